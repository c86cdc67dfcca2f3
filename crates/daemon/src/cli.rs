// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command-line flags for `casared`. Highest-precedence layer of the
//! config resolution order (spec.md §6.4).

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser, Default)]
#[command(name = "casared", about = "CasareRPA orchestrator daemon")]
pub struct Args {
    /// Path to a TOML config file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the state directory (WAL, snapshots, admin socket default).
    #[arg(long)]
    pub state_dir: Option<PathBuf>,

    /// Override the admin Unix socket path.
    #[arg(long)]
    pub admin_socket: Option<PathBuf>,

    /// Override the robot WebSocket bind address (default `0.0.0.0:8765`).
    #[arg(long)]
    pub websocket_bind: Option<String>,

    /// Override the webhook HTTP bind address (default `0.0.0.0:8766`).
    #[arg(long)]
    pub webhook_bind: Option<String>,

    /// Shared secret validated against the `X-Webhook-Secret` header.
    #[arg(long)]
    pub webhook_shared_secret: Option<String>,
}
