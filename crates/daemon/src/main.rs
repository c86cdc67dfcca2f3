// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use casare_daemon::cli::Args;
use casare_daemon::{Config, Orchestrator};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = Config::resolve(&args)?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env("CASARE_LOG").unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!(state_dir = %config.state_dir.display(), "starting casared");

    let orchestrator = Orchestrator::start(config).await?;
    orchestrator.run_until_shutdown().await?;

    tracing::info!("casared shut down cleanly");
    Ok(())
}
