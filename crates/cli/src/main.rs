// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

mod client;
mod color;
mod commands;
mod exit_error;
mod output;
mod parsing;

use std::path::PathBuf;
use std::process::ExitCode;

use casare_wire::AdminResponse;
use clap::Parser;
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "casarectl", about = "Operator CLI for the CasareRPA orchestrator", styles = color::styles())]
struct Cli {
    /// Path to the daemon's admin Unix socket.
    #[arg(long, global = true)]
    socket: Option<PathBuf>,
    /// Output format.
    #[arg(long, global = true, value_enum, default_value = "text")]
    format: CliFormat,
    #[command(subcommand)]
    command: commands::Command,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliFormat {
    Text,
    Json,
}

impl From<CliFormat> for OutputFormat {
    fn from(value: CliFormat) -> Self {
        match value {
            CliFormat::Text => OutputFormat::Text,
            CliFormat::Json => OutputFormat::Json,
        }
    }
}

fn default_socket_path() -> PathBuf {
    if let Ok(path) = std::env::var("CASARE_ADMIN_SOCKET") {
        return PathBuf::from(path);
    }
    let state_dir = std::env::var("CASARE_STATE_DIR")
        .map(PathBuf::from)
        .or_else(|_| std::env::var("XDG_STATE_HOME").map(|dir| PathBuf::from(dir).join("casare")))
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local/state/casare")
        });
    state_dir.join("admin.sock")
}

pub(crate) fn print_response(response: &AdminResponse, format: OutputFormat) {
    println!("{}", output::render(response, format));
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let socket = cli.socket.unwrap_or_else(default_socket_path);
    let format = OutputFormat::from(cli.format);

    match cli.command.run(&socket, format).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(err.code.clamp(1, 255) as u8)
        }
    }
}
