// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::Path;

use casare_core::RobotId;
use casare_wire::AdminRequest;
use clap::Subcommand;

use crate::exit_error::ExitError;
use crate::output::OutputFormat;
use crate::parsing;
use crate::{client, print_response};

#[derive(Debug, Subcommand)]
pub enum RobotCommand {
    /// List every registered robot.
    List,
    /// Show a single robot.
    Get {
        #[arg(value_parser = parsing::robot_id)]
        robot_id: RobotId,
    },
}

pub async fn run(cmd: RobotCommand, socket: &Path, format: OutputFormat) -> Result<(), ExitError> {
    let request = match cmd {
        RobotCommand::List => AdminRequest::ListRobots,
        RobotCommand::Get { robot_id } => AdminRequest::GetRobot { robot_id },
    };
    let response = client::send(socket, request).await?;
    print_response(&response, format);
    Ok(())
}
