// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One module per admin-protocol resource family, each owning its clap
//! subcommand enum and the `run` function that turns it into an
//! [`AdminRequest`](casare_wire::AdminRequest).

pub mod assignment;
pub mod job;
pub mod robot;
pub mod schedule;

use std::path::Path;

use clap::Subcommand;

use crate::exit_error::ExitError;
use crate::output::OutputFormat;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Submit, inspect, and cancel jobs.
    #[command(subcommand)]
    Job(job::JobCommand),
    /// Inspect registered robots.
    #[command(subcommand)]
    Robot(robot::RobotCommand),
    /// Manage time-based schedules.
    #[command(subcommand)]
    Schedule(schedule::ScheduleCommand),
    /// Manage workflow -> robot assignments and per-node overrides.
    #[command(subcommand)]
    Assignment(assignment::AssignmentCommand),
}

impl Command {
    pub async fn run(self, socket: &Path, format: OutputFormat) -> Result<(), ExitError> {
        match self {
            Command::Job(cmd) => job::run(cmd, socket, format).await,
            Command::Robot(cmd) => robot::run(cmd, socket, format).await,
            Command::Schedule(cmd) => schedule::run(cmd, socket, format).await,
            Command::Assignment(cmd) => assignment::run(cmd, socket, format).await,
        }
    }
}
