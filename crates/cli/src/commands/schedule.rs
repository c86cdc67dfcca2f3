// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::Path;

use casare_core::{Frequency, Priority, RobotId, ScheduleId, WorkflowId};
use casare_wire::AdminRequest;
use clap::Subcommand;

use crate::exit_error::ExitError;
use crate::output::OutputFormat;
use crate::parsing;
use crate::{client, print_response};

#[derive(Debug, Subcommand)]
pub enum ScheduleCommand {
    /// List every schedule.
    List,
    /// Create a new schedule.
    Create {
        #[arg(long)]
        name: String,
        #[arg(long, value_parser = parsing::workflow_id)]
        workflow: WorkflowId,
        /// `once|hourly|daily|weekly|monthly`, or pass `--cron` for a custom expression.
        #[arg(long, default_value = "daily")]
        frequency: String,
        #[arg(long)]
        cron: Option<String>,
        #[arg(long, value_parser = parsing::robot_id)]
        fixed_robot: Option<RobotId>,
        #[arg(long, value_parser = parsing::priority, default_value = "normal")]
        priority: Priority,
    },
    /// Enable a disabled schedule.
    Enable {
        #[arg(value_parser = parsing::schedule_id)]
        schedule_id: ScheduleId,
    },
    /// Disable an enabled schedule.
    Disable {
        #[arg(value_parser = parsing::schedule_id)]
        schedule_id: ScheduleId,
    },
}

fn parse_frequency(frequency: &str, cron: Option<String>) -> Result<Frequency, ExitError> {
    if let Some(expression) = cron {
        return Ok(Frequency::Cron { expression });
    }
    match frequency.to_ascii_lowercase().as_str() {
        "once" => Ok(Frequency::Once),
        "hourly" => Ok(Frequency::Hourly),
        "daily" => Ok(Frequency::Daily),
        "weekly" => Ok(Frequency::Weekly),
        "monthly" => Ok(Frequency::Monthly),
        other => Err(ExitError::new(1, format!("invalid frequency {other:?}; pass --cron for a custom expression"))),
    }
}

pub async fn run(cmd: ScheduleCommand, socket: &Path, format: OutputFormat) -> Result<(), ExitError> {
    let request = match cmd {
        ScheduleCommand::List => AdminRequest::ListSchedules,
        ScheduleCommand::Create { name, workflow, frequency, cron, fixed_robot, priority } => {
            AdminRequest::CreateSchedule {
                name,
                workflow_id: workflow,
                frequency: parse_frequency(&frequency, cron)?,
                fixed_robot_id: fixed_robot,
                priority,
            }
        }
        ScheduleCommand::Enable { schedule_id } => AdminRequest::SetScheduleEnabled { schedule_id, enabled: true },
        ScheduleCommand::Disable { schedule_id } => AdminRequest::SetScheduleEnabled { schedule_id, enabled: false },
    };
    let response = client::send(socket, request).await?;
    print_response(&response, format);
    Ok(())
}
