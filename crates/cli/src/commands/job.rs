// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::Path;

use casare_core::{JobId, JobStatus, Priority, RobotId, WorkflowId};
use casare_wire::AdminRequest;
use clap::Subcommand;

use crate::exit_error::ExitError;
use crate::output::OutputFormat;
use crate::parsing;
use crate::{client, print_response};

#[derive(Debug, Subcommand)]
pub enum JobCommand {
    /// Submit a new job against a published workflow.
    Submit {
        #[arg(long, value_parser = parsing::workflow_id)]
        workflow: WorkflowId,
        #[arg(long, value_parser = parsing::priority, default_value = "normal")]
        priority: Priority,
        #[arg(long, value_parser = parsing::robot_id)]
        target_robot: Option<RobotId>,
        #[arg(long)]
        idempotency_key: Option<String>,
        #[arg(long)]
        tenant: Option<String>,
        /// Repeatable `key=value` job parameter; the value is parsed as JSON
        /// when possible, else kept as a string.
        #[arg(long = "param", value_parser = parsing::key_value_json)]
        params: Vec<(String, serde_json::Value)>,
    },
    /// Cancel a job by id.
    Cancel {
        #[arg(value_parser = parsing::job_id)]
        job_id: JobId,
    },
    /// Show a single job.
    Get {
        #[arg(value_parser = parsing::job_id)]
        job_id: JobId,
    },
    /// List jobs, optionally filtered by status.
    List {
        #[arg(long, value_parser = parse_status)]
        status: Option<JobStatus>,
    },
}

fn parse_status(s: &str) -> Result<JobStatus, String> {
    match s.to_ascii_lowercase().as_str() {
        "pending" => Ok(JobStatus::Pending),
        "queued" => Ok(JobStatus::Queued),
        "running" => Ok(JobStatus::Running),
        "completed" => Ok(JobStatus::Completed),
        "failed" => Ok(JobStatus::Failed),
        "timeout" => Ok(JobStatus::Timeout),
        "cancelled" => Ok(JobStatus::Cancelled),
        other => Err(format!("invalid status {other:?}")),
    }
}

pub async fn run(cmd: JobCommand, socket: &Path, format: OutputFormat) -> Result<(), ExitError> {
    let request = match cmd {
        JobCommand::Submit { workflow, priority, target_robot, idempotency_key, tenant, params } => {
            AdminRequest::SubmitJob {
                workflow_id: workflow,
                priority,
                target_robot_id: target_robot,
                scheduled_start: None,
                idempotency_key,
                parameters: params.into_iter().collect(),
                tenant_id: tenant,
            }
        }
        JobCommand::Cancel { job_id } => AdminRequest::CancelJob { job_id },
        JobCommand::Get { job_id } => AdminRequest::GetJob { job_id },
        JobCommand::List { status } => AdminRequest::ListJobs { status },
    };
    let response = client::send(socket, request).await?;
    print_response(&response, format);
    Ok(())
}
