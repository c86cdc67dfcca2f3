// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::Path;

use casare_core::{Capability, RobotId, WorkflowId};
use casare_wire::AdminRequest;
use clap::Subcommand;

use crate::exit_error::ExitError;
use crate::output::OutputFormat;
use crate::parsing;
use crate::{client, print_response};

#[derive(Debug, Subcommand)]
pub enum AssignmentCommand {
    /// List default workflow -> robot assignments.
    List {
        #[arg(long, value_parser = parsing::workflow_id)]
        workflow: Option<WorkflowId>,
    },
    /// Assign a robot to a workflow. Default unless `--non-default` is
    /// passed, in which case the robot is merely pre-assigned (spec.md
    /// §4.4's "+50" scoring path rather than the default's "+100").
    Set {
        #[arg(long, value_parser = parsing::workflow_id)]
        workflow: WorkflowId,
        #[arg(long, value_parser = parsing::robot_id)]
        robot: RobotId,
        #[arg(long, default_value_t = 0)]
        priority: u32,
        #[arg(long)]
        non_default: bool,
    },
    /// Pin a specific workflow node to a robot, or to a capability set.
    Override {
        #[arg(long, value_parser = parsing::workflow_id)]
        workflow: WorkflowId,
        #[arg(long)]
        node: String,
        #[arg(long, value_parser = parsing::robot_id)]
        robot: Option<RobotId>,
        #[arg(long = "capability", value_parser = parsing::capability)]
        capabilities: Vec<Capability>,
        #[arg(long)]
        strict: bool,
    },
}

pub async fn run(cmd: AssignmentCommand, socket: &Path, format: OutputFormat) -> Result<(), ExitError> {
    let request = match cmd {
        AssignmentCommand::List { workflow } => AdminRequest::ListAssignments { workflow_id: workflow },
        AssignmentCommand::Set { workflow, robot, priority, non_default } => AdminRequest::SetAssignment {
            workflow_id: workflow,
            robot_id: robot,
            priority,
            is_default: !non_default,
        },
        AssignmentCommand::Override { workflow, node, robot, capabilities, strict } => AdminRequest::SetOverride {
            workflow_id: workflow,
            node_id: node,
            robot_id: robot,
            required_capabilities: capabilities,
            strict,
        },
    };
    let response = client::send(socket, request).await?;
    print_response(&response, format);
    Ok(())
}
