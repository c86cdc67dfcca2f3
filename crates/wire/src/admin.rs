// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The operator admin protocol: length-prefixed JSON over a Unix domain
//! socket, distinct from the robot WebSocket protocol (SPEC_FULL.md
//! "Admin interface"). Does not bypass the Job Queue/Dispatcher path —
//! `SubmitJob` enqueues exactly as a manual submission would.

use std::collections::HashMap;

use casare_core::{
    Capability, Frequency, JobId, JobStatus, Priority, RobotAssignment, RobotId, Schedule,
    ScheduleId, Workflow, WorkflowId,
};
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AdminRequest {
    SubmitJob {
        workflow_id: WorkflowId,
        priority: Priority,
        #[serde(default)]
        target_robot_id: Option<RobotId>,
        #[serde(default)]
        scheduled_start: Option<chrono::DateTime<chrono::Utc>>,
        #[serde(default)]
        idempotency_key: Option<String>,
        #[serde(default)]
        parameters: HashMap<String, serde_json::Value>,
        #[serde(default)]
        tenant_id: Option<String>,
    },
    CancelJob {
        job_id: JobId,
    },
    GetJob {
        job_id: JobId,
    },
    ListJobs {
        #[serde(default)]
        status: Option<JobStatus>,
    },
    ListRobots,
    GetRobot {
        robot_id: RobotId,
    },
    ListSchedules,
    CreateSchedule {
        name: String,
        workflow_id: WorkflowId,
        frequency: Frequency,
        #[serde(default)]
        fixed_robot_id: Option<RobotId>,
        #[serde(default)]
        priority: Priority,
    },
    SetScheduleEnabled {
        schedule_id: ScheduleId,
        enabled: bool,
    },
    ListAssignments {
        #[serde(default)]
        workflow_id: Option<WorkflowId>,
    },
    SetAssignment {
        workflow_id: WorkflowId,
        robot_id: RobotId,
        #[serde(default)]
        priority: u32,
        /// Default (+100 scoring) vs. merely pre-assigned (+50 scoring) per
        /// spec.md §4.4 steps 2/3.
        #[serde(default = "default_true")]
        is_default: bool,
    },
    SetOverride {
        workflow_id: WorkflowId,
        node_id: String,
        #[serde(default)]
        robot_id: Option<RobotId>,
        #[serde(default)]
        required_capabilities: Vec<Capability>,
        #[serde(default)]
        strict: bool,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AdminResponse {
    Ok,
    JobSubmitted { job_id: JobId },
    Job { job: Option<casare_core::Job> },
    Jobs { jobs: Vec<casare_core::Job> },
    Robot { robot: Option<casare_core::Robot> },
    Robots { robots: Vec<casare_core::Robot> },
    Schedules { schedules: Vec<Schedule> },
    ScheduleCreated { schedule_id: ScheduleId },
    Assignments { assignments: Vec<RobotAssignment> },
    Workflow { workflow: Option<Workflow> },
    Error { message: String },
}

#[cfg(test)]
#[path = "admin_tests.rs"]
mod tests;
