// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The append-only event log vocabulary. Each repository `save`/`delete`
//! call is recorded as one `StorageEvent` before the in-memory
//! [`crate::state::MaterializedState`] is mutated, satisfying the
//! write-through durability requirement. Handlers are idempotent:
//! replaying the same event twice must produce the same state as once
//! (every variant is a whole-entity put or delete, never a delta).

use casare_core::{
    Job, JobId, NodeRobotOverride, Robot, RobotAssignment, RobotId, Schedule, ScheduleId, Trigger,
    TriggerId, Workflow, WorkflowId,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum StorageEvent {
    JobPut { job: Box<Job> },
    JobDeleted { job_id: JobId },
    RobotPut { robot: Box<Robot> },
    RobotDeleted { robot_id: RobotId },
    SchedulePut { schedule: Box<Schedule> },
    ScheduleDeleted { schedule_id: ScheduleId },
    WorkflowPut { workflow: Box<Workflow> },
    WorkflowDeleted { workflow_id: WorkflowId },
    TriggerPut { trigger: Box<Trigger> },
    TriggerDeleted { trigger_id: TriggerId },
    AssignmentPut { assignment: Box<RobotAssignment> },
    AssignmentDeleted { workflow_id: WorkflowId, robot_id: RobotId },
    OverridePut { override_: Box<NodeRobotOverride> },
    OverrideDeleted { workflow_id: WorkflowId, node_id: String },
}
