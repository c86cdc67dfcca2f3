// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state built from event-log replay.

mod assignments;
mod jobs;
mod robots;
mod schedules;
mod triggers;
mod workflows;

use std::collections::HashMap;

use casare_core::{
    Job, JobId, NodeRobotOverride, Robot, RobotAssignment, RobotId, Schedule, ScheduleId, Trigger,
    TriggerId, Workflow, WorkflowId,
};
use serde::{Deserialize, Serialize};

use crate::event::StorageEvent;

/// In-memory projection of every `StorageEvent` applied so far.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MaterializedState {
    pub jobs: HashMap<JobId, Job>,
    pub robots: HashMap<RobotId, Robot>,
    pub schedules: HashMap<ScheduleId, Schedule>,
    pub workflows: HashMap<WorkflowId, Workflow>,
    pub triggers: HashMap<TriggerId, Trigger>,
    pub assignments: Vec<RobotAssignment>,
    pub overrides: Vec<NodeRobotOverride>,
}

impl MaterializedState {
    /// Apply a single event. Idempotent: applying the same event twice
    /// (e.g. during WAL replay after a crash mid-fsync) produces the same
    /// state as applying it once, since every handler is a whole-entity put
    /// or delete rather than an incremental mutation.
    pub fn apply_event(&mut self, event: &StorageEvent) {
        match event {
            StorageEvent::JobPut { .. } | StorageEvent::JobDeleted { .. } => jobs::apply(self, event),
            StorageEvent::RobotPut { .. } | StorageEvent::RobotDeleted { .. } => robots::apply(self, event),
            StorageEvent::SchedulePut { .. } | StorageEvent::ScheduleDeleted { .. } => {
                schedules::apply(self, event)
            }
            StorageEvent::WorkflowPut { .. } | StorageEvent::WorkflowDeleted { .. } => {
                workflows::apply(self, event)
            }
            StorageEvent::TriggerPut { .. } | StorageEvent::TriggerDeleted { .. } => {
                triggers::apply(self, event)
            }
            StorageEvent::AssignmentPut { .. }
            | StorageEvent::AssignmentDeleted { .. }
            | StorageEvent::OverridePut { .. }
            | StorageEvent::OverrideDeleted { .. } => assignments::apply(self, event),
        }
    }

    pub fn jobs_by_status(&self, status: casare_core::JobStatus) -> Vec<&Job> {
        self.jobs.values().filter(|j| j.status == status).collect()
    }

    pub fn robots_by_status(&self, status: casare_core::RobotStatus) -> Vec<&Robot> {
        self.robots.values().filter(|r| r.status == status).collect()
    }

    pub fn enabled_schedules(&self) -> Vec<&Schedule> {
        self.schedules.values().filter(|s| s.enabled).collect()
    }

    pub fn assignments_for_workflow(&self, workflow_id: WorkflowId) -> Vec<&RobotAssignment> {
        self.assignments.iter().filter(|a| a.workflow_id == workflow_id).collect()
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
