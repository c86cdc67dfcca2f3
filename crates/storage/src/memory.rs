// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory repository implementation: no WAL, no snapshot, state lost on
//! restart. Used by integration tests and by `casare-daemon` when run with
//! `--ephemeral`.

use async_trait::async_trait;
use casare_core::{
    Job, JobId, JobStatus, NodeRobotOverride, Robot, RobotAssignment, RobotId, RobotStatus,
    Schedule, ScheduleId, Trigger, TriggerId, Workflow, WorkflowId,
};
use parking_lot::Mutex;

use crate::error::StorageError;
use crate::event::StorageEvent;
use crate::ports::{
    AssignmentRepository, JobRepository, RobotRepository, ScheduleRepository, TriggerRepository,
    WorkflowRepository,
};
use crate::state::MaterializedState;

/// Applies every write straight to a [`MaterializedState`] guarded by a
/// mutex, skipping the WAL entirely.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MaterializedState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn apply(&self, event: StorageEvent) {
        self.state.lock().apply_event(&event);
    }
}

#[async_trait]
impl JobRepository for MemoryStore {
    async fn get(&self, id: JobId) -> Result<Option<Job>, StorageError> {
        Ok(self.state.lock().jobs.get(&id).cloned())
    }

    async fn save(&self, job: &Job) -> Result<(), StorageError> {
        self.apply(StorageEvent::JobPut { job: Box::new(job.clone()) });
        Ok(())
    }

    async fn delete(&self, id: JobId) -> Result<(), StorageError> {
        self.apply(StorageEvent::JobDeleted { job_id: id });
        Ok(())
    }

    async fn by_status(&self, status: JobStatus) -> Result<Vec<Job>, StorageError> {
        Ok(self.state.lock().jobs_by_status(status).into_iter().cloned().collect())
    }

    async fn list(&self) -> Result<Vec<Job>, StorageError> {
        Ok(self.state.lock().jobs.values().cloned().collect())
    }
}

#[async_trait]
impl RobotRepository for MemoryStore {
    async fn get(&self, id: RobotId) -> Result<Option<Robot>, StorageError> {
        Ok(self.state.lock().robots.get(&id).cloned())
    }

    async fn save(&self, robot: &Robot) -> Result<(), StorageError> {
        self.apply(StorageEvent::RobotPut { robot: Box::new(robot.clone()) });
        Ok(())
    }

    async fn delete(&self, id: RobotId) -> Result<(), StorageError> {
        self.apply(StorageEvent::RobotDeleted { robot_id: id });
        Ok(())
    }

    async fn by_status(&self, status: RobotStatus) -> Result<Vec<Robot>, StorageError> {
        Ok(self.state.lock().robots_by_status(status).into_iter().cloned().collect())
    }

    async fn list(&self) -> Result<Vec<Robot>, StorageError> {
        Ok(self.state.lock().robots.values().cloned().collect())
    }
}

#[async_trait]
impl ScheduleRepository for MemoryStore {
    async fn get(&self, id: ScheduleId) -> Result<Option<Schedule>, StorageError> {
        Ok(self.state.lock().schedules.get(&id).cloned())
    }

    async fn save(&self, schedule: &Schedule) -> Result<(), StorageError> {
        self.apply(StorageEvent::SchedulePut { schedule: Box::new(schedule.clone()) });
        Ok(())
    }

    async fn delete(&self, id: ScheduleId) -> Result<(), StorageError> {
        self.apply(StorageEvent::ScheduleDeleted { schedule_id: id });
        Ok(())
    }

    async fn enabled(&self) -> Result<Vec<Schedule>, StorageError> {
        Ok(self.state.lock().enabled_schedules().into_iter().cloned().collect())
    }

    async fn list(&self) -> Result<Vec<Schedule>, StorageError> {
        Ok(self.state.lock().schedules.values().cloned().collect())
    }
}

#[async_trait]
impl WorkflowRepository for MemoryStore {
    async fn get(&self, id: WorkflowId) -> Result<Option<Workflow>, StorageError> {
        Ok(self.state.lock().workflows.get(&id).cloned())
    }

    async fn save(&self, workflow: &Workflow) -> Result<(), StorageError> {
        self.apply(StorageEvent::WorkflowPut { workflow: Box::new(workflow.clone()) });
        Ok(())
    }

    async fn delete(&self, id: WorkflowId) -> Result<(), StorageError> {
        self.apply(StorageEvent::WorkflowDeleted { workflow_id: id });
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Workflow>, StorageError> {
        Ok(self.state.lock().workflows.values().cloned().collect())
    }
}

#[async_trait]
impl TriggerRepository for MemoryStore {
    async fn get(&self, id: TriggerId) -> Result<Option<Trigger>, StorageError> {
        Ok(self.state.lock().triggers.get(&id).cloned())
    }

    async fn save(&self, trigger: &Trigger) -> Result<(), StorageError> {
        self.apply(StorageEvent::TriggerPut { trigger: Box::new(trigger.clone()) });
        Ok(())
    }

    async fn delete(&self, id: TriggerId) -> Result<(), StorageError> {
        self.apply(StorageEvent::TriggerDeleted { trigger_id: id });
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Trigger>, StorageError> {
        Ok(self.state.lock().triggers.values().cloned().collect())
    }
}

#[async_trait]
impl AssignmentRepository for MemoryStore {
    async fn save_assignment(&self, assignment: &RobotAssignment) -> Result<(), StorageError> {
        self.apply(StorageEvent::AssignmentPut { assignment: Box::new(assignment.clone()) });
        Ok(())
    }

    async fn delete_assignment(&self, workflow_id: WorkflowId, robot_id: RobotId) -> Result<(), StorageError> {
        self.apply(StorageEvent::AssignmentDeleted { workflow_id, robot_id });
        Ok(())
    }

    async fn by_workflow(&self, workflow_id: WorkflowId) -> Result<Vec<RobotAssignment>, StorageError> {
        Ok(self.state.lock().assignments_for_workflow(workflow_id).into_iter().cloned().collect())
    }

    async fn save_override(&self, over: &NodeRobotOverride) -> Result<(), StorageError> {
        self.apply(StorageEvent::OverridePut { override_: Box::new(over.clone()) });
        Ok(())
    }

    async fn delete_override(&self, workflow_id: WorkflowId, node_id: &str) -> Result<(), StorageError> {
        self.apply(StorageEvent::OverrideDeleted { workflow_id, node_id: node_id.to_string() });
        Ok(())
    }

    async fn overrides_by_workflow(&self, workflow_id: WorkflowId) -> Result<Vec<NodeRobotOverride>, StorageError> {
        Ok(self
            .state
            .lock()
            .overrides
            .iter()
            .filter(|o| o.workflow_id == workflow_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
