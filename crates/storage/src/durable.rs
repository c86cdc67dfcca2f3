// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WAL-backed repository implementation: every write is appended to the
//! write-ahead log and fsynced before the call returns, then folded into an
//! in-memory [`MaterializedState`]. [`DurableStore::checkpoint`] snapshots
//! that state so recovery only has to replay the WAL's unprocessed tail.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use casare_core::{
    Job, JobId, JobStatus, NodeRobotOverride, Robot, RobotAssignment, RobotId, RobotStatus,
    Schedule, ScheduleId, Trigger, TriggerId, Workflow, WorkflowId,
};
use parking_lot::Mutex;
use tracing::info;

use crate::checkpoint::Checkpointer;
use crate::error::StorageError;
use crate::event::StorageEvent;
use crate::migration::MigrationRegistry;
use crate::ports::{
    AssignmentRepository, JobRepository, RobotRepository, ScheduleRepository, TriggerRepository,
    WorkflowRepository,
};
use crate::state::MaterializedState;
use crate::wal::Wal;

struct Inner {
    state: MaterializedState,
    wal: Wal,
}

/// Durable, crash-recoverable repository backed by a WAL plus periodic
/// snapshots, both rooted at a single state directory.
pub struct DurableStore {
    inner: Mutex<Inner>,
    checkpointer: Checkpointer,
}

impl DurableStore {
    /// Open (or create) the store at `dir`, replaying any WAL entries not
    /// yet folded into the last snapshot.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir: PathBuf = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;

        let checkpointer = Checkpointer::new(dir.join("snapshot.json"));
        let migrations = MigrationRegistry::new();
        let loaded = checkpointer.load(&migrations)?;

        let (mut state, processed_seq) = match loaded {
            Some(snapshot) => (snapshot.state, snapshot.seq),
            None => (MaterializedState::default(), 0),
        };

        let mut wal = Wal::open(dir.join("wal.log"), processed_seq)?;
        let mut replayed = 0u64;
        while let Some(entry) = wal.next_unprocessed()? {
            state.apply_event(&entry.event);
            wal.mark_processed(entry.seq);
            replayed += 1;
        }
        if replayed > 0 {
            info!(replayed, "replayed wal entries on recovery");
        }

        Ok(Self { inner: Mutex::new(Inner { state, wal }), checkpointer })
    }

    fn apply(&self, event: StorageEvent) -> Result<(), StorageError> {
        let mut inner = self.inner.lock();
        let seq = inner.wal.append(&event)?;
        inner.wal.flush()?;
        inner.state.apply_event(&event);
        inner.wal.mark_processed(seq);
        Ok(())
    }

    /// Fold current state into a snapshot. Call periodically (the daemon
    /// does this on a timer) to bound WAL replay time on the next restart.
    pub fn checkpoint(&self) -> Result<(), StorageError> {
        let inner = self.inner.lock();
        self.checkpointer.save(&inner.state, inner.wal.processed_seq())?;
        Ok(())
    }
}

#[async_trait]
impl JobRepository for DurableStore {
    async fn get(&self, id: JobId) -> Result<Option<Job>, StorageError> {
        Ok(self.inner.lock().state.jobs.get(&id).cloned())
    }

    async fn save(&self, job: &Job) -> Result<(), StorageError> {
        self.apply(StorageEvent::JobPut { job: Box::new(job.clone()) })
    }

    async fn delete(&self, id: JobId) -> Result<(), StorageError> {
        self.apply(StorageEvent::JobDeleted { job_id: id })
    }

    async fn by_status(&self, status: JobStatus) -> Result<Vec<Job>, StorageError> {
        Ok(self.inner.lock().state.jobs_by_status(status).into_iter().cloned().collect())
    }

    async fn list(&self) -> Result<Vec<Job>, StorageError> {
        Ok(self.inner.lock().state.jobs.values().cloned().collect())
    }
}

#[async_trait]
impl RobotRepository for DurableStore {
    async fn get(&self, id: RobotId) -> Result<Option<Robot>, StorageError> {
        Ok(self.inner.lock().state.robots.get(&id).cloned())
    }

    async fn save(&self, robot: &Robot) -> Result<(), StorageError> {
        self.apply(StorageEvent::RobotPut { robot: Box::new(robot.clone()) })
    }

    async fn delete(&self, id: RobotId) -> Result<(), StorageError> {
        self.apply(StorageEvent::RobotDeleted { robot_id: id })
    }

    async fn by_status(&self, status: RobotStatus) -> Result<Vec<Robot>, StorageError> {
        Ok(self.inner.lock().state.robots_by_status(status).into_iter().cloned().collect())
    }

    async fn list(&self) -> Result<Vec<Robot>, StorageError> {
        Ok(self.inner.lock().state.robots.values().cloned().collect())
    }
}

#[async_trait]
impl ScheduleRepository for DurableStore {
    async fn get(&self, id: ScheduleId) -> Result<Option<Schedule>, StorageError> {
        Ok(self.inner.lock().state.schedules.get(&id).cloned())
    }

    async fn save(&self, schedule: &Schedule) -> Result<(), StorageError> {
        self.apply(StorageEvent::SchedulePut { schedule: Box::new(schedule.clone()) })
    }

    async fn delete(&self, id: ScheduleId) -> Result<(), StorageError> {
        self.apply(StorageEvent::ScheduleDeleted { schedule_id: id })
    }

    async fn enabled(&self) -> Result<Vec<Schedule>, StorageError> {
        Ok(self.inner.lock().state.enabled_schedules().into_iter().cloned().collect())
    }

    async fn list(&self) -> Result<Vec<Schedule>, StorageError> {
        Ok(self.inner.lock().state.schedules.values().cloned().collect())
    }
}

#[async_trait]
impl WorkflowRepository for DurableStore {
    async fn get(&self, id: WorkflowId) -> Result<Option<Workflow>, StorageError> {
        Ok(self.inner.lock().state.workflows.get(&id).cloned())
    }

    async fn save(&self, workflow: &Workflow) -> Result<(), StorageError> {
        self.apply(StorageEvent::WorkflowPut { workflow: Box::new(workflow.clone()) })
    }

    async fn delete(&self, id: WorkflowId) -> Result<(), StorageError> {
        self.apply(StorageEvent::WorkflowDeleted { workflow_id: id })
    }

    async fn list(&self) -> Result<Vec<Workflow>, StorageError> {
        Ok(self.inner.lock().state.workflows.values().cloned().collect())
    }
}

#[async_trait]
impl TriggerRepository for DurableStore {
    async fn get(&self, id: TriggerId) -> Result<Option<Trigger>, StorageError> {
        Ok(self.inner.lock().state.triggers.get(&id).cloned())
    }

    async fn save(&self, trigger: &Trigger) -> Result<(), StorageError> {
        self.apply(StorageEvent::TriggerPut { trigger: Box::new(trigger.clone()) })
    }

    async fn delete(&self, id: TriggerId) -> Result<(), StorageError> {
        self.apply(StorageEvent::TriggerDeleted { trigger_id: id })
    }

    async fn list(&self) -> Result<Vec<Trigger>, StorageError> {
        Ok(self.inner.lock().state.triggers.values().cloned().collect())
    }
}

#[async_trait]
impl AssignmentRepository for DurableStore {
    async fn save_assignment(&self, assignment: &RobotAssignment) -> Result<(), StorageError> {
        self.apply(StorageEvent::AssignmentPut { assignment: Box::new(assignment.clone()) })
    }

    async fn delete_assignment(&self, workflow_id: WorkflowId, robot_id: RobotId) -> Result<(), StorageError> {
        self.apply(StorageEvent::AssignmentDeleted { workflow_id, robot_id })
    }

    async fn by_workflow(&self, workflow_id: WorkflowId) -> Result<Vec<RobotAssignment>, StorageError> {
        Ok(self.inner.lock().state.assignments_for_workflow(workflow_id).into_iter().cloned().collect())
    }

    async fn save_override(&self, over: &NodeRobotOverride) -> Result<(), StorageError> {
        self.apply(StorageEvent::OverridePut { override_: Box::new(over.clone()) })
    }

    async fn delete_override(&self, workflow_id: WorkflowId, node_id: &str) -> Result<(), StorageError> {
        self.apply(StorageEvent::OverrideDeleted { workflow_id, node_id: node_id.to_string() })
    }

    async fn overrides_by_workflow(&self, workflow_id: WorkflowId) -> Result<Vec<NodeRobotOverride>, StorageError> {
        Ok(self
            .inner
            .lock()
            .state
            .overrides
            .iter()
            .filter(|o| o.workflow_id == workflow_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
#[path = "durable_tests.rs"]
mod tests;
