// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Repository ports: the abstract persistence interfaces the rest of the
//! orchestrator consumes. `memory.rs` and `durable.rs` are the two
//! implementations; callers (scheduler, dispatcher, admin handlers) depend
//! only on these traits.

use async_trait::async_trait;
use casare_core::{
    Job, JobId, JobStatus, NodeRobotOverride, Robot, RobotAssignment, RobotId, RobotStatus,
    Schedule, ScheduleId, Trigger, TriggerId, Workflow, WorkflowId,
};

use crate::error::StorageError;

#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn get(&self, id: JobId) -> Result<Option<Job>, StorageError>;
    async fn save(&self, job: &Job) -> Result<(), StorageError>;
    async fn delete(&self, id: JobId) -> Result<(), StorageError>;
    async fn by_status(&self, status: JobStatus) -> Result<Vec<Job>, StorageError>;
    async fn list(&self) -> Result<Vec<Job>, StorageError>;
}

#[async_trait]
pub trait RobotRepository: Send + Sync {
    async fn get(&self, id: RobotId) -> Result<Option<Robot>, StorageError>;
    async fn save(&self, robot: &Robot) -> Result<(), StorageError>;
    async fn delete(&self, id: RobotId) -> Result<(), StorageError>;
    async fn by_status(&self, status: RobotStatus) -> Result<Vec<Robot>, StorageError>;
    async fn list(&self) -> Result<Vec<Robot>, StorageError>;
}

#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    async fn get(&self, id: ScheduleId) -> Result<Option<Schedule>, StorageError>;
    async fn save(&self, schedule: &Schedule) -> Result<(), StorageError>;
    async fn delete(&self, id: ScheduleId) -> Result<(), StorageError>;
    async fn enabled(&self) -> Result<Vec<Schedule>, StorageError>;
    async fn list(&self) -> Result<Vec<Schedule>, StorageError>;
}

#[async_trait]
pub trait WorkflowRepository: Send + Sync {
    async fn get(&self, id: WorkflowId) -> Result<Option<Workflow>, StorageError>;
    async fn save(&self, workflow: &Workflow) -> Result<(), StorageError>;
    async fn delete(&self, id: WorkflowId) -> Result<(), StorageError>;
    async fn list(&self) -> Result<Vec<Workflow>, StorageError>;
}

#[async_trait]
pub trait TriggerRepository: Send + Sync {
    async fn get(&self, id: TriggerId) -> Result<Option<Trigger>, StorageError>;
    async fn save(&self, trigger: &Trigger) -> Result<(), StorageError>;
    async fn delete(&self, id: TriggerId) -> Result<(), StorageError>;
    async fn list(&self) -> Result<Vec<Trigger>, StorageError>;
}

#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    async fn save_assignment(&self, assignment: &RobotAssignment) -> Result<(), StorageError>;
    async fn delete_assignment(&self, workflow_id: WorkflowId, robot_id: RobotId) -> Result<(), StorageError>;
    async fn by_workflow(&self, workflow_id: WorkflowId) -> Result<Vec<RobotAssignment>, StorageError>;

    async fn save_override(&self, over: &NodeRobotOverride) -> Result<(), StorageError>;
    async fn delete_override(&self, workflow_id: WorkflowId, node_id: &str) -> Result<(), StorageError>;
    async fn overrides_by_workflow(&self, workflow_id: WorkflowId) -> Result<Vec<NodeRobotOverride>, StorageError>;
}
