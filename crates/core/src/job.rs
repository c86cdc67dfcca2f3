// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job identity, priority, and the job lifecycle state machine.

use crate::clock::Clock;
use crate::error::DomainError;
use crate::robot::RobotId;
use crate::workflow::WorkflowId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

crate::define_id! {
    /// Unique identifier for a job instance.
    pub struct JobId("job-");
}

/// Dispatch priority. Ordered `Low < Normal < High < Critical` so a plain
/// `Ord` comparison gives the priority-bucket ordering the Job Queue wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Normal,
    High,
    Critical,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Normal
    }
}

crate::simple_display! {
    Priority {
        Low => "low",
        Normal => "normal",
        High => "high",
        Critical => "critical",
    }
}

/// Current point in the job lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Queued,
    Running,
    Completed,
    Failed,
    Timeout,
    Cancelled,
}

crate::simple_display! {
    JobStatus {
        Pending => "pending",
        Queued => "queued",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
        Timeout => "timeout",
        Cancelled => "cancelled",
    }
}

impl JobStatus {
    /// Terminal statuses never transition again.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed | JobStatus::Timeout | JobStatus::Cancelled)
    }

    /// Whether `self -> next` is a legal edge in the lifecycle graph.
    ///
    /// ```text
    /// Pending -> Queued -> Running -> Completed
    ///             ^          |    \-> Failed
    ///             |          |    \-> Timeout
    ///             \----------+--------> Cancelled
    /// Queued  -> Cancelled
    /// Pending -> Cancelled
    /// ```
    ///
    /// `Running -> Queued` is the dispatcher's rollback edge: a
    /// `job_reject`, an ack timeout, or a robot-loss recovery on a
    /// retry-safe workflow sends a job back to the queue without it ever
    /// having left the non-terminal part of the lifecycle.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (self, next),
            (Pending, Queued)
                | (Pending, Cancelled)
                | (Queued, Running)
                | (Queued, Cancelled)
                | (Running, Queued)
                | (Running, Completed)
                | (Running, Failed)
                | (Running, Timeout)
                | (Running, Cancelled)
        )
    }
}

/// Structured error payload recorded on a Failed/Timeout job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobError {
    pub message: String,
    pub error_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_node: Option<String>,
}

/// Inputs required to create a new job.
#[derive(Debug, Clone)]
pub struct JobConfig {
    pub id: JobId,
    pub workflow_id: WorkflowId,
    pub workflow_blob: Vec<u8>,
    pub priority: Priority,
    pub target_robot_id: Option<RobotId>,
    pub scheduled_start: Option<DateTime<Utc>>,
    pub idempotency_key: Option<String>,
    pub parameters: HashMap<String, serde_json::Value>,
    pub tenant_id: Option<String>,
    /// Back-reference when this job is a retry of an earlier terminal job.
    pub retry_of: Option<JobId>,
    /// Execution timeout once Running. `None` means the dispatcher's
    /// configured default (spec default 1h) applies.
    pub timeout_seconds: Option<u64>,
}

impl JobConfig {
    pub fn new(workflow_id: WorkflowId, workflow_blob: Vec<u8>) -> Self {
        Self {
            id: JobId::new(),
            workflow_id,
            workflow_blob,
            priority: Priority::Normal,
            target_robot_id: None,
            scheduled_start: None,
            idempotency_key: None,
            parameters: HashMap::new(),
            tenant_id: None,
            retry_of: None,
            timeout_seconds: None,
        }
    }
}

/// A single execution request for a workflow, tracked from submission to a
/// terminal state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub workflow_id: WorkflowId,
    /// Opaque serialized workflow definition; the orchestrator never inspects it.
    pub workflow_blob: Vec<u8>,
    pub target_robot_id: Option<RobotId>,
    pub priority: Priority,
    pub status: JobStatus,
    pub scheduled_start: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub current_node: Option<String>,
    pub progress: u8,
    pub result: HashMap<String, serde_json::Value>,
    pub error: Option<JobError>,
    pub idempotency_key: Option<String>,
    pub parameters: HashMap<String, serde_json::Value>,
    pub tenant_id: Option<String>,
    pub retry_of: Option<JobId>,
    /// Robot currently holding this job (set once assigned, cleared on release).
    pub assigned_robot_id: Option<RobotId>,
    /// Consecutive `job_reject`s since the job last entered `Running`.
    #[serde(default)]
    pub consecutive_rejects: u32,
    /// Execution timeout once Running. `None` means the dispatcher's
    /// configured default (spec default 1h) applies.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

impl Job {
    pub fn new(config: JobConfig, clock: &impl Clock) -> Self {
        let now = crate::clock::epoch_to_utc(clock.epoch_ms());
        Self {
            id: config.id,
            workflow_id: config.workflow_id,
            workflow_blob: config.workflow_blob,
            target_robot_id: config.target_robot_id,
            priority: config.priority,
            status: JobStatus::Pending,
            scheduled_start: config.scheduled_start,
            created_at: now,
            started_at: None,
            completed_at: None,
            current_node: None,
            progress: 0,
            result: HashMap::new(),
            error: None,
            idempotency_key: config.idempotency_key,
            parameters: config.parameters,
            tenant_id: config.tenant_id,
            retry_of: config.retry_of,
            assigned_robot_id: None,
            consecutive_rejects: 0,
            timeout_seconds: config.timeout_seconds,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// The only way to move a job between lifecycle states.
    ///
    /// Validates the edge against the static transition table, stamps the
    /// relevant timestamp, and fails explicitly rather than silently no-op'ing
    /// on an illegal transition.
    pub fn transition_to(&mut self, next: JobStatus, now: DateTime<Utc>) -> Result<(), DomainError> {
        if self.status.is_terminal() {
            return Err(DomainError::InvalidTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }

        match next {
            JobStatus::Running => {
                if self.started_at.is_none() {
                    self.started_at = Some(now);
                }
            }
            JobStatus::Completed | JobStatus::Failed | JobStatus::Timeout | JobStatus::Cancelled => {
                self.completed_at = Some(now);
            }
            _ => {}
        }
        self.status = next;
        Ok(())
    }

    /// Roll a `Running` job back to `Queued`: a `job_reject`, an ack
    /// timeout, or a robot-loss recovery on a retry-safe workflow. Clears
    /// the robot assignment; the caller is responsible for releasing the
    /// robot's capacity via `Robot::complete_job` first.
    pub fn requeue(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.transition_to(JobStatus::Queued, now)?;
        self.assigned_robot_id = None;
        Ok(())
    }

    /// Record a `job_reject` against this job's current assignment attempt.
    pub fn record_reject(&mut self) {
        self.consecutive_rejects += 1;
    }

    /// Reset the reject counter once a `job_accept` confirms a fresh assignment.
    pub fn reset_rejects(&mut self) {
        self.consecutive_rejects = 0;
    }

    /// Record progress from an inbound `job_progress` message. Does not change status.
    pub fn record_progress(&mut self, progress: u8, current_node: Option<String>) -> Result<(), DomainError> {
        if progress > 100 {
            return Err(DomainError::InvariantViolation(format!(
                "progress {progress} out of range [0,100]"
            )));
        }
        self.progress = progress;
        if current_node.is_some() {
            self.current_node = current_node;
        }
        Ok(())
    }

    pub fn mark_completed(
        &mut self,
        result: HashMap<String, serde_json::Value>,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        self.transition_to(JobStatus::Completed, now)?;
        self.result = result;
        self.progress = 100;
        Ok(())
    }

    pub fn mark_failed(&mut self, error: JobError, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.transition_to(JobStatus::Failed, now)?;
        self.error = Some(error);
        Ok(())
    }
}

crate::builder! {
    pub struct JobBuilder => Job {
        set {
            id: JobId = JobId::new(),
            workflow_id: WorkflowId = WorkflowId::new(),
            workflow_blob: Vec<u8> = Vec::new(),
            priority: Priority = Priority::Normal,
            status: JobStatus = JobStatus::Pending,
            progress: u8 = 0,
            result: HashMap<String, serde_json::Value> = HashMap::new(),
            parameters: HashMap<String, serde_json::Value> = HashMap::new(),
            consecutive_rejects: u32 = 0,
        }
        option {
            target_robot_id: RobotId = None,
            scheduled_start: DateTime<Utc> = None,
            started_at: DateTime<Utc> = None,
            completed_at: DateTime<Utc> = None,
            current_node: String = None,
            error: JobError = None,
            idempotency_key: String = None,
            tenant_id: String = None,
            retry_of: JobId = None,
            assigned_robot_id: RobotId = None,
            timeout_seconds: u64 = None,
        }
        computed {
            created_at: DateTime<Utc> = Utc::now(),
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
