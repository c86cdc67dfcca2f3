// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Robot (worker agent) identity and capacity/assignment invariants.

use crate::error::DomainError;
use crate::job::JobId;
use crate::workflow::WorkflowId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

crate::define_id! {
    /// Unique identifier for a connected robot.
    pub struct RobotId("rbt-");
}

/// Labeled competency a robot advertises and a job/node may require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Browser,
    Desktop,
    Gpu,
    Cloud,
}

crate::simple_display! {
    Capability {
        Browser => "browser",
        Desktop => "desktop",
        Gpu => "gpu",
        Cloud => "cloud",
    }
}

/// Lifecycle status of a robot connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RobotStatus {
    Offline,
    Online,
    Busy,
    Error,
    Maintenance,
}

crate::simple_display! {
    RobotStatus {
        Offline => "offline",
        Online => "online",
        Busy => "busy",
        Error => "error",
        Maintenance => "maintenance",
    }
}

/// A worker agent that executes workflows assigned to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Robot {
    pub id: RobotId,
    pub name: String,
    pub status: RobotStatus,
    pub environment: String,
    pub max_concurrent_jobs: u32,
    /// Ordered, duplicate-free sequence of jobs currently assigned to this robot.
    current_jobs: Vec<JobId>,
    pub capabilities: BTreeSet<Capability>,
    pub last_heartbeat: Option<DateTime<Utc>>,
    pub workflow_affinity: Vec<WorkflowId>,
    pub tenant_id: Option<String>,
}

impl Robot {
    pub fn new(id: RobotId, name: impl Into<String>, max_concurrent_jobs: u32) -> Self {
        Self {
            id,
            name: name.into(),
            status: RobotStatus::Offline,
            environment: String::new(),
            max_concurrent_jobs,
            current_jobs: Vec::new(),
            capabilities: BTreeSet::new(),
            last_heartbeat: None,
            workflow_affinity: Vec::new(),
            tenant_id: None,
        }
    }

    pub fn current_jobs(&self) -> &[JobId] {
        &self.current_jobs
    }

    pub fn has_capacity(&self) -> bool {
        (self.current_jobs.len() as u32) < self.max_concurrent_jobs
    }

    pub fn utilization(&self) -> f64 {
        if self.max_concurrent_jobs == 0 {
            return 1.0;
        }
        self.current_jobs.len() as f64 / self.max_concurrent_jobs as f64
    }

    pub fn has_capabilities(&self, required: &BTreeSet<Capability>) -> bool {
        required.is_subset(&self.capabilities)
    }

    /// Record a fresh heartbeat, bringing the robot Online if it was Offline.
    ///
    /// A transition to Online always carries
    /// a fresh heartbeat timestamp with it.
    pub fn heartbeat(&mut self, now: DateTime<Utc>) {
        self.last_heartbeat = Some(now);
        if self.status == RobotStatus::Offline {
            self.status = RobotStatus::Online;
        }
    }

    /// Assign a job to this robot. Requires Online, capacity, and no duplicate.
    pub fn assign_job(&mut self, job_id: JobId) -> Result<(), DomainError> {
        if self.status != RobotStatus::Online {
            return Err(DomainError::InvalidTransition {
                from: self.status.to_string(),
                to: RobotStatus::Busy.to_string(),
            });
        }
        if self.current_jobs.contains(&job_id) {
            return Err(DomainError::DuplicateAssignment {
                robot_id: self.id.to_string(),
                job_id: job_id.to_string(),
            });
        }
        if !self.has_capacity() {
            return Err(DomainError::AtCapacity {
                robot_id: self.id.to_string(),
                max_concurrent_jobs: self.max_concurrent_jobs,
            });
        }
        self.current_jobs.push(job_id);
        if !self.has_capacity() {
            self.status = RobotStatus::Busy;
        }
        Ok(())
    }

    /// Release a job's assignment. Flips back to Online if now below capacity.
    pub fn complete_job(&mut self, job_id: JobId) -> Result<(), DomainError> {
        let before = self.current_jobs.len();
        self.current_jobs.retain(|id| *id != job_id);
        if self.current_jobs.len() == before {
            return Err(DomainError::NotFound { entity: "job assignment", id: job_id.to_string() });
        }
        if self.status == RobotStatus::Busy && self.has_capacity() {
            self.status = RobotStatus::Online;
        }
        Ok(())
    }

    pub fn mark_offline(&mut self) {
        self.status = RobotStatus::Offline;
    }

    pub fn set_status(&mut self, status: RobotStatus) {
        self.status = status;
    }
}

crate::builder! {
    pub struct RobotBuilder => Robot {
        into {
            name: String = "test-robot",
            environment: String = "default",
        }
        set {
            id: RobotId = RobotId::new(),
            status: RobotStatus = RobotStatus::Online,
            max_concurrent_jobs: u32 = 2,
            current_jobs: Vec<JobId> = Vec::new(),
            capabilities: BTreeSet<Capability> = BTreeSet::new(),
            workflow_affinity: Vec<WorkflowId> = Vec::new(),
        }
        option {
            last_heartbeat: DateTime<Utc> = None,
            tenant_id: String = None,
        }
    }
}

#[cfg(test)]
#[path = "robot_tests.rs"]
mod tests;
