// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow metadata. The orchestrator treats the definition itself as an
//! opaque blob handed to a robot; it never interprets workflow contents.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a workflow definition.
    pub struct WorkflowId("wfl-");
}

/// Publication status. Only `Published` workflows may be executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Draft,
    Published,
    Archived,
}

crate::simple_display! {
    WorkflowStatus {
        Draft => "draft",
        Published => "published",
        Archived => "archived",
    }
}

/// Metadata about an automation definition authored externally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub id: WorkflowId,
    pub name: String,
    pub description: String,
    /// Monotonic version counter, bumped on every republish.
    pub version: u32,
    pub status: WorkflowStatus,
    pub definition: Vec<u8>,
    /// Whether a job on this workflow may be recovered (re-queued) after its
    /// robot is lost, rather than failed outright. See the robot-loss retry-safety
    /// open question.
    pub retry_safe: bool,
}

impl Workflow {
    pub fn new(id: WorkflowId, name: impl Into<String>, definition: Vec<u8>) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            version: 1,
            status: WorkflowStatus::Draft,
            definition,
            retry_safe: true,
        }
    }

    pub fn is_executable(&self) -> bool {
        self.status == WorkflowStatus::Published
    }

    pub fn publish(&mut self) -> Result<(), DomainError> {
        if self.status == WorkflowStatus::Archived {
            return Err(DomainError::InvalidTransition {
                from: self.status.to_string(),
                to: WorkflowStatus::Published.to_string(),
            });
        }
        self.status = WorkflowStatus::Published;
        Ok(())
    }

    pub fn archive(&mut self) {
        self.status = WorkflowStatus::Archived;
    }

    /// Republish a new definition, bumping the monotonic version.
    pub fn republish(&mut self, definition: Vec<u8>) -> Result<(), DomainError> {
        if self.status == WorkflowStatus::Archived {
            return Err(DomainError::InvalidTransition {
                from: self.status.to_string(),
                to: WorkflowStatus::Published.to_string(),
            });
        }
        self.definition = definition;
        self.version += 1;
        self.status = WorkflowStatus::Published;
        Ok(())
    }
}

crate::builder! {
    pub struct WorkflowBuilder => Workflow {
        into {
            name: String = "test-workflow",
            description: String = "",
        }
        set {
            id: WorkflowId = WorkflowId::new(),
            version: u32 = 1,
            status: WorkflowStatus = WorkflowStatus::Published,
            definition: Vec<u8> = Vec::new(),
            retry_safe: bool = true,
        }
    }
}

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;
