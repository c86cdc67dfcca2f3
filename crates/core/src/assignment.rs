// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Declarative workflow -> default-robot binding (immutable value object).

use crate::robot::RobotId;
use crate::workflow::WorkflowId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Workflow -> default robot binding, with a priority used to break ties
/// when more than one assignment could apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotAssignment {
    pub workflow_id: WorkflowId,
    pub robot_id: RobotId,
    pub priority: u32,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

impl RobotAssignment {
    /// `is_default` selects between the two scoring paths spec.md §4.4
    /// steps 2/3 distinguish: a default assignment (`+100`) versus a
    /// pre-assigned-but-not-default one (`+50`).
    pub fn new(workflow_id: WorkflowId, robot_id: RobotId, is_default: bool, now: DateTime<Utc>) -> Self {
        Self { workflow_id, robot_id, priority: 0, is_default, created_at: now }
    }
}

#[cfg(test)]
#[path = "assignment_tests.rs"]
mod tests;
