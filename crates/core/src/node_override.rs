// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-node robot override within a workflow (immutable value object).

use crate::robot::{Capability, RobotId};
use crate::workflow::WorkflowId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Either a specific robot, or a set of capabilities a robot must have, for a
/// single node within a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OverrideTarget {
    SpecificRobot { robot_id: RobotId, strict: bool },
    RequiredCapabilities(BTreeSet<Capability>),
}

/// A per-node override rule. `active: false` rules are kept (for audit/UI)
/// but never consulted by the Selection Service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRobotOverride {
    pub workflow_id: WorkflowId,
    pub node_id: String,
    pub target: OverrideTarget,
    pub active: bool,
}

impl NodeRobotOverride {
    pub fn specific_robot(
        workflow_id: WorkflowId,
        node_id: impl Into<String>,
        robot_id: RobotId,
        strict: bool,
    ) -> Self {
        Self {
            workflow_id,
            node_id: node_id.into(),
            target: OverrideTarget::SpecificRobot { robot_id, strict },
            active: true,
        }
    }

    pub fn required_capabilities(
        workflow_id: WorkflowId,
        node_id: impl Into<String>,
        capabilities: BTreeSet<Capability>,
    ) -> Self {
        Self {
            workflow_id,
            node_id: node_id.into(),
            target: OverrideTarget::RequiredCapabilities(capabilities),
            active: true,
        }
    }
}

#[cfg(test)]
#[path = "node_override_tests.rs"]
mod tests;
