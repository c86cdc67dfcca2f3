// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! RobotAssignment and NodeRobotOverride event handlers.
//!
//! Both are immutable value objects keyed by a composite (not a single id),
//! so they're stored as flat, deduplicated vectors rather than maps.

use super::MaterializedState;
use crate::event::StorageEvent;

pub(crate) fn apply(state: &mut MaterializedState, event: &StorageEvent) {
    match event {
        StorageEvent::AssignmentPut { assignment } => {
            state
                .assignments
                .retain(|a| !(a.workflow_id == assignment.workflow_id && a.robot_id == assignment.robot_id));
            state.assignments.push((**assignment).clone());
        }
        StorageEvent::AssignmentDeleted { workflow_id, robot_id } => {
            state.assignments.retain(|a| !(a.workflow_id == *workflow_id && a.robot_id == *robot_id));
        }
        StorageEvent::OverridePut { override_ } => {
            state
                .overrides
                .retain(|o| !(o.workflow_id == override_.workflow_id && o.node_id == override_.node_id));
            state.overrides.push((**override_).clone());
        }
        StorageEvent::OverrideDeleted { workflow_id, node_id } => {
            state.overrides.retain(|o| !(o.workflow_id == *workflow_id && &o.node_id == node_id));
        }
        _ => {}
    }
}
