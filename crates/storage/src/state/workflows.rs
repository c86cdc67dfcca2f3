// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow event handlers.

use super::MaterializedState;
use crate::event::StorageEvent;

pub(crate) fn apply(state: &mut MaterializedState, event: &StorageEvent) {
    match event {
        StorageEvent::WorkflowPut { workflow } => {
            state.workflows.insert(workflow.id, (**workflow).clone());
        }
        StorageEvent::WorkflowDeleted { workflow_id } => {
            state.workflows.remove(workflow_id);
        }
        _ => {}
    }
}
