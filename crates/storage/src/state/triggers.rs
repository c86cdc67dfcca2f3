// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Trigger event handlers.

use super::MaterializedState;
use crate::event::StorageEvent;

pub(crate) fn apply(state: &mut MaterializedState, event: &StorageEvent) {
    match event {
        StorageEvent::TriggerPut { trigger } => {
            state.triggers.insert(trigger.id, (**trigger).clone());
        }
        StorageEvent::TriggerDeleted { trigger_id } => {
            state.triggers.remove(trigger_id);
        }
        _ => {}
    }
}
