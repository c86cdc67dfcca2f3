// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job event handlers.

use super::MaterializedState;
use crate::event::StorageEvent;

pub(crate) fn apply(state: &mut MaterializedState, event: &StorageEvent) {
    match event {
        StorageEvent::JobPut { job } => {
            state.jobs.insert(job.id, (**job).clone());
        }
        StorageEvent::JobDeleted { job_id } => {
            state.jobs.remove(job_id);
        }
        _ => {}
    }
}
