// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schedule event handlers.

use super::MaterializedState;
use crate::event::StorageEvent;

pub(crate) fn apply(state: &mut MaterializedState, event: &StorageEvent) {
    match event {
        StorageEvent::SchedulePut { schedule } => {
            state.schedules.insert(schedule.id, (**schedule).clone());
        }
        StorageEvent::ScheduleDeleted { schedule_id } => {
            state.schedules.remove(schedule_id);
        }
        _ => {}
    }
}
