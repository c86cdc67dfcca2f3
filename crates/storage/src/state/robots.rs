// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Robot event handlers.

use super::MaterializedState;
use crate::event::StorageEvent;

pub(crate) fn apply(state: &mut MaterializedState, event: &StorageEvent) {
    match event {
        StorageEvent::RobotPut { robot } => {
            state.robots.insert(robot.id, (**robot).clone());
        }
        StorageEvent::RobotDeleted { robot_id } => {
            state.robots.remove(robot_id);
        }
        _ => {}
    }
}
