// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::Utc;

#[test]
fn new_assignment_respects_is_default_with_zero_priority() {
    let a = RobotAssignment::new(WorkflowId::new(), RobotId::new(), true, Utc::now());
    assert!(a.is_default);
    assert_eq!(a.priority, 0);

    let b = RobotAssignment::new(WorkflowId::new(), RobotId::new(), false, Utc::now());
    assert!(!b.is_default);
}
