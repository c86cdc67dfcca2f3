// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn specific_robot_override_is_active_by_default() {
    let ov = NodeRobotOverride::specific_robot(WorkflowId::new(), "node-1", RobotId::new(), true);
    assert!(ov.active);
    assert!(matches!(ov.target, OverrideTarget::SpecificRobot { strict: true, .. }));
}

#[test]
fn required_capabilities_override_holds_set() {
    let mut caps = BTreeSet::new();
    caps.insert(Capability::Gpu);
    let ov = NodeRobotOverride::required_capabilities(WorkflowId::new(), "node-2", caps.clone());
    match ov.target {
        OverrideTarget::RequiredCapabilities(set) => assert_eq!(set, caps),
        _ => panic!("expected RequiredCapabilities"),
    }
}
