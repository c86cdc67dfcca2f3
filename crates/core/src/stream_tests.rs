// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn fleet_event_round_trips_through_json() {
    let ev = FleetEvent::JobTransitioned {
        job_id: JobId::new(),
        from: JobStatus::Queued,
        to: JobStatus::Running,
    };
    let json = serde_json::to_string(&ev).unwrap();
    let back: FleetEvent = serde_json::from_str(&json).unwrap();
    assert_eq!(ev, back);
}

#[test]
fn fleet_event_tag_is_snake_case_type() {
    let ev = FleetEvent::RobotHeartbeat { robot_id: RobotId::new() };
    let json = serde_json::to_value(&ev).unwrap();
    assert_eq!(json["type"], "robot_heartbeat");
}
