// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::Utc;

#[test]
fn new_robot_starts_offline_with_no_jobs() {
    let robot = Robot::new(RobotId::new(), "r1", 2);
    assert_eq!(robot.status, RobotStatus::Offline);
    assert!(robot.current_jobs().is_empty());
}

#[test]
fn heartbeat_brings_offline_robot_online() {
    let mut robot = Robot::new(RobotId::new(), "r1", 2);
    robot.heartbeat(Utc::now());
    assert_eq!(robot.status, RobotStatus::Online);
    assert!(robot.last_heartbeat.is_some());
}

#[test]
fn assign_job_requires_online() {
    let mut robot = Robot::new(RobotId::new(), "r1", 2);
    let err = robot.assign_job(JobId::new()).unwrap_err();
    assert!(matches!(err, DomainError::InvalidTransition { .. }));
}

#[test]
fn assign_job_rejects_duplicate() {
    let mut robot = Robot::builder().max_concurrent_jobs(2).build();
    let job = JobId::new();
    robot.assign_job(job).unwrap();
    let err = robot.assign_job(job).unwrap_err();
    assert!(matches!(err, DomainError::DuplicateAssignment { .. }));
}

#[test]
fn assign_job_at_capacity_fails() {
    let mut robot = Robot::builder().max_concurrent_jobs(1).build();
    robot.assign_job(JobId::new()).unwrap();
    let err = robot.assign_job(JobId::new()).unwrap_err();
    assert!(matches!(err, DomainError::AtCapacity { .. }));
}

#[test]
fn assign_job_flips_to_busy_when_full() {
    let mut robot = Robot::builder().max_concurrent_jobs(1).build();
    robot.assign_job(JobId::new()).unwrap();
    assert_eq!(robot.status, RobotStatus::Busy);
}

#[test]
fn complete_job_releases_capacity_and_returns_online() {
    let mut robot = Robot::builder().max_concurrent_jobs(1).build();
    let job = JobId::new();
    robot.assign_job(job).unwrap();
    assert_eq!(robot.status, RobotStatus::Busy);
    robot.complete_job(job).unwrap();
    assert_eq!(robot.status, RobotStatus::Online);
    assert!(robot.current_jobs().is_empty());
}

#[test]
fn complete_job_unknown_job_is_not_found() {
    let mut robot = Robot::builder().build();
    let err = robot.complete_job(JobId::new()).unwrap_err();
    assert!(matches!(err, DomainError::NotFound { .. }));
}

#[test]
fn has_capabilities_is_subset_check() {
    let mut robot = Robot::new(RobotId::new(), "r1", 2);
    robot.capabilities.insert(Capability::Browser);
    robot.capabilities.insert(Capability::Gpu);
    let mut required = BTreeSet::new();
    required.insert(Capability::Browser);
    assert!(robot.has_capabilities(&required));
    required.insert(Capability::Desktop);
    assert!(!robot.has_capabilities(&required));
}

#[test]
fn utilization_at_zero_capacity_is_saturated() {
    let robot = Robot::new(RobotId::new(), "r1", 0);
    assert_eq!(robot.utilization(), 1.0);
    assert!(!robot.has_capacity());
}

#[test]
fn utilization_reflects_current_load() {
    let mut robot = Robot::builder().max_concurrent_jobs(2).build();
    assert_eq!(robot.utilization(), 0.0);
    robot.assign_job(JobId::new()).unwrap();
    assert_eq!(robot.utilization(), 0.5);
}
