// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use casare_core::{Capability, Job, JobBuilder, NodeRobotOverride, RobotBuilder, RobotStatus};
use yare::parameterized;

fn job_for(workflow_id: casare_core::WorkflowId) -> Job {
    JobBuilder::default().workflow_id(workflow_id).build()
}

#[test]
fn picks_the_only_eligible_robot() {
    let wf = casare_core::WorkflowId::new();
    let job = job_for(wf);
    let robot = RobotBuilder::default().max_concurrent_jobs(2).status(RobotStatus::Online).build();
    let req = SelectionRequest { job: &job, node_id: None, robots: &[robot.clone()], assignments: &[], overrides: &[] };
    assert_eq!(select_robot(&req).unwrap(), robot.id);
}

#[test]
fn no_available_robot_when_fleet_empty() {
    let wf = casare_core::WorkflowId::new();
    let job = job_for(wf);
    let req = SelectionRequest { job: &job, node_id: None, robots: &[], assignments: &[], overrides: &[] };
    assert!(matches!(select_robot(&req), Err(SelectionError::NoAvailableRobot { .. })));
}

#[test]
fn excludes_robots_at_capacity() {
    let wf = casare_core::WorkflowId::new();
    let job = job_for(wf);
    let mut full = RobotBuilder::default().max_concurrent_jobs(1).status(RobotStatus::Online).build();
    full.assign_job(casare_core::JobId::new()).unwrap();
    let free = RobotBuilder::default().max_concurrent_jobs(1).status(RobotStatus::Online).build();
    let req = SelectionRequest {
        job: &job,
        node_id: None,
        robots: &[full, free.clone()],
        assignments: &[],
        overrides: &[],
    };
    assert_eq!(select_robot(&req).unwrap(), free.id);
}

#[test]
fn excludes_offline_robots() {
    let wf = casare_core::WorkflowId::new();
    let job = job_for(wf);
    let offline = RobotBuilder::default().status(RobotStatus::Offline).build();
    let req = SelectionRequest { job: &job, node_id: None, robots: &[offline], assignments: &[], overrides: &[] };
    assert!(matches!(select_robot(&req), Err(SelectionError::NoAvailableRobot { .. })));
}

#[test]
fn workflow_default_assignment_wins_over_scoring() {
    let wf = casare_core::WorkflowId::new();
    let job = job_for(wf);
    let default_robot = RobotBuilder::default().status(RobotStatus::Online).max_concurrent_jobs(5).build();
    let other = RobotBuilder::default().status(RobotStatus::Online).max_concurrent_jobs(5).build();
    let assignment = RobotAssignment::new(wf, default_robot.id, true, chrono::Utc::now());
    let req = SelectionRequest {
        job: &job,
        node_id: None,
        robots: &[other, default_robot.clone()],
        assignments: &[assignment],
        overrides: &[],
    };
    assert_eq!(select_robot(&req).unwrap(), default_robot.id);
}

#[test]
fn strict_node_override_fails_when_robot_unavailable() {
    let wf = casare_core::WorkflowId::new();
    let job = job_for(wf);
    let missing_robot_id = casare_core::RobotId::new();
    let over = NodeRobotOverride::specific_robot(wf, "node-1", missing_robot_id, true);
    let robot = RobotBuilder::default().status(RobotStatus::Online).build();
    let req = SelectionRequest {
        job: &job,
        node_id: Some("node-1"),
        robots: &[robot],
        assignments: &[],
        overrides: &[over],
    };
    assert!(matches!(select_robot(&req), Err(SelectionError::OverrideRobotUnavailable { .. })));
}

#[test]
fn non_strict_node_override_falls_through_when_unavailable() {
    let wf = casare_core::WorkflowId::new();
    let job = job_for(wf);
    let missing_robot_id = casare_core::RobotId::new();
    let over = NodeRobotOverride::specific_robot(wf, "node-1", missing_robot_id, false);
    let robot = RobotBuilder::default().status(RobotStatus::Online).build();
    let req = SelectionRequest {
        job: &job,
        node_id: Some("node-1"),
        robots: &[robot.clone()],
        assignments: &[],
        overrides: &[over],
    };
    assert_eq!(select_robot(&req).unwrap(), robot.id);
}

#[test]
fn node_override_capability_filter_narrows_candidates() {
    let wf = casare_core::WorkflowId::new();
    let job = job_for(wf);
    let mut caps = std::collections::BTreeSet::new();
    caps.insert(Capability::Gpu);
    let over = NodeRobotOverride::required_capabilities(wf, "node-1", caps);
    let no_gpu = RobotBuilder::default().status(RobotStatus::Online).build();
    let mut gpu = RobotBuilder::default().status(RobotStatus::Online).build();
    gpu.capabilities.insert(Capability::Gpu);
    let req = SelectionRequest {
        job: &job,
        node_id: Some("node-1"),
        robots: &[no_gpu, gpu.clone()],
        assignments: &[],
        overrides: &[over],
    };
    assert_eq!(select_robot(&req).unwrap(), gpu.id);
}

#[test]
fn tenant_mismatch_excludes_robot() {
    let wf = casare_core::WorkflowId::new();
    let job = JobBuilder::default().workflow_id(wf).tenant_id("tenant-a").build();
    let wrong_tenant = RobotBuilder::default().status(RobotStatus::Online).tenant_id("tenant-b").build();
    let right_tenant = RobotBuilder::default().status(RobotStatus::Online).tenant_id("tenant-a").build();
    let req = SelectionRequest {
        job: &job,
        node_id: None,
        robots: &[wrong_tenant, right_tenant.clone()],
        assignments: &[],
        overrides: &[],
    };
    assert_eq!(select_robot(&req).unwrap(), right_tenant.id);
}

#[test]
fn is_deterministic_for_identical_inputs() {
    let wf = casare_core::WorkflowId::new();
    let job = job_for(wf);
    let a = RobotBuilder::default().status(RobotStatus::Online).build();
    let b = RobotBuilder::default().status(RobotStatus::Online).build();
    let robots = vec![a, b];
    let req = SelectionRequest { job: &job, node_id: None, robots: &robots, assignments: &[], overrides: &[] };
    let first = select_robot(&req).unwrap();
    let second = select_robot(&req).unwrap();
    assert_eq!(first, second);
}

#[parameterized(
    zero_percent = { 0, 3 },
    half = { 1, 2 },
    full = { 2, 2 },
)]
fn prefers_lower_utilization(current: u32, max: u32) {
    let wf = casare_core::WorkflowId::new();
    let job = job_for(wf);
    let mut busy = RobotBuilder::default().status(RobotStatus::Online).max_concurrent_jobs(max).build();
    for _ in 0..current.min(max.saturating_sub(1)) {
        busy.assign_job(casare_core::JobId::new()).unwrap();
    }
    let idle = RobotBuilder::default().status(RobotStatus::Online).max_concurrent_jobs(max).build();
    if busy.has_capacity() && idle.utilization() <= busy.utilization() {
        // Equal utilization: either may win, just confirm it doesn't panic.
        let req = SelectionRequest { job: &job, node_id: None, robots: &[busy, idle], assignments: &[], overrides: &[] };
        select_robot(&req).unwrap();
    } else {
        let req = SelectionRequest { job: &job, node_id: None, robots: &[busy, idle.clone()], assignments: &[], overrides: &[] };
        assert_eq!(select_robot(&req).unwrap(), idle.id);
    }
}
