// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::clock::FakeClock;

fn clock() -> FakeClock {
    let c = FakeClock::new();
    c.set_epoch_ms(1_700_000_000_000);
    c
}

#[test]
fn new_job_starts_pending_with_zero_progress() {
    let job = Job::new(JobConfig::new(WorkflowId::new(), vec![]), &clock());
    assert_eq!(job.status, JobStatus::Pending);
    assert_eq!(job.progress, 0);
    assert!(!job.is_terminal());
}

#[test]
fn legal_happy_path_transitions() {
    let clk = clock();
    let mut job = Job::new(JobConfig::new(WorkflowId::new(), vec![]), &clk);
    let now = clk.utc_now();
    job.transition_to(JobStatus::Queued, now).unwrap();
    job.transition_to(JobStatus::Running, now).unwrap();
    assert!(job.started_at.is_some());
    job.transition_to(JobStatus::Completed, now).unwrap();
    assert!(job.completed_at.is_some());
    assert!(job.is_terminal());
}

#[test]
fn pending_can_cancel_directly() {
    let clk = clock();
    let mut job = Job::new(JobConfig::new(WorkflowId::new(), vec![]), &clk);
    job.transition_to(JobStatus::Cancelled, clk.utc_now()).unwrap();
    assert_eq!(job.status, JobStatus::Cancelled);
}

#[test]
fn terminal_status_never_transitions_again() {
    let clk = clock();
    let mut job = Job::new(JobConfig::new(WorkflowId::new(), vec![]), &clk);
    job.transition_to(JobStatus::Cancelled, clk.utc_now()).unwrap();
    let err = job.transition_to(JobStatus::Queued, clk.utc_now()).unwrap_err();
    assert!(matches!(err, DomainError::InvalidTransition { .. }));
}

#[test]
fn illegal_skip_is_rejected() {
    let clk = clock();
    let mut job = Job::new(JobConfig::new(WorkflowId::new(), vec![]), &clk);
    let err = job.transition_to(JobStatus::Running, clk.utc_now()).unwrap_err();
    assert!(matches!(err, DomainError::InvalidTransition { .. }));
    assert_eq!(job.status, JobStatus::Pending);
}

#[test]
fn progress_out_of_range_rejected() {
    let clk = clock();
    let mut job = Job::new(JobConfig::new(WorkflowId::new(), vec![]), &clk);
    job.transition_to(JobStatus::Queued, clk.utc_now()).unwrap();
    job.transition_to(JobStatus::Running, clk.utc_now()).unwrap();
    let err = job.record_progress(101, None).unwrap_err();
    assert!(matches!(err, DomainError::InvariantViolation(_)));
}

#[test]
fn record_progress_updates_current_node_only_when_present() {
    let clk = clock();
    let mut job = Job::new(JobConfig::new(WorkflowId::new(), vec![]), &clk);
    job.transition_to(JobStatus::Queued, clk.utc_now()).unwrap();
    job.transition_to(JobStatus::Running, clk.utc_now()).unwrap();
    job.record_progress(50, Some("node-a".into())).unwrap();
    assert_eq!(job.progress, 50);
    assert_eq!(job.current_node.as_deref(), Some("node-a"));
    job.record_progress(60, None).unwrap();
    assert_eq!(job.current_node.as_deref(), Some("node-a"));
}

#[test]
fn mark_completed_sets_progress_to_100() {
    let clk = clock();
    let mut job = Job::new(JobConfig::new(WorkflowId::new(), vec![]), &clk);
    job.transition_to(JobStatus::Queued, clk.utc_now()).unwrap();
    job.transition_to(JobStatus::Running, clk.utc_now()).unwrap();
    let mut result = HashMap::new();
    result.insert("rows".to_string(), serde_json::json!(42));
    job.mark_completed(result, clk.utc_now()).unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.progress, 100);
    assert_eq!(job.result.get("rows"), Some(&serde_json::json!(42)));
}

#[test]
fn mark_failed_records_error_payload() {
    let clk = clock();
    let mut job = Job::new(JobConfig::new(WorkflowId::new(), vec![]), &clk);
    job.transition_to(JobStatus::Queued, clk.utc_now()).unwrap();
    job.transition_to(JobStatus::Running, clk.utc_now()).unwrap();
    job.mark_failed(
        JobError { message: "boom".into(), error_type: "RuntimeError".into(), failed_node: Some("n1".into()) },
        clk.utc_now(),
    )
    .unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error.unwrap().message, "boom");
}

#[test]
fn priority_ordering_matches_spec() {
    assert!(Priority::Low < Priority::Normal);
    assert!(Priority::Normal < Priority::High);
    assert!(Priority::High < Priority::Critical);
}

#[test]
fn builder_produces_sane_default_job() {
    let job = Job::builder().build();
    assert_eq!(job.status, JobStatus::Pending);
    assert_eq!(job.priority, Priority::Normal);
}

#[test]
fn requeue_rolls_back_a_running_job_without_touching_started_at() {
    let clk = clock();
    let mut job = Job::new(JobConfig::new(WorkflowId::new(), vec![]), &clk);
    job.transition_to(JobStatus::Queued, clk.utc_now()).unwrap();
    job.transition_to(JobStatus::Running, clk.utc_now()).unwrap();
    job.assigned_robot_id = Some(RobotId::new());
    let started_at = job.started_at;

    job.requeue(clk.utc_now()).unwrap();
    assert_eq!(job.status, JobStatus::Queued);
    assert!(job.assigned_robot_id.is_none());

    job.transition_to(JobStatus::Running, clk.utc_now()).unwrap();
    assert_eq!(job.started_at, started_at, "re-entering Running must not reset started_at");
}

#[test]
fn reject_counter_increments_and_resets() {
    let clk = clock();
    let mut job = Job::new(JobConfig::new(WorkflowId::new(), vec![]), &clk);
    job.record_reject();
    job.record_reject();
    assert_eq!(job.consecutive_rejects, 2);
    job.reset_rejects();
    assert_eq!(job.consecutive_rejects, 0);
}
