// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use casare_core::{JobBuilder, Priority};
use chrono::Duration;

fn now() -> DateTime<Utc> {
    Utc::now()
}

#[test]
fn priority_ordering_high_before_low() {
    let queue = JobQueue::new();
    let low = JobBuilder::default().priority(Priority::Low).status(JobStatus::Pending).build();
    let high = JobBuilder::default().priority(Priority::High).status(JobStatus::Pending).build();
    queue.enqueue(low, now()).unwrap();
    queue.enqueue(high.clone(), now()).unwrap();
    assert_eq!(queue.pop(now()).unwrap().id, high.id);
}

#[test]
fn fifo_within_same_priority_bucket() {
    let queue = JobQueue::new();
    let first = JobBuilder::default().priority(Priority::Normal).status(JobStatus::Pending).build();
    let second = JobBuilder::default().priority(Priority::Normal).status(JobStatus::Pending).build();
    queue.enqueue(first.clone(), now()).unwrap();
    queue.enqueue(second, now()).unwrap();
    assert_eq!(queue.pop(now()).unwrap().id, first.id);
}

#[test]
fn scheduled_start_in_future_holds_back_even_at_critical() {
    let queue = JobQueue::new();
    let n = now();
    let future = JobBuilder::default()
        .priority(Priority::Critical)
        .status(JobStatus::Pending)
        .scheduled_start(n + Duration::seconds(10))
        .build();
    queue.enqueue(future, n).unwrap();
    assert!(queue.peek(n).is_none());
    assert!(queue.pop(n).is_none());
    assert_eq!(queue.size(), 1);
    assert!(queue.pop(n + Duration::seconds(11)).is_some());
}

#[test]
fn duplicate_idempotency_key_rejected_while_queued() {
    let queue = JobQueue::new();
    let a = JobBuilder::default().status(JobStatus::Pending).idempotency_key("abc").build();
    let b = JobBuilder::default().status(JobStatus::Pending).idempotency_key("abc").build();
    queue.enqueue(a, now()).unwrap();
    let err = queue.enqueue(b, now()).unwrap_err();
    assert!(matches!(err, QueueError::DuplicateIdempotencyKey(key) if key == "abc"));
}

#[test]
fn idempotency_key_freed_after_pop() {
    let queue = JobQueue::new();
    let a = JobBuilder::default().status(JobStatus::Pending).idempotency_key("abc").build();
    queue.enqueue(a, now()).unwrap();
    queue.pop(now()).unwrap();
    let b = JobBuilder::default().status(JobStatus::Pending).idempotency_key("abc").build();
    assert!(queue.enqueue(b, now()).is_ok());
}

#[test]
fn cancel_removes_queued_job_and_marks_cancelled() {
    let queue = JobQueue::new();
    let job = JobBuilder::default().status(JobStatus::Pending).build();
    let id = job.id;
    queue.enqueue(job, now()).unwrap();
    let cancelled = queue.cancel(id, now()).unwrap().unwrap();
    assert_eq!(cancelled.status, JobStatus::Cancelled);
    assert_eq!(queue.size(), 0);
}

#[test]
fn cancel_is_idempotent_no_op_when_already_removed() {
    let queue = JobQueue::new();
    let job = JobBuilder::default().status(JobStatus::Pending).build();
    let id = job.id;
    queue.enqueue(job, now()).unwrap();
    assert!(queue.cancel(id, now()).unwrap().is_some());
    assert!(queue.cancel(id, now()).unwrap().is_none());
}

#[test]
fn cancel_is_a_no_op_for_unknown_job() {
    let queue = JobQueue::new();
    assert!(queue.cancel(casare_core::JobId::new(), now()).unwrap().is_none());
}

#[test]
fn counts_by_priority_reflects_contents() {
    let queue = JobQueue::new();
    queue.enqueue(JobBuilder::default().priority(Priority::Low).status(JobStatus::Pending).build(), now()).unwrap();
    queue.enqueue(JobBuilder::default().priority(Priority::Low).status(JobStatus::Pending).build(), now()).unwrap();
    queue.enqueue(JobBuilder::default().priority(Priority::High).status(JobStatus::Pending).build(), now()).unwrap();
    let counts = queue.counts_by_priority();
    assert_eq!(counts.get(&Priority::Low), Some(&2));
    assert_eq!(counts.get(&Priority::High), Some(&1));
}
