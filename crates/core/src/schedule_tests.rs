// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::Duration as ChronoDuration;

#[test]
fn record_fire_bumps_run_count_and_sets_next_run() {
    let mut sched = Schedule::new("s1", WorkflowId::new(), Frequency::Hourly);
    let now = Utc::now();
    let next = now + ChronoDuration::hours(1);
    sched.record_fire(now, Some(next));
    assert_eq!(sched.run_count, 1);
    assert_eq!(sched.last_run, Some(now));
    assert_eq!(sched.next_run, Some(next));
    assert!(sched.enabled);
}

#[test]
fn once_schedule_self_disables_after_firing() {
    let mut sched = Schedule::new("s1", WorkflowId::new(), Frequency::Once);
    let now = Utc::now();
    sched.record_fire(now, None);
    assert!(!sched.enabled);
    assert_eq!(sched.next_run, None);
}

#[test]
fn record_success_bumps_success_count_only() {
    let mut sched = Schedule::new("s1", WorkflowId::new(), Frequency::Daily);
    sched.record_success();
    assert_eq!(sched.success_count, 1);
    assert_eq!(sched.run_count, 0);
}

#[test]
fn cron_frequency_displays_as_cron() {
    let freq = Frequency::Cron { expression: "0 9 * * *".into() };
    assert_eq!(freq.to_string(), "cron");
}
