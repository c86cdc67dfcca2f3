// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::Duration;

fn now() -> DateTime<Utc> {
    Utc::now()
}

#[test]
fn first_fire_succeeds() {
    let mut t = Trigger::new("t", WorkflowId::new(), TriggerKind::Webhook);
    assert!(t.try_fire(now()).is_ok());
    assert!(t.last_fired.is_some());
}

#[test]
fn exceeding_max_events_in_window_returns_cooldown() {
    let mut t = TriggerBuilder::default().max_events_per_window(2).window_seconds(60).build();
    let n = now();
    assert!(t.try_fire(n).is_ok());
    assert!(t.try_fire(n + Duration::seconds(1)).is_ok());
    let err = t.try_fire(n + Duration::seconds(2)).unwrap_err();
    assert!(err.remaining_seconds > 0);
}

#[test]
fn window_resets_after_elapsing() {
    let mut t = TriggerBuilder::default().max_events_per_window(1).window_seconds(60).build();
    let n = now();
    assert!(t.try_fire(n).is_ok());
    assert!(t.try_fire(n + Duration::seconds(30)).is_err());
    assert!(t.try_fire(n + Duration::seconds(61)).is_ok());
}

#[test]
fn cooldown_remaining_is_precise() {
    let mut t = TriggerBuilder::default().max_events_per_window(1).window_seconds(60).build();
    let n = now();
    t.try_fire(n).unwrap();
    let err = t.try_fire(n + Duration::seconds(40)).unwrap_err();
    assert_eq!(err.remaining_seconds, 20);
}
