// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! An external-event rule that materializes Jobs on a received signal
//! (webhook, file change, external event source).

use crate::workflow::WorkflowId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a trigger.
    pub struct TriggerId("trg-");
}

/// The input surface a trigger listens on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TriggerKind {
    /// `POST /webhook/{trigger_id}`, validated by the shared secret header.
    Webhook,
    /// A watched path on the orchestrator host's filesystem.
    FileWatch { path: String },
    /// An opaque external event source name (e.g. a message queue topic).
    External { source: String },
}

crate::simple_display! {
    TriggerKind {
        Webhook => "webhook",
        FileWatch(..) => "file_watch",
        External(..) => "external",
    }
}

/// A cooldown window was exceeded: at most `max_events` per `window_seconds`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CooldownActive {
    pub remaining_seconds: u64,
}

/// An event-based rule that materializes Jobs on a received signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    pub id: TriggerId,
    pub name: String,
    pub workflow_id: WorkflowId,
    pub kind: TriggerKind,
    pub enabled: bool,
    /// Rate limiter window length in seconds.
    pub window_seconds: u64,
    /// At most this many fires are accepted per window.
    pub max_events_per_window: u32,
    #[serde(default)]
    pub tenant_id: Option<String>,
    window_started_at: Option<DateTime<Utc>>,
    events_in_window: u32,
    pub last_fired: Option<DateTime<Utc>>,
}

impl Trigger {
    pub fn new(name: impl Into<String>, workflow_id: WorkflowId, kind: TriggerKind) -> Self {
        Self {
            id: TriggerId::new(),
            name: name.into(),
            workflow_id,
            kind,
            enabled: true,
            window_seconds: 60,
            max_events_per_window: 10,
            tenant_id: None,
            window_started_at: None,
            events_in_window: 0,
            last_fired: None,
        }
    }

    /// Attempt to fire the trigger at `now`. Advances (or resets) the rate
    /// limiter window and records the fire on success.
    pub fn try_fire(&mut self, now: DateTime<Utc>) -> Result<(), CooldownActive> {
        let window_elapsed = self
            .window_started_at
            .map(|start| (now - start).num_seconds())
            .unwrap_or(i64::MAX);

        if window_elapsed >= self.window_seconds as i64 {
            self.window_started_at = Some(now);
            self.events_in_window = 0;
        }

        if self.events_in_window >= self.max_events_per_window {
            let remaining = self.window_seconds as i64 - window_elapsed.max(0);
            return Err(CooldownActive { remaining_seconds: remaining.max(0) as u64 });
        }

        self.events_in_window += 1;
        self.last_fired = Some(now);
        Ok(())
    }
}

crate::builder! {
    pub struct TriggerBuilder => Trigger {
        into {
            name: String = "test-trigger",
        }
        set {
            id: TriggerId = TriggerId::new(),
            workflow_id: WorkflowId = WorkflowId::new(),
            kind: TriggerKind = TriggerKind::Webhook,
            enabled: bool = true,
            window_seconds: u64 = 60,
            max_events_per_window: u32 = 10,
            events_in_window: u32 = 0,
        }
        option {
            tenant_id: String = None,
            window_started_at: DateTime<Utc> = None,
            last_fired: DateTime<Utc> = None,
        }
    }
}

#[cfg(test)]
#[path = "trigger_tests.rs"]
mod tests;
