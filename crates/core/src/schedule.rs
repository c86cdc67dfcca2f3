// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A repeating or one-shot rule that materializes Jobs on a time basis.

use crate::job::Priority;
use crate::robot::RobotId;
use crate::workflow::WorkflowId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a schedule.
    pub struct ScheduleId("sch-");
}

/// How often a schedule fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Frequency {
    Once,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    /// Standard 5-field cron expression (`min hour day-of-month month day-of-week`).
    Cron { expression: String },
}

crate::simple_display! {
    Frequency {
        Once => "once",
        Hourly => "hourly",
        Daily => "daily",
        Weekly => "weekly",
        Monthly => "monthly",
        Cron(..) => "cron",
    }
}

/// A time-based rule that periodically materializes Jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub id: ScheduleId,
    pub name: String,
    pub workflow_id: WorkflowId,
    pub fixed_robot_id: Option<RobotId>,
    pub priority: Priority,
    pub frequency: Frequency,
    pub timezone: String,
    pub enabled: bool,
    pub run_count: u64,
    pub success_count: u64,
    pub last_run: Option<DateTime<Utc>>,
    pub next_run: Option<DateTime<Utc>>,
}

impl Schedule {
    pub fn new(name: impl Into<String>, workflow_id: WorkflowId, frequency: Frequency) -> Self {
        Self {
            id: ScheduleId::new(),
            name: name.into(),
            workflow_id,
            fixed_robot_id: None,
            priority: Priority::Normal,
            frequency,
            timezone: "UTC".to_string(),
            enabled: true,
            run_count: 0,
            success_count: 0,
            last_run: None,
            next_run: None,
        }
    }

    /// Record that the schedule fired at `fired_at`, bumping counters and
    /// installing `next_run`. `Once` schedules self-disable after firing.
    pub fn record_fire(&mut self, fired_at: DateTime<Utc>, next_run: Option<DateTime<Utc>>) {
        self.last_run = Some(fired_at);
        self.run_count += 1;
        if matches!(self.frequency, Frequency::Once) {
            self.enabled = false;
            self.next_run = None;
        } else {
            self.next_run = next_run;
        }
    }

    pub fn record_success(&mut self) {
        self.success_count += 1;
    }
}

crate::builder! {
    pub struct ScheduleBuilder => Schedule {
        into {
            name: String = "test-schedule",
            timezone: String = "UTC",
        }
        set {
            id: ScheduleId = ScheduleId::new(),
            workflow_id: WorkflowId = WorkflowId::new(),
            priority: Priority = Priority::Normal,
            frequency: Frequency = Frequency::Hourly,
            enabled: bool = true,
            run_count: u64 = 0,
            success_count: u64 = 0,
        }
        option {
            fixed_robot_id: RobotId = None,
            last_run: DateTime<Utc> = None,
            next_run: DateTime<Utc> = None,
        }
    }
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
