// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Change-stream event types published by the Registry, Job Queue, Dispatcher,
//! and Scheduler for operator-UI consumption.
//!
//! This module only defines the event payloads. The broadcast channel itself
//! is wired up by the daemon binary, which is the layer that already depends
//! on an async runtime; this crate stays synchronous and dependency-light.

use crate::job::{JobId, JobStatus};
use crate::robot::{RobotId, RobotStatus};
use crate::schedule::ScheduleId;
use crate::trigger::TriggerId;
use serde::{Deserialize, Serialize};

/// A fact about fleet or job state that changed, for UI/observer consumption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FleetEvent {
    JobTransitioned { job_id: JobId, from: JobStatus, to: JobStatus },
    JobProgress { job_id: JobId, progress: u8 },
    RobotTransitioned { robot_id: RobotId, from: RobotStatus, to: RobotStatus },
    RobotHeartbeat { robot_id: RobotId },
    ScheduleFired { schedule_id: ScheduleId, job_id: JobId },
    TriggerFired { trigger_id: TriggerId, job_id: JobId },
    SelectionFailed { job_id: JobId },
}

#[cfg(test)]
#[path = "stream_tests.rs"]
mod tests;
