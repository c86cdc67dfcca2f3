// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Robot-originated log lines ingested by the log sink.

use crate::job::JobId;
use crate::robot::RobotId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity of a log line, as reported by the robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

crate::simple_display! {
    LogLevel {
        Trace => "trace",
        Debug => "debug",
        Info => "info",
        Warn => "warn",
        Error => "error",
    }
}

/// A single robot-originated log line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub job_id: Option<JobId>,
    pub robot_id: RobotId,
    pub tenant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
}

/// A batch of log lines sent together (`log_batch` wire message).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogBatch {
    pub robot_id: RobotId,
    pub entries: Vec<LogEntry>,
}

#[cfg(test)]
#[path = "log_entry_tests.rs"]
mod tests;
