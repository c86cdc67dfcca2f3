// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The robot protocol message catalogue.

use std::collections::HashMap;

use casare_core::{JobId, Priority, RobotId};
use serde::{Deserialize, Serialize};

/// Error codes carried in `error` frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidJson,
    InvalidMessage,
    InvalidPayload,
    AuthenticationFailed,
    NotFound,
    RateLimited,
    HandlerError,
    Timeout,
}

/// Every message type exchanged between robot and orchestrator.
///
/// Tagged by `type` in `lower_snake_case`.
/// Direction is documented per-variant; the orchestrator and robot share one
/// enum because a handler on either side just pattern-matches the subset it
/// expects and ignores the rest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum RobotMessage {
    /// R -> O: announce presence and capabilities.
    Register {
        robot_id: RobotId,
        name: String,
        environment: String,
        max_concurrent_jobs: u32,
        tags: Vec<String>,
        capabilities: Vec<String>,
        #[serde(default)]
        tenant_id: Option<String>,
    },
    /// O -> R: accept or reject a registration.
    RegisterAck {
        robot_id: RobotId,
        success: bool,
        message: String,
        #[serde(default)]
        config: HashMap<String, serde_json::Value>,
    },
    /// R -> O: liveness + load report.
    Heartbeat {
        robot_id: RobotId,
        status: String,
        current_jobs: u32,
        #[serde(default)]
        cpu_percent: Option<f32>,
        #[serde(default)]
        mem_percent: Option<f32>,
        #[serde(default)]
        disk_percent: Option<f32>,
        active_job_ids: Vec<JobId>,
    },
    /// O -> R: heartbeat accepted.
    HeartbeatAck { robot_id: RobotId },
    /// R -> O: robot is closing the connection.
    Disconnect { robot_id: RobotId, reason: String },
    /// O -> R: assign a job for execution.
    JobAssign {
        job_id: JobId,
        workflow_id: casare_core::WorkflowId,
        workflow_name: String,
        /// Opaque serialized workflow definition; never interpreted here.
        workflow_json: Vec<u8>,
        priority: Priority,
        timeout_seconds: u64,
        parameters: HashMap<String, serde_json::Value>,
    },
    /// R -> O: robot accepts the assignment.
    JobAccept { job_id: JobId, robot_id: RobotId },
    /// R -> O: robot declines the assignment.
    JobReject { job_id: JobId, robot_id: RobotId, reason: String },
    /// R -> O: incremental progress; no status change.
    JobProgress {
        job_id: JobId,
        progress: u8,
        #[serde(default)]
        current_node: Option<String>,
        #[serde(default)]
        message: Option<String>,
    },
    /// R -> O: job finished successfully.
    JobComplete {
        job_id: JobId,
        robot_id: RobotId,
        result: HashMap<String, serde_json::Value>,
        duration_ms: u64,
    },
    /// R -> O: job finished with an error.
    JobFailed {
        job_id: JobId,
        robot_id: RobotId,
        error_message: String,
        error_type: String,
        #[serde(default)]
        stack_trace: Option<String>,
        #[serde(default)]
        failed_node: Option<String>,
    },
    /// O -> R: request cancellation of a running job.
    JobCancel { job_id: JobId, reason: String },
    /// R -> O: cancellation acknowledged.
    JobCancelled { job_id: JobId, robot_id: RobotId },
    /// R -> O: a single log line.
    LogEntry {
        job_id: Option<JobId>,
        robot_id: RobotId,
        level: String,
        message: String,
        #[serde(default)]
        node_id: Option<String>,
        #[serde(default)]
        extra: HashMap<String, serde_json::Value>,
    },
    /// R -> O: a batch of log lines.
    LogBatch {
        robot_id: RobotId,
        entries: Vec<casare_core::LogEntry>,
    },
    /// O -> R: suspend picking up new work.
    Pause { robot_id: RobotId },
    /// O -> R: resume picking up new work.
    Resume { robot_id: RobotId },
    /// O -> R: request the robot shut down.
    Shutdown { robot_id: RobotId, graceful: bool },
    /// O -> R / R -> O: request current status.
    StatusRequest { robot_id: RobotId },
    /// R -> O: status reply.
    StatusResponse {
        robot_id: RobotId,
        status: String,
        current_jobs: u32,
        active_job_ids: Vec<JobId>,
        uptime_seconds: u64,
        #[serde(default)]
        system_info: HashMap<String, serde_json::Value>,
    },
    /// Either direction: protocol-level error.
    Error {
        error_code: ErrorCode,
        error_message: String,
        #[serde(default)]
        details: HashMap<String, serde_json::Value>,
    },
}

impl RobotMessage {
    /// The `type` discriminant as it appears on the wire, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Register { .. } => "register",
            Self::RegisterAck { .. } => "register_ack",
            Self::Heartbeat { .. } => "heartbeat",
            Self::HeartbeatAck { .. } => "heartbeat_ack",
            Self::Disconnect { .. } => "disconnect",
            Self::JobAssign { .. } => "job_assign",
            Self::JobAccept { .. } => "job_accept",
            Self::JobReject { .. } => "job_reject",
            Self::JobProgress { .. } => "job_progress",
            Self::JobComplete { .. } => "job_complete",
            Self::JobFailed { .. } => "job_failed",
            Self::JobCancel { .. } => "job_cancel",
            Self::JobCancelled { .. } => "job_cancelled",
            Self::LogEntry { .. } => "log_entry",
            Self::LogBatch { .. } => "log_batch",
            Self::Pause { .. } => "pause",
            Self::Resume { .. } => "resume",
            Self::Shutdown { .. } => "shutdown",
            Self::StatusRequest { .. } => "status_request",
            Self::StatusResponse { .. } => "status_response",
            Self::Error { .. } => "error",
        }
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
