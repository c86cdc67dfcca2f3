// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The operator admin protocol listener: one task per connection, each
//! request handled to completion before the next frame is read.

mod mutations;
mod query;

use std::sync::Arc;

use casare_core::{Clock, SystemClock};
use casare_dispatcher::Dispatcher;
use casare_protocol::RobotConnectionHandle;
use casare_queue::JobQueue;
use casare_storage::{AssignmentRepository, JobRepository, RobotRepository, ScheduleRepository, WorkflowRepository};
use casare_wire::{read_message, write_message, AdminRequest, AdminResponse, ProtocolError};
use tokio::net::{UnixListener, UnixStream};
use tracing::{info, warn};

/// Everything an admin request handler needs. Cheap to clone (all `Arc`s).
#[derive(Clone)]
pub struct AdminState {
    pub jobs: Arc<dyn JobRepository>,
    pub robots: Arc<dyn RobotRepository>,
    pub schedules: Arc<dyn ScheduleRepository>,
    pub workflows: Arc<dyn WorkflowRepository>,
    pub assignments: Arc<dyn AssignmentRepository>,
    pub queue: Arc<JobQueue>,
    pub dispatcher: Arc<Dispatcher<RobotConnectionHandle, SystemClock>>,
    pub clock: SystemClock,
}

/// Accept loop for the admin Unix socket. Runs until the listener errors
/// (which on shutdown happens because the task is aborted, not because this
/// returns).
pub async fn serve(listener: UnixListener, state: AdminState) {
    loop {
        match listener.accept().await {
            Ok((stream, _addr)) => {
                let state = state.clone();
                tokio::spawn(async move {
                    if let Err(err) = handle_connection(stream, state).await {
                        warn!(%err, "admin connection ended");
                    }
                });
            }
            Err(err) => {
                warn!(%err, "admin socket accept failed");
                return;
            }
        }
    }
}

async fn handle_connection(mut stream: UnixStream, state: AdminState) -> Result<(), ProtocolError> {
    loop {
        let request: AdminRequest = match read_message(&mut stream).await {
            Ok(request) => request,
            Err(ProtocolError::Io(err)) if is_disconnect(&err) => return Ok(()),
            Err(err) => return Err(err),
        };
        info!(?request, "admin request");
        let response = dispatch(&state, request).await;
        write_message(&mut stream, &response).await?;
    }
}

fn is_disconnect(err: &std::io::Error) -> bool {
    matches!(err.kind(), std::io::ErrorKind::UnexpectedEof | std::io::ErrorKind::ConnectionReset)
}

async fn dispatch(state: &AdminState, request: AdminRequest) -> AdminResponse {
    let result = match request {
        AdminRequest::SubmitJob { .. } => mutations::submit_job(state, request).await,
        AdminRequest::CancelJob { job_id } => mutations::cancel_job(state, job_id).await,
        AdminRequest::GetJob { job_id } => query::get_job(state, job_id).await,
        AdminRequest::ListJobs { status } => query::list_jobs(state, status).await,
        AdminRequest::ListRobots => query::list_robots(state).await,
        AdminRequest::GetRobot { robot_id } => query::get_robot(state, robot_id).await,
        AdminRequest::ListSchedules => query::list_schedules(state).await,
        AdminRequest::CreateSchedule { .. } => mutations::create_schedule(state, request).await,
        AdminRequest::SetScheduleEnabled { schedule_id, enabled } => {
            mutations::set_schedule_enabled(state, schedule_id, enabled).await
        }
        AdminRequest::ListAssignments { workflow_id } => query::list_assignments(state, workflow_id).await,
        AdminRequest::SetAssignment { workflow_id, robot_id, priority, is_default } => {
            mutations::set_assignment(state, workflow_id, robot_id, priority, is_default).await
        }
        AdminRequest::SetOverride { workflow_id, node_id, robot_id, required_capabilities, strict } => {
            mutations::set_override(state, workflow_id, node_id, robot_id, required_capabilities, strict).await
        }
    };
    result.unwrap_or_else(|message| AdminResponse::Error { message })
}

type AdminResult = Result<AdminResponse, String>;
