// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use casare_core::{JobId, JobStatus, RobotId, WorkflowId};
use casare_wire::AdminResponse;

use super::{AdminResult, AdminState};

pub async fn get_job(state: &AdminState, job_id: JobId) -> AdminResult {
    let job = state.jobs.get(job_id).await.map_err(|e| e.to_string())?;
    Ok(AdminResponse::Job { job })
}

pub async fn list_jobs(state: &AdminState, status: Option<JobStatus>) -> AdminResult {
    let jobs = match status {
        Some(status) => state.jobs.by_status(status).await,
        None => state.jobs.list().await,
    }
    .map_err(|e| e.to_string())?;
    Ok(AdminResponse::Jobs { jobs })
}

pub async fn list_robots(state: &AdminState) -> AdminResult {
    let robots = state.robots.list().await.map_err(|e| e.to_string())?;
    Ok(AdminResponse::Robots { robots })
}

pub async fn get_robot(state: &AdminState, robot_id: RobotId) -> AdminResult {
    let robot = state.robots.get(robot_id).await.map_err(|e| e.to_string())?;
    Ok(AdminResponse::Robot { robot })
}

pub async fn list_schedules(state: &AdminState) -> AdminResult {
    let schedules = state.schedules.list().await.map_err(|e| e.to_string())?;
    Ok(AdminResponse::Schedules { schedules })
}

pub async fn list_assignments(state: &AdminState, workflow_id: Option<WorkflowId>) -> AdminResult {
    let assignments = match workflow_id {
        Some(workflow_id) => state.assignments.by_workflow(workflow_id).await,
        None => {
            let mut all = Vec::new();
            for workflow in state.workflows.list().await.map_err(|e| e.to_string())? {
                all.extend(state.assignments.by_workflow(workflow.id).await.map_err(|e| e.to_string())?);
            }
            Ok(all)
        }
    }
    .map_err(|e| e.to_string())?;
    Ok(AdminResponse::Assignments { assignments })
}
