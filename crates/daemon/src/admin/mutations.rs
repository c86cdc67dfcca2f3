// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::BTreeSet;

use casare_core::{Clock, Job, JobConfig, JobId, JobStatus, NodeRobotOverride, RobotAssignment, RobotId, Schedule, ScheduleId, WorkflowId};
use casare_wire::{AdminRequest, AdminResponse};

use super::{AdminResult, AdminState};

pub async fn submit_job(state: &AdminState, request: AdminRequest) -> AdminResult {
    let AdminRequest::SubmitJob { workflow_id, priority, target_robot_id, scheduled_start, idempotency_key, parameters, tenant_id } =
        request
    else {
        unreachable!("dispatch only calls submit_job for SubmitJob");
    };

    let workflow = state.workflows.get(workflow_id).await.map_err(|e| e.to_string())?;
    let workflow = workflow.ok_or_else(|| format!("workflow {workflow_id} not found"))?;
    if !workflow.is_executable() {
        return Err(format!("workflow {workflow_id} is not published"));
    }

    let now = state.clock.utc_now();
    let mut config = JobConfig::new(workflow_id, workflow.definition.clone());
    config.priority = priority;
    config.target_robot_id = target_robot_id;
    config.scheduled_start = scheduled_start;
    config.idempotency_key = idempotency_key;
    config.parameters = parameters;
    config.tenant_id = tenant_id;

    let mut job = Job::new(config, &state.clock);
    job.transition_to(JobStatus::Queued, now).map_err(|e| e.to_string())?;
    state.jobs.save(&job).await.map_err(|e| e.to_string())?;
    let job_id = job.id;
    state.queue.enqueue(job, now).map_err(|e| e.to_string())?;

    Ok(AdminResponse::JobSubmitted { job_id })
}

pub async fn cancel_job(state: &AdminState, job_id: JobId) -> AdminResult {
    state.dispatcher.cancel(job_id, "cancelled by operator").await.map_err(|e| e.to_string())?;
    Ok(AdminResponse::Ok)
}

pub async fn create_schedule(state: &AdminState, request: AdminRequest) -> AdminResult {
    let AdminRequest::CreateSchedule { name, workflow_id, frequency, fixed_robot_id, priority } = request else {
        unreachable!("dispatch only calls create_schedule for CreateSchedule");
    };

    let mut schedule = Schedule::new(name, workflow_id, frequency);
    schedule.fixed_robot_id = fixed_robot_id;
    schedule.priority = priority;
    let schedule_id = schedule.id;
    state.schedules.save(&schedule).await.map_err(|e| e.to_string())?;

    Ok(AdminResponse::ScheduleCreated { schedule_id })
}

pub async fn set_schedule_enabled(state: &AdminState, schedule_id: ScheduleId, enabled: bool) -> AdminResult {
    let mut schedule =
        state.schedules.get(schedule_id).await.map_err(|e| e.to_string())?.ok_or_else(|| format!("schedule {schedule_id} not found"))?;
    schedule.enabled = enabled;
    state.schedules.save(&schedule).await.map_err(|e| e.to_string())?;
    Ok(AdminResponse::Ok)
}

pub async fn set_assignment(
    state: &AdminState,
    workflow_id: WorkflowId,
    robot_id: RobotId,
    priority: u32,
    is_default: bool,
) -> AdminResult {
    let now = state.clock.utc_now();
    let mut assignment = RobotAssignment::new(workflow_id, robot_id, is_default, now);
    assignment.priority = priority;
    state.assignments.save_assignment(&assignment).await.map_err(|e| e.to_string())?;
    Ok(AdminResponse::Ok)
}

pub async fn set_override(
    state: &AdminState,
    workflow_id: WorkflowId,
    node_id: String,
    robot_id: Option<RobotId>,
    required_capabilities: Vec<casare_core::Capability>,
    strict: bool,
) -> AdminResult {
    let over = match robot_id {
        Some(robot_id) => NodeRobotOverride::specific_robot(workflow_id, node_id, robot_id, strict),
        None => NodeRobotOverride::required_capabilities(
            workflow_id,
            node_id,
            required_capabilities.into_iter().collect::<BTreeSet<_>>(),
        ),
    };
    state.assignments.save_override(&over).await.map_err(|e| e.to_string())?;
    Ok(AdminResponse::Ok)
}
