// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rendering for admin-protocol responses: a human-readable text table by
//! default, or `--format json` for scripting.

use casare_core::{Job, RobotAssignment, Schedule};
use casare_wire::AdminResponse;

use crate::color::{header, literal, muted};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub fn render(response: &AdminResponse, format: OutputFormat) -> String {
    if format == OutputFormat::Json {
        return serde_json::to_string_pretty(response).unwrap_or_else(|_| "{}".to_string());
    }
    match response {
        AdminResponse::Ok => "ok".to_string(),
        AdminResponse::JobSubmitted { job_id } => format!("submitted {}", literal(job_id.as_str())),
        AdminResponse::ScheduleCreated { schedule_id } => format!("created {}", literal(schedule_id.as_str())),
        AdminResponse::Job { job: Some(job) } => render_job(job),
        AdminResponse::Job { job: None } => muted("not found"),
        AdminResponse::Jobs { jobs } => render_jobs(jobs),
        AdminResponse::Robot { robot: Some(robot) } => render_robot(robot),
        AdminResponse::Robot { robot: None } => muted("not found"),
        AdminResponse::Robots { robots } => render_robots(robots),
        AdminResponse::Schedules { schedules } => render_schedules(schedules),
        AdminResponse::Assignments { assignments } => render_assignments(assignments),
        AdminResponse::Workflow { workflow: Some(workflow) } => format!("{} v{}", workflow.name, workflow.version),
        AdminResponse::Workflow { workflow: None } => muted("not found"),
        AdminResponse::Error { message } => format!("error: {message}"),
    }
}

fn render_job(job: &Job) -> String {
    let mut lines = vec![
        format!("{}  {}", header("id"), literal(job.id.as_str())),
        format!("{}  {}", header("workflow"), job.workflow_id.as_str()),
        format!("{}  {}", header("status"), job.status),
        format!("{}  {}", header("priority"), job.priority),
        format!("{}  {}%", header("progress"), job.progress),
    ];
    if let Some(robot_id) = job.assigned_robot_id {
        lines.push(format!("{}  {}", header("robot"), robot_id.as_str()));
    }
    if let Some(error) = &job.error {
        lines.push(format!("{}  {} ({})", header("error"), error.message, error.error_type));
    }
    lines.join("\n")
}

fn render_jobs(jobs: &[Job]) -> String {
    if jobs.is_empty() {
        return muted("no jobs");
    }
    let mut lines = vec![format!(
        "{:<26} {:<10} {:<10} {}",
        header("id"),
        header("status"),
        header("priority"),
        header("workflow")
    )];
    for job in jobs {
        lines.push(format!(
            "{:<26} {:<10} {:<10} {}",
            literal(job.id.as_str()),
            job.status,
            job.priority,
            job.workflow_id.as_str()
        ));
    }
    lines.join("\n")
}

fn render_robot(robot: &casare_core::Robot) -> String {
    format!(
        "{}  {}\n{}  {}\n{}  {}\n{}  {}/{}",
        header("id"),
        literal(robot.id.as_str()),
        header("name"),
        robot.name,
        header("status"),
        robot.status,
        header("jobs"),
        robot.current_jobs().len(),
        robot.max_concurrent_jobs
    )
}

fn render_robots(robots: &[casare_core::Robot]) -> String {
    if robots.is_empty() {
        return muted("no robots");
    }
    let mut lines =
        vec![format!("{:<26} {:<14} {:<10} {}", header("id"), header("name"), header("status"), header("jobs"))];
    for robot in robots {
        lines.push(format!(
            "{:<26} {:<14} {:<10} {}/{}",
            literal(robot.id.as_str()),
            robot.name,
            robot.status,
            robot.current_jobs().len(),
            robot.max_concurrent_jobs
        ));
    }
    lines.join("\n")
}

fn render_schedules(schedules: &[Schedule]) -> String {
    if schedules.is_empty() {
        return muted("no schedules");
    }
    let mut lines =
        vec![format!("{:<26} {:<20} {:<9} {}", header("id"), header("name"), header("enabled"), header("next_run"))];
    for schedule in schedules {
        let next_run = schedule.next_run.map(|t| t.to_rfc3339()).unwrap_or_else(|| "-".to_string());
        lines.push(format!(
            "{:<26} {:<20} {:<9} {}",
            literal(schedule.id.as_str()),
            schedule.name,
            schedule.enabled,
            next_run
        ));
    }
    lines.join("\n")
}

fn render_assignments(assignments: &[RobotAssignment]) -> String {
    if assignments.is_empty() {
        return muted("no assignments");
    }
    let mut lines = vec![format!("{:<26} {:<26} {}", header("workflow"), header("robot"), header("priority"))];
    for assignment in assignments {
        lines.push(format!(
            "{:<26} {:<26} {}",
            assignment.workflow_id.as_str(),
            literal(assignment.robot_id.as_str()),
            assignment.priority
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
