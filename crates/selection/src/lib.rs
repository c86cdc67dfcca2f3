// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! casare-selection: the Robot Selection Service.
//!
//! A pure function of its arguments — no I/O, no clock beyond what the
//! caller passes in — so it is deterministic and unit-testable in
//! isolation from the Dispatcher and Registry.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::collections::BTreeSet;

use casare_core::{
    Capability, Job, NodeRobotOverride, OverrideTarget, Robot, RobotAssignment, RobotId,
};
use thiserror::Error;

/// Why the Selection Service could not pick a robot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    /// No robot in the eligible set could take the job.
    #[error("no robot is available for workflow {workflow_id}")]
    NoAvailableRobot { workflow_id: String },

    /// A strict node-level override named a robot that is not currently eligible.
    #[error("override robot {robot_id} is unavailable")]
    OverrideRobotUnavailable { robot_id: String },
}

/// Additional request context beyond the `Job` itself: which node (if any) is
/// being selected for, and the active assignment/override rules.
pub struct SelectionRequest<'a> {
    pub job: &'a Job,
    /// When selecting a robot for a specific node within the workflow,
    /// the node id to look up overrides for. `None` when selecting at the
    /// job level (initial dispatch).
    pub node_id: Option<&'a str>,
    pub robots: &'a [Robot],
    pub assignments: &'a [RobotAssignment],
    pub overrides: &'a [NodeRobotOverride],
}

fn tenant_ok(job: &Job, robot: &Robot) -> bool {
    match (&job.tenant_id, &robot.tenant_id) {
        (Some(j), Some(r)) => j == r,
        _ => true,
    }
}

fn is_eligible(job: &Job, robot: &Robot, required: &BTreeSet<Capability>) -> bool {
    robot.status == casare_core::RobotStatus::Online
        && robot.has_capacity()
        && robot.has_capabilities(required)
        && tenant_ok(job, robot)
}

/// Score a candidate for the capability/utilization ranking step.
fn score(job: &Job, robot: &Robot, required: &BTreeSet<Capability>, assignments: &[RobotAssignment]) -> f64 {
    let mut s = 0.0;
    if robot.has_capacity() {
        s += 100.0;
    }
    let pre_assigned_not_default = assignments
        .iter()
        .any(|a| a.workflow_id == job.workflow_id && a.robot_id == robot.id && !a.is_default);
    if pre_assigned_not_default {
        s += 50.0;
    }
    s += 20.0 * required.iter().filter(|c| robot.capabilities.contains(c)).count() as f64;
    s += 30.0 * (1.0 - robot.utilization());
    if !robot.environment.is_empty()
        && job
            .parameters
            .get("environment")
            .and_then(|v| v.as_str())
            .map(|env| env == robot.environment)
            .unwrap_or(false)
    {
        s += 10.0;
    }
    s
}

fn pick_best<'a>(
    job: &Job,
    candidates: &[&'a Robot],
    required: &BTreeSet<Capability>,
    assignments: &[RobotAssignment],
) -> Option<&'a Robot> {
    candidates
        .iter()
        .copied()
        .map(|r| (r, score(job, r, required, assignments)))
        .max_by(|(ra, sa), (rb, sb)| {
            sa.partial_cmp(sb)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| rb.utilization().partial_cmp(&ra.utilization()).unwrap_or(std::cmp::Ordering::Equal))
                .then_with(|| rb.id.as_str().cmp(ra.id.as_str()))
        })
        .map(|(r, _)| r)
}

/// Select the robot to run `request.job` (or a specific node within it),
/// per the four-step priority order: node override, workflow default,
/// capability/utilization scoring, failure.
pub fn select_robot(request: &SelectionRequest<'_>) -> Result<RobotId, SelectionError> {
    let job = request.job;
    let active_override = request.overrides.iter().find(|o| {
        o.active
            && o.workflow_id == job.workflow_id
            && request.node_id.map(|n| n == o.node_id).unwrap_or(false)
    });

    let (required, strict_override_robot) = match active_override.map(|o| &o.target) {
        Some(OverrideTarget::SpecificRobot { robot_id, strict }) => {
            (BTreeSet::new(), Some((*robot_id, *strict)))
        }
        Some(OverrideTarget::RequiredCapabilities(caps)) => (caps.clone(), None),
        None => (BTreeSet::new(), None),
    };

    // Step 1: active node-level override naming a specific robot.
    if let Some((robot_id, strict)) = strict_override_robot {
        let found = request.robots.iter().find(|r| r.id == robot_id);
        match found {
            Some(r) if is_eligible(job, r, &BTreeSet::new()) => return Ok(r.id),
            _ if strict => {
                return Err(SelectionError::OverrideRobotUnavailable { robot_id: robot_id.to_string() })
            }
            _ => {}
        }
    }

    let eligible: Vec<&Robot> = request.robots.iter().filter(|r| is_eligible(job, r, &required)).collect();

    // Step 2: workflow-level default assignment.
    if let Some(assignment) = request
        .assignments
        .iter()
        .filter(|a| a.is_default && a.workflow_id == job.workflow_id)
        .min_by_key(|a| a.priority)
    {
        if let Some(r) = eligible.iter().find(|r| r.id == assignment.robot_id) {
            return Ok(r.id);
        }
    }

    // Step 3: auto-selection by score within the eligible set.
    if let Some(r) = pick_best(job, &eligible, &required, request.assignments) {
        return Ok(r.id);
    }

    Err(SelectionError::NoAvailableRobot { workflow_id: job.workflow_id.to_string() })
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
