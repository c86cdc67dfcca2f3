// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Domain error taxonomy shared by every entity mutator.
//!
//! Centralizing these in the entity (rather than letting the dispatcher,
//! protocol server, and UI each reinvent the checks) is the whole point of
//! putting invariants on the entity instead of on its callers.

use thiserror::Error;

/// Errors raised by domain entity mutators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("illegal transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("robot {robot_id} is at capacity ({max_concurrent_jobs})")]
    AtCapacity { robot_id: String, max_concurrent_jobs: u32 },

    #[error("job {job_id} is already assigned to robot {robot_id}")]
    DuplicateAssignment { robot_id: String, job_id: String },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}
