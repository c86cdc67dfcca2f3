// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! casare-scheduler: the time-based Job emitter.
//!
//! A tick loop (default 1s) materializes a new [`Job`] for every enabled
//! [`Schedule`] whose `next_run` has arrived, enqueues it onto the shared
//! [`JobQueue`], and advances the schedule's `last_run`/`next_run` via the
//! `ScheduleRepository` (write-through, per SPEC_FULL.md §6.3).
//!
//! Catch-up policy on resume: at most one job per schedule, regardless of
//! how many fire-times elapsed while the orchestrator was down. This is a
//! deliberate simplification (spec.md §9 Open Questions), not a backfill
//! engine.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use casare_core::{Clock, Frequency, Job, JobConfig, JobId, Schedule};
use casare_queue::JobQueue;
use casare_storage::ScheduleRepository;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("storage error: {0}")]
    Storage(#[from] casare_storage::StorageError),
    #[error("queue error: {0}")]
    Queue(#[from] casare_queue::QueueError),
    #[error("invalid cron expression {expression:?}: {source}")]
    InvalidCron { expression: String, source: cron::error::Error },
}

/// Compute the next fire time strictly after `after`, per the schedule's
/// frequency. `Once` schedules never recur (`record_fire` disables them),
/// so this is only consulted for the repeating variants plus the initial
/// `Cron` schedule.
///
/// Timezones beyond UTC are not resolved here (no IANA tz database
/// dependency in this workspace); `schedule.timezone` is carried for
/// display/audit purposes and cron expressions are evaluated in UTC.
pub fn compute_next_run(frequency: &Frequency, after: DateTime<Utc>) -> Result<Option<DateTime<Utc>>, SchedulerError> {
    match frequency {
        Frequency::Once => Ok(None),
        Frequency::Hourly => Ok(Some(after + chrono::Duration::hours(1))),
        Frequency::Daily => Ok(Some(after + chrono::Duration::days(1))),
        Frequency::Weekly => Ok(Some(after + chrono::Duration::weeks(1))),
        Frequency::Monthly => Ok(Some(after + chrono::Months::new(1))),
        Frequency::Cron { expression } => {
            let schedule = cron::Schedule::from_str(expression)
                .map_err(|source| SchedulerError::InvalidCron { expression: expression.clone(), source })?;
            Ok(schedule.after(&after).next())
        }
    }
}

/// Materialize a due schedule into a new, still-`Pending` `Job`. Copies
/// workflow id, fixed robot affinity, and priority; leaves the workflow
/// blob empty since the scheduler never touches workflow definitions.
fn materialize(schedule: &Schedule, clock: &impl Clock) -> Job {
    let mut config = JobConfig::new(schedule.workflow_id, Vec::new());
    config.target_robot_id = schedule.fixed_robot_id;
    config.priority = schedule.priority;
    Job::new(config, clock)
}

/// The time-based Job emitter, consuming a `ScheduleRepository` and
/// publishing onto a shared `JobQueue`.
pub struct Scheduler<K: Clock> {
    schedules: Arc<dyn ScheduleRepository>,
    queue: Arc<JobQueue>,
    clock: K,
}

impl<K: Clock> Scheduler<K> {
    pub fn new(schedules: Arc<dyn ScheduleRepository>, queue: Arc<JobQueue>, clock: K) -> Self {
        Self { schedules, queue, clock }
    }

    /// Run one tick: materialize and enqueue every schedule whose
    /// `next_run` has arrived, recomputing its `next_run` and persisting
    /// the update. Returns the ids of jobs emitted this tick.
    pub async fn tick(&self) -> Result<Vec<JobId>, SchedulerError> {
        let now = self.clock.utc_now();
        let mut fired = Vec::new();
        for mut schedule in self.schedules.enabled().await? {
            let due = match schedule.next_run {
                Some(next_run) => next_run <= now,
                // Never fired before: establish its first next_run and fire
                // immediately if that run-time is already in the past.
                None => match compute_next_run(&schedule.frequency, now)? {
                    Some(next_run) => {
                        schedule.next_run = Some(next_run);
                        false
                    }
                    None => true,
                },
            };
            if !due {
                self.schedules.save(&schedule).await?;
                continue;
            }

            let job = materialize(&schedule, &self.clock);
            let job_id = job.id;
            if let Err(err) = self.queue.enqueue(job, now) {
                error!(schedule_id = %schedule.id, %err, "failed to enqueue scheduled job");
                continue;
            }

            let next_run = compute_next_run(&schedule.frequency, now)?;
            schedule.record_fire(now, next_run);
            self.schedules.save(&schedule).await?;
            info!(schedule_id = %schedule.id, %job_id, "schedule fired");
            fired.push(job_id);
        }
        Ok(fired)
    }
}

/// Spawn the scheduler tick loop (default interval 1s). Returns a handle
/// the daemon holds to abort on shutdown.
pub fn spawn_tick_loop<K>(scheduler: Arc<Scheduler<K>>, tick_interval: Duration) -> tokio::task::JoinHandle<()>
where
    K: Clock + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tick_interval);
        loop {
            interval.tick().await;
            if let Err(err) = scheduler.tick().await {
                warn!(%err, "scheduler tick failed");
            }
        }
    })
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
