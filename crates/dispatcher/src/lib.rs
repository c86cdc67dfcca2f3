// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! casare-dispatcher: the core assignment loop.
//!
//! Drives jobs from the [`casare_queue::JobQueue`] onto eligible robots via
//! the Selection Service, tracks outstanding `job_assign` acks and running
//! jobs' execution deadlines, and reconciles state when a robot disappears.
//!
//! Generic over a [`RobotChannel`] so this crate never depends on
//! `casare-protocol`'s WebSocket machinery; the protocol server implements
//! the trait over its per-connection send queue.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use casare_core::{Clock, DomainError, FleetEvent, Job, JobError, JobId, JobStatus, Robot, RobotId};
use casare_queue::JobQueue;
use casare_registry::Registry;
use casare_selection::{select_robot, SelectionError, SelectionRequest};
use casare_storage::{AssignmentRepository, JobRepository, WorkflowRepository};
use casare_wire::{Envelope, RobotMessage};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{info, warn};
use uuid::Uuid;

/// Transport hook a connected robot is reachable through. Implemented by
/// `casare-protocol` over its per-connection serialized writer task.
pub trait RobotChannel: Clone + Send + Sync + 'static {
    /// Submit an envelope for delivery. Returns an error describing why the
    /// channel could not accept it (connection closed, send queue full, ...).
    fn send(&self, envelope: Envelope) -> Result<(), String>;
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("storage error: {0}")]
    Storage(#[from] casare_storage::StorageError),
    #[error("queue error: {0}")]
    Queue(#[from] casare_queue::QueueError),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("job {job_id} not found")]
    JobNotFound { job_id: JobId },
    #[error("robot {robot_id} has no live connection")]
    NoConnection { robot_id: RobotId },
    #[error("failed to send to robot {robot_id}: {reason}")]
    SendFailed { robot_id: RobotId, reason: String },
}

/// Tunables, all with the spec's documented defaults.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub dispatch_interval: Duration,
    pub assign_ack_timeout: Duration,
    pub default_job_timeout: Duration,
    pub cancel_grace: Duration,
    pub max_reject_retries: u32,
    /// When the head of the queue has no eligible robot: stop this tick
    /// (preserves priority order) if `false`, or skip to the next job if
    /// `true`. The spec allows either; `false` is the documented default.
    pub skip_unavailable: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            dispatch_interval: Duration::from_secs(5),
            assign_ack_timeout: Duration::from_secs(10),
            default_job_timeout: Duration::from_secs(3600),
            cancel_grace: Duration::from_secs(30),
            max_reject_retries: 3,
            skip_unavailable: false,
        }
    }
}

/// Outcome of a single `job_assign` sent and awaiting `job_accept`/`job_reject`.
struct PendingAck {
    #[allow(dead_code)]
    correlation_id: Uuid,
    robot_id: RobotId,
    deadline: DateTime<Utc>,
}

/// The terminal status a `job_cancel` in flight should resolve to once
/// acknowledged (or once its grace period lapses).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CancelTarget {
    Cancelled,
    Timeout,
}

struct PendingCancel {
    robot_id: RobotId,
    target: CancelTarget,
    deadline: DateTime<Utc>,
}

/// Jobs dispatched this tick, for callers that want to log/test the outcome.
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub dispatched: Vec<JobId>,
    pub ack_timeouts: Vec<JobId>,
    pub execution_timeouts: Vec<JobId>,
    pub forced_cancellations: Vec<JobId>,
}

pub struct Dispatcher<C: RobotChannel, K: Clock> {
    queue: Arc<JobQueue>,
    registry: Arc<Registry<C, K>>,
    jobs: Arc<dyn JobRepository>,
    assignments: Arc<dyn AssignmentRepository>,
    workflows: Arc<dyn WorkflowRepository>,
    clock: K,
    events: broadcast::Sender<FleetEvent>,
    config: DispatcherConfig,
    pending_acks: Mutex<HashMap<JobId, PendingAck>>,
    pending_cancels: Mutex<HashMap<JobId, PendingCancel>>,
    running_deadlines: Mutex<HashMap<JobId, DateTime<Utc>>>,
    /// Robot currently believed to hold each non-terminal job, so a late
    /// reply from a since-superseded assignment is recognized and dropped.
    active_assignments: Mutex<HashMap<JobId, RobotId>>,
}

impl<C: RobotChannel, K: Clock> Dispatcher<C, K> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        queue: Arc<JobQueue>,
        registry: Arc<Registry<C, K>>,
        jobs: Arc<dyn JobRepository>,
        assignments: Arc<dyn AssignmentRepository>,
        workflows: Arc<dyn WorkflowRepository>,
        clock: K,
        events: broadcast::Sender<FleetEvent>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            queue,
            registry,
            jobs,
            assignments,
            workflows,
            clock,
            events,
            config,
            pending_acks: Mutex::new(HashMap::new()),
            pending_cancels: Mutex::new(HashMap::new()),
            running_deadlines: Mutex::new(HashMap::new()),
            active_assignments: Mutex::new(HashMap::new()),
        }
    }

    fn publish(&self, event: FleetEvent) {
        let _ = self.events.send(event);
    }

    /// Run one full tick: reap stale acks/cancellations/executions, then
    /// dispatch as many ready jobs as the queue and eligible robots allow.
    pub async fn tick(&self) -> Result<TickReport, DispatchError> {
        let mut report = TickReport::default();
        self.sweep_pending_acks(&mut report).await?;
        self.sweep_running_timeouts(&mut report).await?;
        self.sweep_pending_cancels(&mut report).await?;

        // A job just rolled back by an ack timeout this tick is deprioritized
        // rather than immediately retried, per the "re-dispatch next tick"
        // rule — avoids thrashing the same unresponsive robot in a loop.
        let cooldown: std::collections::HashSet<JobId> = report.ack_timeouts.iter().copied().collect();

        // Bounds the skip_unavailable cycling below: once every job currently
        // queued has been tried once this tick, stop rather than spin.
        let mut skip_budget = self.queue.size();

        loop {
            let now = self.clock.utc_now();
            let Some(head) = self.queue.peek(now) else { break };
            if cooldown.contains(&head.id) {
                break;
            }

            let assignments = self.assignments.by_workflow(head.workflow_id).await?;
            let overrides = self.assignments.overrides_by_workflow(head.workflow_id).await?;
            let snapshot = self.registry.snapshot();
            let request = SelectionRequest {
                job: &head,
                node_id: None,
                robots: snapshot.robots(),
                assignments: &assignments,
                overrides: &overrides,
            };

            match select_robot(&request) {
                Ok(robot_id) => {
                    let Some(job) = self.queue.pop(now) else { break };
                    let job_id = job.id;
                    self.assign(job, robot_id, now).await?;
                    report.dispatched.push(job_id);
                }
                Err(SelectionError::NoAvailableRobot { .. }) => {
                    self.publish(FleetEvent::SelectionFailed { job_id: head.id });
                    if self.config.skip_unavailable && skip_budget > 0 {
                        // Can't "skip" a queue head without removing it; the
                        // queue offers no peek-past-head primitive, so the
                        // configurable alternative degrades to popping and
                        // immediately re-enqueueing behind same-priority peers.
                        // `skip_budget` bounds this to one pass over the
                        // jobs present at the start of the tick.
                        skip_budget -= 1;
                        let Some(job) = self.queue.pop(now) else { break };
                        self.queue.enqueue(job, now)?;
                        continue;
                    }
                    break;
                }
                Err(SelectionError::OverrideRobotUnavailable { .. }) => {
                    self.publish(FleetEvent::SelectionFailed { job_id: head.id });
                    break;
                }
            }
        }

        Ok(report)
    }

    /// Pop-to-assign: transition Queued -> Running, reserve robot capacity,
    /// send `job_assign`, and record the pending ack. Rolls the job back to
    /// Queued on any failure past the transition (concurrent fill, dead
    /// connection, send failure) rather than losing it.
    async fn assign(&self, mut job: Job, robot_id: RobotId, now: DateTime<Utc>) -> Result<(), DispatchError> {
        let job_id = job.id;

        if let Err(err) = self.registry.assign_job(robot_id, job_id) {
            warn!(%job_id, %robot_id, %err, "robot filled concurrently, re-enqueuing job");
            self.queue.enqueue(job, now)?;
            return Ok(());
        }

        job.transition_to(JobStatus::Running, now)?;
        job.assigned_robot_id = Some(robot_id);
        self.jobs.save(&job).await?;
        self.publish(FleetEvent::JobTransitioned { job_id, from: JobStatus::Queued, to: JobStatus::Running });

        let workflow_name =
            self.workflows.get(job.workflow_id).await?.map(|w| w.name).unwrap_or_default();
        let timeout_seconds = job.timeout_seconds.unwrap_or(self.config.default_job_timeout.as_secs());

        let message = RobotMessage::JobAssign {
            job_id,
            workflow_id: job.workflow_id,
            workflow_name,
            workflow_json: job.workflow_blob.clone(),
            priority: job.priority,
            timeout_seconds,
            parameters: job.parameters.clone(),
        };
        let envelope = Envelope::new(message);
        let correlation_id = envelope.id;

        let Some(channel) = self.registry.connection(robot_id) else {
            return self.rollback_assignment(job, robot_id, now).await;
        };
        if let Err(reason) = channel.send(envelope) {
            warn!(%job_id, %robot_id, %reason, "failed to send job_assign, rolling back");
            return self.rollback_assignment(job, robot_id, now).await;
        }

        self.active_assignments.lock().insert(job_id, robot_id);
        self.pending_acks.lock().insert(job_id, PendingAck { correlation_id, robot_id, deadline: now + chrono_duration(self.config.assign_ack_timeout) });
        self.running_deadlines.lock().insert(job_id, now + chrono_duration(Duration::from_secs(timeout_seconds)));
        info!(%job_id, %robot_id, %correlation_id, "job assigned");
        Ok(())
    }

    async fn rollback_assignment(&self, mut job: Job, robot_id: RobotId, now: DateTime<Utc>) -> Result<(), DispatchError> {
        let job_id = job.id;
        let _ = self.registry.complete_job(robot_id, job_id);
        job.requeue(now)?;
        self.jobs.save(&job).await?;
        self.queue.enqueue(job, now)?;
        self.publish(FleetEvent::JobTransitioned { job_id, from: JobStatus::Running, to: JobStatus::Queued });
        Ok(())
    }

    /// Inbound `job_accept`: confirms the assignment, resetting the reject streak.
    pub async fn handle_job_accept(&self, job_id: JobId, robot_id: RobotId) -> Result<(), DispatchError> {
        self.pending_acks.lock().remove(&job_id);
        let Some(mut job) = self.jobs.get(job_id).await? else { return Ok(()) };
        if job.assigned_robot_id != Some(robot_id) {
            warn!(%job_id, %robot_id, "job_accept from unassigned robot, ignoring");
            return Ok(());
        }
        job.reset_rejects();
        self.jobs.save(&job).await?;
        Ok(())
    }

    /// Inbound `job_reject`, or an ack timeout treated identically: release
    /// the robot's capacity and either requeue or fail outright past the
    /// reject-retry budget.
    pub async fn handle_job_reject(&self, job_id: JobId, robot_id: RobotId, reason: &str) -> Result<(), DispatchError> {
        self.pending_acks.lock().remove(&job_id);
        self.running_deadlines.lock().remove(&job_id);
        self.active_assignments.lock().remove(&job_id);
        let now = self.clock.utc_now();
        let _ = self.registry.complete_job(robot_id, job_id);

        let Some(mut job) = self.jobs.get(job_id).await? else { return Err(DispatchError::JobNotFound { job_id }) };
        job.record_reject();
        if job.consecutive_rejects >= self.config.max_reject_retries {
            job.mark_failed(
                JobError { message: format!("no robot accepted ({reason})"), error_type: "NoRobotAccepted".into(), failed_node: None },
                now,
            )?;
            self.jobs.save(&job).await?;
            self.publish(FleetEvent::JobTransitioned { job_id, from: JobStatus::Running, to: JobStatus::Failed });
            warn!(%job_id, rejects = job.consecutive_rejects, "job failed after exhausting reject retries");
        } else {
            job.requeue(now)?;
            self.jobs.save(&job).await?;
            self.queue.enqueue(job, now)?;
            self.publish(FleetEvent::JobTransitioned { job_id, from: JobStatus::Running, to: JobStatus::Queued });
        }
        Ok(())
    }

    /// Inbound `job_progress`: no status change.
    pub async fn handle_job_progress(&self, job_id: JobId, progress: u8, current_node: Option<String>) -> Result<(), DispatchError> {
        let Some(mut job) = self.jobs.get(job_id).await? else { return Ok(()) };
        job.record_progress(progress, current_node)?;
        self.jobs.save(&job).await?;
        self.publish(FleetEvent::JobProgress { job_id, progress });
        Ok(())
    }

    /// Inbound `job_complete`.
    pub async fn handle_job_complete(
        &self,
        job_id: JobId,
        robot_id: RobotId,
        result: HashMap<String, serde_json::Value>,
    ) -> Result<(), DispatchError> {
        if !self.is_current_assignment(job_id, robot_id) {
            warn!(%job_id, %robot_id, "job_complete from stale assignment, ignoring");
            return Ok(());
        }
        let now = self.clock.utc_now();
        let Some(mut job) = self.jobs.get(job_id).await? else { return Err(DispatchError::JobNotFound { job_id }) };
        job.mark_completed(result, now)?;
        self.jobs.save(&job).await?;
        let _ = self.registry.complete_job(robot_id, job_id);
        self.clear_tracking(job_id);
        self.publish(FleetEvent::JobTransitioned { job_id, from: JobStatus::Running, to: JobStatus::Completed });
        Ok(())
    }

    /// Inbound `job_failed`.
    pub async fn handle_job_failed(&self, job_id: JobId, robot_id: RobotId, error: JobError) -> Result<(), DispatchError> {
        if !self.is_current_assignment(job_id, robot_id) {
            warn!(%job_id, %robot_id, "job_failed from stale assignment, ignoring");
            return Ok(());
        }
        let now = self.clock.utc_now();
        let Some(mut job) = self.jobs.get(job_id).await? else { return Err(DispatchError::JobNotFound { job_id }) };
        job.mark_failed(error, now)?;
        self.jobs.save(&job).await?;
        let _ = self.registry.complete_job(robot_id, job_id);
        self.clear_tracking(job_id);
        self.publish(FleetEvent::JobTransitioned { job_id, from: JobStatus::Running, to: JobStatus::Failed });
        Ok(())
    }

    /// Inbound `job_cancelled`: resolves whichever cancellation (explicit or
    /// timeout-driven) is pending for this job.
    pub async fn handle_job_cancelled(&self, job_id: JobId, robot_id: RobotId) -> Result<(), DispatchError> {
        let Some(pending) = self.pending_cancels.lock().remove(&job_id) else {
            return Ok(());
        };
        let now = self.clock.utc_now();
        let target = match pending.target {
            CancelTarget::Cancelled => JobStatus::Cancelled,
            CancelTarget::Timeout => JobStatus::Timeout,
        };
        let Some(mut job) = self.jobs.get(job_id).await? else { return Err(DispatchError::JobNotFound { job_id }) };
        job.transition_to(target, now)?;
        self.jobs.save(&job).await?;
        let _ = self.registry.complete_job(robot_id, job_id);
        self.clear_tracking(job_id);
        self.publish(FleetEvent::JobTransitioned { job_id, from: JobStatus::Running, to: target });
        Ok(())
    }

    /// Cancel a job by id. Synchronous for queued jobs; for a running job,
    /// sends `job_cancel` and waits for `job_cancelled` (or the grace
    /// timeout) via the tick sweep. Idempotent.
    pub async fn cancel(&self, job_id: JobId, reason: &str) -> Result<(), DispatchError> {
        let now = self.clock.utc_now();
        if let Some(job) = self.queue.cancel(job_id, now)? {
            self.jobs.save(&job).await?;
            self.publish(FleetEvent::JobTransitioned { job_id, from: JobStatus::Queued, to: JobStatus::Cancelled });
            return Ok(());
        }

        let Some(mut job) = self.jobs.get(job_id).await? else { return Err(DispatchError::JobNotFound { job_id }) };
        if job.is_terminal() {
            return Ok(());
        }
        if job.status == JobStatus::Pending {
            job.transition_to(JobStatus::Cancelled, now)?;
            self.jobs.save(&job).await?;
            self.publish(FleetEvent::JobTransitioned { job_id, from: JobStatus::Pending, to: JobStatus::Cancelled });
            return Ok(());
        }

        let robot_id = job.assigned_robot_id.ok_or(DispatchError::JobNotFound { job_id })?;
        let channel = self.registry.connection(robot_id).ok_or(DispatchError::NoConnection { robot_id })?;
        let envelope = Envelope::new(RobotMessage::JobCancel { job_id, reason: reason.to_string() });
        channel.send(envelope).map_err(|reason| DispatchError::SendFailed { robot_id, reason })?;
        self.pending_cancels.lock().insert(
            job_id,
            PendingCancel { robot_id, target: CancelTarget::Cancelled, deadline: now + chrono_duration(self.config.cancel_grace) },
        );
        Ok(())
    }

    /// Robot-loss recovery: called once per robot the registry's heartbeat
    /// sweep marked Offline. Recovers each in-flight job per its workflow's
    /// retry-safety, or fails it with "robot lost".
    pub async fn handle_robot_lost(&self, robot_id: RobotId, robot: &Robot) -> Result<(), DispatchError> {
        let now = self.clock.utc_now();
        for &job_id in robot.current_jobs() {
            self.pending_acks.lock().remove(&job_id);
            self.pending_cancels.lock().remove(&job_id);
            self.running_deadlines.lock().remove(&job_id);
            self.active_assignments.lock().remove(&job_id);

            let Some(mut job) = self.jobs.get(job_id).await? else { continue };
            if job.is_terminal() {
                continue;
            }
            let retry_safe = self.workflows.get(job.workflow_id).await?.map(|w| w.retry_safe).unwrap_or(true);
            if retry_safe {
                job.requeue(now)?;
                self.jobs.save(&job).await?;
                self.queue.enqueue(job, now)?;
                self.publish(FleetEvent::JobTransitioned { job_id, from: JobStatus::Running, to: JobStatus::Queued });
                info!(%job_id, %robot_id, "job recovered after robot loss (retry-safe)");
            } else {
                job.mark_failed(
                    JobError { message: "robot lost".into(), error_type: "RobotLost".into(), failed_node: None },
                    now,
                )?;
                self.jobs.save(&job).await?;
                self.publish(FleetEvent::JobTransitioned { job_id, from: JobStatus::Running, to: JobStatus::Failed });
                warn!(%job_id, %robot_id, "job failed, robot lost and workflow not retry-safe");
            }
        }
        Ok(())
    }

    fn is_current_assignment(&self, job_id: JobId, robot_id: RobotId) -> bool {
        self.active_assignments.lock().get(&job_id) == Some(&robot_id)
    }

    fn clear_tracking(&self, job_id: JobId) {
        self.pending_acks.lock().remove(&job_id);
        self.pending_cancels.lock().remove(&job_id);
        self.running_deadlines.lock().remove(&job_id);
        self.active_assignments.lock().remove(&job_id);
    }

    async fn sweep_pending_acks(&self, report: &mut TickReport) -> Result<(), DispatchError> {
        let now = self.clock.utc_now();
        let expired: Vec<(JobId, RobotId)> = {
            let acks = self.pending_acks.lock();
            acks.iter().filter(|(_, p)| p.deadline <= now).map(|(job_id, p)| (*job_id, p.robot_id)).collect()
        };
        for (job_id, robot_id) in expired {
            self.handle_job_reject(job_id, robot_id, "ack timeout").await?;
            report.ack_timeouts.push(job_id);
        }
        Ok(())
    }

    async fn sweep_running_timeouts(&self, report: &mut TickReport) -> Result<(), DispatchError> {
        let now = self.clock.utc_now();
        let expired: Vec<JobId> = {
            let deadlines = self.running_deadlines.lock();
            deadlines.iter().filter(|(_, deadline)| **deadline <= now).map(|(job_id, _)| *job_id).collect()
        };
        for job_id in expired {
            self.running_deadlines.lock().remove(&job_id);
            let Some(robot_id) = self.active_assignments.lock().get(&job_id).copied() else { continue };
            let Some(channel) = self.registry.connection(robot_id) else { continue };
            let envelope = Envelope::new(RobotMessage::JobCancel { job_id, reason: "execution timeout".to_string() });
            if channel.send(envelope).is_ok() {
                self.pending_cancels.lock().insert(
                    job_id,
                    PendingCancel { robot_id, target: CancelTarget::Timeout, deadline: now + chrono_duration(self.config.cancel_grace) },
                );
                report.execution_timeouts.push(job_id);
            }
        }
        Ok(())
    }

    async fn sweep_pending_cancels(&self, report: &mut TickReport) -> Result<(), DispatchError> {
        let now = self.clock.utc_now();
        let expired: Vec<(JobId, RobotId, CancelTarget)> = {
            let cancels = self.pending_cancels.lock();
            cancels
                .iter()
                .filter(|(_, p)| p.deadline <= now)
                .map(|(job_id, p)| (*job_id, p.robot_id, p.target))
                .collect()
        };
        for (job_id, robot_id, target) in expired {
            self.pending_cancels.lock().remove(&job_id);
            let status = match target {
                CancelTarget::Cancelled => JobStatus::Cancelled,
                CancelTarget::Timeout => JobStatus::Timeout,
            };
            if let Some(mut job) = self.jobs.get(job_id).await? {
                if !job.is_terminal() {
                    job.transition_to(status, now)?;
                    self.jobs.save(&job).await?;
                    self.publish(FleetEvent::JobTransitioned { job_id, from: JobStatus::Running, to: status });
                }
            }
            let _ = self.registry.complete_job(robot_id, job_id);
            self.clear_tracking(job_id);
            report.forced_cancellations.push(job_id);
            warn!(%job_id, %robot_id, ?status, "grace period elapsed, forcing cancellation");
        }
        Ok(())
    }
}

/// Lets `casare-registry`'s heartbeat-sweep loop recover a robot's in-flight
/// jobs the same way the explicit-disconnect path does, without the
/// registry crate depending on this one.
#[async_trait::async_trait]
impl<C: RobotChannel, K: Clock + 'static> casare_registry::RobotLossHandler for Dispatcher<C, K> {
    async fn handle_robot_lost(&self, robot_id: RobotId, robot: &Robot) {
        if let Err(err) = self.handle_robot_lost(robot_id, robot).await {
            warn!(%robot_id, %err, "failed to recover jobs after heartbeat-sweep robot loss");
        }
    }
}

fn chrono_duration(d: Duration) -> chrono::Duration {
    chrono::Duration::from_std(d).unwrap_or(chrono::Duration::zero())
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
