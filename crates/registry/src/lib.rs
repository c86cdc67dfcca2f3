// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! casare-registry: the Robot Registry.
//!
//! Process-wide mapping from robot id to a registration record (robot
//! entity + live protocol connection handle + last-heartbeat timestamp).
//! A single writer serializes register/heartbeat/sweep; readers receive
//! immutable [`RegistrySnapshot`]s safe to hand to the stateless Selection
//! Service.
//!
//! Generic over the connection handle type `C` so this crate never depends
//! on `casare-protocol`'s WebSocket types; the protocol server attaches its
//! own handle via [`Registry::attach_connection`].

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use casare_core::{Clock, DomainError, FleetEvent, JobId, Robot, RobotId, RobotStatus};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// Recovers a robot's in-flight jobs once the heartbeat sweep has marked it
/// Offline (spec.md §4.3/§4.8). Implemented by `casare-dispatcher`'s
/// `Dispatcher` over its own `handle_robot_lost`; kept as a trait here so
/// this crate never depends on the dispatcher crate.
#[async_trait]
pub trait RobotLossHandler: Send + Sync {
    async fn handle_robot_lost(&self, robot_id: RobotId, robot: &Robot);
}

/// Reported load/resource metrics from a robot's most recent heartbeat.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeartbeatMetrics {
    pub cpu_percent: Option<f32>,
    pub mem_percent: Option<f32>,
    pub disk_percent: Option<f32>,
}

struct Record<C> {
    robot: Robot,
    connection: Option<C>,
    last_heartbeat_monotonic: Instant,
    metrics: HeartbeatMetrics,
}

/// Fleet-wide gauges, recomputed per snapshot (SPEC_FULL.md §4.3).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryCounts {
    pub online: usize,
    pub busy: usize,
    pub offline: usize,
    pub error: usize,
    pub maintenance: usize,
}

/// Immutable point-in-time view of the fleet, safe to pass to the
/// stateless Selection Service without holding the registry lock.
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    robots: Vec<Robot>,
}

impl RegistrySnapshot {
    pub fn robots(&self) -> &[Robot] {
        &self.robots
    }

    pub fn get(&self, robot_id: RobotId) -> Option<&Robot> {
        self.robots.iter().find(|r| r.id == robot_id)
    }

    pub fn counts(&self) -> RegistryCounts {
        let mut counts = RegistryCounts::default();
        for r in &self.robots {
            match r.status {
                RobotStatus::Online => counts.online += 1,
                RobotStatus::Busy => counts.busy += 1,
                RobotStatus::Offline => counts.offline += 1,
                RobotStatus::Error => counts.error += 1,
                RobotStatus::Maintenance => counts.maintenance += 1,
            }
        }
        counts
    }
}

/// The Robot Registry: connected-robot state, liveness, and capacity.
pub struct Registry<C: Clone + Send + Sync + 'static, K: Clock> {
    records: RwLock<HashMap<RobotId, Record<C>>>,
    clock: K,
    events: broadcast::Sender<FleetEvent>,
}

impl<C: Clone + Send + Sync + 'static, K: Clock> Registry<C, K> {
    pub fn new(clock: K, events: broadcast::Sender<FleetEvent>) -> Self {
        Self { records: RwLock::new(HashMap::new()), clock, events }
    }

    fn publish(&self, event: FleetEvent) {
        let _ = self.events.send(event);
    }

    /// Handle an inbound `register` message: create or update the record and
    /// mark the robot Online with a fresh heartbeat.
    pub fn register(&self, mut robot: Robot, connection: Option<C>) -> RobotId {
        let now = self.clock.utc_now();
        robot.heartbeat(now);
        let id = robot.id;
        let mut records = self.records.write();
        records.insert(
            id,
            Record { robot, connection, last_heartbeat_monotonic: self.clock.now(), metrics: HeartbeatMetrics::default() },
        );
        info!(robot_id = %id, "robot registered");
        self.publish(FleetEvent::RobotTransitioned { robot_id: id, from: RobotStatus::Offline, to: RobotStatus::Online });
        id
    }

    /// Attach (or replace) the live connection handle for an already-known robot.
    pub fn attach_connection(&self, robot_id: RobotId, connection: C) {
        if let Some(record) = self.records.write().get_mut(&robot_id) {
            record.connection = Some(connection);
        }
    }

    pub fn connection(&self, robot_id: RobotId) -> Option<C> {
        self.records.read().get(&robot_id).and_then(|r| r.connection.clone())
    }

    /// Handle an inbound `heartbeat` message: refresh liveness and metrics.
    pub fn heartbeat(&self, robot_id: RobotId, metrics: HeartbeatMetrics) -> Result<(), DomainError> {
        let now = self.clock.utc_now();
        let mut records = self.records.write();
        let record = records
            .get_mut(&robot_id)
            .ok_or_else(|| DomainError::NotFound { entity: "robot", id: robot_id.to_string() })?;
        let was_offline = record.robot.status == RobotStatus::Offline;
        record.robot.heartbeat(now);
        record.last_heartbeat_monotonic = self.clock.now();
        record.metrics = metrics;
        if was_offline {
            self.publish(FleetEvent::RobotTransitioned { robot_id, from: RobotStatus::Offline, to: RobotStatus::Online });
        }
        self.publish(FleetEvent::RobotHeartbeat { robot_id });
        Ok(())
    }

    /// Assign a job to a robot, delegating to [`Robot::assign_job`].
    pub fn assign_job(&self, robot_id: RobotId, job_id: JobId) -> Result<(), DomainError> {
        let mut records = self.records.write();
        let record = records
            .get_mut(&robot_id)
            .ok_or_else(|| DomainError::NotFound { entity: "robot", id: robot_id.to_string() })?;
        let from = record.robot.status;
        record.robot.assign_job(job_id)?;
        if record.robot.status != from {
            self.publish(FleetEvent::RobotTransitioned { robot_id, from, to: record.robot.status });
        }
        Ok(())
    }

    /// Release a job's assignment, delegating to [`Robot::complete_job`].
    pub fn complete_job(&self, robot_id: RobotId, job_id: JobId) -> Result<(), DomainError> {
        let mut records = self.records.write();
        let record = records
            .get_mut(&robot_id)
            .ok_or_else(|| DomainError::NotFound { entity: "robot", id: robot_id.to_string() })?;
        let from = record.robot.status;
        record.robot.complete_job(job_id)?;
        if record.robot.status != from {
            self.publish(FleetEvent::RobotTransitioned { robot_id, from, to: record.robot.status });
        }
        Ok(())
    }

    pub fn set_status(&self, robot_id: RobotId, status: RobotStatus) -> Result<(), DomainError> {
        let mut records = self.records.write();
        let record = records
            .get_mut(&robot_id)
            .ok_or_else(|| DomainError::NotFound { entity: "robot", id: robot_id.to_string() })?;
        let from = record.robot.status;
        record.robot.set_status(status);
        if from != status {
            self.publish(FleetEvent::RobotTransitioned { robot_id, from, to: status });
        }
        Ok(())
    }

    pub fn get(&self, robot_id: RobotId) -> Option<Robot> {
        self.records.read().get(&robot_id).map(|r| r.robot.clone())
    }

    /// Immutable point-in-time view safe to pass to the Selection Service.
    pub fn snapshot(&self) -> RegistrySnapshot {
        let records = self.records.read();
        RegistrySnapshot { robots: records.values().map(|r| r.robot.clone()).collect() }
    }

    /// Mark any robot whose last heartbeat is older than `timeout` Offline.
    /// Returns the id and post-transition state of each robot that went
    /// offline this sweep, so the caller (Dispatcher) can recover their
    /// in-flight jobs.
    pub fn sweep(&self, timeout: Duration) -> Vec<(RobotId, Robot)> {
        let now = self.clock.now();
        let mut went_offline = Vec::new();
        let mut records = self.records.write();
        for (id, record) in records.iter_mut() {
            if record.robot.status == RobotStatus::Offline {
                continue;
            }
            if now.saturating_duration_since(record.last_heartbeat_monotonic) >= timeout {
                let from = record.robot.status;
                record.robot.mark_offline();
                record.connection = None;
                went_offline.push((*id, record.robot.clone()));
                warn!(robot_id = %id, "robot heartbeat stale, marking offline");
                self.publish(FleetEvent::RobotTransitioned { robot_id: *id, from, to: RobotStatus::Offline });
            }
        }
        went_offline
    }
}

/// Spawn the periodic heartbeat sweep task (default every 30s). Every robot
/// the sweep marks Offline is handed to `loss_handler` so its in-flight job
/// is recovered exactly as the explicit-disconnect path in
/// `casare-protocol::connection::graceful_close` already does. Returns a
/// handle the daemon holds to abort on shutdown.
pub fn spawn_sweep_loop<C, K, H>(
    registry: Arc<Registry<C, K>>,
    loss_handler: Arc<H>,
    sweep_interval: Duration,
    heartbeat_timeout: Duration,
) -> tokio::task::JoinHandle<()>
where
    C: Clone + Send + Sync + 'static,
    K: Clock + 'static,
    H: RobotLossHandler + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_interval);
        loop {
            interval.tick().await;
            let offline = registry.sweep(heartbeat_timeout);
            if !offline.is_empty() {
                info!(count = offline.len(), "heartbeat sweep marked robots offline");
            }
            for (robot_id, robot) in &offline {
                loss_handler.handle_robot_lost(*robot_id, robot).await;
            }
        }
    })
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
