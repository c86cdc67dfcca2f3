// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup, wiring, and shutdown.
//!
//! Constructs every component named in spec.md §2 exactly once, wires them
//! together via `Arc`-shared storage/queue/registry, spawns one task per
//! long-running loop (registry sweep, scheduler tick, dispatcher tick,
//! protocol server, webhook server, admin listener), and tears them down
//! cleanly on shutdown signal.

use std::path::PathBuf;
use std::sync::Arc;

use casare_core::{JobStatus, SystemClock};
use casare_dispatcher::{Dispatcher, DispatcherConfig};
use casare_protocol::{ProtocolConfig, ProtocolServer, RobotConnectionHandle};
use casare_queue::JobQueue;
use casare_registry::Registry;
use casare_scheduler::Scheduler;
use casare_storage::{
    AssignmentRepository, DurableStore, JobRepository, RobotRepository, ScheduleRepository,
    TriggerRepository, WorkflowRepository,
};
use casare_triggers::TriggerContext;
use fs2::FileExt;
use thiserror::Error;
use tokio::net::{TcpListener, UnixListener};
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::admin;
use crate::config::Config;
use crate::log_archive::LogArchive;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("another casared instance holds the lock at {0}")]
    LockFailed(PathBuf),
    #[error("storage error: {0}")]
    Storage(#[from] casare_storage::StorageError),
    #[error("queue error: {0}")]
    Queue(#[from] casare_queue::QueueError),
    #[error("failed to bind admin socket {path}: {source}")]
    AdminBind { path: PathBuf, source: std::io::Error },
}

/// Every spawned task handle plus shared state a clean shutdown needs.
pub struct Orchestrator {
    pub config: Config,
    pub storage: Arc<DurableStore>,
    pub queue: Arc<JobQueue>,
    pub registry: Arc<Registry<RobotConnectionHandle, SystemClock>>,
    pub dispatcher: Arc<Dispatcher<RobotConnectionHandle, SystemClock>>,
    pub events: broadcast::Sender<casare_core::FleetEvent>,
    tasks: Vec<tokio::task::JoinHandle<()>>,
    lock_file: std::fs::File,
}

impl Orchestrator {
    /// Bring up every component and start serving. Returns once all
    /// listeners are bound; the caller awaits `run_until_shutdown`.
    pub async fn start(config: Config) -> Result<Self, LifecycleError> {
        std::fs::create_dir_all(&config.state_dir)?;

        let lock_path = config.state_dir.join("casared.lock");
        let lock_file = std::fs::OpenOptions::new().write(true).create(true).truncate(false).open(&lock_path)?;
        lock_file.try_lock_exclusive().map_err(|_| LifecycleError::LockFailed(lock_path.clone()))?;
        {
            use std::io::Write;
            let mut f = &lock_file;
            f.set_len(0)?;
            writeln!(f, "{}", std::process::id())?;
        }

        let storage = Arc::new(DurableStore::open(config.state_dir.join("data"))?);
        let clock = SystemClock;
        let (events, _) = broadcast::channel(1024);

        let queue = Arc::new(JobQueue::new());
        recover_queue(&storage, &queue, &clock).await?;

        let registry: Arc<Registry<RobotConnectionHandle, SystemClock>> =
            Arc::new(Registry::new(clock.clone(), events.clone()));

        let jobs: Arc<dyn JobRepository> = storage.clone();
        let robots: Arc<dyn RobotRepository> = storage.clone();
        let schedules: Arc<dyn ScheduleRepository> = storage.clone();
        let workflows: Arc<dyn WorkflowRepository> = storage.clone();
        let triggers: Arc<dyn TriggerRepository> = storage.clone();
        let assignments: Arc<dyn AssignmentRepository> = storage.clone();

        let dispatcher_config = DispatcherConfig {
            dispatch_interval: config.dispatch_interval,
            assign_ack_timeout: config.assign_ack_timeout,
            default_job_timeout: config.default_job_timeout,
            cancel_grace: config.cancel_grace,
            max_reject_retries: config.max_reject_retries,
            skip_unavailable: false,
        };
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&queue),
            Arc::clone(&registry),
            Arc::clone(&jobs),
            Arc::clone(&assignments),
            Arc::clone(&workflows),
            clock.clone(),
            events.clone(),
            dispatcher_config,
        ));

        let mut tasks = Vec::new();

        tasks.push(casare_registry::spawn_sweep_loop(
            Arc::clone(&registry),
            Arc::clone(&dispatcher),
            config.heartbeat_sweep_interval,
            config.heartbeat_timeout,
        ));

        let scheduler = Arc::new(Scheduler::new(Arc::clone(&schedules), Arc::clone(&queue), clock.clone()));
        tasks.push(casare_scheduler::spawn_tick_loop(scheduler, config.scheduler_tick));

        {
            let dispatcher = Arc::clone(&dispatcher);
            let interval = config.dispatch_interval;
            tasks.push(tokio::spawn(async move {
                let mut ticker = tokio::time::interval(interval);
                loop {
                    ticker.tick().await;
                    if let Err(err) = dispatcher.tick().await {
                        warn!(%err, "dispatcher tick failed");
                    }
                }
            }));
        }

        {
            let storage = Arc::clone(&storage);
            let interval = config.checkpoint_interval;
            tasks.push(tokio::spawn(async move {
                let mut ticker = tokio::time::interval(interval);
                loop {
                    ticker.tick().await;
                    if let Err(err) = storage.checkpoint() {
                        warn!(%err, "checkpoint failed");
                    }
                }
            }));
        }

        let protocol_config = ProtocolConfig {
            bind_addr: config.websocket_bind,
            rate_limit_max: 100,
            rate_limit_window: std::time::Duration::from_secs(60),
            registration_timeout: std::time::Duration::from_secs(15),
            log_sink_capacity: config.log_buffer_size,
        };
        let (protocol_server, log_rx) = ProtocolServer::new(
            Arc::clone(&registry),
            Arc::clone(&dispatcher),
            Arc::clone(&robots),
            clock.clone(),
            protocol_config,
        );
        let protocol_listener = TcpListener::bind(config.websocket_bind).await?;
        info!(addr = %config.websocket_bind, "robot protocol server listening");
        tasks.push(tokio::spawn(async move {
            if let Err(err) = Arc::new(protocol_server).serve(protocol_listener).await {
                warn!(%err, "robot protocol server stopped");
            }
        }));

        let log_archive = LogArchive::open(config.state_dir.join("logs"), config.log_retention_days)?;
        tasks.push(log_archive.spawn_drain(log_rx));
        tasks.push(log_archive.spawn_retention_sweep());

        let trigger_ctx = Arc::new(TriggerContext {
            triggers,
            queue: Arc::clone(&queue),
            clock: clock.clone(),
            shared_secret: config.webhook_shared_secret.clone(),
        });
        let webhook_addr = config.webhook_bind;
        tasks.push(tokio::spawn(async move {
            if let Err(err) = casare_triggers::serve(trigger_ctx, webhook_addr).await {
                warn!(%err, "webhook server stopped");
            }
        }));

        if config.admin_socket_path.exists() {
            std::fs::remove_file(&config.admin_socket_path)?;
        }
        let admin_listener = UnixListener::bind(&config.admin_socket_path)
            .map_err(|source| LifecycleError::AdminBind { path: config.admin_socket_path.clone(), source })?;
        info!(path = %config.admin_socket_path.display(), "admin socket listening");
        let admin_state = admin::AdminState {
            jobs,
            robots,
            schedules,
            workflows,
            assignments,
            queue: Arc::clone(&queue),
            dispatcher: Arc::clone(&dispatcher),
            clock: clock.clone(),
        };
        tasks.push(tokio::spawn(admin::serve(admin_listener, admin_state)));

        Ok(Self { config, storage, queue, registry, dispatcher, events, tasks, lock_file })
    }

    /// Block until a shutdown signal arrives, then checkpoint and clean up.
    pub async fn run_until_shutdown(mut self) -> Result<(), LifecycleError> {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
        info!("shutdown signal received, draining");
        for task in self.tasks.drain(..) {
            task.abort();
        }
        self.storage.checkpoint()?;
        let _ = std::fs::remove_file(&self.config.admin_socket_path);
        self.lock_file.unlock().ok();
        Ok(())
    }
}

/// On restart, rebuild the in-memory Job Queue from any jobs persisted as
/// `Queued`. `Pending` jobs (submitted but never queued) and `Running` jobs
/// whose robot is gone are left for the robot-loss path to reconcile once
/// the registry observes the robot is absent.
async fn recover_queue(
    storage: &DurableStore,
    queue: &JobQueue,
    clock: &SystemClock,
) -> Result<(), LifecycleError> {
    use casare_core::Clock;
    let now = clock.utc_now();
    let queued = JobRepository::by_status(storage, JobStatus::Queued).await?;
    let count = queued.len();
    for job in queued {
        queue.enqueue(job, now)?;
    }
    if count > 0 {
        info!(count, "recovered queued jobs from storage on startup");
    }
    Ok(())
}
