// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-robot-connection handling: the state machine, the serialized writer
//! task, and message dispatch to the Registry / Dispatcher / log sink
//! (SPEC_FULL.md §4.9).
//!
//! ```text
//! Connecting ── register → Registering ── register_ack(ok) → Active
//!                                       ╰─ register_ack(fail) → Closed
//! Active ── disconnect/error/close → Closed
//! ```

use std::collections::BTreeSet;
use std::net::SocketAddr;
use std::sync::Arc;

use casare_core::{Capability, Clock, JobError, LogEntry, LogLevel, Robot, RobotId};
use casare_dispatcher::{Dispatcher, RobotChannel};
use casare_registry::{HeartbeatMetrics, Registry};
use casare_storage::RobotRepository;
use casare_wire::{Envelope, RobotMessage};
use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::log_sink::LogSink;
use crate::rate_limit::RateLimiter;
use crate::ProtocolConfig;

/// Outbound send queue capacity per connection. "Soft-capped" per
/// SPEC_FULL.md §5: a full queue means a misbehaving or wedged robot, so
/// `RobotChannel::send` fails loudly rather than buffering without bound.
const SEND_QUEUE_CAPACITY: usize = 256;

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("websocket handshake failed: {0}")]
    Handshake(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("registration timed out")]
    RegistrationTimeout,
    #[error("first frame was not register")]
    ExpectedRegister,
    #[error("registry error: {0}")]
    Domain(#[from] casare_core::DomainError),
    #[error("storage error: {0}")]
    Storage(#[from] casare_storage::StorageError),
    #[error("dispatch error: {0}")]
    Dispatch(#[from] casare_dispatcher::DispatchError),
}

/// Handle to a connected robot's serialized outbound send queue. Cloneable
/// and cheap; every clone shares one writer task per connection, matching
/// the registry's generic connection-handle seam.
#[derive(Clone)]
pub struct RobotConnectionHandle {
    tx: mpsc::Sender<Message>,
}

impl RobotChannel for RobotConnectionHandle {
    fn send(&self, envelope: Envelope) -> Result<(), String> {
        let text = serde_json::to_string(&envelope).map_err(|e| e.to_string())?;
        self.tx.try_send(Message::Text(text)).map_err(|e| e.to_string())
    }
}

/// Shared context handed to every connection task, one per protocol server
/// instance (mirrors the teacher's `ListenCtx` shape).
pub struct ConnCtx<K: Clock> {
    pub registry: Arc<Registry<RobotConnectionHandle, K>>,
    pub dispatcher: Arc<Dispatcher<RobotConnectionHandle, K>>,
    pub robots: Arc<dyn RobotRepository>,
    pub clock: K,
    pub config: ProtocolConfig,
    pub log_sink: LogSink,
}

/// Accept a raw TCP stream, upgrade it to a WebSocket, and run the
/// connection until it closes.
pub async fn handle_connection<K: Clock + 'static>(
    stream: TcpStream,
    addr: SocketAddr,
    ctx: Arc<ConnCtx<K>>,
) -> Result<(), ConnectionError> {
    let ws = tokio_tungstenite::accept_async(stream).await?;
    let (mut write, mut read) = ws.split();

    let (tx, mut rx) = mpsc::channel::<Message>(SEND_QUEUE_CAPACITY);
    let writer = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if write.send(msg).await.is_err() {
                break;
            }
        }
    });
    let handle = RobotConnectionHandle { tx };

    let robot_id = match tokio::time::timeout(ctx.config.registration_timeout, read.next()).await {
        Ok(Some(Ok(Message::Text(text)))) => match register_robot(&text, &handle, &ctx).await {
            Ok(id) => id,
            Err(err) => {
                writer.abort();
                return Err(err);
            }
        },
        Ok(_) => {
            writer.abort();
            return Err(ConnectionError::ExpectedRegister);
        }
        Err(_) => {
            writer.abort();
            return Err(ConnectionError::RegistrationTimeout);
        }
    };
    info!(%robot_id, %addr, "robot active");

    let mut limiter = RateLimiter::new(ctx.config.rate_limit_max, ctx.config.rate_limit_window);
    loop {
        match read.next().await {
            Some(Ok(Message::Text(text))) => {
                if !limiter.allow() {
                    warn!(%robot_id, "rate limit exceeded, dropping frame");
                    let _ = handle.send(Envelope::new(RobotMessage::Error {
                        error_code: casare_wire::ErrorCode::RateLimited,
                        error_message: "rate limit exceeded".into(),
                        details: Default::default(),
                    }));
                    continue;
                }
                if let Err(err) = dispatch_frame(&text, robot_id, &ctx).await {
                    warn!(%robot_id, %err, "error handling inbound frame");
                }
            }
            Some(Ok(Message::Close(_))) | None => break,
            Some(Ok(_)) => {} // ping/pong/binary ignored
            Some(Err(err)) => {
                warn!(%robot_id, %err, "websocket read error");
                break;
            }
        }
    }

    graceful_close(robot_id, &ctx).await;
    writer.abort();
    Ok(())
}

async fn register_robot<K: Clock + 'static>(
    text: &str,
    handle: &RobotConnectionHandle,
    ctx: &ConnCtx<K>,
) -> Result<RobotId, ConnectionError> {
    let envelope: Envelope = match serde_json::from_str(text) {
        Ok(e) => e,
        Err(_) => return Err(ConnectionError::ExpectedRegister),
    };
    let RobotMessage::Register { robot_id, name, environment, max_concurrent_jobs, tags, capabilities, tenant_id } =
        envelope.message
    else {
        return Err(ConnectionError::ExpectedRegister);
    };
    // `tags` is accepted for wire compatibility but has no first-class home in
    // the domain model beyond `environment`/`capabilities`; logged, not stored.
    debug!(%robot_id, ?tags, "register: tags not persisted, logging only");

    let mut robot = Robot::new(robot_id, name, max_concurrent_jobs);
    robot.environment = environment;
    robot.capabilities = parse_capabilities(&capabilities);
    robot.tenant_id = tenant_id;

    ctx.registry.register(robot.clone(), Some(handle.clone()));
    ctx.robots.save(&robot).await?;

    let _ = handle.send(Envelope::new(RobotMessage::RegisterAck {
        robot_id,
        success: true,
        message: "registered".into(),
        config: Default::default(),
    }));
    Ok(robot_id)
}

fn parse_capabilities(tags: &[String]) -> BTreeSet<Capability> {
    tags.iter()
        .filter_map(|t| match t.as_str() {
            "browser" => Some(Capability::Browser),
            "desktop" => Some(Capability::Desktop),
            "gpu" => Some(Capability::Gpu),
            "cloud" => Some(Capability::Cloud),
            other => {
                warn!(capability = other, "unknown capability, ignoring");
                None
            }
        })
        .collect()
}

async fn dispatch_frame<K: Clock + 'static>(
    text: &str,
    robot_id: RobotId,
    ctx: &ConnCtx<K>,
) -> Result<(), ConnectionError> {
    let envelope: Envelope = match serde_json::from_str(text) {
        Ok(e) => e,
        Err(err) => {
            warn!(%robot_id, %err, "invalid json frame");
            return Ok(());
        }
    };

    match envelope.message {
        RobotMessage::Heartbeat { cpu_percent, mem_percent, disk_percent, .. } => {
            ctx.registry.heartbeat(
                robot_id,
                HeartbeatMetrics { cpu_percent, mem_percent, disk_percent },
            )?;
            if let Some(conn) = ctx.registry.connection(robot_id) {
                let _ = conn.send(Envelope::reply_to(envelope.id, RobotMessage::HeartbeatAck { robot_id }));
            }
        }
        RobotMessage::JobAccept { job_id, robot_id: rid } => {
            ctx.dispatcher.handle_job_accept(job_id, rid).await?;
        }
        RobotMessage::JobReject { job_id, robot_id: rid, reason } => {
            ctx.dispatcher.handle_job_reject(job_id, rid, &reason).await?;
        }
        RobotMessage::JobProgress { job_id, progress, current_node, .. } => {
            ctx.dispatcher.handle_job_progress(job_id, progress, current_node).await?;
        }
        RobotMessage::JobComplete { job_id, robot_id: rid, result, .. } => {
            ctx.dispatcher.handle_job_complete(job_id, rid, result).await?;
        }
        RobotMessage::JobFailed { job_id, robot_id: rid, error_message, error_type, failed_node, .. } => {
            ctx.dispatcher
                .handle_job_failed(job_id, rid, JobError { message: error_message, error_type, failed_node })
                .await?;
        }
        RobotMessage::JobCancelled { job_id, robot_id: rid } => {
            ctx.dispatcher.handle_job_cancelled(job_id, rid).await?;
        }
        RobotMessage::LogEntry { job_id, robot_id: rid, level, message, node_id, .. } => {
            let tenant_id = ctx.registry.get(rid).and_then(|r| r.tenant_id);
            ctx.log_sink.ingest(vec![LogEntry {
                level: parse_log_level(&level),
                message,
                timestamp: ctx.clock.utc_now(),
                job_id,
                robot_id: rid,
                tenant_id,
                node_id,
            }]);
        }
        RobotMessage::LogBatch { entries, .. } => {
            ctx.log_sink.ingest(entries);
        }
        RobotMessage::Disconnect { reason, .. } => {
            info!(%robot_id, %reason, "robot requested disconnect");
        }
        RobotMessage::StatusResponse { .. } => {
            debug!(%robot_id, "status response received");
        }
        RobotMessage::Error { error_code, error_message, .. } => {
            warn!(%robot_id, ?error_code, %error_message, "robot reported protocol error");
        }
        other => {
            warn!(%robot_id, kind = other.kind(), "unexpected message direction, ignoring");
        }
    }
    Ok(())
}

fn parse_log_level(level: &str) -> LogLevel {
    serde_json::from_value(serde_json::Value::String(level.to_string())).unwrap_or(LogLevel::Info)
}

/// Flush pending logs (handled by the log sink's own backpressure) and
/// release the robot's in-flight jobs, as a stale heartbeat sweep would.
async fn graceful_close<K: Clock + 'static>(robot_id: RobotId, ctx: &ConnCtx<K>) {
    let Some(robot) = ctx.registry.get(robot_id) else { return };
    if let Err(err) = ctx.registry.set_status(robot_id, casare_core::RobotStatus::Offline) {
        warn!(%robot_id, %err, "failed to mark robot offline on close");
    }
    if let Err(err) = ctx.dispatcher.handle_robot_lost(robot_id, &robot).await {
        warn!(%robot_id, %err, "failed to recover jobs on connection close");
    }
    info!(%robot_id, "robot connection closed");
}

#[cfg(test)]
#[path = "connection_tests.rs"]
mod tests;
