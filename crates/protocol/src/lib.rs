// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! casare-protocol: the robot WebSocket protocol server (SPEC_FULL.md §4.9).
//!
//! One task per accepted connection (reader + serialized writer), dispatching
//! inbound frames to the Registry, the Dispatcher, or the log sink. Never
//! depends on `casare-daemon`; the daemon only owns startup/shutdown wiring.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod connection;
mod log_sink;
mod rate_limit;

pub use connection::{ConnectionError, RobotConnectionHandle};
pub use log_sink::LogSink;
pub use rate_limit::RateLimiter;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use casare_core::{Clock, LogEntry};
use casare_dispatcher::Dispatcher;
use casare_registry::Registry;
use casare_storage::RobotRepository;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::warn;

use connection::ConnCtx;

/// Tunables, all with SPEC_FULL.md's documented defaults.
#[derive(Debug, Clone)]
pub struct ProtocolConfig {
    pub bind_addr: SocketAddr,
    pub rate_limit_max: u32,
    pub rate_limit_window: Duration,
    pub registration_timeout: Duration,
    pub log_sink_capacity: usize,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8765".parse().expect("valid default bind addr"),
            rate_limit_max: 100,
            rate_limit_window: Duration::from_secs(60),
            registration_timeout: Duration::from_secs(15),
            log_sink_capacity: 1024,
        }
    }
}

/// Accepts robot WebSocket connections and dispatches their frames.
pub struct ProtocolServer<K: Clock> {
    ctx: Arc<ConnCtx<K>>,
}

impl<K: Clock + 'static> ProtocolServer<K> {
    /// Returns the server plus the receiving end of the log sink, which the
    /// daemon is responsible for draining (e.g. to a file via
    /// `tracing-appender`, or onward to a durable sink).
    pub fn new(
        registry: Arc<Registry<RobotConnectionHandle, K>>,
        dispatcher: Arc<Dispatcher<RobotConnectionHandle, K>>,
        robots: Arc<dyn RobotRepository>,
        clock: K,
        config: ProtocolConfig,
    ) -> (Self, mpsc::Receiver<Vec<LogEntry>>) {
        let (log_sink, log_rx) = LogSink::new(config.log_sink_capacity);
        let ctx = Arc::new(ConnCtx { registry, dispatcher, robots, clock, config, log_sink });
        (Self { ctx }, log_rx)
    }

    /// Bind and run the accept loop until the listener errors or the process
    /// shuts down. Each accepted connection is handled in its own task.
    pub async fn serve(self: Arc<Self>, listener: TcpListener) -> std::io::Result<()> {
        loop {
            let (stream, addr) = listener.accept().await?;
            let ctx = Arc::clone(&self.ctx);
            tokio::spawn(async move {
                if let Err(err) = connection::handle_connection(stream, addr, ctx).await {
                    warn!(%addr, %err, "robot connection ended");
                }
            });
        }
    }

    /// Convenience wrapper: bind `config.bind_addr` and serve.
    pub async fn bind_and_serve(self: Arc<Self>) -> std::io::Result<()> {
        let addr = self.ctx.config.bind_addr;
        let listener = TcpListener::bind(addr).await?;
        tracing::info!(%addr, "protocol server listening");
        self.serve(listener).await
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
