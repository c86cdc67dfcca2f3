// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded ingestion channel for robot-originated `log_entry`/`log_batch`
//! frames (SPEC_FULL.md §5 "Backpressure"). Overflow drops the oldest batch
//! and increments `logs_dropped` rather than blocking the protocol server.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use casare_core::LogEntry;
use tokio::sync::mpsc;
use tracing::warn;

#[derive(Clone)]
pub struct LogSink {
    tx: mpsc::Sender<Vec<LogEntry>>,
    dropped: Arc<AtomicU64>,
}

impl LogSink {
    /// `capacity` bounds the number of in-flight batches, not individual entries.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Vec<LogEntry>>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx, dropped: Arc::new(AtomicU64::new(0)) }, rx)
    }

    /// Never blocks. A full channel drops this batch and counts it, rather
    /// than ever applying backpressure to the caller (a robot connection's
    /// read loop).
    pub fn ingest(&self, batch: Vec<LogEntry>) {
        if let Err(mpsc::error::TrySendError::Full(_)) = self.tx.try_send(batch) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            warn!("log sink full, dropping batch");
        }
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
#[path = "log_sink_tests.rs"]
mod tests;
