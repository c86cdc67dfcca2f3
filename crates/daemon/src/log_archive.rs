// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable archive for robot-originated log lines (SPEC_FULL.md "Job &
//! robot log retention"): day-bucketed JSONL files under `logs/`, written
//! via `tracing_appender::rolling::daily`, swept for files older than the
//! configured retention window.

use std::path::PathBuf;
use std::sync::Arc;

use casare_core::LogEntry;
use tokio::sync::mpsc;
use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;

pub struct LogArchive {
    dir: PathBuf,
    retention_days: u32,
    writer: mpsc::UnboundedSender<String>,
    _guard: Arc<WorkerGuard>,
    _drain: tokio::task::JoinHandle<()>,
}

impl LogArchive {
    pub fn open(dir: PathBuf, retention_days: u32) -> std::io::Result<Self> {
        std::fs::create_dir_all(&dir)?;
        let appender = tracing_appender::rolling::daily(&dir, "robot.jsonl");
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);

        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let drain = tokio::task::spawn_blocking(move || {
            use std::io::Write;
            let mut writer = non_blocking;
            while let Some(line) = rx.blocking_recv() {
                if let Err(err) = writeln!(writer, "{line}") {
                    warn!(%err, "failed to write robot log line");
                }
            }
        });

        Ok(Self { dir, retention_days, writer: tx, _guard: Arc::new(guard), _drain: drain })
    }

    /// Spawn the task that forwards every batch the protocol server's log
    /// sink produces into the day-bucketed files.
    pub fn spawn_drain(&self, mut log_rx: mpsc::Receiver<Vec<LogEntry>>) -> tokio::task::JoinHandle<()> {
        let writer = self.writer.clone();
        tokio::spawn(async move {
            while let Some(batch) = log_rx.recv().await {
                for entry in batch {
                    match serde_json::to_string(&entry) {
                        Ok(line) => {
                            if writer.send(line).is_err() {
                                return;
                            }
                        }
                        Err(err) => warn!(%err, "failed to serialize log entry"),
                    }
                }
            }
        })
    }

    /// Spawn the daily sweep that deletes archive files whose modification
    /// time is older than the retention window.
    pub fn spawn_retention_sweep(&self) -> tokio::task::JoinHandle<()> {
        let dir = self.dir.clone();
        let retention_days = self.retention_days;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(std::time::Duration::from_secs(24 * 60 * 60));
            loop {
                ticker.tick().await;
                if let Err(err) = sweep_old_files(&dir, retention_days) {
                    warn!(%err, "log retention sweep failed");
                }
            }
        })
    }
}

fn sweep_old_files(dir: &PathBuf, retention_days: u32) -> std::io::Result<()> {
    let cutoff = std::time::SystemTime::now() - std::time::Duration::from_secs(u64::from(retention_days) * 24 * 60 * 60);
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let metadata = entry.metadata()?;
        if metadata.is_file() {
            if let Ok(modified) = metadata.modified() {
                if modified < cutoff {
                    if let Err(err) = std::fs::remove_file(entry.path()) {
                        warn!(path = %entry.path().display(), %err, "failed to remove expired log file");
                    }
                }
            }
        }
    }
    Ok(())
}
