// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only write-ahead log of [`StorageEvent`]s, the durability backbone
//! behind the WAL-backed repository implementation in `durable.rs`. One
//! line of JSON per entry; an advisory exclusive file lock (via `fs2`)
//! guards against two daemon processes sharing a state directory.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::event::StorageEvent;

#[derive(Debug, Error)]
pub enum WalError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed wal entry: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("wal file {0} is locked by another process")]
    Locked(PathBuf),
}

/// A single durable record: the event plus its monotonic sequence number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalEntry {
    pub seq: u64,
    pub event: StorageEvent,
}

/// Append-only event log with replay-from-sequence recovery.
pub struct Wal {
    file: File,
    entries: Vec<WalEntry>,
    read_cursor: usize,
    write_seq: u64,
    processed_seq: u64,
}

impl Wal {
    /// Open (creating if absent) the WAL at `path`. `processed_seq` is the
    /// last sequence number already folded into a snapshot — entries at or
    /// below it are skipped by [`Self::next_unprocessed`].
    pub fn open(path: impl AsRef<Path>, processed_seq: u64) -> Result<Self, WalError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let existing = if path.exists() {
            let file = File::open(path)?;
            let reader = BufReader::new(file);
            let mut entries = Vec::new();
            for line in reader.lines() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                entries.push(serde_json::from_str::<WalEntry>(&line)?);
            }
            entries
        } else {
            Vec::new()
        };

        let file = OpenOptions::new().create(true).append(true).read(true).open(path)?;
        file.try_lock_exclusive().map_err(|_| WalError::Locked(path.to_path_buf()))?;

        let write_seq = existing.last().map(|e| e.seq).unwrap_or(0);
        let read_cursor = existing.iter().position(|e| e.seq > processed_seq).unwrap_or(existing.len());

        Ok(Self { file, entries: existing, read_cursor, write_seq, processed_seq })
    }

    /// Append one event, returning its assigned sequence number. Not
    /// durable until [`Self::flush`] is called.
    pub fn append(&mut self, event: &StorageEvent) -> Result<u64, WalError> {
        let seq = self.write_seq + 1;
        let entry = WalEntry { seq, event: event.clone() };
        let mut line = serde_json::to_vec(&entry)?;
        line.push(b'\n');
        self.file.write_all(&line)?;
        self.write_seq = seq;
        self.entries.push(entry);
        Ok(seq)
    }

    /// Fsync pending writes, satisfying the write-through requirement of
    /// a `save` must durably commit before the method returns.
    pub fn flush(&mut self) -> Result<(), WalError> {
        self.file.flush()?;
        self.file.sync_all()?;
        Ok(())
    }

    /// Pop the next entry the caller hasn't seen yet (whether fresh since
    /// this process's `open`, or recovered from a prior crash).
    pub fn next_unprocessed(&mut self) -> Result<Option<WalEntry>, WalError> {
        if self.read_cursor >= self.entries.len() {
            return Ok(None);
        }
        let entry = self.entries[self.read_cursor].clone();
        self.read_cursor += 1;
        Ok(Some(entry))
    }

    /// Record that entries up to and including `seq` have been folded into
    /// a snapshot, so a future reopen can skip them.
    pub fn mark_processed(&mut self, seq: u64) {
        self.processed_seq = seq;
    }

    pub fn write_seq(&self) -> u64 {
        self.write_seq
    }

    pub fn processed_seq(&self) -> u64 {
        self.processed_seq
    }
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
