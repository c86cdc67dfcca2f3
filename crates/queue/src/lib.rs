// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! casare-queue: the priority queue of ready-to-dispatch jobs.
//!
//! Ordered by `(priority bucket desc, scheduled-start time asc, submission
//! order asc)`. Guarded by a single mutex; enqueue/pop are O(log n) via a
//! sorted insertion point, cancel is O(n) (acceptable at expected fleet
//! sizes).

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::cmp::Ordering;
use std::collections::HashMap;

use casare_core::{DomainError, Job, JobId, JobStatus, Priority};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    /// A non-terminal job with this idempotency key is already queued.
    #[error("idempotency key {0:?} is already queued")]
    DuplicateIdempotencyKey(String),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

struct Entry {
    job: Job,
    seq: u64,
}

impl Entry {
    fn scheduled_start(&self) -> DateTime<Utc> {
        self.job.scheduled_start.unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Ordering key: higher priority first, then earlier scheduled start,
    /// then earlier submission. Implemented as a tuple compared in reverse
    /// so a plain ascending sort puts the dispatch head at index 0.
    fn sort_key(&self) -> (std::cmp::Reverse<Priority>, DateTime<Utc>, u64) {
        (std::cmp::Reverse(self.job.priority), self.scheduled_start(), self.seq)
    }
}

struct Inner {
    entries: Vec<Entry>,
    idempotency_index: HashMap<String, JobId>,
    next_seq: u64,
}

/// The dispatch-ready job queue. Clone to share; internal state is mutex-guarded.
pub struct JobQueue {
    inner: Mutex<Inner>,
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl JobQueue {
    pub fn new() -> Self {
        Self { inner: Mutex::new(Inner { entries: Vec::new(), idempotency_index: HashMap::new(), next_seq: 0 }) }
    }

    /// Enqueue a job. Rejects if a non-terminal job with the same
    /// idempotency key is already queued; transitions `job` to `Queued`.
    pub fn enqueue(&self, mut job: Job, now: DateTime<Utc>) -> Result<(), QueueError> {
        let mut inner = self.inner.lock();
        if let Some(key) = &job.idempotency_key {
            if inner.idempotency_index.contains_key(key) {
                return Err(QueueError::DuplicateIdempotencyKey(key.clone()));
            }
        }
        if job.status == JobStatus::Pending {
            job.transition_to(JobStatus::Queued, now)?;
        }
        let seq = inner.next_seq;
        inner.next_seq += 1;
        if let Some(key) = &job.idempotency_key {
            inner.idempotency_index.insert(key.clone(), job.id);
        }
        let entry = Entry { job, seq };
        let pos = inner.entries.partition_point(|e| e.sort_key() <= entry.sort_key());
        inner.entries.insert(pos, entry);
        Ok(())
    }

    /// Inspect the dispatch head without removing it. Returns `None` if the
    /// queue is empty or the head job's `scheduled_start` is still in the
    /// future (held back until its time arrives, even at `Critical` priority).
    pub fn peek(&self, now: DateTime<Utc>) -> Option<Job> {
        let inner = self.inner.lock();
        let head = inner.entries.first()?;
        if head.scheduled_start() > now {
            return None;
        }
        Some(head.job.clone())
    }

    /// Remove and return the dispatch head, subject to the same
    /// `scheduled_start` holdback as [`Self::peek`].
    pub fn pop(&self, now: DateTime<Utc>) -> Option<Job> {
        let mut inner = self.inner.lock();
        let ready = inner.entries.first().map(|e| e.scheduled_start() <= now).unwrap_or(false);
        if !ready {
            return None;
        }
        let entry = inner.entries.remove(0);
        if let Some(key) = &entry.job.idempotency_key {
            inner.idempotency_index.remove(key);
        }
        Some(entry.job)
    }

    /// Cancel a still-queued job: removes it and transitions it to
    /// `Cancelled`. A no-op (returns `Ok(None)`) if the job is not in the
    /// queue — the caller (Dispatcher) handles already-dispatched jobs.
    /// Idempotent: cancelling twice is a no-op the second time.
    pub fn cancel(&self, job_id: JobId, now: DateTime<Utc>) -> Result<Option<Job>, DomainError> {
        let mut inner = self.inner.lock();
        let Some(pos) = inner.entries.iter().position(|e| e.job.id == job_id) else {
            return Ok(None);
        };
        let mut entry = inner.entries.remove(pos);
        if let Some(key) = &entry.job.idempotency_key {
            inner.idempotency_index.remove(key);
        }
        entry.job.transition_to(JobStatus::Cancelled, now)?;
        Ok(Some(entry.job))
    }

    pub fn size(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Count of currently-queued jobs per priority bucket, for metrics.
    pub fn counts_by_priority(&self) -> HashMap<Priority, usize> {
        let inner = self.inner.lock();
        let mut counts = HashMap::new();
        for entry in &inner.entries {
            *counts.entry(entry.job.priority).or_insert(0) += 1;
        }
        counts
    }
}

/// Implemented so `Priority` sorts naturally inside [`Entry::sort_key`]'s tuple.
impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}
impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.sort_key() == other.sort_key()
    }
}
impl Eq for Entry {}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
