// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Repository-facing error taxonomy. Callers (scheduler, dispatcher, admin
//! handlers) branch on [`StorageError::is_transient`] to decide whether a
//! failed call is worth retrying.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("wal error: {0}")]
    Wal(#[from] crate::wal::WalError),

    #[error("snapshot error: {0}")]
    Snapshot(#[from] crate::snapshot::SnapshotError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Transient errors (disk contention, momentary IO failure) are worth
    /// retrying with backoff; `NotFound` and corrupt-data
    /// errors are permanent and should propagate to the caller.
    pub fn is_transient(&self) -> bool {
        matches!(self, StorageError::Io(_))
    }
}
