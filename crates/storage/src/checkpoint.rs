// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic snapshot writer. Folding the WAL into a snapshot and truncating
//! the processed prefix keeps recovery time bounded as the log grows.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, warn};

const ZSTD_LEVEL: i32 = 3;

use crate::migration::MigrationRegistry;
use crate::snapshot::{rotate_bak_path, Snapshot, SnapshotError, CURRENT_SNAPSHOT_VERSION};
use crate::state::MaterializedState;

/// Writes and loads snapshots at a fixed path, keeping rotated backups.
pub struct Checkpointer {
    path: PathBuf,
}

impl Checkpointer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Atomically persist `state` as of WAL sequence `seq`: write to a
    /// temp file, back up the prior snapshot, then rename into place.
    pub fn save(&self, state: &MaterializedState, seq: u64) -> Result<(), SnapshotError> {
        let snapshot = Snapshot {
            version: CURRENT_SNAPSHOT_VERSION,
            seq,
            state: state.clone(),
            created_at: Utc::now(),
        };
        let bytes = serde_json::to_vec_pretty(&snapshot)?;

        let tmp_path = self.path.with_extension("tmp");
        let file = File::create(&tmp_path)?;
        let mut encoder = zstd::stream::Encoder::new(file, ZSTD_LEVEL)?;
        encoder.write_all(&bytes)?;
        encoder.finish()?;

        if self.path.exists() {
            let bak_path = rotate_bak_path(&self.path);
            if let Err(err) = fs::rename(&self.path, &bak_path) {
                warn!(path = %self.path.display(), error = %err, "failed to rotate prior snapshot to backup");
            }
        }
        fs::rename(&tmp_path, &self.path)?;
        debug!(seq, path = %self.path.display(), "wrote snapshot");
        Ok(())
    }

    /// Load the snapshot at this path, migrating it to the current schema
    /// version if it was written by an older binary. Returns `None` if no
    /// snapshot exists yet (first run).
    pub fn load(&self, migrations: &MigrationRegistry) -> Result<Option<Snapshot>, SnapshotError> {
        load_snapshot(&self.path, migrations)
    }
}

/// Standalone loader used both by [`Checkpointer::load`] and recovery tools
/// that only need to inspect a snapshot file.
pub fn load_snapshot(
    path: &Path,
    migrations: &MigrationRegistry,
) -> Result<Option<Snapshot>, SnapshotError> {
    if !path.exists() {
        return Ok(None);
    }
    let file = File::open(path)?;
    let mut decoder = zstd::stream::Decoder::new(file)?;
    let mut bytes = Vec::new();
    decoder.read_to_end(&mut bytes)?;
    let raw: serde_json::Value = serde_json::from_slice(&bytes)?;
    let migrated = migrations.migrate_to(raw, CURRENT_SNAPSHOT_VERSION)?;
    let snapshot: Snapshot = serde_json::from_value(migrated)?;
    Ok(Some(snapshot))
}

#[cfg(test)]
#[path = "checkpoint_tests.rs"]
mod tests;
