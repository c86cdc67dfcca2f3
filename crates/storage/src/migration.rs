// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schema migrations for on-disk snapshots, so `casare-daemon` upgrades can
//! read snapshots written by an older binary.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MigrationError {
    #[error("snapshot version {0} is newer than the running binary's {1}")]
    TooNew(u32, u32),
    #[error("no migration path from version {0} to {1}")]
    NoPath(u32, u32),
}

/// One version-to-version upgrade step over the raw snapshot JSON.
pub trait Migration: Send + Sync {
    fn source_version(&self) -> u32;
    fn target_version(&self) -> u32;
    fn migrate(&self, snapshot: &mut Value) -> Result<(), MigrationError>;
}

/// Chains registered [`Migration`]s to bring a snapshot up to the current version.
#[derive(Default)]
pub struct MigrationRegistry {
    pub(crate) migrations: Vec<Box<dyn Migration>>,
}

impl MigrationRegistry {
    pub fn new() -> Self {
        Self { migrations: Vec::new() }
    }

    pub fn register(&mut self, migration: Box<dyn Migration>) {
        self.migrations.push(migration);
    }

    /// Migrate `snapshot` (expected to carry a top-level `"v"` field) from
    /// its current version to `target_version`, applying each registered
    /// step in sequence. A no-op if already at `target_version`.
    pub fn migrate_to(&self, mut snapshot: Value, target_version: u32) -> Result<Value, MigrationError> {
        let mut current_version = snapshot
            .get("v")
            .and_then(Value::as_u64)
            .map(|v| v as u32)
            .unwrap_or(target_version);

        if current_version == target_version {
            return Ok(snapshot);
        }
        if current_version > target_version {
            return Err(MigrationError::TooNew(current_version, target_version));
        }

        while current_version < target_version {
            let step = self
                .migrations
                .iter()
                .find(|m| m.source_version() == current_version)
                .ok_or(MigrationError::NoPath(current_version, target_version))?;
            step.migrate(&mut snapshot)?;
            current_version = step.target_version();
            if let Some(obj) = snapshot.as_object_mut() {
                obj.insert("v".into(), current_version.into());
            }
        }
        Ok(snapshot)
    }
}

#[cfg(test)]
#[path = "migration_tests.rs"]
mod tests;
