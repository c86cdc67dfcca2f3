// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event-sourced persistence for the orchestrator: a write-ahead log of
//! [`event::StorageEvent`]s folds into a [`state::MaterializedState`]
//! snapshot, recoverable after a crash by replaying the log's unprocessed
//! tail. [`ports`] defines the abstract repository traits the rest of the
//! workspace depends on; [`memory::MemoryStore`] and
//! [`durable::DurableStore`] are the two implementations.

pub mod checkpoint;
pub mod durable;
pub mod error;
pub mod event;
pub mod memory;
pub mod migration;
pub mod ports;
pub mod snapshot;
pub mod state;
pub mod wal;

pub use checkpoint::{load_snapshot, Checkpointer};
pub use durable::DurableStore;
pub use error::StorageError;
pub use event::StorageEvent;
pub use memory::MemoryStore;
pub use migration::{Migration, MigrationError, MigrationRegistry};
pub use ports::{
    AssignmentRepository, JobRepository, RobotRepository, ScheduleRepository, TriggerRepository,
    WorkflowRepository,
};
pub use snapshot::{Snapshot, SnapshotError, CURRENT_SNAPSHOT_VERSION};
pub use state::MaterializedState;
pub use wal::{Wal, WalEntry, WalError};
