// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use casare_core::JobBuilder;
use tempfile::tempdir;

#[tokio::test]
async fn save_persists_across_reopen_via_wal_replay() {
    let dir = tempdir().unwrap();
    let job = JobBuilder::default().build();
    {
        let store = DurableStore::open(dir.path()).unwrap();
        JobRepository::save(&store, &job).await.unwrap();
    }

    let reopened = DurableStore::open(dir.path()).unwrap();
    let fetched = JobRepository::get(&reopened, job.id).await.unwrap();
    assert_eq!(fetched, Some(job));
}

#[tokio::test]
async fn checkpoint_then_reopen_skips_replayed_entries() {
    let dir = tempdir().unwrap();
    let job = JobBuilder::default().build();
    {
        let store = DurableStore::open(dir.path()).unwrap();
        JobRepository::save(&store, &job).await.unwrap();
        store.checkpoint().unwrap();
    }

    let reopened = DurableStore::open(dir.path()).unwrap();
    let fetched = JobRepository::get(&reopened, job.id).await.unwrap();
    assert_eq!(fetched, Some(job));
}

#[tokio::test]
async fn delete_after_reopen_is_durable() {
    let dir = tempdir().unwrap();
    let job = JobBuilder::default().build();
    {
        let store = DurableStore::open(dir.path()).unwrap();
        JobRepository::save(&store, &job).await.unwrap();
    }
    {
        let store = DurableStore::open(dir.path()).unwrap();
        JobRepository::delete(&store, job.id).await.unwrap();
    }

    let reopened = DurableStore::open(dir.path()).unwrap();
    assert_eq!(JobRepository::get(&reopened, job.id).await.unwrap(), None);
}
