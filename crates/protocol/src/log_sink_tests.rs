// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use casare_core::{LogLevel, RobotId};

fn entry() -> LogEntry {
    LogEntry {
        level: LogLevel::Info,
        message: "hello".into(),
        timestamp: chrono::Utc::now(),
        job_id: None,
        robot_id: RobotId::new(),
        tenant_id: None,
        node_id: None,
    }
}

#[tokio::test]
async fn ingests_within_capacity() {
    let (sink, mut rx) = LogSink::new(2);
    sink.ingest(vec![entry()]);
    sink.ingest(vec![entry()]);
    assert_eq!(sink.dropped(), 0);
    assert!(rx.recv().await.is_some());
    assert!(rx.recv().await.is_some());
}

#[tokio::test]
async fn drops_and_counts_past_capacity() {
    let (sink, mut rx) = LogSink::new(1);
    sink.ingest(vec![entry()]);
    sink.ingest(vec![entry()]);
    assert_eq!(sink.dropped(), 1);
    assert!(rx.recv().await.is_some());
    assert!(rx.try_recv().is_err());
}
