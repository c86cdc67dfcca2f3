// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use casare_core::{FakeClock, LogLevel, RobotId};
use casare_dispatcher::{Dispatcher, DispatcherConfig};
use casare_queue::JobQueue;
use casare_storage::MemoryStore;
use casare_wire::{Envelope, RobotMessage};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;
type WsWrite = SplitSink<WsStream, WsMessage>;
type WsRead = SplitStream<WsStream>;

async fn spawn_server() -> (SocketAddr, mpsc::Receiver<Vec<LogEntry>>) {
    let clock = FakeClock::new();
    clock.set_epoch_ms(1_700_000_000_000);
    let store = Arc::new(MemoryStore::new());
    let (events_tx, _events_rx) = tokio::sync::broadcast::channel(64);

    let registry = Arc::new(Registry::new(clock.clone(), events_tx.clone()));
    let queue = Arc::new(JobQueue::new());
    let dispatcher = Arc::new(Dispatcher::new(
        queue,
        registry.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        clock.clone(),
        events_tx,
        DispatcherConfig::default(),
    ));

    let config = ProtocolConfig { bind_addr: "127.0.0.1:0".parse().unwrap(), ..Default::default() };
    let (server, log_rx) = ProtocolServer::new(registry, dispatcher, store, clock, config);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = Arc::new(server);
    tokio::spawn(async move {
        let _ = server.serve(listener).await;
    });
    (addr, log_rx)
}

async fn connect_and_register(addr: SocketAddr, robot_id: RobotId) -> (WsWrite, WsRead) {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/")).await.unwrap();
    let (mut write, mut read) = ws.split();

    let register = Envelope::new(RobotMessage::Register {
        robot_id,
        name: "robot-1".into(),
        environment: "prod".into(),
        max_concurrent_jobs: 2,
        tags: vec!["extra".into()],
        capabilities: vec!["browser".into(), "gpu".into()],
        tenant_id: None,
    });
    write.send(WsMessage::Text(serde_json::to_string(&register).unwrap())).await.unwrap();

    let reply = read.next().await.unwrap().unwrap();
    let WsMessage::Text(text) = reply else { panic!("expected text frame") };
    let envelope: Envelope = serde_json::from_str(&text).unwrap();
    assert!(matches!(envelope.message, RobotMessage::RegisterAck { success: true, .. }));

    (write, read)
}

#[tokio::test]
async fn register_then_heartbeat_round_trip() {
    let (addr, _log_rx) = spawn_server().await;
    let robot_id = RobotId::new();
    let (mut write, mut read) = connect_and_register(addr, robot_id).await;

    let heartbeat = Envelope::new(RobotMessage::Heartbeat {
        robot_id,
        status: "online".into(),
        current_jobs: 0,
        cpu_percent: Some(10.0),
        mem_percent: Some(20.0),
        disk_percent: Some(30.0),
        active_job_ids: vec![],
    });
    write.send(WsMessage::Text(serde_json::to_string(&heartbeat).unwrap())).await.unwrap();

    let reply = read.next().await.unwrap().unwrap();
    let WsMessage::Text(text) = reply else { panic!("expected text frame") };
    let envelope: Envelope = serde_json::from_str(&text).unwrap();
    assert!(matches!(envelope.message, RobotMessage::HeartbeatAck { robot_id: r } if r == robot_id));
}

#[tokio::test]
async fn log_batch_reaches_the_log_sink() {
    let (addr, mut log_rx) = spawn_server().await;
    let robot_id = RobotId::new();
    let (mut write, _read) = connect_and_register(addr, robot_id).await;

    let batch = Envelope::new(RobotMessage::LogBatch {
        robot_id,
        entries: vec![LogEntry {
            level: LogLevel::Info,
            message: "hello from robot".into(),
            timestamp: chrono::Utc::now(),
            job_id: None,
            robot_id,
            tenant_id: None,
            node_id: None,
        }],
    });
    write.send(WsMessage::Text(serde_json::to_string(&batch).unwrap())).await.unwrap();

    let received = tokio::time::timeout(std::time::Duration::from_secs(2), log_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].message, "hello from robot");
}

#[tokio::test]
async fn disconnect_is_handled_without_panicking() {
    let (addr, _log_rx) = spawn_server().await;
    let robot_id = RobotId::new();
    let (mut write, _read) = connect_and_register(addr, robot_id).await;

    // Closing should drive the server's graceful-close path (mark offline,
    // recover in-flight jobs); deeper state assertions belong to
    // casare-dispatcher's own robot-loss tests.
    write.close().await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
}
