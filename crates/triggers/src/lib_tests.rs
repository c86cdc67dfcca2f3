// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use axum::body::{self, Body};
use axum::http::Request;
use casare_core::{FakeClock, TriggerBuilder, WorkflowId};
use casare_storage::MemoryStore;
use tower::ServiceExt;

const SECRET: &str = "s3cr3t";

fn ctx_with(trigger: Trigger) -> (Arc<TriggerContext<FakeClock>>, Arc<MemoryStore>) {
    let clock = FakeClock::new();
    clock.set_epoch_ms(1_700_000_000_000);
    let store = Arc::new(MemoryStore::new());
    let ctx = Arc::new(TriggerContext {
        triggers: store.clone(),
        queue: Arc::new(JobQueue::new()),
        clock,
        shared_secret: SECRET.into(),
    });
    (ctx, store)
}

async fn post_webhook(
    ctx: Arc<TriggerContext<FakeClock>>,
    trigger_id: TriggerId,
    secret: Option<&str>,
    body_json: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let app = router(ctx);
    let mut req = Request::builder().method("POST").uri(format!("/webhook/{trigger_id}")).header("content-type", "application/json");
    if let Some(s) = secret {
        req = req.header("x-webhook-secret", s);
    }
    let req = req.body(Body::from(body_json.to_string())).unwrap();
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let parsed = if bytes.is_empty() { serde_json::Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, parsed)
}

fn webhook_trigger() -> Trigger {
    TriggerBuilder::default().workflow_id(WorkflowId::new()).kind(TriggerKind::Webhook).max_events_per_window(2).build()
}

#[tokio::test]
async fn accepts_a_valid_webhook_and_enqueues_a_job() {
    let trigger = webhook_trigger();
    let trigger_id = trigger.id;
    let (ctx, store) = ctx_with(trigger);

    let (status, body) = post_webhook(
        ctx.clone(),
        trigger_id,
        Some(SECRET),
        serde_json::json!({"event_type": "order.created", "data": {"order_id": 42}}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "accepted");
    assert!(body["job_id"].is_string());
    assert_eq!(ctx.queue.size(), 1);

    let stored = store.get(trigger_id).await.unwrap().unwrap();
    assert!(stored.last_fired.is_some());
}

#[tokio::test]
async fn rejects_an_unknown_trigger_with_404() {
    let (ctx, _store) = ctx_with(webhook_trigger());
    let (status, _) =
        post_webhook(ctx, TriggerId::new(), Some(SECRET), serde_json::json!({"event_type": "x"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn rejects_a_wrong_secret_with_400() {
    let trigger = webhook_trigger();
    let trigger_id = trigger.id;
    let (ctx, _store) = ctx_with(trigger);
    let (status, _) =
        post_webhook(ctx, trigger_id, Some("wrong"), serde_json::json!({"event_type": "x"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn rejects_malformed_json_with_400() {
    let trigger = webhook_trigger();
    let trigger_id = trigger.id;
    let (ctx, _store) = ctx_with(trigger);

    let app = router(ctx);
    let req = Request::builder()
        .method("POST")
        .uri(format!("/webhook/{trigger_id}"))
        .header("content-type", "application/json")
        .header("x-webhook-secret", SECRET)
        .body(Body::from("not json"))
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn rate_limits_once_the_cooldown_window_is_exhausted() {
    let trigger = webhook_trigger(); // max_events_per_window = 2
    let trigger_id = trigger.id;
    let (ctx, _store) = ctx_with(trigger);

    for _ in 0..2 {
        let (status, _) =
            post_webhook(ctx.clone(), trigger_id, Some(SECRET), serde_json::json!({"event_type": "x"})).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) =
        post_webhook(ctx.clone(), trigger_id, Some(SECRET), serde_json::json!({"event_type": "x"})).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["status"], "rate_limited");
}
