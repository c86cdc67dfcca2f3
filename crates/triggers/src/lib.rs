// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! casare-triggers: the Trigger Bus's webhook HTTP surface (SPEC_FULL.md §4.7).
//!
//! `POST /webhook/{trigger_id}` materializes and enqueues a [`Job`] from a
//! [`Trigger`]'s configured workflow, subject to the trigger's own cooldown
//! window (`Trigger::try_fire`). File-watch and external-source triggers
//! (`TriggerKind::FileWatch`/`External`) are out of this crate's scope; they
//! share the same `Trigger` entity but have no HTTP surface to serve.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod error;

pub use error::TriggerHttpError;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use casare_core::{Clock, CooldownActive, Job, JobConfig, JobId, Trigger, TriggerId, TriggerKind};
use casare_queue::JobQueue;
use casare_storage::TriggerRepository;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Shared state behind every webhook handler.
pub struct TriggerContext<K: Clock> {
    pub triggers: Arc<dyn TriggerRepository>,
    pub queue: Arc<JobQueue>,
    pub clock: K,
    /// Compared verbatim against the `X-Webhook-Secret` header.
    pub shared_secret: String,
}

/// `POST /webhook/{trigger_id}` body: `{event_type, data, timestamp}`.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    pub event_type: String,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default)]
    pub timestamp: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Serialize)]
struct AcceptedResponse {
    status: &'static str,
    job_id: JobId,
}

#[derive(Serialize)]
struct RateLimitedResponse {
    status: &'static str,
    cooldown_remaining: u64,
}

/// Build the webhook router. A thin binding layer; all the logic lives in
/// [`handle_webhook`] so it can be tested without an HTTP round trip.
pub fn router<K: Clock + 'static>(ctx: Arc<TriggerContext<K>>) -> Router {
    Router::new().route("/webhook/:trigger_id", post(webhook_handler::<K>)).with_state(ctx)
}

/// Bind `bind_addr` and serve the webhook router until the listener errors.
pub async fn serve<K: Clock + 'static>(ctx: Arc<TriggerContext<K>>, bind_addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(bind_addr).await?;
    info!(%bind_addr, "trigger webhook server listening");
    axum::serve(listener, router(ctx)).await
}

async fn webhook_handler<K: Clock + 'static>(
    State(ctx): State<Arc<TriggerContext<K>>>,
    Path(trigger_id): Path<TriggerId>,
    headers: HeaderMap,
    Json(payload): Json<WebhookPayload>,
) -> Response {
    match handle_webhook(&ctx, trigger_id, &headers, payload).await {
        Ok(job_id) => (StatusCode::OK, Json(AcceptedResponse { status: "accepted", job_id })).into_response(),
        Err(TriggerHttpError::NotFound) => StatusCode::NOT_FOUND.into_response(),
        // The documented contract (spec.md §6.2) only names 200/429/404/400;
        // a bad or missing secret folds into the generic 400 bucket rather
        // than introducing an undocumented 401/403.
        Err(TriggerHttpError::Unauthorized) => StatusCode::BAD_REQUEST.into_response(),
        Err(TriggerHttpError::Cooldown(CooldownActive { remaining_seconds })) => (
            StatusCode::TOO_MANY_REQUESTS,
            Json(RateLimitedResponse { status: "rate_limited", cooldown_remaining: remaining_seconds }),
        )
            .into_response(),
        Err(err) => {
            warn!(%trigger_id, %err, "webhook handling failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// The webhook's actual behavior, independent of axum wiring.
async fn handle_webhook<K: Clock>(
    ctx: &TriggerContext<K>,
    trigger_id: TriggerId,
    headers: &HeaderMap,
    payload: WebhookPayload,
) -> Result<JobId, TriggerHttpError> {
    let mut trigger = ctx.triggers.get(trigger_id).await?.ok_or(TriggerHttpError::NotFound)?;
    if !trigger.enabled || !matches!(trigger.kind, TriggerKind::Webhook) {
        return Err(TriggerHttpError::NotFound);
    }

    let provided = headers.get("x-webhook-secret").and_then(|v| v.to_str().ok());
    if provided != Some(ctx.shared_secret.as_str()) {
        return Err(TriggerHttpError::Unauthorized);
    }

    let now = ctx.clock.utc_now();
    trigger.try_fire(now)?;

    let job = materialize(&trigger, &payload, &ctx.clock);
    let job_id = job.id;
    ctx.queue.enqueue(job, now)?;
    ctx.triggers.save(&trigger).await?;
    info!(%trigger_id, %job_id, event_type = %payload.event_type, "webhook fired");
    Ok(job_id)
}

/// Materialize a fired trigger into a still-`Pending` `Job`. Copies the
/// trigger's workflow id and tenant, and folds the webhook payload into the
/// job's parameters so the workflow can read `event_type`/`data`/`timestamp`.
fn materialize(trigger: &Trigger, payload: &WebhookPayload, clock: &impl Clock) -> Job {
    let mut parameters = HashMap::new();
    parameters.insert("event_type".to_string(), serde_json::Value::String(payload.event_type.clone()));
    parameters.insert("data".to_string(), payload.data.clone());
    if let Some(ts) = payload.timestamp {
        parameters.insert("timestamp".to_string(), serde_json::Value::String(ts.to_rfc3339()));
    }

    let mut config = JobConfig::new(trigger.workflow_id, Vec::new());
    config.parameters = parameters;
    config.tenant_id = trigger.tenant_id.clone();
    Job::new(config, clock)
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
