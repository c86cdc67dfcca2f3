// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TriggerHttpError {
    #[error("unknown trigger")]
    NotFound,
    #[error("missing or incorrect X-Webhook-Secret header")]
    Unauthorized,
    #[error(transparent)]
    Cooldown(#[from] casare_core::CooldownActive),
    #[error("storage error: {0}")]
    Storage(#[from] casare_storage::StorageError),
    #[error("queue error: {0}")]
    Queue(#[from] casare_queue::QueueError),
}
