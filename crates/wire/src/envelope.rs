// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The common envelope wrapping every robot protocol frame.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::message::RobotMessage;

/// A single robot protocol frame: envelope metadata plus a typed payload.
///
/// `id` is sender-assigned and unique per frame; `correlation_id` is set by
/// a reply to echo the `id` of the request it answers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<Uuid>,
    #[serde(flatten)]
    pub message: RobotMessage,
}

impl Envelope {
    pub fn new(message: RobotMessage) -> Self {
        Self { id: Uuid::new_v4(), timestamp: Utc::now(), correlation_id: None, message }
    }

    pub fn reply_to(correlation_id: Uuid, message: RobotMessage) -> Self {
        Self { id: Uuid::new_v4(), timestamp: Utc::now(), correlation_id: Some(correlation_id), message }
    }
}

#[cfg(test)]
#[path = "envelope_tests.rs"]
mod tests;
