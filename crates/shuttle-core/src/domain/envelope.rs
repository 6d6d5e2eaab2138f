//! Envelope - push channel の運搬用フォーマット
//!
//! Every frame on the push channel is one JSON envelope:
//! `{ id?, type, action, payload, timestamp }`.
//! Requests carry an `id`; the matching `response`/`error` echoes it.
//! Notifications carry no `id` and are routed by `action` alone.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ids::CorrelationId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Request,
    Response,
    Notification,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CorrelationId>,
    #[serde(rename = "type")]
    pub kind: MessageType,
    pub action: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(default)]
    pub timestamp: String,
}

impl Envelope {
    pub fn request(
        id: CorrelationId,
        action: impl Into<String>,
        payload: Value,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Some(id),
            kind: MessageType::Request,
            action: action.into(),
            payload,
            timestamp: now.to_rfc3339(),
        }
    }

    pub fn notification(action: impl Into<String>, payload: Value, now: DateTime<Utc>) -> Self {
        Self {
            id: None,
            kind: MessageType::Notification,
            action: action.into(),
            payload,
            timestamp: now.to_rfc3339(),
        }
    }

    pub fn response(
        id: CorrelationId,
        action: impl Into<String>,
        payload: Value,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Some(id),
            kind: MessageType::Response,
            action: action.into(),
            payload,
            timestamp: now.to_rfc3339(),
        }
    }

    pub fn error(
        id: CorrelationId,
        action: impl Into<String>,
        error: &ErrorPayload,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Some(id),
            kind: MessageType::Error,
            action: action.into(),
            payload: serde_json::to_value(error).unwrap_or(Value::Null),
            timestamp: now.to_rfc3339(),
        }
    }

    pub fn is_reply(&self) -> bool {
        matches!(self.kind, MessageType::Response | MessageType::Error)
    }
}

/// Payload of an `error` envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}
