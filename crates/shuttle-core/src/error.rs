//! Error taxonomy of the sync engine.
//!
//! No error here is fatal: every caller either recovers through a fallback
//! path or surfaces the error and keeps the last known-good state.

use serde_json::Value;
use thiserror::Error;

use crate::domain::{ErrorPayload, SessionId};

/// ErrorKind は失敗の運用分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No active push channel.
    ChannelUnavailable,
    /// Deadline passed before a matching response arrived.
    Timeout,
    /// The server answered with an explicit error envelope.
    Rejected,
    /// An optimistic mutation was reverted.
    Rollback,
    /// The request was torn down locally (disconnect, dropped caller).
    Cancelled,
    Transport,
    Decode,
}

/// Explicit error returned by the backend.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{code}: {message}")]
pub struct RemoteError {
    pub code: String,
    pub message: String,
    pub details: Option<Value>,
}

impl From<ErrorPayload> for RemoteError {
    fn from(payload: ErrorPayload) -> Self {
        Self {
            code: payload.code,
            message: payload.message,
            details: payload.details,
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum SyncError {
    #[error("push channel is not connected")]
    ChannelUnavailable,

    #[error("request {action} timed out after {timeout_ms}ms")]
    Timeout { action: String, timeout_ms: u64 },

    #[error("request rejected: {0}")]
    Rejected(RemoteError),

    #[error("request cancelled")]
    Cancelled,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("http error: {0}")]
    Http(String),

    #[error("decode error: {0}")]
    Decode(String),
}

impl SyncError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::ChannelUnavailable => ErrorKind::ChannelUnavailable,
            SyncError::Timeout { .. } => ErrorKind::Timeout,
            SyncError::Rejected(_) => ErrorKind::Rejected,
            SyncError::Cancelled => ErrorKind::Cancelled,
            SyncError::Transport(_) | SyncError::Http(_) => ErrorKind::Transport,
            SyncError::Decode(_) => ErrorKind::Decode,
        }
    }

    /// Errors for which a fallback path (HTTP, static defaults) should be tried.
    pub fn is_recoverable_locally(&self) -> bool {
        matches!(
            self,
            SyncError::ChannelUnavailable | SyncError::Transport(_) | SyncError::Http(_)
        )
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Decode(err.to_string())
    }
}

/// Structured error of a user-initiated optimistic mutation.
#[derive(Debug, Clone, Error)]
#[error("{message} (entity={entity_id})")]
pub struct MutationError {
    pub message: String,
    pub entity_id: String,
    pub related_session_id: Option<SessionId>,
    pub rolled_back: bool,
    #[source]
    pub cause: SyncError,
}

impl MutationError {
    pub fn kind(&self) -> ErrorKind {
        if self.rolled_back {
            ErrorKind::Rollback
        } else {
            self.cause.kind()
        }
    }
}
