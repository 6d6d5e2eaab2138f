//! Pending request table - correlation id → resolver
//!
//! # 不変条件
//! - each entry is completed at most once (resolve, reject or evict removes it)
//! - an entry lives exactly as long as its `PendingGuard`; dropping the guard
//!   (timeout, caller gone) evicts it
//! - a reply for an id that is no longer present is reported as late and
//!   never reaches any caller

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;
use tokio::sync::oneshot;

use crate::domain::CorrelationId;
use crate::error::SyncError;

pub type Reply = Result<Value, SyncError>;

struct PendingEntry {
    action: String,
    tx: oneshot::Sender<Reply>,
}

#[derive(Clone, Default)]
pub struct PendingRequests {
    entries: Arc<Mutex<HashMap<CorrelationId, PendingEntry>>>,
}

/// Outcome of routing a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Delivered { action: String },
    /// No entry: the request already timed out, was cancelled or never existed.
    Late,
}

impl PendingRequests {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<CorrelationId, PendingEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register before the request frame is written so a fast reply cannot
    /// race past the entry.
    pub fn register(&self, id: CorrelationId, action: &str) -> PendingGuard {
        let (tx, rx) = oneshot::channel();
        self.lock().insert(
            id.clone(),
            PendingEntry {
                action: action.to_string(),
                tx,
            },
        );
        PendingGuard {
            id,
            table: self.clone(),
            rx,
        }
    }

    pub fn resolve(&self, id: &CorrelationId, reply: Reply) -> Resolution {
        let Some(entry) = self.lock().remove(id) else {
            return Resolution::Late;
        };
        // the receiver may have been dropped between lookup and send; same as late
        match entry.tx.send(reply) {
            Ok(()) => Resolution::Delivered {
                action: entry.action,
            },
            Err(_) => Resolution::Late,
        }
    }

    pub fn evict(&self, id: &CorrelationId) -> bool {
        self.lock().remove(id).is_some()
    }

    /// Reject every outstanding request with `error`. Returns how many.
    pub fn reject_all(&self, error: SyncError) -> usize {
        let drained: Vec<PendingEntry> = self.lock().drain().map(|(_, e)| e).collect();
        let count = drained.len();
        for entry in drained {
            let _ = entry.tx.send(Err(error.clone()));
        }
        count
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Caller's handle on one pending entry.
pub struct PendingGuard {
    id: CorrelationId,
    table: PendingRequests,
    rx: oneshot::Receiver<Reply>,
}

impl PendingGuard {
    pub fn id(&self) -> &CorrelationId {
        &self.id
    }

    /// Wait for the reply. A dropped sender means the entry was torn down
    /// without a reply and reads as `Cancelled`.
    pub async fn reply(&mut self) -> Reply {
        match (&mut self.rx).await {
            Ok(reply) => reply,
            Err(_) => Err(SyncError::Cancelled),
        }
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.table.evict(&self.id);
    }
}
