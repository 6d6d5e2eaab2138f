use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::store::{AppState, selectors};
use crate::typed::DispatchOutcome;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreCounts {
    pub workflows: usize,
    pub steps: usize,
    pub tasks: usize,
    pub sessions: usize,
    pub messages: usize,
    pub pending_permissions: usize,
    pub pending_requests: usize,
}

impl StoreCounts {
    /// Counts over every loaded view (active and cached).
    pub fn collect(state: &AppState, pending_requests: usize) -> Self {
        Self {
            workflows: state.workflows.len(),
            steps: state.views().map(|v| v.steps.len()).sum(),
            tasks: state.views().map(|v| v.tasks.len()).sum(),
            sessions: state.sessions.len(),
            messages: state.messages.values().map(Vec::len).sum(),
            pending_permissions: selectors::pending_permission_count(state),
            pending_requests,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchCounts {
    pub applied: u64,
    pub ignored: u64,
    pub malformed: u64,
}

/// Running totals of dispatch outcomes, shared with the receive loop.
#[derive(Debug, Default)]
pub struct DispatchStats {
    applied: AtomicU64,
    ignored: AtomicU64,
    malformed: AtomicU64,
}

impl DispatchStats {
    pub fn record(&self, outcome: &DispatchOutcome) {
        let counter = match outcome {
            DispatchOutcome::Applied => &self.applied,
            DispatchOutcome::Ignored => &self.ignored,
            DispatchOutcome::Malformed(_) => &self.malformed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DispatchCounts {
        DispatchCounts {
            applied: self.applied.load(Ordering::Relaxed),
            ignored: self.ignored.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
        }
    }
}
