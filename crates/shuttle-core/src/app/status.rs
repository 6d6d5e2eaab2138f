//! Status - 同期状態のスナップショット

use std::fmt;

use serde::Serialize;

use super::context::SyncContext;
use crate::domain::{SessionId, WorkflowId};
use crate::observability::{DispatchCounts, StoreCounts};

/// Point-in-time view of the engine for status output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncStatus {
    pub connection: &'static str,
    pub revision: u64,
    pub active_workflow: Option<WorkflowId>,
    pub active_session: Option<SessionId>,
    pub counts: StoreCounts,
    pub dispatch: DispatchCounts,
}

impl SyncStatus {
    pub fn collect(ctx: &SyncContext) -> Self {
        let (active_workflow, active_session) = ctx.store().read(|state| {
            (
                state.kanban.workflow_id.clone(),
                state.active_session_id.clone(),
            )
        });
        Self {
            connection: ctx.connection().status().as_str(),
            revision: ctx.store().revision(),
            active_workflow,
            active_session,
            counts: ctx.counts(),
            dispatch: ctx.dispatch_counts(),
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rev={} workflow={} tasks={} sessions={} permissions={} pending={} applied={}",
            self.connection,
            self.revision,
            self.active_workflow
                .as_ref()
                .map(|id| id.as_str())
                .unwrap_or("-"),
            self.counts.tasks,
            self.counts.sessions,
            self.counts.pending_permissions,
            self.counts.pending_requests,
            self.dispatch.applied,
        )
    }
}
