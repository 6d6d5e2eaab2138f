//! TypedRegistry - Handler の登録と dispatch
//!
//! # 学習ポイント
//! - HashMap での型消去された trait object の管理
//! - Generic methods での登録と型安全性
//!
//! Built once at startup (mutable), then used read-only by the receive loop.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use super::handler::{DynHandler, Handler, TypedHandler};
use super::notification::Notification;
use crate::store::AppState;

/// RegistryError は TypedRegistry の操作エラー
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Handler for action '{0}' is already registered")]
    AlreadyRegistered(String),
}

/// Result of routing one notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Applied,
    /// No handler for this action (forward compatibility).
    Ignored,
    /// Known action, payload failed to decode; state untouched.
    Malformed(String),
}

#[derive(Default)]
pub struct TypedRegistry {
    handlers: HashMap<&'static str, Arc<dyn DynHandler>>,
}

impl TypedRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn register<N: Notification, H: Handler<N> + 'static>(
        &mut self,
        handler: H,
    ) -> Result<(), RegistryError> {
        if self.handlers.contains_key(N::ACTION) {
            return Err(RegistryError::AlreadyRegistered(N::ACTION.to_string()));
        }
        self.handlers
            .insert(N::ACTION, Arc::new(TypedHandler::<N, H>::new(handler)));
        Ok(())
    }

    pub fn get(&self, action: &str) -> Option<Arc<dyn DynHandler>> {
        self.handlers.get(action).cloned()
    }

    pub fn registered_actions(&self) -> Vec<String> {
        let mut actions: Vec<String> = self.handlers.keys().map(|a| a.to_string()).collect();
        actions.sort();
        actions
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Apply one notification to `state`.
    ///
    /// A malformed payload leaves `state` untouched: the payload is decoded
    /// in full before the handler runs.
    pub fn dispatch(&self, state: &mut AppState, action: &str, payload: Value) -> DispatchOutcome {
        let Some(handler) = self.handlers.get(action) else {
            debug!(action, "no handler registered; ignoring notification");
            return DispatchOutcome::Ignored;
        };
        match handler.apply_dyn(state, payload) {
            Ok(()) => DispatchOutcome::Applied,
            Err(err) => {
                warn!(action, error = %err, "malformed notification payload; skipped");
                DispatchOutcome::Malformed(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::{ExecutorDeleted, WorkflowDeleted};
    use crate::domain::WorkflowId;
    use serde_json::json;

    fn drop_workflow(state: &mut AppState, event: WorkflowDeleted) {
        state.workflows.retain(|w| w.id != event.workflow_id);
    }

    fn drop_executor(state: &mut AppState, event: ExecutorDeleted) {
        state.executors.retain(|e| e.id != event.executor_id);
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = TypedRegistry::new();
        registry.register::<WorkflowDeleted, _>(drop_workflow).unwrap();
        assert!(registry.get("workflow.deleted").is_some());
        assert!(registry.get("workflow.created").is_none());
    }

    #[test]
    fn test_double_registration() {
        let mut registry = TypedRegistry::new();
        registry.register::<WorkflowDeleted, _>(drop_workflow).unwrap();
        let result = registry.register::<WorkflowDeleted, _>(drop_workflow);
        assert!(matches!(result, Err(RegistryError::AlreadyRegistered(_))));
    }

    #[test]
    fn test_registered_actions_sorted() {
        let mut registry = TypedRegistry::new();
        registry.register::<WorkflowDeleted, _>(drop_workflow).unwrap();
        registry.register::<ExecutorDeleted, _>(drop_executor).unwrap();
        assert_eq!(
            registry.registered_actions(),
            vec!["executor.deleted".to_string(), "workflow.deleted".to_string()]
        );
    }

    #[test]
    fn unknown_actions_are_ignored() {
        let registry = TypedRegistry::new();
        let mut state = AppState::default();
        let outcome = registry.dispatch(&mut state, "hologram.updated", json!({}));
        assert_eq!(outcome, DispatchOutcome::Ignored);
    }

    #[test]
    fn malformed_payload_is_reported_not_applied() {
        let mut registry = TypedRegistry::new();
        registry.register::<WorkflowDeleted, _>(drop_workflow).unwrap();

        let mut state = AppState::default();
        state.workflows.push(crate::domain::Workflow {
            id: WorkflowId::new("w1"),
            workspace_id: "ws".into(),
            name: "Board".to_string(),
            description: None,
        });

        let outcome = registry.dispatch(&mut state, "workflow.deleted", json!({ "id": 7 }));
        assert!(matches!(outcome, DispatchOutcome::Malformed(_)));
        assert_eq!(state.workflows.len(), 1);
    }
}
