//! User and user-settings handlers.

use crate::domain::events::{UserSettingsUpdated, UserUpdated};
use crate::store::AppState;
use crate::typed::{RegistryError, TypedRegistry};

pub fn register(registry: &mut TypedRegistry) -> Result<(), RegistryError> {
    registry.register::<UserUpdated, _>(|state: &mut AppState, e: UserUpdated| {
        state.user = Some(e.0)
    })?;
    registry.register::<UserSettingsUpdated, _>(on_settings_updated)?;
    Ok(())
}

/// Field-by-field merge of preferences. Navigation stays client-owned, set
/// or not.
pub fn on_settings_updated(state: &mut AppState, event: UserSettingsUpdated) {
    state.settings.merge_broadcast(event.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{WorkflowId, WorkspaceId};
    use serde_json::json;

    fn registry() -> TypedRegistry {
        let mut registry = TypedRegistry::new();
        register(&mut registry).unwrap();
        registry
    }

    #[test]
    fn broadcast_does_not_change_active_workspace() {
        let registry = registry();
        let mut state = AppState::default();
        state.settings.workspace_id = Some(WorkspaceId::new("ws-active"));
        state.settings.workflow_id = Some(WorkflowId::new("w-active"));

        registry.dispatch(
            &mut state,
            "user.settings.updated",
            json!({
                "workspace_id": "ws-other",
                "workflow_id": "w-other",
                "preferred_shell": "zsh"
            }),
        );

        assert_eq!(state.settings.workspace_id, Some(WorkspaceId::new("ws-active")));
        assert_eq!(state.settings.workflow_id, Some(WorkflowId::new("w-active")));
        assert_eq!(state.settings.preferred_shell.as_deref(), Some("zsh"));
    }

    #[test]
    fn broadcast_does_not_select_a_workspace() {
        let registry = registry();
        let mut state = AppState::default();

        registry.dispatch(
            &mut state,
            "user.settings.updated",
            json!({ "workspace_id": "ws-stale", "workflow_id": "w-stale" }),
        );

        assert_eq!(state.settings.workspace_id, None);
        assert_eq!(state.settings.workflow_id, None);
    }

    #[test]
    fn user_update_replaces_user() {
        let registry = registry();
        let mut state = AppState::default();
        registry.dispatch(&mut state, "user.updated", json!({ "id": "u1", "name": "Ada" }));
        assert_eq!(state.user.unwrap().name.as_deref(), Some("Ada"));
    }
}
