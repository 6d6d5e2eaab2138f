//! Agent and agent-profile handlers.

use crate::domain::events::{
    AgentProfileCreated, AgentProfileDeleted, AgentProfileUpdated, AgentUpdated, AgentsAvailable,
};
use crate::store::AppState;
use crate::store::state::upsert_by;
use crate::typed::{RegistryError, TypedRegistry};

pub fn register(registry: &mut TypedRegistry) -> Result<(), RegistryError> {
    registry.register::<AgentUpdated, _>(|state: &mut AppState, e: AgentUpdated| {
        upsert_by(&mut state.agents, e.0, |a, b| a.id == b.id)
    })?;
    registry.register::<AgentsAvailable, _>(on_agents_available)?;
    registry.register::<AgentProfileCreated, _>(|state: &mut AppState, e: AgentProfileCreated| {
        upsert_by(&mut state.agent_profiles, e.0, |a, b| a.id == b.id)
    })?;
    registry.register::<AgentProfileUpdated, _>(|state: &mut AppState, e: AgentProfileUpdated| {
        upsert_by(&mut state.agent_profiles, e.0, |a, b| a.id == b.id)
    })?;
    registry.register::<AgentProfileDeleted, _>(|state: &mut AppState, e: AgentProfileDeleted| {
        state.agent_profiles.retain(|p| p.id != e.profile_id)
    })?;
    Ok(())
}

/// The backend sends the full list of installed agents; it replaces ours.
pub fn on_agents_available(state: &mut AppState, event: AgentsAvailable) {
    state.agents = event.agents;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> TypedRegistry {
        let mut registry = TypedRegistry::new();
        register(&mut registry).unwrap();
        registry
    }

    #[test]
    fn profile_lifecycle() {
        let registry = registry();
        let mut state = AppState::default();
        let profile = json!({ "id": "p1", "agent_id": "claude", "name": "Default" });

        registry.dispatch(&mut state, "agent.profile.created", profile.clone());
        registry.dispatch(&mut state, "agent.profile.created", profile);
        assert_eq!(state.agent_profiles.len(), 1);

        registry.dispatch(
            &mut state,
            "agent.profile.updated",
            json!({ "id": "p1", "agent_id": "claude", "name": "Fast", "model": "small" }),
        );
        assert_eq!(state.agent_profiles[0].name, "Fast");

        registry.dispatch(&mut state, "agent.profile.deleted", json!({ "profile_id": "p1" }));
        assert!(state.agent_profiles.is_empty());
    }

    #[test]
    fn availability_replaces_agent_list() {
        let registry = registry();
        let mut state = AppState::default();
        registry.dispatch(
            &mut state,
            "agent.updated",
            json!({ "id": "old", "name": "old", "available": true }),
        );
        registry.dispatch(
            &mut state,
            "agent.available",
            json!({ "agents": [{ "id": "new", "name": "new", "available": true }] }),
        );
        assert_eq!(state.agents.len(), 1);
        assert_eq!(state.agents[0].name, "new");
    }
}
