//! Turn handlers: one active turn per session.

use tracing::debug;

use super::transcript::repair_running_tool_calls;
use crate::domain::Turn;
use crate::domain::events::{TurnCompleted, TurnStarted};
use crate::store::AppState;
use crate::store::state::upsert_by;
use crate::typed::{RegistryError, TypedRegistry};

pub fn register(registry: &mut TypedRegistry) -> Result<(), RegistryError> {
    registry.register::<TurnStarted, _>(|state: &mut AppState, e: TurnStarted| {
        on_turn_started(state, e.0)
    })?;
    registry.register::<TurnCompleted, _>(|state: &mut AppState, e: TurnCompleted| {
        on_turn_completed(state, e.0)
    })?;
    Ok(())
}

pub fn on_turn_started(state: &mut AppState, turn: Turn) {
    state
        .active_turns
        .insert(turn.session_id.clone(), turn.id.clone());
    let turns = state.turns.entry(turn.session_id.clone()).or_default();
    upsert_by(turns, turn, |a, b| a.id == b.id);
}

/// Clear the active turn (unless a newer one already started) and repair
/// tool calls left `running`.
pub fn on_turn_completed(state: &mut AppState, turn: Turn) {
    let session_id = turn.session_id.clone();
    if state.active_turns.get(&session_id) == Some(&turn.id) {
        state.active_turns.remove(&session_id);
    } else {
        debug!(
            session_id = %session_id,
            turn_id = %turn.id,
            "completed turn was not the active one"
        );
    }
    let turns = state.turns.entry(session_id.clone()).or_default();
    upsert_by(turns, turn, |a, b| a.id == b.id);
    repair_running_tool_calls(state, &session_id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SessionId, ToolCallStatus, TurnId};
    use crate::handlers::fixtures::tool_call;
    use crate::handlers::transcript::upsert_message;
    use serde_json::json;

    fn registry() -> TypedRegistry {
        let mut registry = TypedRegistry::new();
        register(&mut registry).unwrap();
        registry
    }

    #[test]
    fn completion_clears_active_turn_and_repairs_tool_calls() {
        let registry = registry();
        let mut state = AppState::default();
        let s1 = SessionId::new("s1");

        registry.dispatch(
            &mut state,
            "session.turn.started",
            json!({ "id": "turn1", "session_id": "s1" }),
        );
        assert_eq!(state.active_turns.get(&s1), Some(&TurnId::new("turn1")));

        upsert_message(&mut state, tool_call("tc1", "s1", ToolCallStatus::Running));
        registry.dispatch(
            &mut state,
            "session.turn.completed",
            json!({ "id": "turn1", "session_id": "s1", "completed_at": "2026-05-01T10:00:00Z" }),
        );

        assert!(!state.active_turns.contains_key(&s1));
        assert_eq!(
            state.messages[&s1][0].tool_status,
            Some(ToolCallStatus::Complete)
        );
        assert_eq!(state.turns[&s1].len(), 1);
        assert!(state.turns[&s1][0].completed_at.is_some());
    }

    #[test]
    fn stale_completion_keeps_newer_active_turn() {
        let mut state = AppState::default();
        let s1 = SessionId::new("s1");
        let turn = |id: &str| Turn {
            id: TurnId::new(id),
            session_id: s1.clone(),
            started_at: None,
            completed_at: None,
        };

        on_turn_started(&mut state, turn("a"));
        on_turn_started(&mut state, turn("b"));
        on_turn_completed(&mut state, turn("a"));

        assert_eq!(state.active_turns.get(&s1), Some(&TurnId::new("b")));
    }
}
