//! Session handlers: lifecycle, mode, permission prompts and message queue.

use tracing::debug;

use crate::domain::TaskSession;
use crate::domain::events::{
    PermissionRequested, PermissionResolved, QueueStatusChanged, SessionCreated, SessionDeleted,
    SessionModeChanged, SessionStateChanged,
};
use crate::store::AppState;
use crate::store::state::upsert_by;
use crate::typed::{RegistryError, TypedRegistry};

pub fn register(registry: &mut TypedRegistry) -> Result<(), RegistryError> {
    registry.register::<SessionCreated, _>(|state: &mut AppState, e: SessionCreated| {
        state.sessions.insert(e.0.id.clone(), e.0);
    })?;
    registry.register::<SessionStateChanged, _>(on_state_changed)?;
    registry.register::<SessionDeleted, _>(|state: &mut AppState, e: SessionDeleted| {
        state.remove_session(&e.session_id);
    })?;
    registry.register::<SessionModeChanged, _>(|state: &mut AppState, e: SessionModeChanged| {
        state.session_modes.insert(e.session_id, e.mode);
    })?;
    registry.register::<PermissionRequested, _>(|state: &mut AppState, e: PermissionRequested| {
        let pending = state.permissions.entry(e.0.session_id.clone()).or_default();
        upsert_by(pending, e.0, |a, b| a.id == b.id);
    })?;
    registry.register::<PermissionResolved, _>(on_permission_resolved)?;
    registry.register::<QueueStatusChanged, _>(on_queue_status_changed)?;
    Ok(())
}

/// A state change for a session we have never seen creates it.
pub fn on_state_changed(state: &mut AppState, event: SessionStateChanged) {
    let session = state
        .sessions
        .entry(event.session_id.clone())
        .or_insert_with(|| TaskSession {
            id: event.session_id.clone(),
            task_id: event.task_id.clone(),
            state: event.state,
            agent_profile_id: None,
            executor_id: None,
            environment_id: None,
            error_message: None,
            started_at: None,
            updated_at: None,
        });
    session.state = event.state;
    if event.error_message.is_some() || event.state.is_terminal() {
        session.error_message = event.error_message;
    }
}

pub fn on_permission_resolved(state: &mut AppState, event: PermissionResolved) {
    let Some(pending) = state.permissions.get_mut(&event.session_id) else {
        debug!(session_id = %event.session_id, "resolved permission for unknown session");
        return;
    };
    pending.retain(|p| p.id != event.pending_id);
    if pending.is_empty() {
        state.permissions.remove(&event.session_id);
    }
}

/// The queued-message table only holds sessions with a message waiting.
pub fn on_queue_status_changed(state: &mut AppState, event: QueueStatusChanged) {
    let status = event.0;
    if status.is_queued {
        state
            .side
            .queued_messages
            .insert(status.session_id.clone(), status);
    } else {
        state.side.queued_messages.remove(&status.session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SessionId, SessionState};
    use crate::handlers::fixtures::{message, session};
    use crate::handlers::transcript::upsert_message;
    use serde_json::json;

    fn registry() -> TypedRegistry {
        let mut registry = TypedRegistry::new();
        register(&mut registry).unwrap();
        registry
    }

    #[test]
    fn state_change_for_unknown_session_creates_it() {
        let registry = registry();
        let mut state = AppState::default();
        registry.dispatch(
            &mut state,
            "session.state_changed",
            json!({ "session_id": "s1", "task_id": "t1", "state": "RUNNING" }),
        );
        let s = &state.sessions[&SessionId::new("s1")];
        assert_eq!(s.state, SessionState::Running);
    }

    #[test]
    fn failure_keeps_error_message_and_recovery_clears_it() {
        let mut state = AppState::default();
        state.sessions.insert(SessionId::new("s1"), session("s1", "t1"));

        on_state_changed(
            &mut state,
            SessionStateChanged {
                session_id: "s1".into(),
                task_id: "t1".into(),
                state: SessionState::Failed,
                error_message: Some("agent crashed".to_string()),
            },
        );
        assert_eq!(
            state.sessions[&SessionId::new("s1")].error_message.as_deref(),
            Some("agent crashed")
        );

        on_state_changed(
            &mut state,
            SessionStateChanged {
                session_id: "s1".into(),
                task_id: "t1".into(),
                state: SessionState::Cancelled,
                error_message: None,
            },
        );
        assert!(state.sessions[&SessionId::new("s1")].error_message.is_none());
    }

    #[test]
    fn permission_prompt_lifecycle() {
        let registry = registry();
        let mut state = AppState::default();
        let prompt = json!({
            "id": "perm1",
            "session_id": "s1",
            "title": "Run cargo test?",
            "options": [{ "option_id": "allow", "name": "Allow" }]
        });
        registry.dispatch(&mut state, "session.permission.requested", prompt.clone());
        registry.dispatch(&mut state, "session.permission.requested", prompt);
        assert_eq!(state.permissions[&SessionId::new("s1")].len(), 1);

        registry.dispatch(
            &mut state,
            "session.permission.resolved",
            json!({ "session_id": "s1", "pending_id": "perm1" }),
        );
        assert!(state.permissions.is_empty());
    }

    #[test]
    fn queue_status_tracks_only_waiting_messages() {
        let registry = registry();
        let mut state = AppState::default();
        registry.dispatch(
            &mut state,
            "message.queue.status_changed",
            json!({ "session_id": "s1", "is_queued": true, "message": { "content": "next" } }),
        );
        assert!(state.side.queued_messages.contains_key(&SessionId::new("s1")));

        registry.dispatch(
            &mut state,
            "message.queue.status_changed",
            json!({ "session_id": "s1", "is_queued": false }),
        );
        assert!(state.side.queued_messages.is_empty());
    }

    #[test]
    fn session_deleted_purges_its_tables() {
        let registry = registry();
        let mut state = AppState::default();
        let s1 = SessionId::new("s1");
        state.sessions.insert(s1.clone(), session("s1", "t1"));
        state.session_modes.insert(s1.clone(), "plan".to_string());
        upsert_message(&mut state, message("m1", "s1"));

        registry.dispatch(&mut state, "session.deleted", json!({ "session_id": "s1" }));

        assert!(state.sessions.is_empty());
        assert!(state.messages.is_empty());
        assert!(state.session_modes.is_empty());
    }
}
