//! Transcript handlers (chat messages, comments, tool calls).
//!
//! Messages are kept per session in arrival order. An update for a known id
//! replaces it in place; an unknown id is appended.

use tracing::debug;

use crate::domain::events::{MessageAdded, MessageUpdated};
use crate::domain::{Message, SessionId, ToolCallStatus};
use crate::store::AppState;
use crate::store::state::upsert_by;
use crate::typed::{RegistryError, TypedRegistry};

pub fn register(registry: &mut TypedRegistry) -> Result<(), RegistryError> {
    registry.register::<MessageAdded, _>(|state: &mut AppState, e: MessageAdded| {
        upsert_message(state, e.0)
    })?;
    registry.register::<MessageUpdated, _>(|state: &mut AppState, e: MessageUpdated| {
        upsert_message(state, e.0)
    })?;
    Ok(())
}

pub fn upsert_message(state: &mut AppState, message: Message) {
    let messages = state.messages.entry(message.session_id.clone()).or_default();
    upsert_by(messages, message, |a, b| a.id == b.id);
}

/// Mark every tool call still `running` in a session as complete.
///
/// Runs once when a turn completes; an update notification for the tool call
/// may have been lost. Returns the number of repaired entries.
pub fn repair_running_tool_calls(state: &mut AppState, session_id: &SessionId) -> usize {
    let Some(messages) = state.messages.get_mut(session_id) else {
        return 0;
    };
    let mut repaired = 0;
    for message in messages.iter_mut().filter(|m| m.is_running_tool_call()) {
        message.tool_status = Some(ToolCallStatus::Complete);
        repaired += 1;
    }
    if repaired > 0 {
        debug!(session_id = %session_id, repaired, "repaired running tool calls");
    }
    repaired
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MessageId;
    use crate::handlers::fixtures::{message, tool_call};

    #[test]
    fn update_replaces_in_place_and_keeps_order() {
        let mut state = AppState::default();
        upsert_message(&mut state, message("m1", "s1"));
        upsert_message(&mut state, message("m2", "s1"));

        let mut edited = message("m1", "s1");
        edited.content = "edited".to_string();
        upsert_message(&mut state, edited);

        let msgs = &state.messages[&SessionId::new("s1")];
        let ids: Vec<&MessageId> = msgs.iter().map(|m| &m.id).collect();
        assert_eq!(ids, vec![&MessageId::new("m1"), &MessageId::new("m2")]);
        assert_eq!(msgs[0].content, "edited");
    }

    #[test]
    fn repair_is_idempotent() {
        let mut state = AppState::default();
        let s1 = SessionId::new("s1");
        upsert_message(&mut state, tool_call("tc1", "s1", ToolCallStatus::Running));
        upsert_message(&mut state, tool_call("tc2", "s1", ToolCallStatus::Error));

        assert_eq!(repair_running_tool_calls(&mut state, &s1), 1);
        assert_eq!(repair_running_tool_calls(&mut state, &s1), 0);
        assert_eq!(
            state.messages[&s1][1].tool_status,
            Some(ToolCallStatus::Error)
        );
    }
}
