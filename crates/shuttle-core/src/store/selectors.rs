//! Pure reads over an `AppState` snapshot.

use super::state::AppState;
use crate::domain::{
    Agent, Environment, Executor, Message, PendingPermission, QueueStatus, SessionId,
    SessionState, StepId, Task, TaskId, TaskSession, Terminal, TerminalStatus, TurnId,
    WorkflowStep,
};

pub fn active_steps(state: &AppState) -> &[WorkflowStep] {
    &state.kanban.steps
}

pub fn tasks_in_step<'a>(state: &'a AppState, step_id: &StepId) -> Vec<&'a Task> {
    state.kanban.tasks_in_step(step_id)
}

pub fn task<'a>(state: &'a AppState, task_id: &TaskId) -> Option<&'a Task> {
    state.find_task(task_id)
}

/// Sessions of a task, oldest first.
pub fn sessions_for_task<'a>(state: &'a AppState, task_id: &TaskId) -> Vec<&'a TaskSession> {
    let mut sessions: Vec<&TaskSession> = state
        .sessions
        .values()
        .filter(|s| &s.task_id == task_id)
        .collect();
    sessions.sort_by(|a, b| a.started_at.cmp(&b.started_at).then_with(|| a.id.cmp(&b.id)));
    sessions
}

pub fn primary_session<'a>(state: &'a AppState, task_id: &TaskId) -> Option<&'a TaskSession> {
    let primary = task(state, task_id)?.primary_session_id.as_ref()?;
    state.sessions.get(primary)
}

pub fn active_session(state: &AppState) -> Option<&TaskSession> {
    state
        .active_session_id
        .as_ref()
        .and_then(|id| state.sessions.get(id))
}

pub fn session_messages<'a>(state: &'a AppState, session_id: &SessionId) -> &'a [Message] {
    state
        .messages
        .get(session_id)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

pub fn running_tool_calls<'a>(state: &'a AppState, session_id: &SessionId) -> Vec<&'a Message> {
    session_messages(state, session_id)
        .iter()
        .filter(|m| m.is_running_tool_call())
        .collect()
}

pub fn active_turn<'a>(state: &'a AppState, session_id: &SessionId) -> Option<&'a TurnId> {
    state.active_turns.get(session_id)
}

/// The agent is working: a turn is open or the session reports running.
pub fn is_session_busy(state: &AppState, session_id: &SessionId) -> bool {
    active_turn(state, session_id).is_some()
        || state
            .sessions
            .get(session_id)
            .is_some_and(|s| matches!(s.state, SessionState::Starting | SessionState::Running))
}

pub fn pending_permissions<'a>(
    state: &'a AppState,
    session_id: &SessionId,
) -> &'a [PendingPermission] {
    state
        .permissions
        .get(session_id)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

pub fn pending_permission_count(state: &AppState) -> usize {
    state.permissions.values().map(Vec::len).sum()
}

pub fn queue_status<'a>(state: &'a AppState, session_id: &SessionId) -> Option<&'a QueueStatus> {
    state.side.queued_messages.get(session_id)
}

pub fn running_terminals<'a>(state: &'a AppState, session_id: &SessionId) -> Vec<&'a Terminal> {
    state
        .terminals
        .get(session_id)
        .map(|ts| {
            ts.iter()
                .filter(|t| t.status == TerminalStatus::Running)
                .collect()
        })
        .unwrap_or_default()
}

pub fn available_agents(state: &AppState) -> Vec<&Agent> {
    state.agents.iter().filter(|a| a.available).collect()
}

pub fn default_executor(state: &AppState) -> Option<&Executor> {
    state
        .executors
        .iter()
        .find(|e| e.is_default)
        .or_else(|| state.executors.first())
}

pub fn default_environment(state: &AppState) -> Option<&Environment> {
    state
        .environments
        .iter()
        .find(|e| e.is_default)
        .or_else(|| state.environments.first())
}
