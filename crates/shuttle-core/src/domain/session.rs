//! Session model: task sessions, transcript messages, turns, permissions,
//! queued messages and terminals.

use serde::{Deserialize, Serialize};

use super::ids::{
    AgentProfileId, EnvironmentId, ExecutorId, MessageId, PermissionId, SessionId, TaskId,
    TerminalId, TurnId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    Created,
    Starting,
    Running,
    WaitingForInput,
    Completed,
    Failed,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl SessionState {
    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SessionState::Completed | SessionState::Failed | SessionState::Cancelled
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSession {
    pub id: SessionId,
    pub task_id: TaskId,
    pub state: SessionState,
    #[serde(default)]
    pub agent_profile_id: Option<AgentProfileId>,
    #[serde(default)]
    pub executor_id: Option<ExecutorId>,
    #[serde(default)]
    pub environment_id: Option<EnvironmentId>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorType {
    User,
    Agent,
    #[serde(other)]
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Message,
    ToolCall,
    Thinking,
    Status,
    Error,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallStatus {
    Running,
    Complete,
    Error,
    #[serde(other)]
    Unknown,
}

/// One transcript entry (chat message, comment, tool call, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub session_id: SessionId,
    #[serde(default)]
    pub task_id: Option<TaskId>,
    #[serde(default)]
    pub turn_id: Option<TurnId>,
    pub author_type: AuthorType,
    #[serde(rename = "type", default = "default_message_kind")]
    pub kind: MessageKind,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_status: Option<ToolCallStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    #[serde(default)]
    pub created_at: Option<String>,
}

fn default_message_kind() -> MessageKind {
    MessageKind::Message
}

impl Message {
    pub fn is_running_tool_call(&self) -> bool {
        self.kind == MessageKind::ToolCall && self.tool_status == Some(ToolCallStatus::Running)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub id: TurnId,
    pub session_id: SessionId,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionOption {
    pub option_id: String,
    pub name: String,
    #[serde(default)]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingPermission {
    pub id: PermissionId,
    pub session_id: SessionId,
    #[serde(default)]
    pub tool_call_id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub options: Vec<PermissionOption>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedMessage {
    pub content: String,
    #[serde(default)]
    pub queued_at: Option<String>,
}

/// Queue state of one session (at most one queued follow-up message).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueStatus {
    pub session_id: SessionId,
    pub is_queued: bool,
    #[serde(default)]
    pub message: Option<QueuedMessage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalStatus {
    Running,
    Exited,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Terminal {
    pub id: TerminalId,
    pub session_id: SessionId,
    #[serde(default)]
    pub label: String,
    #[serde(default = "default_terminal_status")]
    pub status: TerminalStatus,
    #[serde(default)]
    pub exit_code: Option<i32>,
}

fn default_terminal_status() -> TerminalStatus {
    TerminalStatus::Running
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_call_message_decodes_status() {
        let msg: Message = serde_json::from_value(serde_json::json!({
            "id": "m1",
            "session_id": "s1",
            "author_type": "agent",
            "type": "tool_call",
            "content": "Read file",
            "tool_status": "running"
        }))
        .unwrap();
        assert!(msg.is_running_tool_call());
    }

    #[test]
    fn plain_message_defaults_kind() {
        let msg: Message = serde_json::from_value(serde_json::json!({
            "id": "m2",
            "session_id": "s1",
            "author_type": "user",
            "content": "hi"
        }))
        .unwrap();
        assert_eq!(msg.kind, MessageKind::Message);
        assert!(!msg.is_running_tool_call());
    }

    #[test]
    fn terminal_states() {
        assert!(SessionState::Completed.is_terminal());
        assert!(!SessionState::WaitingForInput.is_terminal());
    }
}
