//! Client-initiated actions: request payloads and response shapes.
//!
//! Action names are kept as constants next to their payload types so call
//! sites never spell the strings themselves.

use serde::{Deserialize, Serialize};

use super::agents::Environment;
use super::board::{Task, WorkflowStep};
use super::ids::{
    AgentProfileId, EnvironmentId, ExecutorId, PermissionId, SessionId, StepId, TaskId, WorkflowId,
};
use super::session::{QueueStatus, TaskSession};

pub const SESSION_LAUNCH: &str = "session.launch";
pub const PERMISSION_RESPOND: &str = "permission.respond";
pub const MESSAGE_QUEUE_ADD: &str = "message.queue.add";
pub const MESSAGE_QUEUE_CANCEL: &str = "message.queue.cancel";
pub const MESSAGE_QUEUE_GET: &str = "message.queue.get";
pub const MESSAGE_QUEUE_UPDATE: &str = "message.queue.update";
pub const ENVIRONMENT_LIST: &str = "environment.list";
pub const TASK_MOVE: &str = "task.move";
pub const TASK_SUBSCRIBE: &str = "task.subscribe";
pub const SESSION_SUBSCRIBE: &str = "session.subscribe";
pub const REQUEST_CANCEL: &str = "request.cancel";

/// Why a session is being launched. Each intent has its own default timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaunchIntent {
    Prepare,
    Start,
    StartCreated,
    Resume,
    WorkflowStep,
    RestoreWorkspace,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchSessionRequest {
    pub task_id: TaskId,
    pub intent: LaunchIntent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_profile_id: Option<AgentProfileId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executor_id: Option<ExecutorId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_id: Option<EnvironmentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_step_id: Option<StepId>,
}

impl LaunchSessionRequest {
    pub fn new(task_id: TaskId, intent: LaunchIntent) -> Self {
        Self {
            task_id,
            intent,
            session_id: None,
            agent_profile_id: None,
            executor_id: None,
            environment_id: None,
            prompt: None,
            workflow_step_id: None,
        }
    }

    pub fn with_session(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }

    pub fn with_step(mut self, step_id: StepId) -> Self {
        self.workflow_step_id = Some(step_id);
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchSessionResponse {
    pub session: TaskSession,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionReply {
    pub session_id: SessionId,
    pub pending_id: PermissionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_id: Option<String>,
    #[serde(default)]
    pub cancelled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueMessageRequest {
    pub session_id: SessionId,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRef {
    pub session_id: SessionId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRef {
    pub task_id: TaskId,
}

/// Queue actions all answer with the session's queue status.
pub type QueueStatusResponse = QueueStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentListResponse {
    #[serde(default)]
    pub environments: Vec<Environment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveTaskRequest {
    pub task_id: TaskId,
    pub workflow_id: WorkflowId,
    pub workflow_step_id: StepId,
    pub position: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveTaskResponse {
    #[serde(default)]
    pub task: Option<Task>,
    #[serde(default)]
    pub workflow_step: Option<WorkflowStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelRequest {
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launch_request_omits_unset_fields() {
        let req = LaunchSessionRequest::new(TaskId::new("t1"), LaunchIntent::Resume)
            .with_session(SessionId::new("s1"));
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["intent"], "resume");
        assert_eq!(json["session_id"], "s1");
        assert!(json.get("prompt").is_none());
    }

    #[test]
    fn move_response_tolerates_missing_step() {
        let resp: MoveTaskResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(resp.task.is_none());
        assert!(resp.workflow_step.is_none());
    }
}
