//! Board model: workspaces, workflows (boards), workflow steps (columns), tasks.

use serde::{Deserialize, Serialize};

use super::ids::{SessionId, StepId, TaskId, WorkflowId, WorkspaceId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: WorkspaceId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A workflow is what the UI calls a board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: WorkflowId,
    pub workspace_id: WorkspaceId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// An action a step runs when a task enters it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepAction {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<serde_json::Value>,
}

impl StepAction {
    pub const AUTO_START_AGENT: &'static str = "auto_start_agent";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepEvents {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub on_enter: Vec<StepAction>,
}

/// A workflow step is what the UI calls a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub id: StepId,
    pub workflow_id: WorkflowId,
    pub name: String,
    pub position: i64,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub events: StepEvents,
}

impl WorkflowStep {
    pub fn auto_starts_agent(&self) -> bool {
        self.events
            .on_enter
            .iter()
            .any(|action| action.kind == StepAction::AUTO_START_AGENT)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    #[default]
    Todo,
    Created,
    Scheduling,
    InProgress,
    Review,
    Blocked,
    WaitingForInput,
    Completed,
    Failed,
    Cancelled,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub workflow_id: WorkflowId,
    pub workflow_step_id: StepId,
    #[serde(default)]
    pub workspace_id: Option<WorkspaceId>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub state: TaskState,
    #[serde(default)]
    pub priority: i64,
    #[serde(default)]
    pub position: i64,
    #[serde(default)]
    pub primary_session_id: Option<SessionId>,
    #[serde(default)]
    pub archived_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Task {
    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }
}
