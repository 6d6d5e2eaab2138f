//! Agents, agent profiles, executors, environments, task plans and
//! executor-prepare progress.

use serde::{Deserialize, Serialize};

use super::ids::{AgentId, AgentProfileId, EnvironmentId, ExecutorId, SessionId, TaskId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub available: bool,
    #[serde(default)]
    pub supports_mcp: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentProfile {
    pub id: AgentProfileId,
    pub agent_id: AgentId,
    pub name: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub auto_approve: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Executor {
    pub id: ExecutorId,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    pub id: EnvironmentId,
    pub name: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub is_default: bool,
}

impl Environment {
    /// The set used when neither the push channel nor HTTP can list environments.
    pub fn static_defaults() -> Vec<Environment> {
        vec![Environment {
            id: EnvironmentId::new("local"),
            name: "Local".to_string(),
            kind: "local".to_string(),
            is_default: true,
        }]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskPlan {
    pub task_id: TaskId,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrepareStatus {
    Running,
    Completed,
    Failed,
}

/// Progress of an executor preparing a session's workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrepareProgress {
    pub session_id: SessionId,
    #[serde(default)]
    pub task_id: Option<TaskId>,
    #[serde(default)]
    pub step: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub progress: Option<u8>,
    #[serde(default = "default_prepare_status")]
    pub status: PrepareStatus,
}

fn default_prepare_status() -> PrepareStatus {
    PrepareStatus::Running
}
