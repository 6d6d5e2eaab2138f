//! GitHub integration records: auth status, pull requests linked to tasks,
//! and repository watches.

use serde::{Deserialize, Serialize};

use super::ids::{TaskId, WorkflowId};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GitHubStatus {
    #[serde(default)]
    pub authenticated: bool,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub auth_method: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequest {
    pub task_id: TaskId,
    pub number: u64,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub checks_state: Option<String>,
    #[serde(default)]
    pub review_state: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoWatch {
    pub id: String,
    pub repository: String,
    #[serde(default)]
    pub workflow_id: Option<WorkflowId>,
    #[serde(default)]
    pub enabled: bool,
}
