//! Hydration - 初期スナップショットのマージ
//!
//! # 設計原則
//! - the snapshot is partial: every slice is optional and missing slices keep
//!   what the store already holds (field-by-field merge, never a wholesale
//!   replace)
//! - the merge runs in one store write after the fetch resumes; entities the
//!   store already holds came from live notifications and win over the
//!   snapshot's copy
//! - the requested workspace/workflow are client-owned navigation state and
//!   win over whatever the snapshot's settings say
//! - a failed fetch leaves the store as it is; the error never escapes
//!   `hydrate_into`

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::SyncConfig;
use crate::domain::{
    Agent, AgentProfile, Environment, Executor, Task, TaskSession, User, UserSettingsPatch,
    Workflow, WorkflowId, WorkflowStep, Workspace, WorkspaceId,
};
use crate::error::SyncError;
use crate::ports::HttpApi;
use crate::store::{AppState, KanbanView, StoreHandle};

/// Path of the hydration read under `/api/v1`.
pub const STATE_PATH: &str = "state";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KanbanSnapshot {
    pub workflow_id: WorkflowId,
    #[serde(default)]
    pub steps: Vec<WorkflowStep>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

/// Server-rendered partial state. Absent fields leave the slice untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HydrationSnapshot {
    #[serde(default)]
    pub workspaces: Option<Vec<Workspace>>,
    #[serde(default)]
    pub workflows: Option<Vec<Workflow>>,
    #[serde(default)]
    pub kanban: Option<KanbanSnapshot>,
    #[serde(default)]
    pub sessions: Option<Vec<TaskSession>>,
    #[serde(default)]
    pub agents: Option<Vec<Agent>>,
    #[serde(default)]
    pub agent_profiles: Option<Vec<AgentProfile>>,
    #[serde(default)]
    pub executors: Option<Vec<Executor>>,
    #[serde(default)]
    pub environments: Option<Vec<Environment>>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub settings: Option<UserSettingsPatch>,
}

/// Which workspace/workflow the client is opening.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HydrationScope {
    pub workspace_id: Option<WorkspaceId>,
    pub workflow_id: Option<WorkflowId>,
}

impl HydrationScope {
    fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(id) = &self.workspace_id {
            query.push(("workspace_id", id.to_string()));
        }
        if let Some(id) = &self.workflow_id {
            query.push(("workflow_id", id.to_string()));
        }
        query
    }
}

/// Append the incoming items `same` finds no match for.
fn insert_missing<T>(items: &mut Vec<T>, incoming: Vec<T>, same: impl Fn(&T, &T) -> bool) {
    for item in incoming {
        if !items.iter().any(|existing| same(existing, &item)) {
            items.push(item);
        }
    }
}

fn merge_kanban(state: &mut AppState, kanban: KanbanSnapshot) {
    let KanbanSnapshot {
        workflow_id,
        steps,
        tasks,
    } = kanban;
    let tasks: Vec<Task> = tasks
        .into_iter()
        .filter(|t| state.find_task(&t.id).is_none())
        .collect();
    match state.view_for_mut(&workflow_id) {
        Some(view) => {
            for step in steps {
                if view.step(&step.id).is_none() {
                    view.upsert_step(step);
                }
            }
            for task in tasks {
                view.upsert_task(task);
            }
        }
        None => {
            let mut view = KanbanView::default();
            view.replace(workflow_id, steps, tasks);
            state.put_view(view);
        }
    }
}

/// Merge `snapshot` into `state`.
pub fn merge_snapshot(
    state: &mut AppState,
    snapshot: HydrationSnapshot,
    scope: &HydrationScope,
) {
    if let Some(workspaces) = snapshot.workspaces {
        insert_missing(&mut state.workspaces, workspaces, |a, b| a.id == b.id);
    }
    if let Some(workflows) = snapshot.workflows {
        insert_missing(&mut state.workflows, workflows, |a, b| a.id == b.id);
    }
    if let Some(sessions) = snapshot.sessions {
        for session in sessions {
            state.sessions.entry(session.id.clone()).or_insert(session);
        }
    }
    if let Some(agents) = snapshot.agents {
        insert_missing(&mut state.agents, agents, |a, b| a.id == b.id);
    }
    if let Some(profiles) = snapshot.agent_profiles {
        insert_missing(&mut state.agent_profiles, profiles, |a, b| a.id == b.id);
    }
    if let Some(executors) = snapshot.executors {
        insert_missing(&mut state.executors, executors, |a, b| a.id == b.id);
    }
    if let Some(environments) = snapshot.environments {
        insert_missing(&mut state.environments, environments, |a, b| a.id == b.id);
    }
    if state.user.is_none() {
        state.user = snapshot.user;
    }

    if state.settings.workspace_id.is_none() {
        state.settings.workspace_id = scope.workspace_id.clone();
    }
    if state.settings.workflow_id.is_none() {
        state.settings.workflow_id = scope.workflow_id.clone();
    }
    if let Some(patch) = snapshot.settings {
        state.settings.merge_snapshot(patch);
    }

    if let Some(workflow_id) = state.settings.workflow_id.clone() {
        state.activate_workflow(&workflow_id);
    }
    if let Some(kanban) = snapshot.kanban {
        if state.kanban.workflow_id.is_none() {
            state.activate_workflow(&kanban.workflow_id);
        }
        merge_kanban(state, kanban);
    }
}

/// Fetch the snapshot, bounded by the hydration timeout.
pub async fn fetch_snapshot(
    http: &dyn HttpApi,
    config: &SyncConfig,
    scope: &HydrationScope,
) -> Result<HydrationSnapshot, SyncError> {
    let timeout = config.hydration_timeout();
    let body = tokio::time::timeout(timeout, http.get_json(STATE_PATH, &scope.query()))
        .await
        .map_err(|_| SyncError::Timeout {
            action: STATE_PATH.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        })??;
    Ok(serde_json::from_value(body)?)
}

/// Fetch the snapshot and merge it into `store`.
///
/// On failure only the scope's navigation is applied. Returns whether the
/// fetch succeeded; the caller refetches later when it did not.
pub async fn hydrate_into(
    store: &StoreHandle,
    http: &dyn HttpApi,
    config: &SyncConfig,
    scope: &HydrationScope,
) -> bool {
    let (snapshot, ok) = match fetch_snapshot(http, config, scope).await {
        Ok(snapshot) => (snapshot, true),
        Err(err) => {
            warn!(error = %err, "hydration failed; keeping current state");
            (HydrationSnapshot::default(), false)
        }
    };
    store.write(|state| {
        merge_snapshot(state, snapshot, scope);
        if ok {
            info!(
                workflows = state.workflows.len(),
                tasks = state.kanban.tasks.len(),
                "hydrated store"
            );
        }
    });
    ok
}
