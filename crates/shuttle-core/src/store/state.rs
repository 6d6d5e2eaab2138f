//! AppState - domain-partitioned in-memory replica
//!
//! # 設計原則
//! - 1 slice = 1 domain; handlers write exactly the slices they own
//! - kanban views are scoped: `kanban` is the active workflow, `kanban_multi`
//!   caches the others and never holds the active one
//! - deletion cascades are explicit methods here, not spread over handlers

use std::collections::HashMap;

use super::kanban::KanbanView;
use super::side_tables::SideTables;
use crate::domain::{
    Agent, AgentProfile, Environment, Executor, GitHubStatus, Message, PendingPermission,
    PrepareProgress, PullRequest, RepoWatch, SessionId, Task, TaskId, TaskPlan, TaskSession,
    Terminal, Turn, TurnId, User, UserSettings, Workflow, WorkflowId, Workspace,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GitHubSlice {
    pub status: Option<GitHubStatus>,
    pub pull_requests: HashMap<TaskId, PullRequest>,
    pub watches: Vec<RepoWatch>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub workspaces: Vec<Workspace>,
    pub workflows: Vec<Workflow>,
    pub kanban: KanbanView,
    pub kanban_multi: HashMap<WorkflowId, KanbanView>,

    pub sessions: HashMap<SessionId, TaskSession>,
    pub active_session_id: Option<SessionId>,
    pub session_modes: HashMap<SessionId, String>,
    /// Per-session transcript in arrival order.
    pub messages: HashMap<SessionId, Vec<Message>>,
    pub turns: HashMap<SessionId, Vec<Turn>>,
    pub active_turns: HashMap<SessionId, TurnId>,
    pub permissions: HashMap<SessionId, Vec<PendingPermission>>,
    pub terminals: HashMap<SessionId, Vec<Terminal>>,
    pub prepare: HashMap<SessionId, PrepareProgress>,

    pub agents: Vec<Agent>,
    pub agent_profiles: Vec<AgentProfile>,
    pub executors: Vec<Executor>,
    pub environments: Vec<Environment>,

    pub user: Option<User>,
    pub settings: UserSettings,
    pub github: GitHubSlice,
    pub task_plans: HashMap<TaskId, TaskPlan>,

    pub side: SideTables,
}

/// Replace the element `same` matches, or append.
pub(crate) fn upsert_by<T>(items: &mut Vec<T>, item: T, same: impl Fn(&T, &T) -> bool) {
    match items.iter_mut().find(|existing| same(existing, &item)) {
        Some(existing) => *existing = item,
        None => items.push(item),
    }
}

impl AppState {
    /// The view holding `workflow_id`, active or cached.
    pub fn view_for(&self, workflow_id: &WorkflowId) -> Option<&KanbanView> {
        if self.kanban.is_scoped_to(workflow_id) {
            Some(&self.kanban)
        } else {
            self.kanban_multi.get(workflow_id)
        }
    }

    pub fn view_for_mut(&mut self, workflow_id: &WorkflowId) -> Option<&mut KanbanView> {
        if self.kanban.is_scoped_to(workflow_id) {
            Some(&mut self.kanban)
        } else {
            self.kanban_multi.get_mut(workflow_id)
        }
    }

    pub fn views(&self) -> impl Iterator<Item = &KanbanView> {
        std::iter::once(&self.kanban).chain(self.kanban_multi.values())
    }

    pub fn views_mut(&mut self) -> impl Iterator<Item = &mut KanbanView> {
        std::iter::once(&mut self.kanban).chain(self.kanban_multi.values_mut())
    }

    /// Make `workflow_id` the active view. The previous active view moves into
    /// the cache; a cached view for the target is restored.
    ///
    /// Returns `false` when it already was active.
    pub fn activate_workflow(&mut self, workflow_id: &WorkflowId) -> bool {
        if self.kanban.is_scoped_to(workflow_id) {
            return false;
        }
        let next = self
            .kanban_multi
            .remove(workflow_id)
            .unwrap_or_else(|| KanbanView::scoped(workflow_id.clone()));
        let previous = std::mem::replace(&mut self.kanban, next);
        if let Some(prev_id) = previous.workflow_id.clone() {
            self.kanban_multi.insert(prev_id, previous);
        }
        true
    }

    /// Store a full board snapshot for a workflow, active or not.
    pub fn put_view(&mut self, view: KanbanView) {
        let Some(workflow_id) = view.workflow_id.clone() else {
            return;
        };
        if self.kanban.is_scoped_to(&workflow_id) {
            self.kanban = view;
        } else {
            self.kanban_multi.insert(workflow_id, view);
        }
    }

    pub fn find_task(&self, task_id: &TaskId) -> Option<&Task> {
        self.views().find_map(|v| v.task(task_id))
    }

    pub fn sessions_of_task(&self, task_id: &TaskId) -> Vec<SessionId> {
        let mut ids: Vec<SessionId> = self
            .sessions
            .values()
            .filter(|s| &s.task_id == task_id)
            .map(|s| s.id.clone())
            .collect();
        if let Some(primary) = self.find_task(task_id).and_then(|t| t.primary_session_id.clone())
            && !ids.contains(&primary)
        {
            ids.push(primary);
        }
        ids.sort();
        ids
    }

    /// Remove a session and every table keyed by it.
    pub fn remove_session(&mut self, session_id: &SessionId) -> Option<TaskSession> {
        self.messages.remove(session_id);
        self.turns.remove(session_id);
        self.active_turns.remove(session_id);
        self.permissions.remove(session_id);
        self.terminals.remove(session_id);
        self.prepare.remove(session_id);
        self.session_modes.remove(session_id);
        self.side.purge_session(session_id);
        if self.active_session_id.as_ref() == Some(session_id) {
            self.active_session_id = None;
        }
        self.sessions.remove(session_id)
    }

    /// Remove a task from every view and cascade over the sessions it owned.
    ///
    /// Returns the purged session ids.
    pub fn purge_task(&mut self, task_id: &TaskId) -> Vec<SessionId> {
        let owned = self.sessions_of_task(task_id);
        for session_id in &owned {
            self.remove_session(session_id);
        }
        for view in self.views_mut() {
            view.remove_task(task_id);
        }
        self.task_plans.remove(task_id);
        self.github.pull_requests.remove(task_id);
        self.prepare
            .retain(|_, p| p.task_id.as_ref() != Some(task_id));
        owned
    }

    /// Drop a workflow, its cached view and, if active, the active view.
    /// Its tasks are purged along with their sessions.
    pub fn remove_workflow(&mut self, workflow_id: &WorkflowId) {
        let task_ids: Vec<TaskId> = self
            .view_for(workflow_id)
            .map(|v| v.tasks.iter().map(|t| t.id.clone()).collect())
            .unwrap_or_default();
        for task_id in &task_ids {
            self.purge_task(task_id);
        }
        self.workflows.retain(|w| &w.id != workflow_id);
        self.kanban_multi.remove(workflow_id);
        if self.kanban.is_scoped_to(workflow_id) {
            self.kanban = KanbanView::default();
        }
    }
}
