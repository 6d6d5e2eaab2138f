//! Events - push channel の notification 定義
//!
//! One type per notification action. The type's `ACTION` constant is the
//! routing key, so a typo in an action name is a compile error at the
//! registration site rather than a silently dropped notification.

use serde::{Deserialize, Serialize};

use super::agents::{Agent, AgentProfile, Environment, Executor, PrepareProgress, TaskPlan};
use super::board::{Task, Workflow, WorkflowStep};
use super::github::{GitHubStatus, PullRequest, RepoWatch};
use super::ids::{
    AgentProfileId, EnvironmentId, ExecutorId, PermissionId, SessionId, StepId, TaskId,
    TerminalId, WorkflowId,
};
use super::session::{
    Message, PendingPermission, QueueStatus, SessionState, TaskSession, Terminal, Turn,
};
use super::settings::{User, UserSettingsPatch};
use crate::typed::Notification;

/// A notification whose payload is exactly one entity.
macro_rules! entity_notification {
    ($(#[$meta:meta])* $name:ident($inner:ty) => $action:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub $inner);

        impl Notification for $name {
            const ACTION: &'static str = $action;
        }
    };
}

/// A notification with its own payload struct.
macro_rules! notification_action {
    ($name:ident => $action:literal) => {
        impl Notification for $name {
            const ACTION: &'static str = $action;
        }
    };
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

entity_notification!(TaskCreated(Task) => "task.created");
entity_notification!(TaskUpdated(Task) => "task.updated");
entity_notification!(TaskStateChanged(Task) => "task.state_changed");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDeleted {
    pub task_id: TaskId,
    #[serde(default)]
    pub workflow_id: Option<WorkflowId>,
}
notification_action!(TaskDeleted => "task.deleted");

// ---------------------------------------------------------------------------
// Workflows (boards) and columns (steps)
// ---------------------------------------------------------------------------

entity_notification!(WorkflowCreated(Workflow) => "workflow.created");
entity_notification!(WorkflowUpdated(Workflow) => "workflow.updated");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDeleted {
    pub workflow_id: WorkflowId,
}
notification_action!(WorkflowDeleted => "workflow.deleted");

entity_notification!(ColumnCreated(WorkflowStep) => "column.created");
entity_notification!(ColumnUpdated(WorkflowStep) => "column.updated");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDeleted {
    pub step_id: StepId,
    pub workflow_id: WorkflowId,
}
notification_action!(ColumnDeleted => "column.deleted");

/// Full board contents of one workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KanbanUpdate {
    pub workflow_id: WorkflowId,
    #[serde(default)]
    pub steps: Vec<WorkflowStep>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}
notification_action!(KanbanUpdate => "kanban.update");

// ---------------------------------------------------------------------------
// Agents and profiles
// ---------------------------------------------------------------------------

entity_notification!(AgentUpdated(Agent) => "agent.updated");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentsAvailable {
    #[serde(default)]
    pub agents: Vec<Agent>,
}
notification_action!(AgentsAvailable => "agent.available");

entity_notification!(AgentProfileCreated(AgentProfile) => "agent.profile.created");
entity_notification!(AgentProfileUpdated(AgentProfile) => "agent.profile.updated");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentProfileDeleted {
    pub profile_id: AgentProfileId,
}
notification_action!(AgentProfileDeleted => "agent.profile.deleted");

// ---------------------------------------------------------------------------
// Transcript (messages / comments)
// ---------------------------------------------------------------------------

entity_notification!(MessageAdded(Message) => "session.message.added");
entity_notification!(MessageUpdated(Message) => "session.message.updated");

// ---------------------------------------------------------------------------
// Terminals
// ---------------------------------------------------------------------------

entity_notification!(TerminalCreated(Terminal) => "terminal.created");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminalExited {
    pub terminal_id: TerminalId,
    pub session_id: SessionId,
    #[serde(default)]
    pub exit_code: Option<i32>,
}
notification_action!(TerminalExited => "terminal.exited");

// ---------------------------------------------------------------------------
// Executors and environments
// ---------------------------------------------------------------------------

entity_notification!(ExecutorCreated(Executor) => "executor.created");
entity_notification!(ExecutorUpdated(Executor) => "executor.updated");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutorDeleted {
    pub executor_id: ExecutorId,
}
notification_action!(ExecutorDeleted => "executor.deleted");

entity_notification!(EnvironmentCreated(Environment) => "environment.created");
entity_notification!(EnvironmentUpdated(Environment) => "environment.updated");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentDeleted {
    pub environment_id: EnvironmentId,
}
notification_action!(EnvironmentDeleted => "environment.deleted");

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

entity_notification!(UserUpdated(User) => "user.updated");
entity_notification!(UserSettingsUpdated(UserSettingsPatch) => "user.settings.updated");

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

entity_notification!(SessionCreated(TaskSession) => "session.created");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStateChanged {
    pub session_id: SessionId,
    pub task_id: TaskId,
    pub state: SessionState,
    #[serde(default)]
    pub error_message: Option<String>,
}
notification_action!(SessionStateChanged => "session.state_changed");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDeleted {
    pub session_id: SessionId,
    #[serde(default)]
    pub task_id: Option<TaskId>,
}
notification_action!(SessionDeleted => "session.deleted");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionModeChanged {
    pub session_id: SessionId,
    pub mode: String,
}
notification_action!(SessionModeChanged => "session.mode.changed");

entity_notification!(PermissionRequested(PendingPermission) => "session.permission.requested");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionResolved {
    pub session_id: SessionId,
    pub pending_id: PermissionId,
}
notification_action!(PermissionResolved => "session.permission.resolved");

entity_notification!(QueueStatusChanged(QueueStatus) => "message.queue.status_changed");

// ---------------------------------------------------------------------------
// Turns
// ---------------------------------------------------------------------------

entity_notification!(TurnStarted(Turn) => "session.turn.started");
entity_notification!(TurnCompleted(Turn) => "session.turn.completed");

// ---------------------------------------------------------------------------
// GitHub
// ---------------------------------------------------------------------------

entity_notification!(GitHubStatusUpdated(GitHubStatus) => "github.status.updated");
entity_notification!(PullRequestUpdated(PullRequest) => "github.pr.updated");
entity_notification!(RepoWatchUpdated(RepoWatch) => "github.watch.updated");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoWatchDeleted {
    pub id: String,
}
notification_action!(RepoWatchDeleted => "github.watch.deleted");

// ---------------------------------------------------------------------------
// Task plans and executor prepare progress
// ---------------------------------------------------------------------------

entity_notification!(TaskPlanUpdated(TaskPlan) => "task.plan.updated");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskPlanDeleted {
    pub task_id: TaskId,
}
notification_action!(TaskPlanDeleted => "task.plan.deleted");

entity_notification!(PrepareProgressed(PrepareProgress) => "executor.prepare.progress");
entity_notification!(PrepareCompleted(PrepareProgress) => "executor.prepare.completed");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_notifications_decode_the_bare_entity() {
        let event: TaskUpdated = serde_json::from_value(serde_json::json!({
            "id": "t1",
            "workflow_id": "w1",
            "workflow_step_id": "s1",
            "title": "Ship it"
        }))
        .unwrap();
        assert_eq!(event.0.title, "Ship it");
        assert_eq!(TaskUpdated::ACTION, "task.updated");
    }

    #[test]
    fn struct_notifications_use_their_own_payload() {
        let event: ColumnDeleted =
            serde_json::from_value(serde_json::json!({ "step_id": "s1", "workflow_id": "w1" }))
                .unwrap();
        assert_eq!(event.step_id, StepId::new("s1"));
        assert_eq!(ColumnDeleted::ACTION, "column.deleted");
    }
}
