//! Domain handlers - notification を Store に適用する関数群
//!
//! One module per domain. Every handler is a plain
//! `fn(&mut AppState, Notification)`: no I/O, no clock, no channel access.
//! `register_all` installs every handler into a registry once at startup.

pub mod agents;
pub mod board;
pub mod executors;
pub mod github;
pub mod plans;
pub mod sessions;
pub mod tasks;
pub mod terminals;
pub mod transcript;
pub mod turns;
pub mod users;

use crate::domain::events::*;
use crate::typed::{Notification, RegistryError, TypedRegistry};

/// Every notification action the engine understands.
pub const ALL_ACTIONS: &[&str] = &[
    TaskCreated::ACTION,
    TaskUpdated::ACTION,
    TaskStateChanged::ACTION,
    TaskDeleted::ACTION,
    WorkflowCreated::ACTION,
    WorkflowUpdated::ACTION,
    WorkflowDeleted::ACTION,
    ColumnCreated::ACTION,
    ColumnUpdated::ACTION,
    ColumnDeleted::ACTION,
    KanbanUpdate::ACTION,
    AgentUpdated::ACTION,
    AgentsAvailable::ACTION,
    AgentProfileCreated::ACTION,
    AgentProfileUpdated::ACTION,
    AgentProfileDeleted::ACTION,
    MessageAdded::ACTION,
    MessageUpdated::ACTION,
    TerminalCreated::ACTION,
    TerminalExited::ACTION,
    ExecutorCreated::ACTION,
    ExecutorUpdated::ACTION,
    ExecutorDeleted::ACTION,
    EnvironmentCreated::ACTION,
    EnvironmentUpdated::ACTION,
    EnvironmentDeleted::ACTION,
    UserUpdated::ACTION,
    UserSettingsUpdated::ACTION,
    SessionCreated::ACTION,
    SessionStateChanged::ACTION,
    SessionDeleted::ACTION,
    SessionModeChanged::ACTION,
    PermissionRequested::ACTION,
    PermissionResolved::ACTION,
    QueueStatusChanged::ACTION,
    TurnStarted::ACTION,
    TurnCompleted::ACTION,
    GitHubStatusUpdated::ACTION,
    PullRequestUpdated::ACTION,
    RepoWatchUpdated::ACTION,
    RepoWatchDeleted::ACTION,
    TaskPlanUpdated::ACTION,
    TaskPlanDeleted::ACTION,
    PrepareProgressed::ACTION,
    PrepareCompleted::ACTION,
];

pub fn register_all(registry: &mut TypedRegistry) -> Result<(), RegistryError> {
    tasks::register(registry)?;
    board::register(registry)?;
    agents::register(registry)?;
    transcript::register(registry)?;
    terminals::register(registry)?;
    executors::register(registry)?;
    users::register(registry)?;
    sessions::register(registry)?;
    turns::register(registry)?;
    github::register(registry)?;
    plans::register(registry)?;
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_all_covers_every_action() {
        let mut registry = TypedRegistry::new();
        register_all(&mut registry).unwrap();

        let mut expected: Vec<String> = ALL_ACTIONS.iter().map(|a| a.to_string()).collect();
        expected.sort();
        assert_eq!(registry.registered_actions(), expected);
    }
}
