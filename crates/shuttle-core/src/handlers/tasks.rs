//! Task handlers.
//!
//! A task lives in exactly one workflow view. Notifications are applied to
//! the view scoped to the task's `workflow_id` (active or cached) and are a
//! no-op when no such view is held.

use tracing::debug;

use crate::domain::Task;
use crate::domain::events::{TaskCreated, TaskDeleted, TaskStateChanged, TaskUpdated};
use crate::store::AppState;
use crate::typed::{RegistryError, TypedRegistry};

pub fn register(registry: &mut TypedRegistry) -> Result<(), RegistryError> {
    registry.register::<TaskCreated, _>(|state: &mut AppState, e: TaskCreated| {
        upsert_task(state, e.0)
    })?;
    registry.register::<TaskUpdated, _>(|state: &mut AppState, e: TaskUpdated| {
        upsert_task(state, e.0)
    })?;
    registry.register::<TaskStateChanged, _>(|state: &mut AppState, e: TaskStateChanged| {
        upsert_task(state, e.0)
    })?;
    registry.register::<TaskDeleted, _>(on_task_deleted)?;
    Ok(())
}

/// Upsert by id into the task's own workflow view.
///
/// A task that changed workflow is dropped from views of other workflows.
pub fn upsert_task(state: &mut AppState, task: Task) {
    for view in state.views_mut() {
        if !view.is_scoped_to(&task.workflow_id) {
            view.remove_task(&task.id);
        }
    }
    let workflow_id = task.workflow_id.clone();
    match state.view_for_mut(&workflow_id) {
        Some(view) => {
            view.upsert_task(task);
        }
        None => debug!(
            task_id = %task.id,
            workflow_id = %workflow_id,
            "task for an unloaded workflow; ignored"
        ),
    }
}

pub fn on_task_deleted(state: &mut AppState, event: TaskDeleted) {
    let purged = state.purge_task(&event.task_id);
    debug!(task_id = %event.task_id, sessions = purged.len(), "task deleted");
}
