//! Workflow (board), column (step) and kanban snapshot handlers.

use tracing::debug;

use crate::domain::WorkflowStep;
use crate::domain::events::{
    ColumnCreated, ColumnDeleted, ColumnUpdated, KanbanUpdate, WorkflowCreated, WorkflowDeleted,
    WorkflowUpdated,
};
use crate::store::state::upsert_by;
use crate::store::{AppState, KanbanView};
use crate::typed::{RegistryError, TypedRegistry};

pub fn register(registry: &mut TypedRegistry) -> Result<(), RegistryError> {
    registry.register::<WorkflowCreated, _>(|state: &mut AppState, e: WorkflowCreated| {
        upsert_by(&mut state.workflows, e.0, |a, b| a.id == b.id)
    })?;
    registry.register::<WorkflowUpdated, _>(|state: &mut AppState, e: WorkflowUpdated| {
        upsert_by(&mut state.workflows, e.0, |a, b| a.id == b.id)
    })?;
    registry.register::<WorkflowDeleted, _>(|state: &mut AppState, e: WorkflowDeleted| {
        state.remove_workflow(&e.workflow_id)
    })?;
    registry.register::<ColumnCreated, _>(|state: &mut AppState, e: ColumnCreated| {
        upsert_step(state, e.0)
    })?;
    registry.register::<ColumnUpdated, _>(|state: &mut AppState, e: ColumnUpdated| {
        upsert_step(state, e.0)
    })?;
    registry.register::<ColumnDeleted, _>(on_column_deleted)?;
    registry.register::<KanbanUpdate, _>(on_kanban_update)?;
    Ok(())
}

pub fn upsert_step(state: &mut AppState, step: WorkflowStep) {
    let workflow_id = step.workflow_id.clone();
    match state.view_for_mut(&workflow_id) {
        Some(view) => {
            view.upsert_step(step);
        }
        None => debug!(
            step_id = %step.id,
            workflow_id = %workflow_id,
            "column for an unloaded workflow"
        ),
    }
}

pub fn on_column_deleted(state: &mut AppState, event: ColumnDeleted) {
    if let Some(view) = state.view_for_mut(&event.workflow_id) {
        view.remove_step(&event.step_id);
    }
}

/// Full snapshot of one workflow. Non-active workflows land in the cache.
pub fn on_kanban_update(state: &mut AppState, event: KanbanUpdate) {
    let mut view = KanbanView::default();
    view.replace(event.workflow_id, event.steps, event.tasks);
    state.put_view(view);
}
