//! Task plan and executor-prepare progress handlers.

use crate::domain::events::{PrepareCompleted, PrepareProgressed, TaskPlanDeleted, TaskPlanUpdated};
use crate::domain::PrepareProgress;
use crate::store::AppState;
use crate::typed::{RegistryError, TypedRegistry};

pub fn register(registry: &mut TypedRegistry) -> Result<(), RegistryError> {
    registry.register::<TaskPlanUpdated, _>(|state: &mut AppState, e: TaskPlanUpdated| {
        state.task_plans.insert(e.0.task_id.clone(), e.0);
    })?;
    registry.register::<TaskPlanDeleted, _>(|state: &mut AppState, e: TaskPlanDeleted| {
        state.task_plans.remove(&e.task_id);
    })?;
    registry.register::<PrepareProgressed, _>(|state: &mut AppState, e: PrepareProgressed| {
        record_progress(state, e.0)
    })?;
    registry.register::<PrepareCompleted, _>(|state: &mut AppState, e: PrepareCompleted| {
        record_progress(state, e.0)
    })?;
    Ok(())
}

/// Latest progress per session. Percentages never go backwards within a run.
pub fn record_progress(state: &mut AppState, mut progress: PrepareProgress) {
    if let Some(previous) = state.prepare.get(&progress.session_id)
        && previous.status == progress.status
        && let (Some(before), Some(now)) = (previous.progress, progress.progress)
        && now < before
    {
        progress.progress = Some(before);
    }
    state.prepare.insert(progress.session_id.clone(), progress);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PrepareStatus, SessionId, TaskId};
    use serde_json::json;

    fn registry() -> TypedRegistry {
        let mut registry = TypedRegistry::new();
        register(&mut registry).unwrap();
        registry
    }

    #[test]
    fn prepare_progress_then_completion() {
        let registry = registry();
        let mut state = AppState::default();
        registry.dispatch(
            &mut state,
            "executor.prepare.progress",
            json!({ "session_id": "s1", "step": "clone", "progress": 60 }),
        );
        registry.dispatch(
            &mut state,
            "executor.prepare.progress",
            json!({ "session_id": "s1", "step": "clone", "progress": 40 }),
        );
        assert_eq!(state.prepare[&SessionId::new("s1")].progress, Some(60));

        registry.dispatch(
            &mut state,
            "executor.prepare.completed",
            json!({ "session_id": "s1", "step": "done", "progress": 100, "status": "completed" }),
        );
        assert_eq!(
            state.prepare[&SessionId::new("s1")].status,
            PrepareStatus::Completed
        );
    }

    #[test]
    fn plan_lifecycle() {
        let registry = registry();
        let mut state = AppState::default();
        registry.dispatch(
            &mut state,
            "task.plan.updated",
            json!({ "task_id": "t1", "content": "1. write tests" }),
        );
        assert_eq!(state.task_plans[&TaskId::new("t1")].content, "1. write tests");

        registry.dispatch(&mut state, "task.plan.deleted", json!({ "task_id": "t1" }));
        assert!(state.task_plans.is_empty());
    }
}
