//! Executor and environment handlers.

use crate::domain::Executor;
use crate::domain::events::{
    EnvironmentCreated, EnvironmentDeleted, EnvironmentUpdated, ExecutorCreated, ExecutorDeleted,
    ExecutorUpdated,
};
use crate::store::AppState;
use crate::store::state::upsert_by;
use crate::typed::{RegistryError, TypedRegistry};

pub fn register(registry: &mut TypedRegistry) -> Result<(), RegistryError> {
    registry.register::<ExecutorCreated, _>(|state: &mut AppState, e: ExecutorCreated| {
        upsert_executor(state, e.0)
    })?;
    registry.register::<ExecutorUpdated, _>(|state: &mut AppState, e: ExecutorUpdated| {
        upsert_executor(state, e.0)
    })?;
    registry.register::<ExecutorDeleted, _>(|state: &mut AppState, e: ExecutorDeleted| {
        state.executors.retain(|x| x.id != e.executor_id)
    })?;
    registry.register::<EnvironmentCreated, _>(|state: &mut AppState, e: EnvironmentCreated| {
        upsert_by(&mut state.environments, e.0, |a, b| a.id == b.id)
    })?;
    registry.register::<EnvironmentUpdated, _>(|state: &mut AppState, e: EnvironmentUpdated| {
        upsert_by(&mut state.environments, e.0, |a, b| a.id == b.id)
    })?;
    registry.register::<EnvironmentDeleted, _>(|state: &mut AppState, e: EnvironmentDeleted| {
        state.environments.retain(|x| x.id != e.environment_id)
    })?;
    Ok(())
}

/// At most one executor is the default: a new default demotes the others.
pub fn upsert_executor(state: &mut AppState, executor: Executor) {
    if executor.is_default {
        for other in state.executors.iter_mut().filter(|x| x.id != executor.id) {
            other.is_default = false;
        }
    }
    upsert_by(&mut state.executors, executor, |a, b| a.id == b.id);
}
