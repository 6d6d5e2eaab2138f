//! GitHub status, pull request and repository watch handlers.

use crate::domain::events::{
    GitHubStatusUpdated, PullRequestUpdated, RepoWatchDeleted, RepoWatchUpdated,
};
use crate::store::AppState;
use crate::store::state::upsert_by;
use crate::typed::{RegistryError, TypedRegistry};

pub fn register(registry: &mut TypedRegistry) -> Result<(), RegistryError> {
    registry.register::<GitHubStatusUpdated, _>(|state: &mut AppState, e: GitHubStatusUpdated| {
        state.github.status = Some(e.0)
    })?;
    // one pull request per task; a newer PR for the same task replaces it
    registry.register::<PullRequestUpdated, _>(|state: &mut AppState, e: PullRequestUpdated| {
        state.github.pull_requests.insert(e.0.task_id.clone(), e.0);
    })?;
    registry.register::<RepoWatchUpdated, _>(|state: &mut AppState, e: RepoWatchUpdated| {
        upsert_by(&mut state.github.watches, e.0, |a, b| a.id == b.id)
    })?;
    registry.register::<RepoWatchDeleted, _>(|state: &mut AppState, e: RepoWatchDeleted| {
        state.github.watches.retain(|w| w.id != e.id)
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TaskId;
    use serde_json::json;

    fn registry() -> TypedRegistry {
        let mut registry = TypedRegistry::new();
        register(&mut registry).unwrap();
        registry
    }

    #[test]
    fn pull_request_is_keyed_by_task() {
        let registry = registry();
        let mut state = AppState::default();
        for number in [12, 13] {
            registry.dispatch(
                &mut state,
                "github.pr.updated",
                json!({ "task_id": "t1", "number": number, "state": "open" }),
            );
        }
        assert_eq!(state.github.pull_requests.len(), 1);
        assert_eq!(state.github.pull_requests[&TaskId::new("t1")].number, 13);
    }

    #[test]
    fn watch_lifecycle_and_status() {
        let registry = registry();
        let mut state = AppState::default();
        registry.dispatch(
            &mut state,
            "github.status.updated",
            json!({ "authenticated": true, "username": "octo" }),
        );
        registry.dispatch(
            &mut state,
            "github.watch.updated",
            json!({ "id": "rw1", "repository": "acme/api", "enabled": true }),
        );
        assert!(state.github.status.as_ref().unwrap().authenticated);
        assert_eq!(state.github.watches.len(), 1);

        registry.dispatch(&mut state, "github.watch.deleted", json!({ "id": "rw1" }));
        assert!(state.github.watches.is_empty());
    }
}
