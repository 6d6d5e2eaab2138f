//! SyncContext - アプリケーションコンテキスト
//!
//! Owns the store, the connection and the typed actions. Every subsystem
//! that needs state gets it from here; there is no global store.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use super::hydration::{self, HydrationScope};
use super::reconcile::{self, MoveOutcome};
use super::status::SyncStatus;
use crate::client::{ClientActions, ConnectionManager, NotificationSink};
use crate::config::SyncConfig;
use crate::domain::{SessionId, StepId, TaskId, WorkflowId};
use crate::error::{MutationError, SyncError};
use crate::observability::{DispatchCounts, DispatchStats, StoreCounts};
use crate::store::StoreHandle;
use crate::typed::TypedRegistry;

/// Applies notifications from the receive loop to the store.
pub struct StoreDispatcher {
    store: StoreHandle,
    registry: Arc<TypedRegistry>,
    stats: Arc<DispatchStats>,
}

impl StoreDispatcher {
    pub fn new(
        store: StoreHandle,
        registry: Arc<TypedRegistry>,
        stats: Arc<DispatchStats>,
    ) -> Self {
        Self {
            store,
            registry,
            stats,
        }
    }
}

impl NotificationSink for StoreDispatcher {
    fn on_notification(&self, action: &str, payload: Value) {
        // Tallied inside the write so a revision bump implies the tally.
        self.store.write(|state| {
            let outcome = self.registry.dispatch(state, action, payload);
            self.stats.record(&outcome);
        });
    }
}

#[derive(Clone)]
pub struct SyncContext {
    store: StoreHandle,
    actions: ClientActions,
    stats: Arc<DispatchStats>,
}

impl SyncContext {
    pub(crate) fn new(
        store: StoreHandle,
        actions: ClientActions,
        stats: Arc<DispatchStats>,
    ) -> Self {
        Self {
            store,
            actions,
            stats,
        }
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    pub fn actions(&self) -> &ClientActions {
        &self.actions
    }

    pub fn connection(&self) -> &ConnectionManager {
        self.actions.connection()
    }

    pub fn config(&self) -> &SyncConfig {
        self.actions.config()
    }

    pub async fn connect(&self) -> Result<(), SyncError> {
        self.connection().connect().await
    }

    pub async fn disconnect(&self) {
        self.connection().disconnect().await
    }

    /// Merge the HTTP snapshot into the store. Safe while connected: state
    /// applied during the fetch is kept.
    ///
    /// Returns `false` when the fetch failed.
    pub async fn hydrate(&self, scope: &HydrationScope) -> bool {
        let http = self.actions.http().as_ref();
        hydration::hydrate_into(&self.store, http, self.config(), scope).await
    }

    /// Make `workflow_id` the active board and remember it as navigation state.
    pub fn set_active_workflow(&self, workflow_id: &WorkflowId) -> bool {
        self.store.write(|state| {
            state.settings.workflow_id = Some(workflow_id.clone());
            state.activate_workflow(workflow_id)
        })
    }

    /// Ask the backend for the task's detail stream. Failures are logged.
    pub async fn set_active_task(&self, task_id: &TaskId) {
        if let Err(err) = self.actions.subscribe_task(task_id).await {
            warn!(task_id = %task_id, error = %err, "task.subscribe failed");
        }
    }

    /// Track the visible session and subscribe to its stream. Failures are logged.
    pub async fn set_active_session(&self, session_id: &SessionId) {
        self.store.write(|state| {
            state.active_session_id = Some(session_id.clone());
        });
        if let Err(err) = self.actions.subscribe_session(session_id).await {
            warn!(session_id = %session_id, error = %err, "session.subscribe failed");
        }
    }

    pub fn clear_active_session(&self) {
        self.store.write(|state| state.active_session_id = None);
        debug!("active session cleared");
    }

    pub async fn move_task(
        &self,
        task_id: &TaskId,
        workflow_id: &WorkflowId,
        step_id: &StepId,
    ) -> Result<MoveOutcome, MutationError> {
        reconcile::move_task(&self.store, &self.actions, task_id, workflow_id, step_id).await
    }

    pub fn counts(&self) -> StoreCounts {
        let pending = self.connection().pending_count();
        self.store.read(|state| StoreCounts::collect(state, pending))
    }

    pub fn dispatch_counts(&self) -> DispatchCounts {
        self.stats.snapshot()
    }

    pub fn status(&self) -> SyncStatus {
        SyncStatus::collect(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::AppBuilder;
    use crate::client::ConnectionStatus;
    use crate::domain::actions::SESSION_SUBSCRIBE;
    use crate::app::hydration::STATE_PATH;
    use crate::handlers::fixtures;
    use crate::impls::{InMemoryServer, InMemoryTransport, StubHttpApi};
    use crate::ports::HttpApi;
    use crate::store::KanbanView;
    use serde_json::json;
    use tokio::sync::Notify;

    /// Answers `state` only after `open` is notified.
    struct GatedHttp {
        open: Arc<Notify>,
        body: Value,
    }

    #[async_trait::async_trait]
    impl HttpApi for GatedHttp {
        async fn get_json(
            &self,
            path: &str,
            _query: &[(&str, String)],
        ) -> Result<Value, SyncError> {
            assert_eq!(path, STATE_PATH);
            self.open.notified().await;
            Ok(self.body.clone())
        }

        async fn post_action(&self, action: &str, _payload: Value) -> Result<Value, SyncError> {
            Err(SyncError::Http(format!("unexpected post {action}")))
        }
    }

    fn context() -> (SyncContext, InMemoryServer) {
        let (transport, server) = InMemoryTransport::pair();
        let ctx = AppBuilder::new(SyncConfig::default())
            .with_default_handlers()
            .unwrap()
            .build(Arc::new(transport), Arc::new(StubHttpApi::new()))
            .unwrap();
        (ctx, server)
    }

    #[tokio::test]
    async fn notifications_reach_the_store_in_order() {
        let (ctx, mut server) = context();
        ctx.store().replace(fixtures::board("w1"));
        let mut revisions = ctx.store().subscribe();
        ctx.connect().await.unwrap();
        let peer = server.accept().await.unwrap();

        let mut task = fixtures::task("t1", "w1", "backlog", 0);
        peer.notify("task.created", serde_json::to_value(&task).unwrap());
        task.title = "second".to_string();
        peer.notify("task.updated", serde_json::to_value(&task).unwrap());
        peer.notify("brand.new.action", json!({}));
        peer.notify("task.updated", json!({ "id": 5 }));

        while ctx.dispatch_counts()
            != (DispatchCounts {
                applied: 2,
                ignored: 1,
                malformed: 1,
            })
        {
            revisions.changed().await.unwrap();
        }
        ctx.store().read(|s| {
            assert_eq!(s.kanban.tasks.len(), 1);
            assert_eq!(s.kanban.tasks[0].title, "second");
        });
    }

    #[tokio::test]
    async fn switching_workflows_restores_the_cached_view() {
        let (ctx, _server) = context();
        ctx.store().write(|s| {
            *s = fixtures::board("w1");
            let mut cached = KanbanView::scoped("w2".into());
            cached.upsert_task(fixtures::task("t2", "w2", "todo", 0));
            s.put_view(cached);
        });

        assert!(ctx.set_active_workflow(&"w2".into()));
        ctx.store().read(|s| {
            assert!(s.kanban.is_scoped_to(&"w2".into()));
            assert_eq!(s.kanban.tasks.len(), 1);
            assert!(s.kanban_multi.contains_key(&WorkflowId::new("w1")));
            assert_eq!(s.settings.workflow_id, Some("w2".into()));
        });
        assert!(!ctx.set_active_workflow(&"w2".into()));
    }

    #[tokio::test]
    async fn active_session_survives_a_failed_subscribe() {
        let (ctx, _server) = context();
        assert_eq!(ctx.connection().status(), ConnectionStatus::Disconnected);

        ctx.set_active_session(&"s1".into()).await;
        assert_eq!(
            ctx.store().read(|s| s.active_session_id.clone()),
            Some("s1".into())
        );
    }

    #[tokio::test]
    async fn active_session_subscribes_when_connected() {
        let (ctx, mut server) = context();
        ctx.connect().await.unwrap();
        let mut peer = server.accept().await.unwrap();

        let subscriber = ctx.clone();
        let call = tokio::spawn(async move { subscriber.set_active_session(&"s1".into()).await });
        let request = peer.recv_request().await.unwrap();
        assert_eq!(request.action, SESSION_SUBSCRIBE);
        assert_eq!(request.payload["session_id"], "s1");
        peer.reply(&request, json!({}));
        call.await.unwrap();
    }

    #[tokio::test]
    async fn refetch_while_connected_keeps_live_state() {
        let open = Arc::new(Notify::new());
        let http = GatedHttp {
            open: open.clone(),
            body: json!({
                "kanban": {
                    "workflow_id": "w1",
                    "tasks": [{
                        "id": "t1",
                        "workflow_id": "w1",
                        "workflow_step_id": "backlog",
                        "title": "T1"
                    }]
                },
                "sessions": [{ "id": "s9", "task_id": "t1", "state": "RUNNING" }]
            }),
        };
        let (transport, mut server) = InMemoryTransport::pair();
        let ctx = AppBuilder::new(SyncConfig::default())
            .with_default_handlers()
            .unwrap()
            .build(Arc::new(transport), Arc::new(http))
            .unwrap();
        ctx.store().replace(fixtures::board("w1"));
        ctx.store().write(|s| s.active_session_id = Some("s1".into()));
        let mut revisions = ctx.store().subscribe();
        ctx.connect().await.unwrap();
        let peer = server.accept().await.unwrap();

        let hydrator = ctx.clone();
        let scope = HydrationScope {
            workspace_id: None,
            workflow_id: Some("w1".into()),
        };
        let refetch = tokio::spawn(async move { hydrator.hydrate(&scope).await });

        peer.notify(
            "task.created",
            serde_json::to_value(fixtures::task("live", "w1", "done", 0)).unwrap(),
        );
        while ctx.dispatch_counts().applied < 1 {
            revisions.changed().await.unwrap();
        }
        open.notify_one();
        assert!(refetch.await.unwrap());

        ctx.store().read(|s| {
            assert!(s.kanban.task(&"live".into()).is_some());
            assert!(s.kanban.task(&"t1".into()).is_some());
            assert!(s.sessions.contains_key(&SessionId::new("s9")));
            assert_eq!(s.active_session_id, Some("s1".into()));
        });
    }
}
