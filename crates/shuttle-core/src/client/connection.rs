//! ConnectionManager - push channel のライフサイクル
//!
//! # 状態遷移
//! ```text
//! Disconnected → Connecting → Connected → Error        (peer closed / read failed)
//!                           ↘ Error                    (open failed)
//! any → Disconnected                                   (explicit disconnect)
//! ```
//!
//! # 設計原則
//! - `connect()` is idempotent and serialized; the manager never retries on
//!   its own (reconnect policy belongs to the caller)
//! - one receive loop per link routes replies to the pending table and hands
//!   notifications to the sink one at a time, in arrival order
//! - notifications reach the sink only while `Connected`
//! - `disconnect()` rejects every pending request with `Cancelled`; a link
//!   that dies on its own rejects them with `ChannelUnavailable`

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::pending::{PendingRequests, Resolution};
use crate::domain::actions::{CancelRequest, REQUEST_CANCEL};
use crate::domain::{CorrelationId, Envelope, ErrorPayload, MessageType};
use crate::error::{RemoteError, SyncError};
use crate::ports::{Clock, IdGenerator, PushTransport, SystemClock, UlidGenerator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

impl ConnectionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionStatus::Disconnected => "disconnected",
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Error => "error",
        }
    }
}

/// Receiver of server notifications. Called from the receive loop, one
/// notification at a time; implementations must not block on I/O.
pub trait NotificationSink: Send + Sync {
    fn on_notification(&self, action: &str, payload: Value);
}

pub struct ConnectionOptions {
    /// Send `request.cancel { id }` when a request times out.
    pub cancel_on_timeout: bool,
    pub clock: Arc<dyn Clock>,
    pub ids: Arc<dyn IdGenerator>,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            cancel_on_timeout: false,
            clock: Arc::new(SystemClock),
            ids: Arc::new(UlidGenerator::new(SystemClock)),
        }
    }
}

struct ActiveLink {
    outbound: mpsc::UnboundedSender<String>,
    generation: u64,
    reader: Option<JoinHandle<()>>,
}

struct Inner {
    transport: Arc<dyn PushTransport>,
    sink: Arc<dyn NotificationSink>,
    options: ConnectionOptions,
    pending: PendingRequests,
    status: watch::Sender<ConnectionStatus>,
    link: Mutex<Option<ActiveLink>>,
    generation: AtomicU64,
    lifecycle: tokio::sync::Mutex<()>,
}

/// Cheap to clone; clones share one connection.
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<Inner>,
}

impl ConnectionManager {
    pub fn new(
        transport: Arc<dyn PushTransport>,
        sink: Arc<dyn NotificationSink>,
        options: ConnectionOptions,
    ) -> Self {
        let (status, _) = watch::channel(ConnectionStatus::Disconnected);
        Self {
            inner: Arc::new(Inner {
                transport,
                sink,
                options,
                pending: PendingRequests::new(),
                status,
                link: Mutex::new(None),
                generation: AtomicU64::new(0),
                lifecycle: tokio::sync::Mutex::new(()),
            }),
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.inner.status.borrow()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.inner.status.subscribe()
    }

    pub fn pending_count(&self) -> usize {
        self.inner.pending.len()
    }

    /// Open the push channel. A no-op when already connected.
    pub async fn connect(&self) -> Result<(), SyncError> {
        let _lifecycle = self.inner.lifecycle.lock().await;
        if self.status() == ConnectionStatus::Connected {
            return Ok(());
        }
        self.inner.set_status(ConnectionStatus::Connecting);

        let link = match self.inner.transport.open().await {
            Ok(link) => link,
            Err(err) => {
                warn!(error = %err, "push channel open failed");
                self.inner.set_status(ConnectionStatus::Error);
                return Err(err);
            }
        };

        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *self.inner.lock_link() = Some(ActiveLink {
            outbound: link.outbound,
            generation,
            reader: None,
        });
        self.inner.set_status(ConnectionStatus::Connected);
        info!(generation, "push channel connected");

        let reader = tokio::spawn(receive_loop(self.inner.clone(), link.inbound, generation));
        if let Some(active) = self.inner.lock_link().as_mut()
            && active.generation == generation
        {
            active.reader = Some(reader);
        }
        Ok(())
    }

    /// Tear the channel down and reject every pending request with `Cancelled`.
    pub async fn disconnect(&self) {
        let _lifecycle = self.inner.lifecycle.lock().await;
        let link = self.inner.lock_link().take();
        if let Some(link) = link
            && let Some(reader) = link.reader
        {
            reader.abort();
        }
        let rejected = self.inner.pending.reject_all(SyncError::Cancelled);
        self.inner.set_status(ConnectionStatus::Disconnected);
        info!(rejected, "push channel disconnected");
    }

    /// Send a correlated request and wait for its reply.
    ///
    /// Fails fast with `ChannelUnavailable` unless connected. On timeout the
    /// pending entry is evicted; a reply arriving later is discarded.
    pub async fn request(
        &self,
        action: &str,
        payload: Value,
        timeout: Duration,
    ) -> Result<Value, SyncError> {
        let outbound = self.inner.outbound().ok_or(SyncError::ChannelUnavailable)?;

        let id = self.inner.options.ids.correlation_id();
        let mut pending = self.inner.pending.register(id.clone(), action);
        let now = self.inner.options.clock.now();
        let envelope = Envelope::request(id.clone(), action, payload, now);
        let frame = serde_json::to_string(&envelope)?;
        if outbound.send(frame).is_err() {
            return Err(SyncError::ChannelUnavailable);
        }
        debug!(%id, action, "request sent");

        let outcome = tokio::time::timeout(timeout, pending.reply()).await;
        drop(pending);
        match outcome {
            Ok(reply) => reply,
            Err(_) => {
                let timeout_ms = timeout.as_millis() as u64;
                warn!(%id, action, timeout_ms, "request timed out");
                if self.inner.options.cancel_on_timeout {
                    self.send_cancel(&id);
                }
                Err(SyncError::Timeout {
                    action: action.to_string(),
                    timeout_ms,
                })
            }
        }
    }

    /// Fire-and-forget notification frame to the server.
    pub fn notify(&self, action: &str, payload: Value) -> Result<(), SyncError> {
        let outbound = self.inner.outbound().ok_or(SyncError::ChannelUnavailable)?;
        let envelope = Envelope::notification(action, payload, self.inner.options.clock.now());
        outbound
            .send(serde_json::to_string(&envelope)?)
            .map_err(|_| SyncError::ChannelUnavailable)
    }

    fn send_cancel(&self, id: &CorrelationId) {
        let payload = serde_json::to_value(CancelRequest {
            id: id.as_str().to_string(),
        })
        .unwrap_or(Value::Null);
        if let Err(err) = self.notify(REQUEST_CANCEL, payload) {
            debug!(%id, error = %err, "cancel signal not sent");
        }
    }
}

impl Inner {
    fn lock_link(&self) -> std::sync::MutexGuard<'_, Option<ActiveLink>> {
        self.link.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_status(&self, status: ConnectionStatus) {
        let previous = self.status.send_replace(status);
        if previous != status {
            debug!(from = previous.as_str(), to = status.as_str(), "connection status");
        }
    }

    fn outbound(&self) -> Option<mpsc::UnboundedSender<String>> {
        if *self.status.borrow() != ConnectionStatus::Connected {
            return None;
        }
        self.lock_link().as_ref().map(|l| l.outbound.clone())
    }

    fn route(&self, envelope: Envelope) {
        match (envelope.kind, envelope.id) {
            (MessageType::Notification, _) => {
                if *self.status.borrow() == ConnectionStatus::Connected {
                    self.sink.on_notification(&envelope.action, envelope.payload);
                } else {
                    debug!(action = %envelope.action, "notification while not connected; dropped");
                }
            }
            (MessageType::Response, Some(id)) => {
                self.resolve(&id, &envelope.action, Ok(envelope.payload));
            }
            (MessageType::Error, Some(id)) => {
                let error = serde_json::from_value::<ErrorPayload>(envelope.payload.clone())
                    .unwrap_or_else(|_| ErrorPayload {
                        code: "unknown".to_string(),
                        message: envelope.payload.to_string(),
                        details: None,
                    });
                let reply = Err(SyncError::Rejected(RemoteError::from(error)));
                self.resolve(&id, &envelope.action, reply);
            }
            (kind, _) => {
                debug!(?kind, action = %envelope.action, "unroutable frame skipped");
            }
        }
    }

    fn resolve(&self, id: &CorrelationId, action: &str, reply: Result<Value, SyncError>) {
        match self.pending.resolve(id, reply) {
            Resolution::Delivered { .. } => {}
            Resolution::Late => debug!(%id, action, "late or unknown reply discarded"),
        }
    }

    /// The link ended on its own. Ignored when it was already replaced or
    /// torn down by `disconnect`.
    fn on_link_closed(&self, generation: u64) {
        let mut link = self.lock_link();
        if link.as_ref().map(|l| l.generation) != Some(generation) {
            return;
        }
        link.take();
        drop(link);
        let rejected = self.pending.reject_all(SyncError::ChannelUnavailable);
        self.set_status(ConnectionStatus::Error);
        warn!(generation, rejected, "push channel closed by peer");
    }
}

async fn receive_loop(
    inner: Arc<Inner>,
    mut inbound: mpsc::UnboundedReceiver<String>,
    generation: u64,
) {
    while let Some(frame) = inbound.recv().await {
        match serde_json::from_str::<Envelope>(&frame) {
            Ok(envelope) => inner.route(envelope),
            Err(err) => warn!(error = %err, "undecodable frame skipped"),
        }
    }
    inner.on_link_closed(generation);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::{InMemoryServer, InMemoryTransport, ServerPeer};
    use serde_json::json;

    #[derive(Default)]
    struct RecordingSink {
        seen: Mutex<Vec<(String, Value)>>,
    }

    impl RecordingSink {
        fn actions(&self) -> Vec<String> {
            self.seen
                .lock()
                .unwrap()
                .iter()
                .map(|(a, _)| a.clone())
                .collect()
        }
    }

    impl NotificationSink for RecordingSink {
        fn on_notification(&self, action: &str, payload: Value) {
            self.seen.lock().unwrap().push((action.to_string(), payload));
        }
    }

    fn manager_with(
        options: ConnectionOptions,
    ) -> (ConnectionManager, InMemoryServer, Arc<RecordingSink>) {
        let (transport, server) = InMemoryTransport::pair();
        let sink = Arc::new(RecordingSink::default());
        let manager = ConnectionManager::new(Arc::new(transport), sink.clone(), options);
        (manager, server, sink)
    }

    async fn connected() -> (ConnectionManager, ServerPeer, Arc<RecordingSink>) {
        let (manager, mut server, sink) = manager_with(ConnectionOptions::default());
        manager.connect().await.unwrap();
        let peer = server.accept().await.unwrap();
        (manager, peer, sink)
    }

    async fn wait_for_status(manager: &ConnectionManager, want: ConnectionStatus) {
        let mut rx = manager.subscribe_status();
        tokio::time::timeout(Duration::from_secs(1), rx.wait_for(|s| *s == want))
            .await
            .expect("status change")
            .unwrap();
    }

    #[tokio::test]
    async fn connect_is_idempotent() {
        let (manager, mut server, _) = manager_with(ConnectionOptions::default());
        manager.connect().await.unwrap();
        manager.connect().await.unwrap();

        assert_eq!(manager.status(), ConnectionStatus::Connected);
        assert!(server.accept().await.is_some());
        let second = tokio::time::timeout(Duration::from_millis(50), server.accept()).await;
        assert!(second.is_err(), "a second link was opened");
    }

    #[tokio::test]
    async fn request_without_connection_fails_fast() {
        let (manager, _server, _) = manager_with(ConnectionOptions::default());
        let err = manager
            .request("environment.list", json!({}), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::ChannelUnavailable));
        assert_eq!(manager.pending_count(), 0);
    }

    #[tokio::test]
    async fn open_failure_enters_error_state() {
        let (transport, _server) = InMemoryTransport::pair();
        transport.set_refuse(true);
        let manager = ConnectionManager::new(
            Arc::new(transport),
            Arc::new(RecordingSink::default()),
            ConnectionOptions::default(),
        );
        assert!(manager.connect().await.is_err());
        assert_eq!(manager.status(), ConnectionStatus::Error);
    }

    #[tokio::test]
    async fn reply_resolves_matching_request() {
        let (manager, mut peer, _) = connected().await;
        let server = tokio::spawn(async move {
            let req = peer.recv_request().await.unwrap();
            assert_eq!(req.action, "message.queue.get");
            peer.reply(&req, json!({ "session_id": "s1", "is_queued": false }));
            peer
        });

        let reply = manager
            .request("message.queue.get", json!({ "session_id": "s1" }), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(reply["is_queued"], false);
        assert_eq!(manager.pending_count(), 0);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn error_envelope_is_rejected_with_code() {
        let (manager, mut peer, _) = connected().await;
        tokio::spawn(async move {
            let req = peer.recv_request().await.unwrap();
            peer.reject(&req, "conflict", "task moved elsewhere");
            peer
        });

        let err = manager
            .request("task.move", json!({}), Duration::from_secs(1))
            .await
            .unwrap_err();
        match err {
            SyncError::Rejected(remote) => assert_eq!(remote.code, "conflict"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn timeout_evicts_and_late_reply_is_discarded() {
        let (manager, mut peer, _) = connected().await;

        let err = manager
            .request("session.launch", json!({}), Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Timeout { timeout_ms: 20, .. }));
        assert_eq!(manager.pending_count(), 0);

        // the late reply must not complete the next request
        let stale = peer.recv_request().await.unwrap();
        let next = tokio::spawn({
            let manager = manager.clone();
            async move {
                manager
                    .request("environment.list", json!({}), Duration::from_secs(1))
                    .await
            }
        });
        let fresh = peer.recv_request().await.unwrap();
        peer.reply(&stale, json!({ "stale": true }));
        peer.reply(&fresh, json!({ "fresh": true }));

        let reply = next.await.unwrap().unwrap();
        assert_eq!(reply, json!({ "fresh": true }));
    }

    #[tokio::test]
    async fn cancel_signal_is_opt_in() {
        let options = ConnectionOptions {
            cancel_on_timeout: true,
            ..ConnectionOptions::default()
        };
        let (manager, mut server, _) = manager_with(options);
        manager.connect().await.unwrap();
        let mut peer = server.accept().await.unwrap();

        let _ = manager
            .request("session.launch", json!({}), Duration::from_millis(10))
            .await;

        let request = peer.recv().await.unwrap();
        let cancel = peer.recv().await.unwrap();
        assert_eq!(cancel.kind, MessageType::Notification);
        assert_eq!(cancel.action, REQUEST_CANCEL);
        assert_eq!(cancel.payload["id"], request.id.unwrap().as_str());
    }

    #[tokio::test]
    async fn disconnect_cancels_pending_requests() {
        let (manager, mut peer, _) = connected().await;
        let waiting = tokio::spawn({
            let manager = manager.clone();
            async move {
                manager
                    .request("session.launch", json!({}), Duration::from_secs(5))
                    .await
            }
        });
        peer.recv_request().await.unwrap();

        manager.disconnect().await;

        let err = waiting.await.unwrap().unwrap_err();
        assert!(matches!(err, SyncError::Cancelled));
        assert_eq!(manager.status(), ConnectionStatus::Disconnected);
    }

    #[tokio::test]
    async fn peer_close_fails_pending_and_enters_error() {
        let (manager, mut peer, _) = connected().await;
        let waiting = tokio::spawn({
            let manager = manager.clone();
            async move {
                manager
                    .request("task.move", json!({}), Duration::from_secs(5))
                    .await
            }
        });
        peer.recv_request().await.unwrap();
        peer.close();

        let err = waiting.await.unwrap().unwrap_err();
        assert!(matches!(err, SyncError::ChannelUnavailable));
        wait_for_status(&manager, ConnectionStatus::Error).await;
    }

    #[tokio::test]
    async fn notifications_reach_the_sink_in_order() {
        let (manager, peer, sink) = connected().await;
        peer.notify("task.created", json!({ "id": "t1" }));
        peer.send_raw("{ not json");
        peer.notify("task.updated", json!({ "id": "t1" }));
        peer.close();

        wait_for_status(&manager, ConnectionStatus::Error).await;
        assert_eq!(sink.actions(), vec!["task.created", "task.updated"]);
    }

    #[tokio::test]
    async fn dropped_caller_evicts_its_entry() {
        let (manager, _peer, _) = connected().await;
        let abandoned = tokio::time::timeout(
            Duration::from_millis(10),
            manager.request("session.launch", json!({}), Duration::from_secs(60)),
        )
        .await;
        assert!(abandoned.is_err());
        assert_eq!(manager.pending_count(), 0);
    }

    #[tokio::test]
    async fn reconnect_after_disconnect_opens_a_new_link() {
        let (manager, mut server, _) = manager_with(ConnectionOptions::default());
        manager.connect().await.unwrap();
        let _first = server.accept().await.unwrap();
        manager.disconnect().await;

        manager.connect().await.unwrap();
        assert!(server.accept().await.is_some());
        assert_eq!(manager.status(), ConnectionStatus::Connected);
    }
}
