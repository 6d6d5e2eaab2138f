//! InMemoryTransport - テスト・開発用の push channel
//!
//! # 学習ポイント
//! - mpsc channel のペアで双方向リンクを模擬
//! - サーバー側 (`ServerPeer`) をテストから台本どおりに操作できる
//!
//! ```ignore
//! let (transport, mut server) = InMemoryTransport::pair();
//! manager.connect().await?;
//! let mut peer = server.accept().await.unwrap();
//! let req = peer.recv_request().await.unwrap();
//! peer.reply(&req, json!({ "ok": true }));
//! ```

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::domain::{Envelope, ErrorPayload, MessageType};
use crate::error::SyncError;
use crate::ports::{PushTransport, TransportLink};

/// Client side: hands every opened link to the paired `InMemoryServer`.
pub struct InMemoryTransport {
    accept: mpsc::UnboundedSender<ServerPeer>,
    refuse: AtomicBool,
}

/// Server side: yields one `ServerPeer` per `open()`.
pub struct InMemoryServer {
    peers: mpsc::UnboundedReceiver<ServerPeer>,
}

impl InMemoryTransport {
    pub fn pair() -> (InMemoryTransport, InMemoryServer) {
        let (accept, peers) = mpsc::unbounded_channel();
        (
            InMemoryTransport {
                accept,
                refuse: AtomicBool::new(false),
            },
            InMemoryServer { peers },
        )
    }

    /// Make the next `open()` calls fail as if the server were down.
    pub fn set_refuse(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl PushTransport for InMemoryTransport {
    async fn open(&self) -> Result<TransportLink, SyncError> {
        if self.refuse.load(Ordering::SeqCst) {
            return Err(SyncError::Transport("connection refused".to_string()));
        }
        let (to_client, inbound) = mpsc::unbounded_channel();
        let (outbound, from_client) = mpsc::unbounded_channel();
        self.accept
            .send(ServerPeer {
                to_client,
                from_client,
            })
            .map_err(|_| SyncError::Transport("server is gone".to_string()))?;
        Ok(TransportLink { outbound, inbound })
    }
}

impl InMemoryServer {
    pub async fn accept(&mut self) -> Option<ServerPeer> {
        self.peers.recv().await
    }
}

/// The backend's end of one link.
pub struct ServerPeer {
    to_client: mpsc::UnboundedSender<String>,
    from_client: mpsc::UnboundedReceiver<String>,
}

impl ServerPeer {
    /// Next decoded frame from the client; `None` once the client closed.
    pub async fn recv(&mut self) -> Option<Envelope> {
        loop {
            let frame = self.from_client.recv().await?;
            if let Ok(envelope) = serde_json::from_str(&frame) {
                return Some(envelope);
            }
        }
    }

    /// Next request frame, skipping anything else the client sent.
    pub async fn recv_request(&mut self) -> Option<Envelope> {
        loop {
            let envelope = self.recv().await?;
            if envelope.kind == MessageType::Request {
                return Some(envelope);
            }
        }
    }

    pub fn send_raw(&self, frame: impl Into<String>) -> bool {
        self.to_client.send(frame.into()).is_ok()
    }

    pub fn send(&self, envelope: &Envelope) -> bool {
        match serde_json::to_string(envelope) {
            Ok(frame) => self.send_raw(frame),
            Err(_) => false,
        }
    }

    pub fn notify(&self, action: &str, payload: Value) -> bool {
        self.send(&Envelope::notification(action, payload, Utc::now()))
    }

    pub fn reply(&self, request: &Envelope, payload: Value) -> bool {
        match &request.id {
            Some(id) => self.send(&Envelope::response(
                id.clone(),
                request.action.clone(),
                payload,
                Utc::now(),
            )),
            None => false,
        }
    }

    pub fn reject(&self, request: &Envelope, code: &str, message: &str) -> bool {
        let error = ErrorPayload {
            code: code.to_string(),
            message: message.to_string(),
            details: None,
        };
        match &request.id {
            Some(id) => self.send(&Envelope::error(
                id.clone(),
                request.action.clone(),
                &error,
                Utc::now(),
            )),
            None => false,
        }
    }

    /// Drop the server end; the client sees its inbound stream end.
    pub fn close(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CorrelationId;
    use serde_json::json;

    #[tokio::test]
    async fn frames_flow_both_ways() {
        let (transport, mut server) = InMemoryTransport::pair();
        let mut link = transport.open().await.unwrap();
        let mut peer = server.accept().await.unwrap();

        let request = Envelope::request(
            CorrelationId::from("c1"),
            "task.move",
            json!({}),
            Utc::now(),
        );
        link.outbound
            .send(serde_json::to_string(&request).unwrap())
            .unwrap();

        let received = peer.recv_request().await.unwrap();
        assert_eq!(received.action, "task.move");
        assert!(peer.reply(&received, json!({ "ok": true })));

        let frame = link.inbound.recv().await.unwrap();
        let reply: Envelope = serde_json::from_str(&frame).unwrap();
        assert_eq!(reply.kind, MessageType::Response);
        assert_eq!(reply.id, Some(CorrelationId::from("c1")));
    }

    #[tokio::test]
    async fn refused_open_fails() {
        let (transport, _server) = InMemoryTransport::pair();
        transport.set_refuse(true);
        assert!(transport.open().await.is_err());
    }

    #[tokio::test]
    async fn closing_the_peer_ends_the_inbound_stream() {
        let (transport, mut server) = InMemoryTransport::pair();
        let mut link = transport.open().await.unwrap();
        server.accept().await.unwrap().close();
        assert!(link.inbound.recv().await.is_none());
    }
}
