//! PushTransport port - 双方向 push channel の抽象化
//!
//! A transport only moves text frames. Envelope encoding, correlation and
//! dispatch live in the client layer, so a WebSocket and an in-memory peer
//! are interchangeable.

use tokio::sync::mpsc;

use crate::error::SyncError;

/// Both halves of one open channel.
///
/// - `outbound`: frames to the server. Dropping every sender closes the link.
/// - `inbound`: frames from the server. `None` means the peer closed it.
#[derive(Debug)]
pub struct TransportLink {
    pub outbound: mpsc::UnboundedSender<String>,
    pub inbound: mpsc::UnboundedReceiver<String>,
}

#[async_trait::async_trait]
pub trait PushTransport: Send + Sync {
    /// Open a new link. Each call yields an independent channel.
    async fn open(&self) -> Result<TransportLink, SyncError>;
}
