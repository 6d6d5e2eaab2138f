//! WsTransport - tokio-tungstenite による push channel
//!
//! `open` connects, then splits the socket into two pump tasks:
//! - writer: `outbound` receiver → socket (sends Close once every sender is dropped)
//! - reader: socket → `inbound` sender (ends on Close or socket error)

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, warn};
use url::Url;

use crate::error::SyncError;
use crate::ports::{PushTransport, TransportLink};

#[derive(Debug, Clone)]
pub struct WsTransport {
    url: Url,
}

impl WsTransport {
    pub fn new(url: Url) -> Self {
        Self { url }
    }

    pub fn parse(url: &str) -> Result<Self, SyncError> {
        let url = Url::parse(url)
            .map_err(|e| SyncError::Transport(format!("invalid url {url}: {e}")))?;
        Ok(Self::new(url))
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait::async_trait]
impl PushTransport for WsTransport {
    async fn open(&self) -> Result<TransportLink, SyncError> {
        let (ws, _) = connect_async(self.url.as_str())
            .await
            .map_err(|e| SyncError::Transport(e.to_string()))?;
        let (mut sink, mut stream) = ws.split();

        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();
        let (in_tx, in_rx) = mpsc::unbounded_channel::<String>();

        tokio::spawn(async move {
            while let Some(frame) = out_rx.recv().await {
                if let Err(err) = sink.send(WsMessage::Text(frame)).await {
                    warn!(error = %err, "push channel write failed");
                    return;
                }
            }
            let _ = sink.close().await;
        });

        tokio::spawn(async move {
            while let Some(message) = stream.next().await {
                match message {
                    Ok(WsMessage::Text(text)) => {
                        if in_tx.send(text).is_err() {
                            break;
                        }
                    }
                    Ok(WsMessage::Binary(bytes)) => match String::from_utf8(bytes) {
                        Ok(text) => {
                            if in_tx.send(text).is_err() {
                                break;
                            }
                        }
                        Err(_) => debug!("non-utf8 binary frame skipped"),
                    },
                    Ok(WsMessage::Close(_)) => break,
                    Ok(_) => {}
                    Err(err) => {
                        warn!(error = %err, "push channel read failed");
                        break;
                    }
                }
            }
        });

        Ok(TransportLink {
            outbound: out_tx,
            inbound: in_rx,
        })
    }
}
