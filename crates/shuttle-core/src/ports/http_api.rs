//! HttpApi port - `/api/v1` HTTP surface
//!
//! Serves the hydration snapshot and is the degrade path for actions when the
//! push channel is unavailable.

use serde_json::Value;

use crate::error::SyncError;

#[async_trait::async_trait]
pub trait HttpApi: Send + Sync {
    /// `GET {base}/api/v1/{path}` with query parameters; returns the JSON body.
    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value, SyncError>;

    /// `POST {base}/api/v1/actions/{action}` with the action payload.
    async fn post_action(&self, action: &str, payload: Value) -> Result<Value, SyncError>;
}
