//! StubHttpApi - 開発・テスト用の HTTP 応答スタブ
//!
//! Responses are keyed by path (`"environments"`, `"state"`) or by
//! `"actions/{action}"`. Unknown keys answer with an HTTP 404 error.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use serde_json::Value;

use crate::error::SyncError;
use crate::ports::HttpApi;

#[derive(Default)]
pub struct StubHttpApi {
    responses: Mutex<HashMap<String, Result<Value, SyncError>>>,
    calls: Mutex<Vec<String>>,
}

impl StubHttpApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, key: &str, response: Result<Value, SyncError>) -> Self {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), response);
        self
    }

    /// Keys requested so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn answer(&self, key: String) -> Result<Value, SyncError> {
        let response = self
            .responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned();
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(key);
        response.unwrap_or_else(|| Err(SyncError::Http("status 404 Not Found".to_string())))
    }
}

#[async_trait::async_trait]
impl HttpApi for StubHttpApi {
    async fn get_json(&self, path: &str, _query: &[(&str, String)]) -> Result<Value, SyncError> {
        self.answer(path.trim_start_matches('/').to_string())
    }

    async fn post_action(&self, action: &str, _payload: Value) -> Result<Value, SyncError> {
        self.answer(format!("actions/{action}"))
    }
}
