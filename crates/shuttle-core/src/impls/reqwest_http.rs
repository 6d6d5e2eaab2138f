//! ReqwestHttpApi - `/api/v1` over reqwest

use std::time::Duration;

use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::SyncError;
use crate::ports::HttpApi;

#[derive(Debug, Clone)]
pub struct ReqwestHttpApi {
    client: reqwest::Client,
    base: Url,
}

impl ReqwestHttpApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SyncError> {
        let base = Url::parse(base_url)
            .map_err(|e| SyncError::Http(format!("invalid base url {base_url}: {e}")))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::Http(e.to_string()))?;
        Ok(Self { client, base })
    }

    fn endpoint(&self, path: &str) -> Result<Url, SyncError> {
        self.base
            .join(&format!("api/v1/{}", path.trim_start_matches('/')))
            .map_err(|e| SyncError::Http(e.to_string()))
    }
}

async fn into_json(response: reqwest::Response) -> Result<Value, SyncError> {
    let status = response.status();
    if !status.is_success() {
        return Err(SyncError::Http(format!("status {status}")));
    }
    response
        .json::<Value>()
        .await
        .map_err(|e| SyncError::Decode(e.to_string()))
}

#[async_trait::async_trait]
impl HttpApi for ReqwestHttpApi {
    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value, SyncError> {
        let url = self.endpoint(path)?;
        debug!(%url, "GET");
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| SyncError::Http(e.to_string()))?;
        into_json(response).await
    }

    async fn post_action(&self, action: &str, payload: Value) -> Result<Value, SyncError> {
        let url = self.endpoint(&format!("actions/{action}"))?;
        debug!(%url, "POST");
        let response = self
            .client
            .post(url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| SyncError::Http(e.to_string()))?;
        into_json(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_live_under_api_v1() {
        let api = ReqwestHttpApi::new("http://localhost:8080", Duration::from_secs(1)).unwrap();
        assert_eq!(
            api.endpoint("/environments").unwrap().as_str(),
            "http://localhost:8080/api/v1/environments"
        );
        assert_eq!(
            api.endpoint("actions/task.move").unwrap().as_str(),
            "http://localhost:8080/api/v1/actions/task.move"
        );
    }

    #[test]
    fn bad_base_url_is_rejected() {
        assert!(ReqwestHttpApi::new("::nope::", Duration::from_secs(1)).is_err());
    }
}
