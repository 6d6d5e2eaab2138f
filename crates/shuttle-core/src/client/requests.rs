//! Typed client actions over the request/response layer.
//!
//! Each action knows its payload and response types and its default
//! deadline. Passive reads degrade instead of failing:
//! `environment.list` falls back to HTTP, then to the static default set.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::connection::ConnectionManager;
use crate::config::SyncConfig;
use crate::domain::actions::{
    ENVIRONMENT_LIST, EnvironmentListResponse, LaunchSessionRequest, LaunchSessionResponse,
    MESSAGE_QUEUE_ADD, MESSAGE_QUEUE_CANCEL, MESSAGE_QUEUE_GET, MESSAGE_QUEUE_UPDATE,
    MoveTaskRequest, MoveTaskResponse, PERMISSION_RESPOND, PermissionReply, QueueMessageRequest,
    SESSION_LAUNCH, SESSION_SUBSCRIBE, SessionRef, TASK_MOVE, TASK_SUBSCRIBE, TaskRef,
};
use crate::domain::{Environment, QueueStatus, SessionId, TaskId, TaskSession};
use crate::error::SyncError;
use crate::ports::HttpApi;

#[derive(Clone)]
pub struct ClientActions {
    connection: ConnectionManager,
    http: Arc<dyn HttpApi>,
    config: Arc<SyncConfig>,
}

impl ClientActions {
    pub fn new(
        connection: ConnectionManager,
        http: Arc<dyn HttpApi>,
        config: Arc<SyncConfig>,
    ) -> Self {
        Self {
            connection,
            http,
            config,
        }
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    pub fn http(&self) -> &Arc<dyn HttpApi> {
        &self.http
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Encode, send over the push channel and decode the reply.
    pub async fn call<Req, Resp>(
        &self,
        action: &str,
        request: &Req,
        timeout: Duration,
    ) -> Result<Resp, SyncError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let payload = serde_json::to_value(request)?;
        let reply = self.connection.request(action, payload, timeout).await?;
        Ok(serde_json::from_value(reply)?)
    }

    /// Like `call`, but retried as a direct HTTP action when the channel is down.
    async fn call_or_post<Req, Resp>(&self, action: &str, request: &Req) -> Result<Resp, SyncError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        match self.call(action, request, self.config.request_timeout()).await {
            Err(SyncError::ChannelUnavailable) => {
                debug!(action, "push channel unavailable; posting over http");
                let reply = self
                    .http
                    .post_action(action, serde_json::to_value(request)?)
                    .await?;
                Ok(serde_json::from_value(reply)?)
            }
            other => other,
        }
    }

    /// `session.launch`. `timeout` defaults to the intent's configured deadline.
    pub async fn launch_session(
        &self,
        request: &LaunchSessionRequest,
        timeout: Option<Duration>,
    ) -> Result<TaskSession, SyncError> {
        let timeout =
            timeout.unwrap_or_else(|| self.config.launch_timeouts.for_intent(request.intent));
        let response: LaunchSessionResponse = self.call(SESSION_LAUNCH, request, timeout).await?;
        Ok(response.session)
    }

    pub async fn respond_permission(&self, reply: &PermissionReply) -> Result<(), SyncError> {
        let _: Value = self.call_or_post(PERMISSION_RESPOND, reply).await?;
        Ok(())
    }

    pub async fn queue_message(
        &self,
        session_id: &SessionId,
        content: &str,
    ) -> Result<QueueStatus, SyncError> {
        let request = QueueMessageRequest {
            session_id: session_id.clone(),
            content: content.to_string(),
        };
        self.call(MESSAGE_QUEUE_ADD, &request, self.config.request_timeout())
            .await
    }

    pub async fn update_queued_message(
        &self,
        session_id: &SessionId,
        content: &str,
    ) -> Result<QueueStatus, SyncError> {
        let request = QueueMessageRequest {
            session_id: session_id.clone(),
            content: content.to_string(),
        };
        self.call(MESSAGE_QUEUE_UPDATE, &request, self.config.request_timeout())
            .await
    }

    pub async fn cancel_queued_message(
        &self,
        session_id: &SessionId,
    ) -> Result<QueueStatus, SyncError> {
        let request = SessionRef {
            session_id: session_id.clone(),
        };
        self.call(MESSAGE_QUEUE_CANCEL, &request, self.config.request_timeout())
            .await
    }

    pub async fn queue_status(&self, session_id: &SessionId) -> Result<QueueStatus, SyncError> {
        let request = SessionRef {
            session_id: session_id.clone(),
        };
        self.call(MESSAGE_QUEUE_GET, &request, self.config.request_timeout())
            .await
    }

    pub async fn move_task(
        &self,
        request: &MoveTaskRequest,
    ) -> Result<MoveTaskResponse, SyncError> {
        self.call(TASK_MOVE, request, self.config.request_timeout())
            .await
    }

    pub async fn subscribe_task(&self, task_id: &TaskId) -> Result<(), SyncError> {
        let request = TaskRef {
            task_id: task_id.clone(),
        };
        let _: Value = self
            .call(TASK_SUBSCRIBE, &request, self.config.request_timeout())
            .await?;
        Ok(())
    }

    pub async fn subscribe_session(&self, session_id: &SessionId) -> Result<(), SyncError> {
        let request = SessionRef {
            session_id: session_id.clone(),
        };
        let _: Value = self
            .call(SESSION_SUBSCRIBE, &request, self.config.request_timeout())
            .await?;
        Ok(())
    }

    /// Environments from the push channel, else `GET /api/v1/environments`,
    /// else the static defaults. Never fails.
    pub async fn list_environments(&self) -> Vec<Environment> {
        let via_channel: Result<EnvironmentListResponse, SyncError> = self
            .call(ENVIRONMENT_LIST, &serde_json::json!({}), self.config.request_timeout())
            .await;
        match via_channel {
            Ok(response) => return response.environments,
            Err(err) => debug!(error = %err, "environment.list over channel failed"),
        }

        match self.http.get_json("environments", &[]).await {
            Ok(body) => match decode_environments(body) {
                Ok(environments) => return environments,
                Err(err) => warn!(error = %err, "environment list over http undecodable"),
            },
            Err(err) => warn!(error = %err, "environment list over http failed"),
        }
        Environment::static_defaults()
    }
}

/// Accepts `{ "environments": [...] }` or a bare array.
fn decode_environments(body: Value) -> Result<Vec<Environment>, SyncError> {
    if body.is_array() {
        return Ok(serde_json::from_value(body)?);
    }
    let response: EnvironmentListResponse = serde_json::from_value(body)?;
    Ok(response.environments)
}
