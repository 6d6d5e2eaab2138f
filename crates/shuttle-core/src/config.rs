//! SyncConfig - 接続先とタイムアウトの設定
//!
//! Loaded from TOML; every field has a default, so an empty or missing file
//! is a valid configuration. Environment overrides are applied last through
//! an injectable lookup so tests never touch the process environment.
//!
//! ```toml
//! ws_url = "ws://localhost:8080/ws"
//! request_timeout_ms = 15000
//!
//! [launch_timeouts]
//! resume = 90000
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::actions::LaunchIntent;

pub const ENV_WS_URL: &str = "SHUTTLE_WS_URL";
pub const ENV_HTTP_URL: &str = "SHUTTLE_HTTP_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Default deadline of `session.launch` per intent, in milliseconds.
///
/// Resuming and restoring a workspace wait on the backend to rebuild an
/// existing environment, so they get more time than a cold start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchTimeouts {
    pub prepare: u64,
    pub start: u64,
    pub start_created: u64,
    pub resume: u64,
    pub workflow_step: u64,
    pub restore_workspace: u64,
}

impl Default for LaunchTimeouts {
    fn default() -> Self {
        Self {
            prepare: 30_000,
            start: 30_000,
            start_created: 30_000,
            resume: 60_000,
            workflow_step: 30_000,
            restore_workspace: 60_000,
        }
    }
}

impl LaunchTimeouts {
    pub fn for_intent(&self, intent: LaunchIntent) -> Duration {
        let ms = match intent {
            LaunchIntent::Prepare => self.prepare,
            LaunchIntent::Start => self.start,
            LaunchIntent::StartCreated => self.start_created,
            LaunchIntent::Resume => self.resume,
            LaunchIntent::WorkflowStep => self.workflow_step,
            LaunchIntent::RestoreWorkspace => self.restore_workspace,
        };
        Duration::from_millis(ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub ws_url: String,
    pub http_base_url: String,
    pub request_timeout_ms: u64,
    pub hydration_timeout_ms: u64,
    /// Send `request.cancel` to the backend when a request times out.
    pub cancel_on_timeout: bool,
    pub launch_timeouts: LaunchTimeouts,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            ws_url: "ws://localhost:8080/ws".to_string(),
            http_base_url: "http://localhost:8080".to_string(),
            request_timeout_ms: 15_000,
            hydration_timeout_ms: 10_000,
            cancel_on_timeout: false,
            launch_timeouts: LaunchTimeouts::default(),
        }
    }
}

impl SyncConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        Self::from_toml_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `SHUTTLE_*` overrides. `lookup` is usually `|k| std::env::var(k).ok()`.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(ENV_WS_URL).filter(|v| !v.is_empty()) {
            self.ws_url = url;
        }
        if let Some(url) = lookup(ENV_HTTP_URL).filter(|v| !v.is_empty()) {
            self.http_base_url = url;
        }
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn hydration_timeout(&self) -> Duration {
        Duration::from_millis(self.hydration_timeout_ms)
    }
}
