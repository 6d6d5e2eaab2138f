//! AppBuilder - アプリケーションの構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）
//! - Store → Dispatcher → Connection → Actions の順に配線する

use std::sync::Arc;

use super::context::{StoreDispatcher, SyncContext};
use crate::client::{ClientActions, ConnectionManager, ConnectionOptions};
use crate::config::SyncConfig;
use crate::handlers;
use crate::observability::DispatchStats;
use crate::ports::{Clock, HttpApi, PushTransport, SystemClock, UlidGenerator};
use crate::store::StoreHandle;
use crate::typed::{Handler, Notification, RegistryError, TypedRegistry};

/// AppBuilder は SyncContext を構築
///
/// # 使用例
/// ```ignore
/// let ctx = AppBuilder::new(config)
///     .with_default_handlers()?
///     .expect_actions(handlers::ALL_ACTIONS)
///     .build(transport, http)?;
/// ```
///
/// # Fail-fast 設計
/// - expect_actions() で期待される action を登録
/// - build() 時に「期待集合 ⊆ 登録済み集合」をチェック
/// - 不足があれば BuildError を返す
pub struct AppBuilder {
    config: SyncConfig,
    registry: TypedRegistry,
    expected_actions: Option<Vec<String>>,
    clock: Arc<dyn Clock>,
}

/// BuildError はアプリケーション構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing handlers for actions: {0:?}. These actions were expected but not registered.")]
    MissingActions(Vec<String>),
}

impl AppBuilder {
    pub fn new(config: SyncConfig) -> Self {
        Self {
            config,
            registry: TypedRegistry::new(),
            expected_actions: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Handler を登録
    pub fn register<N: Notification, H: Handler<N> + 'static>(
        mut self,
        handler: H,
    ) -> Result<Self, RegistryError> {
        self.registry.register::<N, H>(handler)?;
        Ok(self)
    }

    /// Every domain handler.
    pub fn with_default_handlers(mut self) -> Result<Self, RegistryError> {
        handlers::register_all(&mut self.registry)?;
        Ok(self)
    }

    /// 期待される action のリストを設定
    pub fn expect_actions(mut self, actions: &[&str]) -> Self {
        self.expected_actions = Some(actions.iter().map(|a| a.to_string()).collect());
        self
    }

    /// Clock for envelope timestamps and correlation ids.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// 検証してから SyncContext を生成
    pub fn build(
        self,
        transport: Arc<dyn PushTransport>,
        http: Arc<dyn HttpApi>,
    ) -> Result<SyncContext, BuildError> {
        if let Some(expected) = &self.expected_actions {
            let registered = self.registry.registered_actions();
            let missing: Vec<String> = expected
                .iter()
                .filter(|action| !registered.contains(action))
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Err(BuildError::MissingActions(missing));
            }
        }

        let store = StoreHandle::default();
        let stats = Arc::new(DispatchStats::default());
        let sink = StoreDispatcher::new(store.clone(), Arc::new(self.registry), stats.clone());
        let options = ConnectionOptions {
            cancel_on_timeout: self.config.cancel_on_timeout,
            clock: self.clock.clone(),
            ids: Arc::new(UlidGenerator::new(self.clock)),
        };
        let connection = ConnectionManager::new(transport, Arc::new(sink), options);
        let actions = ClientActions::new(connection, http, Arc::new(self.config));
        Ok(SyncContext::new(store, actions, stats))
    }
}
