//! shuttle-core
//!
//! Client-side real-time state sync engine: a push channel to the backend,
//! correlated requests over it, and a typed notification registry that keeps
//! an in-memory replica of backend state current.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, envelope, board, session, agents, settings, events, actions）
//! - **ports**: 抽象化レイヤー（PushTransport, HttpApi, Clock, IdGenerator）
//! - **impls**: 実装（WsTransport, ReqwestHttpApi, InMemoryTransport, StubHttpApi）
//! - **store**: AppState と StoreHandle、kanban view、selectors
//! - **typed**: 型付き Notification API（Notification trait, Handler trait, TypedRegistry）
//! - **handlers**: ドメインごとの notification handler
//! - **client**: ConnectionManager, pending table, typed client actions
//! - **app**: AppBuilder, SyncContext, hydration, reconcile, status
//! - config / error / observability

pub mod app;
pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod impls;
pub mod observability;
pub mod ports;
pub mod store;
pub mod typed;
