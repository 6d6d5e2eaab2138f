//! Client - backend との通信レイヤー
//!
//! # 構成
//! - **connection**: push channel の接続管理と request/response の相関
//! - **pending**: 応答待ちリクエストの表（相関 ID → waiter）
//! - **requests**: 型付きの client action と HTTP / 静的デフォルトへのフォールバック

pub mod connection;
pub mod pending;
pub mod requests;

pub use self::connection::{
    ConnectionManager, ConnectionOptions, ConnectionStatus, NotificationSink,
};
pub use self::pending::{PendingGuard, PendingRequests, Resolution};
pub use self::requests::ClientActions;
