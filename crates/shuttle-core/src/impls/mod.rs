//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **WsTransport**: tokio-tungstenite による本番用 push channel
//! - **ReqwestHttpApi**: reqwest による `/api/v1` クライアント
//! - **InMemoryTransport**: テスト用の push channel（サーバー側を台本で操作）
//! - **StubHttpApi**: テスト用の HTTP 応答スタブ

pub mod inmem_transport;
pub mod reqwest_http;
pub mod stub_http;
pub mod ws_transport;

pub use self::inmem_transport::{InMemoryServer, InMemoryTransport, ServerPeer};
pub use self::reqwest_http::ReqwestHttpApi;
pub use self::stub_http::StubHttpApi;
pub use self::ws_transport::WsTransport;
