//! Ports - 抽象化レイヤー
//!
//! 各 trait は外部システム（backend の push channel, HTTP API, 時計, ID 生成）
//! へのインターフェースを提供し、実装の詳細を隠蔽します。

pub mod clock;
pub mod http_api;
pub mod id_generator;
pub mod transport;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::http_api::HttpApi;
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::transport::{PushTransport, TransportLink};
