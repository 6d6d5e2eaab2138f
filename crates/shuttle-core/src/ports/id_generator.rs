//! IdGenerator port - correlation id 生成の抽象化
//!
//! Entity ids are always issued by the backend; the only ids minted locally
//! are request correlation ids.
//!
//! # 実装
//! - **UlidGenerator**: ULID ベース（時刻でソート可能）

use ulid::Ulid;

use crate::domain::CorrelationId;
use crate::ports::Clock;

pub trait IdGenerator: Send + Sync {
    fn correlation_id(&self) -> CorrelationId;
}

/// UlidGenerator は Clock の時刻 + 乱数から ULID を生成
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn correlation_id(&self) -> CorrelationId {
        let timestamp_ms = self.clock.now().timestamp_millis() as u64;
        CorrelationId::from_ulid(Ulid::from_parts(timestamp_ms, rand::random()))
    }
}
