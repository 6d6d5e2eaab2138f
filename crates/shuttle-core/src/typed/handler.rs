//! Handler trait - notification を Store に適用する Handler の定義
//!
//! # 学習ポイント
//! - ジェネリック trait (`Handler<N>`)
//! - Object-safe trait (`DynHandler`)
//! - Type erasure パターン (`TypedHandler<N, H>` → `DynHandler`)
//!
//! Handlers are pure with respect to the outside world: they read the
//! current state and the decoded payload and write the next state. No I/O.

use std::marker::PhantomData;

use serde_json::Value;

use super::notification::Notification;
use crate::store::AppState;

/// Handler は decode 済みの notification を state に適用する
///
/// Any `Fn(&mut AppState, N)` is a handler, so domain modules register plain
/// functions:
/// ```ignore
/// registry.register::<TaskCreated, _>(tasks::on_task_created)?;
/// ```
pub trait Handler<N: Notification>: Send + Sync {
    fn apply(&self, state: &mut AppState, event: N);
}

impl<N, F> Handler<N> for F
where
    N: Notification,
    F: Fn(&mut AppState, N) + Send + Sync,
{
    fn apply(&self, state: &mut AppState, event: N) {
        self(state, event)
    }
}

/// DynHandler は object-safe な Handler の抽象化
///
/// `HashMap<&str, Arc<dyn DynHandler>>` に格納するための型消去レイヤー。
pub trait DynHandler: Send + Sync {
    fn apply_dyn(&self, state: &mut AppState, payload: Value) -> Result<(), serde_json::Error>;
    fn action(&self) -> &'static str;
}

pub struct TypedHandler<N: Notification, H: Handler<N>> {
    handler: H,
    _marker: PhantomData<fn(N)>,
}

impl<N: Notification, H: Handler<N>> TypedHandler<N, H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            _marker: PhantomData,
        }
    }
}

impl<N: Notification, H: Handler<N>> DynHandler for TypedHandler<N, H> {
    fn apply_dyn(&self, state: &mut AppState, payload: Value) -> Result<(), serde_json::Error> {
        let event: N = serde_json::from_value(payload)?;
        self.handler.apply(state, event);
        Ok(())
    }

    fn action(&self) -> &'static str {
        N::ACTION
    }
}
