//! Typed - 型付き notification API
//!
//! action 名の typo を型で排除し、Handler との対応付けを静的に保証します。
//!
//! # 二層構造
//! - **表層（Typed）**: `Notification` trait, `Handler<N>` trait - 型安全
//! - **内部（Dyn）**: `DynHandler` trait - object-safe, type erasure

pub mod handler;
pub mod notification;
pub mod registry;

pub use self::handler::{DynHandler, Handler, TypedHandler};
pub use self::notification::Notification;
pub use self::registry::{DispatchOutcome, RegistryError, TypedRegistry};
