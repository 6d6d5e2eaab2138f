//! App - アプリケーション層
//!
//! このモジュールは、client と store を組み合わせてアプリケーションロジックを実装します。
//!
//! # 主要コンポーネント
//! - **AppBuilder**: アプリケーションの構築とワイヤリング
//! - **SyncContext**: store / connection / actions を束ねるコンテキスト
//! - **hydration**: HTTP スナップショットを現在の Store にマージ
//! - **reconcile**: 楽観的更新とロールバック
//! - **status**: ステータスビュー

pub mod builder;
pub mod context;
pub mod hydration;
pub mod reconcile;
pub mod status;

// 主要な型を再エクスポート
pub use self::builder::{AppBuilder, BuildError};
pub use self::context::{StoreDispatcher, SyncContext};
pub use self::hydration::{HydrationScope, HydrationSnapshot};
pub use self::reconcile::{AutomationEvent, MoveOutcome};
pub use self::status::SyncStatus;
