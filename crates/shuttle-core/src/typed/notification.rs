//! Notification trait - 型付き notification の定義
//!
//! # 学習ポイント
//! - Associated Constants (`const ACTION`)
//! - `DeserializeOwned + Send + Sync + 'static` so decoded payloads can be
//!   moved into handlers stored behind `Arc<dyn DynHandler>`

use serde::de::DeserializeOwned;

/// Notification は action 名と payload 型を対応付ける
///
/// # 使用例
/// ```ignore
/// #[derive(Deserialize)]
/// struct ColumnDeleted { step_id: StepId, workflow_id: WorkflowId }
///
/// impl Notification for ColumnDeleted {
///     const ACTION: &'static str = "column.deleted";
/// }
/// ```
pub trait Notification: DeserializeOwned + Send + Sync + 'static {
    /// `{domain}.{event}` or `{domain}.{sub}.{event}`, e.g. `agent.profile.deleted`.
    const ACTION: &'static str;
}
