//! Domain identifiers (strongly-typed IDs).
//!
//! サーバーが発行する ID はすべて opaque な文字列です。
//! `Id<T>` は文字列をそのまま保持し、`T` は PhantomData のマーカー型として
//! コンパイル時の型安全性だけを提供します（TaskId と SessionId は混同できない）。
//!
//! Correlation ids are the one exception: they are minted locally from a ULID
//! so they sort by creation time in logs.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;
use std::marker::PhantomData;
use ulid::Ulid;

/// IdMarker は各 ID 型のマーカー trait
///
/// `kind()` is only used by `Debug` output (`task:abc123`).
pub trait IdMarker: Send + Sync + 'static {
    fn kind() -> &'static str;
}

/// Generic opaque ID.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id<T: IdMarker> {
    value: String,
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            _marker: PhantomData,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn into_inner(self) -> String {
        self.value
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl<T: IdMarker> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", T::kind(), self.value)
    }
}

impl<T: IdMarker> From<&str> for Id<T> {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl<T: IdMarker> From<String> for Id<T> {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl<T: IdMarker> Borrow<str> for Id<T> {
    fn borrow(&self) -> &str {
        &self.value
    }
}

impl<T: IdMarker> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.value)
    }
}

impl<'de, T: IdMarker> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

// ========================================
// マーカー型の定義
// ========================================

macro_rules! id_marker {
    ($marker:ident, $alias:ident, $kind:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $marker {}

        impl IdMarker for $marker {
            fn kind() -> &'static str {
                $kind
            }
        }

        pub type $alias = Id<$marker>;
    };
}

id_marker!(Workspace, WorkspaceId, "workspace");
id_marker!(Workflow, WorkflowId, "workflow");
id_marker!(Step, StepId, "step");
id_marker!(Task, TaskId, "task");
id_marker!(Session, SessionId, "session");
id_marker!(Message, MessageId, "message");
id_marker!(Turn, TurnId, "turn");
id_marker!(Agent, AgentId, "agent");
id_marker!(AgentProfile, AgentProfileId, "agent_profile");
id_marker!(Executor, ExecutorId, "executor");
id_marker!(Environment, EnvironmentId, "environment");
id_marker!(Permission, PermissionId, "permission");
id_marker!(Terminal, TerminalId, "terminal");
id_marker!(User, UserId, "user");

/// Correlation id of a client-initiated request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(String);

impl CorrelationId {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CorrelationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_keep_the_server_value_verbatim() {
        let task = TaskId::new("t-123");
        assert_eq!(task.to_string(), "t-123");
        assert_eq!(format!("{task:?}"), "task:t-123");

        // let _: SessionId = task; // <- does not compile
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = WorkflowId::new("wf-1");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, r#""wf-1""#);

        let back: WorkflowId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn ids_can_be_looked_up_by_str() {
        let mut map = std::collections::HashMap::new();
        map.insert(StepId::new("s-1"), 1);
        assert_eq!(map.get("s-1"), Some(&1));
    }

    #[test]
    fn correlation_ids_from_ulid_are_sortable() {
        let a = CorrelationId::from_ulid(Ulid::from_parts(1, 0));
        let b = CorrelationId::from_ulid(Ulid::from_parts(2, 0));
        assert!(a < b);
    }
}
