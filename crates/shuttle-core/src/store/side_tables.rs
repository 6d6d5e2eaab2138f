//! Client-only tables keyed by session id.
//!
//! Nothing on the wire ever deletes these entries; they are dropped only by
//! an explicit purge when the owning session (or its task) goes away.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::{QueueStatus, SessionId};

/// An editor tab the user opened inside a session's workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorTab {
    pub path: String,
    #[serde(default)]
    pub pinned: bool,
}

/// A file attached to the next prompt as context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextFile {
    pub path: String,
    #[serde(default)]
    pub pinned: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SideTables {
    pub open_tabs: HashMap<SessionId, Vec<EditorTab>>,
    pub queued_messages: HashMap<SessionId, QueueStatus>,
    pub context_files: HashMap<SessionId, Vec<ContextFile>>,
}

impl SideTables {
    /// Open a tab; reopening an already open path is a no-op.
    pub fn open_tab(&mut self, session_id: &SessionId, tab: EditorTab) {
        let tabs = self.open_tabs.entry(session_id.clone()).or_default();
        if !tabs.iter().any(|t| t.path == tab.path) {
            tabs.push(tab);
        }
    }

    pub fn close_tab(&mut self, session_id: &SessionId, path: &str) {
        if let Some(tabs) = self.open_tabs.get_mut(session_id) {
            tabs.retain(|t| t.path != path);
        }
    }

    pub fn add_context_file(&mut self, session_id: &SessionId, file: ContextFile) {
        let files = self.context_files.entry(session_id.clone()).or_default();
        match files.iter_mut().find(|f| f.path == file.path) {
            Some(existing) => *existing = file,
            None => files.push(file),
        }
    }

    /// Drop every entry keyed by `session_id`. Returns how many tables held one.
    pub fn purge_session(&mut self, session_id: &SessionId) -> usize {
        [
            self.open_tabs.remove(session_id).is_some(),
            self.queued_messages.remove(session_id).is_some(),
            self.context_files.remove(session_id).is_some(),
        ]
        .into_iter()
        .filter(|removed| *removed)
        .count()
    }

    pub fn is_empty(&self) -> bool {
        self.open_tabs.is_empty()
            && self.queued_messages.is_empty()
            && self.context_files.is_empty()
    }
}
