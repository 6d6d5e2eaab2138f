//! Store - single authoritative state container
//!
//! # 設計原則
//! - all writes go through `StoreHandle::write`, one closure at a time
//! - the lock is a std `Mutex` held only inside the closure; an `.await`
//!   cannot happen while it is held
//! - every committed write bumps a revision on a `watch` channel
//!
//! Async continuations (request replies, hydration) must call `read`/`write`
//! again after resuming instead of reusing values captured before the await.

pub mod kanban;
pub mod selectors;
pub mod side_tables;
pub mod state;

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;

pub use kanban::{KanbanView, TaskPlacement};
pub use side_tables::{ContextFile, EditorTab, SideTables};
pub use state::{AppState, GitHubSlice};

/// Shared handle to the store. Cloning is cheap and every clone sees the same state.
#[derive(Clone)]
pub struct StoreHandle {
    state: Arc<Mutex<AppState>>,
    revision: Arc<watch::Sender<u64>>,
}

impl StoreHandle {
    pub fn new(state: AppState) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            state: Arc::new(Mutex::new(state)),
            revision: Arc::new(revision),
        }
    }

    pub fn read<R>(&self, f: impl FnOnce(&AppState) -> R) -> R {
        let guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    /// Apply one write and publish the next revision.
    pub fn write<R>(&self, f: impl FnOnce(&mut AppState) -> R) -> R {
        let result = {
            let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            f(&mut guard)
        };
        self.revision.send_modify(|rev| *rev += 1);
        result
    }

    pub fn snapshot(&self) -> AppState {
        self.read(Clone::clone)
    }

    /// Replace the whole state (reset).
    pub fn replace(&self, state: AppState) {
        self.write(|current| *current = state);
    }

    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    /// Change notifications; the value is the revision of the latest write.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }
}

impl Default for StoreHandle {
    fn default() -> Self {
        Self::new(AppState::default())
    }
}

impl std::fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreHandle")
            .field("revision", &self.revision())
            .finish_non_exhaustive()
    }
}
