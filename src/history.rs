//! Session history.
//!
//! The router never decides what the "current" location is; it asks a
//! [`History`]. In a browser that would wrap `window.history`; this crate
//! ships [`MemoryHistory`], a back/forward stack kept in memory, which is
//! what hosts without a browser (and the tests) use.

use crate::debug_log;
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};

/// State stored alongside a history entry.
pub type HistoryState = serde_json::Value;

/// Session history collaborator.
///
/// Methods take `&self`; implementations use interior mutability because the
/// history is shared by every router of a [`RouterGroup`](crate::RouterGroup).
pub trait History {
    /// Add a new entry and make it current.
    fn push(&self, path: &str, state: Option<HistoryState>);

    /// Overwrite the current entry.
    fn replace(&self, path: &str, state: Option<HistoryState>);

    /// State of the current entry.
    fn state(&self) -> Option<HistoryState>;

    /// Path of the current entry, query string included.
    fn path(&self) -> String;
}

/// One entry of a [`MemoryHistory`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub path: String,
    pub state: Option<HistoryState>,
}

impl HistoryEntry {
    fn new(path: &str, state: Option<HistoryState>) -> Self {
        Self {
            path: path.to_string(),
            state,
        }
    }
}

/// In-memory back/forward stack.
///
/// Starts with a single `/` entry. Pushing drops any forward entries.
#[derive(Debug)]
pub struct MemoryHistory {
    entries: RefCell<Vec<HistoryEntry>>,
    current: Cell<usize>,
}

impl MemoryHistory {
    /// Create a history whose only entry is `/`.
    pub fn new() -> Self {
        Self::starting_at("/")
    }

    /// Create a history whose only entry is `path`.
    pub fn starting_at(path: &str) -> Self {
        Self {
            entries: RefCell::new(vec![HistoryEntry::new(path, None)]),
            current: Cell::new(0),
        }
    }

    /// Step back one entry. Returns `false` at the start of the stack.
    pub fn back(&self) -> bool {
        let current = self.current.get();
        if current == 0 {
            return false;
        }
        self.current.set(current - 1);
        debug_log!("History back to '{}'", self.path());
        true
    }

    /// Step forward one entry. Returns `false` at the end of the stack.
    pub fn forward(&self) -> bool {
        if !self.can_go_forward() {
            return false;
        }
        self.current.set(self.current.get() + 1);
        debug_log!("History forward to '{}'", self.path());
        true
    }

    /// Check if can go back
    pub fn can_go_back(&self) -> bool {
        self.current.get() > 0
    }

    /// Check if can go forward
    pub fn can_go_forward(&self) -> bool {
        self.current.get() + 1 < self.entries.borrow().len()
    }

    /// Number of entries, forward entries included.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Always `false`; a history has at least one entry.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Index of the current entry.
    pub fn index(&self) -> usize {
        self.current.get()
    }

    /// Copy of every entry, oldest first.
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.entries.borrow().clone()
    }

    fn with_current<T>(&self, f: impl FnOnce(&HistoryEntry) -> T) -> T {
        f(&self.entries.borrow()[self.current.get()])
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl History for MemoryHistory {
    fn push(&self, path: &str, state: Option<HistoryState>) {
        let mut entries = self.entries.borrow_mut();
        let next = self.current.get() + 1;
        entries.truncate(next);
        entries.push(HistoryEntry::new(path, state));
        self.current.set(next);
        debug_log!("History push '{}' ({} entries)", path, entries.len());
    }

    fn replace(&self, path: &str, state: Option<HistoryState>) {
        self.entries.borrow_mut()[self.current.get()] = HistoryEntry::new(path, state);
        debug_log!("History replace '{}'", path);
    }

    fn state(&self) -> Option<HistoryState> {
        self.with_current(|entry| entry.state.clone())
    }

    fn path(&self) -> String {
        self.with_current(|entry| entry.path.clone())
    }
}
