use serde::{Deserialize, Serialize};

use crate::element::{Element, ElementId};

/// Oldest entries are evicted past this point to bound memory in long
/// sessions.
pub const HISTORY_LIMIT: usize = 50;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryKind {
    Add,
    Delete,
    Update,
}

/// One recorded mutation. Carries full before/after snapshots so undo can
/// restore an element attribute-for-attribute, not merely by id.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub kind: HistoryKind,
    pub element_id: ElementId,
    pub before: Option<Element>,
    pub after: Option<Element>,
    pub timestamp: u64,
}

/// Linear undo stack with a cursor.
///
/// The cursor counts applied entries; `0..cursor` have been applied,
/// `cursor..len` are redoable. Recording a new entry while the cursor is
/// behind the tip truncates the redoable tail first.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct History {
    entries: Vec<HistoryEntry>,
    cursor: usize,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, entry: HistoryEntry) {
        self.entries.truncate(self.cursor);
        self.entries.push(entry);
        if self.entries.len() > HISTORY_LIMIT {
            self.entries.remove(0);
        } else {
            self.cursor += 1;
            return;
        }
        // Eviction dropped the oldest applied entry; the cursor already
        // pointed at the tip, so it stays at len.
        self.cursor = self.entries.len();
    }

    /// Entry to invert for undo, if any. Does not move the cursor.
    pub fn peek_undo(&self) -> Option<&HistoryEntry> {
        self.cursor.checked_sub(1).map(|i| &self.entries[i])
    }

    /// Entry to re-apply for redo, if any. Does not move the cursor.
    pub fn peek_redo(&self) -> Option<&HistoryEntry> {
        self.entries.get(self.cursor)
    }

    pub fn step_back(&mut self) {
        debug_assert!(self.cursor > 0);
        self.cursor -= 1;
    }

    pub fn step_forward(&mut self) {
        debug_assert!(self.cursor < self.entries.len());
        self.cursor += 1;
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }
}

pub(crate) fn timestamp_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
