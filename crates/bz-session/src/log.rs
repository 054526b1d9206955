//! Append-only conversation log
//!
//! The log is the single merge point for the push path and the request
//! path. Both paths append; nothing else mutates. Entries are never
//! reordered or edited after append, and the logical index of an entry is
//! its position at append time.

use std::sync::RwLock;

use bz_core::ConversationEntry;

/// Ordered, append-only record of the conversation.
///
/// Safe to share across tasks; `snapshot` never observes a torn entry.
#[derive(Default)]
pub struct ConversationLog {
    entries: RwLock<Vec<ConversationEntry>>,
}

impl ConversationLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, returning its logical index
    pub fn append(&self, entry: ConversationEntry) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.push(entry);
        entries.len() - 1
    }

    /// Atomically empty the log. Used only by session reset.
    pub fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.clear();
    }

    /// Current ordered sequence of entries, for the presentation layer
    pub fn snapshot(&self) -> Vec<ConversationEntry> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.clone()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.len()
    }

    /// Check if the log is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
