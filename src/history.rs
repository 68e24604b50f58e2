//! Bounded, newest-first record of past search queries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{config::DEFAULT_HISTORY_CAP, error::Result};

/// Maximum number of suggestions returned for a prefix.
pub const MAX_SUGGESTIONS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHistoryEntry {
    pub query: String,
    pub timestamp: DateTime<Utc>,
    pub result_count: usize,
}

/// Where history is loaded from at startup and saved to after each change.
pub trait HistoryStore {
    fn load_history(&self) -> Result<Vec<SearchHistoryEntry>>;
    fn save_history(&self, entries: &[SearchHistoryEntry]) -> Result<()>;
}

impl<T: HistoryStore + ?Sized> HistoryStore for &T {
    fn load_history(&self) -> Result<Vec<SearchHistoryEntry>> {
        (**self).load_history()
    }

    fn save_history(&self, entries: &[SearchHistoryEntry]) -> Result<()> {
        (**self).save_history(entries)
    }
}

/// In-memory history. Mutation needs `&mut self`, so sharing one across
/// threads means wrapping it in a lock.
#[derive(Debug, Clone)]
pub struct SearchHistory {
    entries: Vec<SearchHistoryEntry>,
    cap: usize,
}

impl Default for SearchHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAP)
    }
}

impl SearchHistory {
    pub fn new(cap: usize) -> Self {
        Self {
            entries: Vec::new(),
            cap,
        }
    }

    /// Rebuild from stored entries, keeping the newest-first, duplicate-free
    /// shape even if the stored list was edited by hand.
    pub fn from_entries(entries: Vec<SearchHistoryEntry>, cap: usize) -> Self {
        let mut history = Self::new(cap);
        for entry in entries.into_iter().rev() {
            history.push_front(entry);
        }
        history
    }

    /// Put `query` at the head, dropping any older entry with the same text
    /// and anything past the cap.
    ///
    /// ```
    /// use folio::history::SearchHistory;
    ///
    /// let mut history = SearchHistory::default();
    /// history.record("foo", 1);
    /// history.record("bar", 2);
    /// history.record("foo", 3);
    /// assert_eq!(history.len(), 2);
    /// assert_eq!(history.entries()[0].query, "foo");
    /// ```
    pub fn record(&mut self, query: &str, result_count: usize) {
        self.push_front(SearchHistoryEntry {
            query: query.to_string(),
            timestamp: Utc::now(),
            result_count,
        });
    }

    /// Past queries containing `prefix`, ignoring case, newest first.
    pub fn suggestions(&self, prefix: &str) -> Vec<&str> {
        let needle = prefix.to_lowercase();
        self.entries
            .iter()
            .filter(|e| e.query.to_lowercase().contains(&needle))
            .take(MAX_SUGGESTIONS)
            .map(|e| e.query.as_str())
            .collect()
    }

    pub fn remove(&mut self, query: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.query != query);
        self.entries.len() != before
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[SearchHistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push_front(&mut self, entry: SearchHistoryEntry) {
        self.entries.retain(|e| e.query != entry.query);
        self.entries.insert(0, entry);
        self.entries.truncate(self.cap);
    }
}

/// A [`SearchHistory`] that writes through to a [`HistoryStore`] after
/// every mutation.
pub struct PersistentHistory<S: HistoryStore> {
    history: SearchHistory,
    store: S,
}

impl<S: HistoryStore> PersistentHistory<S> {
    pub fn load(store: S, cap: usize) -> Result<Self> {
        let history = SearchHistory::from_entries(store.load_history()?, cap);
        Ok(Self { history, store })
    }

    pub fn record(&mut self, query: &str, result_count: usize) -> Result<()> {
        self.history.record(query, result_count);
        self.save()
    }

    pub fn remove(&mut self, query: &str) -> Result<bool> {
        let removed = self.history.remove(query);
        if removed {
            self.save()?;
        }
        Ok(removed)
    }

    pub fn clear(&mut self) -> Result<()> {
        self.history.clear();
        self.save()
    }

    pub fn history(&self) -> &SearchHistory {
        &self.history
    }

    fn save(&self) -> Result<()> {
        self.store.save_history(self.history.entries())
    }
}
