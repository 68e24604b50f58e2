use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

/// A stable identifier derived from a document's path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentId {
    pub numeric: u64,
    /// The short hex string for human display (e.g. "a1b2c3").
    pub short: String,
}

impl DocumentId {
    pub fn new(path: &str) -> Self {
        let mut hasher = DefaultHasher::new();
        path.hash(&mut hasher);
        let numeric = hasher.finish();
        Self {
            numeric,
            short: format!("{numeric:016x}")[..6].to_string(),
        }
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.short)
    }
}
