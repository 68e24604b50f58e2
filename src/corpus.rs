//! Sources of document text for search.

use std::path::Path;

use crate::{
    doc_id::DocumentId,
    error::{Error, Result},
    library_db::LibraryDb,
};

/// Read-only access to a set of named documents.
///
/// Implementations are queried from several threads at once while a search
/// runs, hence the `Sync` bound.
pub trait ContentProvider: Sync {
    /// Every document id, in a stable order.
    fn document_ids(&self) -> Result<Vec<String>>;

    /// Full text of one document.
    fn text(&self, document_id: &str) -> Result<String>;
}

/// Documents held in memory, kept in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemoryCorpus {
    documents: Vec<(String, String)>,
}

impl MemoryCorpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a document.
    pub fn insert(&mut self, id: impl Into<String>, text: impl Into<String>) {
        let id = id.into();
        let text = text.into();
        match self.documents.iter_mut().find(|(existing, _)| *existing == id) {
            Some(slot) => slot.1 = text,
            None => self.documents.push((id, text)),
        }
    }

    pub fn with(
        mut self,
        id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        self.insert(id, text);
        self
    }
}

impl ContentProvider for MemoryCorpus {
    fn document_ids(&self) -> Result<Vec<String>> {
        Ok(self.documents.iter().map(|(id, _)| id.clone()).collect())
    }

    fn text(&self, document_id: &str) -> Result<String> {
        self.documents
            .iter()
            .find(|(id, _)| id == document_id)
            .map(|(_, text)| text.clone())
            .ok_or_else(|| Error::NotFound {
                kind: "document",
                name: document_id.to_string(),
            })
    }
}

/// Registered library documents, read from disk on demand.
pub struct LibraryCorpus<'a> {
    db: &'a LibraryDb,
}

impl<'a> LibraryCorpus<'a> {
    pub fn new(db: &'a LibraryDb) -> Self {
        Self { db }
    }
}

impl ContentProvider for LibraryCorpus<'_> {
    fn document_ids(&self) -> Result<Vec<String>> {
        Ok(self
            .db
            .list_documents()?
            .into_iter()
            .map(|(name, _)| name)
            .collect())
    }

    fn text(&self, document_id: &str) -> Result<String> {
        let path =
            self.db
                .get_document(document_id)?
                .ok_or_else(|| Error::NotFound {
                    kind: "document",
                    name: document_id.to_string(),
                })?;
        Ok(std::fs::read_to_string(path)?)
    }
}

/// Library name for a file added without an explicit one.
///
/// Uses the file stem, suffixed with a short hash of the full path when
/// another file already holds that name.
pub fn default_name(db: &LibraryDb, path: &Path) -> Result<String> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("untitled")
        .to_string();

    let path_str = path.to_string_lossy();
    match db.get_document(&stem)? {
        Some(existing) if existing != path_str => {
            let id = DocumentId::new(&path_str);
            Ok(format!("{stem}-{}", id.short))
        }
        _ => Ok(stem),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> (tempfile::TempDir, LibraryDb) {
        let tmp = tempfile::tempdir().unwrap();
        let db = LibraryDb::open(&tmp.path().join("library.redb")).unwrap();
        (tmp, db)
    }

    #[test]
    fn memory_corpus_keeps_order_and_replaces() {
        let mut corpus = MemoryCorpus::new().with("b", "one").with("a", "two");
        corpus.insert("b", "three");
        assert_eq!(corpus.document_ids().unwrap(), vec!["b", "a"]);
        assert_eq!(corpus.text("b").unwrap(), "three");
        assert!(matches!(
            corpus.text("missing"),
            Err(Error::NotFound { kind: "document", .. })
        ));
    }

    #[test]
    fn library_corpus_reads_registered_files() {
        let (tmp, db) = test_db();
        let path = tmp.path().join("moby.txt");
        std::fs::write(&path, "Call me Ishmael.").unwrap();
        db.add_document("moby", &path.to_string_lossy()).unwrap();

        let corpus = LibraryCorpus::new(&db);
        assert_eq!(corpus.document_ids().unwrap(), vec!["moby"]);
        assert_eq!(corpus.text("moby").unwrap(), "Call me Ishmael.");
        assert!(corpus.text("dracula").is_err());
    }

    #[test]
    fn library_corpus_reports_missing_files() {
        let (tmp, db) = test_db();
        let path = tmp.path().join("gone.txt");
        db.add_document("gone", &path.to_string_lossy()).unwrap();
        assert!(matches!(
            LibraryCorpus::new(&db).text("gone"),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn default_name_disambiguates_collisions() {
        let (tmp, db) = test_db();
        let first = tmp.path().join("a").join("notes.md");
        let second = tmp.path().join("b").join("notes.md");

        assert_eq!(default_name(&db, &first).unwrap(), "notes");
        db.add_document("notes", &first.to_string_lossy()).unwrap();

        // Re-adding the same file keeps its name.
        assert_eq!(default_name(&db, &first).unwrap(), "notes");

        let other = default_name(&db, &second).unwrap();
        assert!(other.starts_with("notes-"));
        assert_eq!(other.len(), "notes-".len() + 6);
    }
}
