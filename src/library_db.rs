use std::path::Path;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

use crate::{
    error::Result,
    history::{HistoryStore, SearchHistoryEntry},
    toc::TableOfContents,
};

type StrTable = TableDefinition<'static, &'static str, &'static str>;

const DOCUMENTS: StrTable = TableDefinition::new("documents");
const SETTINGS: StrTable = TableDefinition::new("settings");
const HISTORY: StrTable = TableDefinition::new("history");
const TOCS: StrTable = TableDefinition::new("tocs");

const HISTORY_KEY: &str = "entries";

/// Local key/value store: registered documents, settings, search history
/// and the last generated table of contents per document.
pub struct LibraryDb {
    db: Database,
}

impl LibraryDb {
    pub fn open(path: &Path) -> Result<Self> {
        let db = Database::create(path)?;

        // Ensure all tables exist by opening them in a write transaction.
        let txn = db.begin_write()?;
        txn.open_table(DOCUMENTS)?;
        txn.open_table(SETTINGS)?;
        txn.open_table(HISTORY)?;
        txn.open_table(TOCS)?;
        txn.commit()?;

        Ok(Self { db })
    }

    // -- Documents --

    pub fn add_document(&self, name: &str, path: &str) -> Result<()> {
        self.put(DOCUMENTS, name, path)
    }

    pub fn get_document(&self, name: &str) -> Result<Option<String>> {
        self.get(DOCUMENTS, name)
    }

    /// Forget a document and its cached table of contents.
    pub fn remove_document(&self, name: &str) -> Result<bool> {
        let txn = self.db.begin_write()?;
        let removed = {
            let mut documents = txn.open_table(DOCUMENTS)?;
            let mut tocs = txn.open_table(TOCS)?;
            tocs.remove(name)?;
            documents.remove(name)?.is_some()
        };
        txn.commit()?;
        Ok(removed)
    }

    pub fn list_documents(&self) -> Result<Vec<(String, String)>> {
        self.list(DOCUMENTS)
    }

    // -- Settings --

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.put(SETTINGS, key, value)
    }

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        self.get(SETTINGS, key)
    }

    pub fn remove_setting(&self, key: &str) -> Result<bool> {
        let txn = self.db.begin_write()?;
        let removed = {
            let mut table = txn.open_table(SETTINGS)?;
            table.remove(key)?.is_some()
        };
        txn.commit()?;
        Ok(removed)
    }

    pub fn list_settings(&self) -> Result<Vec<(String, String)>> {
        self.list(SETTINGS)
    }

    // -- Tables of contents --

    /// Store `toc` under its document, replacing any previous one.
    pub fn store_toc(&self, toc: &TableOfContents) -> Result<()> {
        self.put(TOCS, &toc.document_id, &toc.to_json()?)
    }

    /// The stored table for `document`, with its generation method intact.
    pub fn load_toc(
        &self,
        document: &str,
    ) -> Result<Option<TableOfContents>> {
        match self.get(TOCS, document)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    // -- Helpers --

    fn put(
        &self,
        definition: StrTable,
        key: &str,
        value: &str,
    ) -> Result<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(definition)?;
            table.insert(key, value)?;
        }
        txn.commit()?;
        Ok(())
    }

    fn get(
        &self,
        definition: StrTable,
        key: &str,
    ) -> Result<Option<String>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(definition)?;
        Ok(table.get(key)?.map(|v| v.value().to_string()))
    }

    fn list(
        &self,
        definition: StrTable,
    ) -> Result<Vec<(String, String)>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(definition)?;
        let mut result = Vec::new();
        for entry in table.iter()? {
            let (k, v) = entry?;
            result.push((k.value().to_string(), v.value().to_string()));
        }
        Ok(result)
    }
}

impl HistoryStore for LibraryDb {
    fn load_history(&self) -> Result<Vec<SearchHistoryEntry>> {
        match self.get(HISTORY, HISTORY_KEY)? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    fn save_history(&self, entries: &[SearchHistoryEntry]) -> Result<()> {
        self.put(HISTORY, HISTORY_KEY, &serde_json::to_string(entries)?)
    }
}

impl std::fmt::Debug for LibraryDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibraryDb").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::toc::{Chapter, GenerationMethod};

    fn test_db() -> (tempfile::TempDir, LibraryDb) {
        let tmp = tempfile::tempdir().unwrap();
        let db = LibraryDb::open(&tmp.path().join("library.redb")).unwrap();
        (tmp, db)
    }

    #[test]
    fn documents_crud() {
        let (_tmp, db) = test_db();

        assert_eq!(db.list_documents().unwrap(), vec![]);
        assert_eq!(db.get_document("moby").unwrap(), None);

        db.add_document("moby", "/books/moby.txt").unwrap();
        assert_eq!(
            db.get_document("moby").unwrap(),
            Some("/books/moby.txt".to_string())
        );

        let documents = db.list_documents().unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].0, "moby");

        assert!(db.remove_document("moby").unwrap());
        assert!(!db.remove_document("moby").unwrap());
        assert_eq!(db.get_document("moby").unwrap(), None);
    }

    #[test]
    fn settings_crud() {
        let (_tmp, db) = test_db();

        assert_eq!(db.get_setting("history.cap").unwrap(), None);
        db.set_setting("history.cap", "20").unwrap();
        assert_eq!(
            db.get_setting("history.cap").unwrap(),
            Some("20".to_string())
        );
        assert_eq!(db.list_settings().unwrap().len(), 1);
        assert!(db.remove_setting("history.cap").unwrap());
        assert_eq!(db.get_setting("history.cap").unwrap(), None);
    }

    #[test]
    fn history_roundtrip() {
        let (_tmp, db) = test_db();
        assert!(db.load_history().unwrap().is_empty());

        let entries = vec![SearchHistoryEntry {
            query: "whale".to_string(),
            timestamp: Utc::now(),
            result_count: 3,
        }];
        db.save_history(&entries).unwrap();
        assert_eq!(db.load_history().unwrap(), entries);
    }

    #[test]
    fn toc_is_replaced_and_removed_with_document() {
        let (_tmp, db) = test_db();
        db.add_document("moby", "/books/moby.txt").unwrap();

        let first = TableOfContents::automatic(
            "moby",
            vec![Chapter::new(1, "Loomings", 1, 0, 0.9)],
        );
        db.store_toc(&first).unwrap();
        let second = TableOfContents::automatic("moby", vec![]);
        db.store_toc(&second).unwrap();

        let loaded = db.load_toc("moby").unwrap().unwrap();
        assert_eq!(loaded.id, second.id);
        assert!(loaded.chapters.is_empty());
        assert_eq!(loaded.method, GenerationMethod::Automatic);

        db.remove_document("moby").unwrap();
        assert!(db.load_toc("moby").unwrap().is_none());
    }

    #[test]
    fn stored_toc_keeps_its_method() {
        let (_tmp, db) = test_db();
        let mut toc = TableOfContents::automatic(
            "moby",
            vec![Chapter::new(1, "Loomings", 1, 0, 0.9)],
        );
        toc.add_chapter(None, Chapter::new(0, "Carpet-Bag", 1, 500, 0.8))
            .unwrap();
        db.store_toc(&toc).unwrap();
        let loaded = db.load_toc("moby").unwrap().unwrap();
        assert_eq!(loaded.method, GenerationMethod::Hybrid);
        assert_eq!(loaded.chapters, toc.chapters);

        let manual = TableOfContents::manual("journey");
        db.store_toc(&manual).unwrap();
        let loaded = db.load_toc("journey").unwrap().unwrap();
        assert_eq!(loaded.method, GenerationMethod::Manual);
    }

    #[test]
    fn reopen_preserves_data() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("library.redb");

        {
            let db = LibraryDb::open(&path).unwrap();
            db.add_document("moby", "/books/moby.txt").unwrap();
            db.set_setting("history.cap", "10").unwrap();
        }

        {
            let db = LibraryDb::open(&path).unwrap();
            assert_eq!(
                db.get_document("moby").unwrap(),
                Some("/books/moby.txt".to_string())
            );
            assert_eq!(
                db.get_setting("history.cap").unwrap(),
                Some("10".to_string())
            );
        }
    }
}
