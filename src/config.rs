//! Generation and search settings.
//!
//! Defaults live here; overrides are stored as strings in the `settings`
//! table of the library database, keyed by the names in [`KEYS`].

use std::{path::PathBuf, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    library_db::LibraryDb,
    pattern::{Pattern, default_patterns, load_patterns},
};

pub const DEFAULT_MIN_CHAPTER_LENGTH: usize = 100;
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.6;
pub const DEFAULT_MAX_DEPTH: u32 = 3;
pub const DEFAULT_CHARS_PER_PAGE: usize = 2000;
pub const DEFAULT_HISTORY_CAP: usize = 50;

/// Every recognised settings key.
pub const KEYS: &[&str] = &[
    "toc.min_chapter_length",
    "toc.confidence_threshold",
    "toc.max_depth",
    "toc.patterns_file",
    "search.case_sensitive",
    "search.whole_words",
    "search.use_regex",
    "search.max_results",
    "history.cap",
    "chars_per_page",
];

/// Inputs to one table-of-contents generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Texts shorter than this many characters are rejected.
    pub min_chapter_length: usize,
    pub confidence_threshold: f32,
    pub patterns: Vec<Pattern>,
    pub max_depth: u32,
    pub chars_per_page: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            min_chapter_length: DEFAULT_MIN_CHAPTER_LENGTH,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            patterns: default_patterns(),
            max_depth: DEFAULT_MAX_DEPTH,
            chars_per_page: DEFAULT_CHARS_PER_PAGE,
        }
    }
}

/// Defaults applied to queries that do not say otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchDefaults {
    pub case_sensitive: bool,
    pub whole_words: bool,
    pub use_regex: bool,
    pub max_results: Option<usize>,
    pub history_cap: usize,
    pub chars_per_page: usize,
}

impl Default for SearchDefaults {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            whole_words: false,
            use_regex: false,
            max_results: None,
            history_cap: DEFAULT_HISTORY_CAP,
            chars_per_page: DEFAULT_CHARS_PER_PAGE,
        }
    }
}

/// Everything configurable, resolved against the settings table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub generation: GenerationConfig,
    pub search: SearchDefaults,
    /// JSON pattern file replacing the built-in rules, if configured.
    pub patterns_file: Option<PathBuf>,
}

impl Settings {
    /// Read every known key, falling back to defaults for missing ones.
    pub fn load(db: &LibraryDb) -> Result<Self> {
        let mut settings = Self::default();
        for key in KEYS {
            if let Some(value) = db.get_setting(key)? {
                settings.apply(key, &value)?;
            }
        }
        if let Some(path) = &settings.patterns_file {
            match load_patterns(path) {
                Ok(patterns) => settings.generation.patterns = patterns,
                Err(e) => tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "cannot read pattern file, using built-in rules"
                ),
            }
        }
        Ok(settings)
    }

    /// Validate and persist one override. A pattern file must exist and
    /// parse before it is recorded.
    pub fn set(db: &LibraryDb, key: &str, value: &str) -> Result<()> {
        let mut settings = Self::default();
        settings.apply(key, value)?;
        if let Some(path) = &settings.patterns_file {
            load_patterns(path)?;
        }
        db.set_setting(key, value)
    }

    /// Apply a single `key = value` override to this value.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "toc.min_chapter_length" => {
                self.generation.min_chapter_length = parse(key, value)?;
            }
            "toc.confidence_threshold" => {
                let threshold: f32 = parse(key, value)?;
                if !(0.0..=1.0).contains(&threshold) {
                    return Err(Error::Config(format!(
                        "{key} must be between 0 and 1, got {value}"
                    )));
                }
                self.generation.confidence_threshold = threshold;
            }
            "toc.max_depth" => self.generation.max_depth = parse(key, value)?,
            "toc.patterns_file" => {
                self.patterns_file = Some(PathBuf::from(value));
            }
            "search.case_sensitive" => {
                self.search.case_sensitive = parse(key, value)?;
            }
            "search.whole_words" => {
                self.search.whole_words = parse(key, value)?;
            }
            "search.use_regex" => self.search.use_regex = parse(key, value)?,
            "search.max_results" => {
                self.search.max_results = Some(parse(key, value)?);
            }
            "history.cap" => self.search.history_cap = parse(key, value)?,
            "chars_per_page" => {
                let chars: usize = parse(key, value)?;
                if chars == 0 {
                    return Err(Error::Config(format!(
                        "{key} must be positive"
                    )));
                }
                self.generation.chars_per_page = chars;
                self.search.chars_per_page = chars;
            }
            _ => {
                return Err(Error::NotFound {
                    kind: "setting",
                    name: key.to_string(),
                });
            }
        }
        Ok(())
    }
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("invalid value for {key}: {value}")))
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
    fn defaults_without_overrides() {
        let (_tmp, db) = test_db();
        let settings = Settings::load(&db).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.generation.min_chapter_length, 100);
        assert_eq!(settings.generation.confidence_threshold, 0.6);
        assert_eq!(settings.search.history_cap, 50);
    }

    #[test]
    fn overrides_are_applied() {
        let (_tmp, db) = test_db();
        Settings::set(&db, "toc.confidence_threshold", "0.75").unwrap();
        Settings::set(&db, "search.whole_words", "true").unwrap();
        Settings::set(&db, "chars_per_page", "500").unwrap();

        let settings = Settings::load(&db).unwrap();
        assert_eq!(settings.generation.confidence_threshold, 0.75);
        assert!(settings.search.whole_words);
        assert_eq!(settings.generation.chars_per_page, 500);
        assert_eq!(settings.search.chars_per_page, 500);
    }

    #[test]
    fn invalid_values_are_not_stored() {
        let (_tmp, db) = test_db();
        assert!(matches!(
            Settings::set(&db, "toc.max_depth", "deep"),
            Err(Error::Config(_))
        ));
        assert!(Settings::set(&db, "toc.confidence_threshold", "1.5").is_err());
        assert!(Settings::set(&db, "chars_per_page", "0").is_err());
        assert_eq!(db.get_setting("toc.max_depth").unwrap(), None);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let (_tmp, db) = test_db();
        assert!(matches!(
            Settings::set(&db, "theme", "dark"),
            Err(Error::NotFound { kind: "setting", .. })
        ));
    }

    #[test]
    fn patterns_file_replaces_defaults() {
        let (tmp, db) = test_db();
        let path = tmp.path().join("rules.json");
        std::fs::write(
            &path,
            r#"[{"regex":"^Act \\d+","level_hint":1,"weight":0.9,"label":"act"}]"#,
        )
        .unwrap();
        Settings::set(&db, "toc.patterns_file", &path.to_string_lossy())
            .unwrap();

        let settings = Settings::load(&db).unwrap();
        assert_eq!(settings.generation.patterns.len(), 1);
        assert_eq!(settings.generation.patterns[0].label, "act");

        std::fs::remove_file(&path).unwrap();
        let settings = Settings::load(&db).unwrap();
        assert_eq!(settings.generation.patterns, default_patterns());
        assert_eq!(settings.patterns_file.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn missing_patterns_file_is_not_stored() {
        let (tmp, db) = test_db();
        let path = tmp.path().join("missing.json");
        assert!(matches!(
            Settings::set(&db, "toc.patterns_file", &path.to_string_lossy()),
            Err(Error::Io(_))
        ));
        assert_eq!(db.get_setting("toc.patterns_file").unwrap(), None);

        let garbage = tmp.path().join("garbage.json");
        std::fs::write(&garbage, "not json").unwrap();
        assert!(
            Settings::set(&db, "toc.patterns_file", &garbage.to_string_lossy())
                .is_err()
        );
        assert!(Settings::load(&db).is_ok());
    }
}
