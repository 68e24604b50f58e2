//! folio - chapter detection and line search for long-form text.
//!
//! folio scans plain-text or Markdown books for chapter headings (Chinese
//! `第X章` style, English `Chapter N` style, Markdown `#` headings and a few
//! numbering schemes), scores each heading, and nests the survivors into a
//! table of contents. A line-oriented search engine ranks plain-text or
//! regular-expression matches across a library of documents, and a bounded
//! history remembers past queries.
//!
//! # Quick start
//!
//! ```
//! use folio::{
//!     GenerationConfig,
//!     MemoryCorpus,
//!     QueryEngine,
//!     SearchQuery,
//!     TocGenerator,
//! };
//!
//! let body = "It was a bright cold day in April. ".repeat(3);
//! let text =
//!     format!("Chapter 1 Arrival\n{body}\nChapter 2 Departure\n{body}");
//!
//! let toc = TocGenerator::new()
//!     .generate("novel", &text, &GenerationConfig::default())
//!     .unwrap();
//! assert_eq!(toc.chapters.len(), 2);
//!
//! let corpus = MemoryCorpus::new().with("novel", text.as_str());
//! let report = QueryEngine::new(2000)
//!     .search(&SearchQuery::new("april"), &corpus)
//!     .unwrap();
//! for hit in &report.results {
//!     let chapter = toc.chapter_at(hit.position).unwrap();
//!     println!("{} @ {}: {}", chapter.title, hit.position, hit.snippet);
//! }
//! ```

pub mod confidence;
pub mod config;
pub mod corpus;
pub mod data_dir;
pub mod detect;
pub mod doc_id;
pub mod error;
pub mod generator;
pub mod hierarchy;
pub mod history;
pub mod library_db;
pub mod merge;
pub mod pattern;
pub mod query;
pub mod relevance;
pub mod toc;

pub use config::{GenerationConfig, SearchDefaults, Settings};
pub use corpus::{ContentProvider, LibraryCorpus, MemoryCorpus};
pub use data_dir::DataDir;
pub use doc_id::DocumentId;
pub use error::{Error, Result};
pub use generator::TocGenerator;
pub use history::{HistoryStore, PersistentHistory, SearchHistory};
pub use library_db::LibraryDb;
pub use pattern::{Pattern, PatternSet};
pub use query::{QueryEngine, SearchQuery, SearchReport, SearchResult};
pub use toc::{Chapter, GenerationMethod, TableOfContents};
