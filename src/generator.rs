//! Table-of-contents generation: detect, score, merge, nest.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::{
    config::GenerationConfig,
    confidence::score_candidates,
    detect::detect,
    error::{Error, Result},
    hierarchy::build_forest,
    merge::{MergeOptions, filter_and_merge},
    pattern::PatternSet,
    toc::TableOfContents,
};

/// Builds tables of contents, one at a time per instance.
///
/// A call made while another is still running on the same generator fails
/// with [`Error::GenerationTimeout`] instead of waiting.
#[derive(Debug, Default)]
pub struct TocGenerator {
    busy: AtomicBool,
}

/// Clears the busy flag when dropped.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl TocGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Detect the chapter structure of `text`.
    ///
    /// ```
    /// use folio::{config::GenerationConfig, generator::TocGenerator};
    ///
    /// let body = "Call me Ishmael. ".repeat(5);
    /// let text = format!(
    ///     "Chapter 1 Loomings\n{body}\nChapter 2 The Carpet-Bag\n{body}"
    /// );
    /// let toc = TocGenerator::new()
    ///     .generate("moby", &text, &GenerationConfig::default())
    ///     .unwrap();
    /// assert_eq!(toc.chapters.len(), 2);
    /// assert_eq!(toc.chapters[1].title, "Chapter 2 The Carpet-Bag");
    /// ```
    pub fn generate(
        &self,
        document_id: &str,
        text: &str,
        config: &GenerationConfig,
    ) -> Result<TableOfContents> {
        let _guard = self.acquire()?;

        if text.trim().is_empty() {
            return Err(Error::NoContentFound);
        }
        let length = text.chars().count();
        if length < config.min_chapter_length {
            return Err(Error::InsufficientContent {
                length,
                minimum: config.min_chapter_length,
            });
        }

        let patterns = PatternSet::compile(&config.patterns);
        if patterns.is_empty() {
            tracing::warn!(
                document = document_id,
                "no usable heading rules, nothing can be detected"
            );
        }
        let mut candidates = detect(text, &patterns);
        let detected = candidates.len();
        score_candidates(&mut candidates);

        let flat = filter_and_merge(
            candidates,
            &MergeOptions {
                threshold: config.confidence_threshold,
                max_depth: config.max_depth,
                content_length: length,
                chars_per_page: config.chars_per_page,
            },
        );
        let kept = flat.len();
        let toc = TableOfContents::automatic(document_id, build_forest(flat));

        tracing::debug!(
            document = document_id,
            rules = patterns.rules().len(),
            rejected_rules = patterns.rejected().len(),
            detected,
            kept,
            roots = toc.chapters.len(),
            confidence = toc.overall_confidence,
            "generated table of contents"
        );
        Ok(toc)
    }

    fn acquire(&self) -> Result<BusyGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| Error::GenerationTimeout)?;
        Ok(BusyGuard(&self.busy))
    }
}
