//! Line-oriented search over a [`ContentProvider`].

use rayon::prelude::*;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::{
    config::SearchDefaults,
    corpus::ContentProvider,
    error::Result,
    relevance::{
        char_to_byte,
        estimate_page,
        plain_relevance,
        snippet,
        total_pages,
    },
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub text: String,
    pub use_regex: bool,
    pub case_sensitive: bool,
    /// Plain-text mode only; ignored for regular expressions.
    pub whole_words: bool,
    /// Restrict the search to these documents, in this order.
    pub target_document_ids: Option<Vec<String>>,
    pub max_results: Option<usize>,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// A query for `text` carrying the configured defaults.
    pub fn with_defaults(
        text: impl Into<String>,
        defaults: &SearchDefaults,
    ) -> Self {
        Self {
            text: text.into(),
            use_regex: defaults.use_regex,
            case_sensitive: defaults.case_sensitive,
            whole_words: defaults.whole_words,
            target_document_ids: None,
            max_results: defaults.max_results,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub document_id: String,
    /// Character offset of the match in the document.
    pub position: usize,
    pub context_line: String,
    pub snippet: String,
    pub page: Option<u32>,
    pub relevance: f32,
    pub matched_text: String,
}

/// A document that contributed nothing because it could not be searched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedDocument {
    pub document_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchReport {
    pub results: Vec<SearchResult>,
    pub skipped: Vec<SkippedDocument>,
}

pub struct QueryEngine {
    chars_per_page: usize,
}

impl QueryEngine {
    pub fn new(chars_per_page: usize) -> Self {
        Self {
            chars_per_page: chars_per_page.max(1),
        }
    }

    pub fn from_defaults(defaults: &SearchDefaults) -> Self {
        Self::new(defaults.chars_per_page)
    }

    /// Run `query` against every selected document of `corpus`.
    ///
    /// Each line contributes at most its first match. Results are ranked by
    /// relevance; equal scores keep document order, then position order.
    pub fn search<P: ContentProvider>(
        &self,
        query: &SearchQuery,
        corpus: &P,
    ) -> Result<SearchReport> {
        if query.text.is_empty() {
            return Ok(SearchReport::default());
        }

        let ids = match &query.target_document_ids {
            Some(ids) => ids.clone(),
            None => corpus.document_ids()?,
        };

        let plain = if query.use_regex {
            None
        } else {
            Some(
                RegexBuilder::new(&regex::escape(&query.text))
                    .case_insensitive(!query.case_sensitive)
                    .build()?,
            )
        };

        let scanned: Vec<_> = ids
            .par_iter()
            .map(|id| self.scan_document(query, plain.as_ref(), id, corpus))
            .collect();

        let mut report = SearchReport::default();
        for outcome in scanned {
            match outcome {
                Ok(results) => report.results.extend(results),
                Err(skipped) => {
                    tracing::warn!(
                        document = %skipped.document_id,
                        reason = %skipped.reason,
                        "skipping document"
                    );
                    report.skipped.push(skipped);
                }
            }
        }

        report
            .results
            .sort_by(|a, b| b.relevance.total_cmp(&a.relevance));
        if let Some(max) = query.max_results {
            report.results.truncate(max);
        }

        tracing::debug!(
            query = %query.text,
            documents = ids.len(),
            results = report.results.len(),
            skipped = report.skipped.len(),
            "search complete"
        );
        Ok(report)
    }

    fn scan_document<P: ContentProvider>(
        &self,
        query: &SearchQuery,
        plain: Option<&Regex>,
        document_id: &str,
        corpus: &P,
    ) -> std::result::Result<Vec<SearchResult>, SkippedDocument> {
        let skip = |reason: String| SkippedDocument {
            document_id: document_id.to_string(),
            reason,
        };

        let text = corpus.text(document_id).map_err(|e| skip(e.to_string()))?;
        let matcher = match plain {
            Some(regex) => Matcher::Plain(regex),
            None => Matcher::Pattern(
                RegexBuilder::new(&query.text)
                    .case_insensitive(!query.case_sensitive)
                    .build()
                    .map_err(|e| skip(format!("invalid expression: {e}")))?,
            ),
        };

        Ok(self.scan_text(query, &matcher, document_id, &text))
    }

    fn scan_text(
        &self,
        query: &SearchQuery,
        matcher: &Matcher<'_>,
        document_id: &str,
        text: &str,
    ) -> Vec<SearchResult> {
        let map = char_to_byte(text);
        let content_length = map.len() - 1;
        let pages = total_pages(content_length, self.chars_per_page);

        let mut results = Vec::new();
        let mut line_start = 0usize;

        for raw_line in text.split('\n') {
            let line_chars = raw_line.chars().count();
            let line = raw_line.strip_suffix('\r').unwrap_or(raw_line);

            if let Some((byte_start, byte_end)) = matcher.first_match(
                line,
                query.whole_words,
            ) {
                let start = line_start + line[..byte_start].chars().count();
                let end = start + line[byte_start..byte_end].chars().count();
                let relevance = match matcher {
                    Matcher::Plain(_) => {
                        plain_relevance(&query.text, line, query.case_sensitive)
                    }
                    Matcher::Pattern(_) => 1.0,
                };

                results.push(SearchResult {
                    document_id: document_id.to_string(),
                    position: start,
                    context_line: line.to_string(),
                    snippet: snippet(text, &map, start, end),
                    page: Some(estimate_page(start, content_length, pages)),
                    relevance,
                    matched_text: line[byte_start..byte_end].to_string(),
                });
            }

            line_start += line_chars + 1;
        }

        results
    }
}

enum Matcher<'a> {
    Plain(&'a Regex),
    Pattern(Regex),
}

impl Matcher<'_> {
    /// Byte range of the first acceptable match on `line`.
    fn first_match(
        &self,
        line: &str,
        whole_words: bool,
    ) -> Option<(usize, usize)> {
        match self {
            Self::Plain(regex) => regex
                .find_iter(line)
                .find(|m| {
                    !whole_words || is_whole_token(line, m.start(), m.end())
                })
                .map(|m| (m.start(), m.end())),
            Self::Pattern(regex) => regex
                .find_iter(line)
                .find(|m| !m.is_empty())
                .map(|m| (m.start(), m.end())),
        }
    }
}

/// Whether `line[start..end]` is exactly one whitespace-separated token.
fn is_whole_token(line: &str, start: usize, end: usize) -> bool {
    if line[start..end].contains(char::is_whitespace) {
        return false;
    }
    let before = line[..start].chars().next_back();
    let after = line[end..].chars().next();
    before.is_none_or(char::is_whitespace)
        && after.is_none_or(char::is_whitespace)
}
