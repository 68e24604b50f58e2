//! Line scanner that turns raw text into chapter candidates.

use serde::{Deserialize, Serialize};

use crate::pattern::PatternSet;

/// Lines shorter than this (after trimming) are never headings.
const MIN_LINE_CHARS: usize = 2;

/// An unverified heading detection. Discarded after filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterCandidate {
    pub title: String,
    pub level: u32,
    /// Character offset of the line start in the whole text.
    pub start_position: usize,
    pub raw_confidence: f32,
}

/// Scan `text` line by line and emit one candidate per line matched by a
/// rule in `patterns`.
///
/// Offsets count characters, and every line (skipped or not) advances the
/// running offset by its length plus one for the newline.
///
/// ```
/// use folio::detect::detect;
/// use folio::pattern::{default_patterns, PatternSet};
///
/// let patterns = PatternSet::compile(&default_patterns());
/// let found = detect("Chapter 1 Start\nbody text\nChapter 2 End", &patterns);
/// assert_eq!(found.len(), 2);
/// assert_eq!(found[1].start_position, 26);
/// ```
pub fn detect(text: &str, patterns: &PatternSet) -> Vec<ChapterCandidate> {
    let mut candidates = Vec::new();
    let mut offset = 0usize;

    for line in text.split('\n') {
        let line_chars = line.chars().count();
        let trimmed = line.trim();

        if trimmed.chars().count() >= MIN_LINE_CHARS
            && let Some(rule) = patterns.first_match(trimmed)
        {
            let (title, level) = if rule.markdown {
                markdown_heading(trimmed)
            } else {
                (trimmed.to_string(), rule.level_hint)
            };

            if !title.is_empty() {
                candidates.push(ChapterCandidate {
                    title,
                    level,
                    start_position: offset,
                    raw_confidence: rule.weight,
                });
            }
        }

        offset += line_chars + 1;
    }

    tracing::debug!(count = candidates.len(), "detected heading candidates");
    candidates
}

/// Split a Markdown ATX heading into its title and level.
fn markdown_heading(line: &str) -> (String, u32) {
    let hashes = line.chars().take_while(|&c| c == '#').count();
    let title = line[hashes..].trim().to_string();
    (title, hashes as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::{Pattern, default_patterns};

    fn defaults() -> PatternSet {
        PatternSet::compile(&default_patterns())
    }

    #[test]
    fn offsets_include_skipped_lines() {
        let text = "\nx\nChapter 1 Begin\n";
        let found = detect(text, &defaults());
        assert_eq!(found.len(), 1);
        // "" (1) + "x" (2) = 3
        assert_eq!(found[0].start_position, 3);
    }

    #[test]
    fn offsets_count_characters_not_bytes() {
        let text = "第一章 开始\n正文内容\n第二章 继续";
        let found = detect(text, &defaults());
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].start_position, 0);
        assert_eq!(found[1].start_position, 7 + 5);
    }

    #[test]
    fn markdown_level_from_hash_count() {
        let text = "# Book\n## Part\n### Detail ###";
        let found = detect(text, &defaults());
        let levels: Vec<_> = found.iter().map(|c| c.level).collect();
        assert_eq!(levels, vec![1, 2, 3]);
        assert_eq!(found[1].title, "Part");
        assert_eq!(found[2].title, "Detail ###");
    }

    #[test]
    fn first_matching_rule_wins() {
        let patterns = PatternSet::compile(&[
            Pattern::new("^Chapter", 1, 0.4, "loose"),
            Pattern::new(r"^Chapter \d+", 2, 0.9, "strict"),
        ]);
        let found = detect("Chapter 7", &patterns);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].level, 1);
        assert_eq!(found[0].raw_confidence, 0.4);
    }

    #[test]
    fn indented_headings_are_trimmed() {
        let found = detect("   Chapter 4 Indented  ", &defaults());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Chapter 4 Indented");
        assert_eq!(found[0].start_position, 0);
    }

    #[test]
    fn no_rules_no_candidates() {
        let found = detect("Chapter 1\nChapter 2", &PatternSet::default());
        assert!(found.is_empty());
    }

    #[test]
    fn crlf_lines_are_handled() {
        let text = "Chapter 1 A\r\nbody\r\nChapter 2 B\r\n";
        let found = detect(text, &defaults());
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].title, "Chapter 1 A");
        assert_eq!(found[1].start_position, 13 + 6);
    }
}
