//! Thresholding, de-duplication and range assignment for scored candidates.

use crate::{
    detect::ChapterCandidate,
    relevance::{estimate_page, total_pages},
    toc::Chapter,
};

/// Accepted headings closer than this many characters are duplicates.
pub const DUPLICATE_WINDOW: usize = 50;

#[derive(Debug, Clone, Copy)]
pub struct MergeOptions {
    /// Minimum adjusted confidence a candidate needs to survive.
    pub threshold: f32,
    /// Deepest level kept; deeper candidates are dropped.
    pub max_depth: u32,
    /// Length of the whole text in characters.
    pub content_length: usize,
    pub chars_per_page: usize,
}

/// Turn scored candidates into flat, ranged chapters in document order.
///
/// Survivors get ids `1..` in order, an end position at the next survivor's
/// start (or the end of the text), a character count and a page estimate.
pub fn filter_and_merge(
    mut candidates: Vec<ChapterCandidate>,
    options: &MergeOptions,
) -> Vec<Chapter> {
    candidates.sort_by(|a, b| {
        a.start_position
            .cmp(&b.start_position)
            .then(b.raw_confidence.total_cmp(&a.raw_confidence))
    });

    let mut accepted: Vec<ChapterCandidate> = Vec::new();
    for candidate in candidates {
        if candidate.raw_confidence < options.threshold
            || candidate.level > options.max_depth
        {
            continue;
        }
        if let Some(last) = accepted.last()
            && candidate.start_position - last.start_position < DUPLICATE_WINDOW
        {
            continue;
        }
        accepted.push(candidate);
    }

    let pages = total_pages(options.content_length, options.chars_per_page);
    let starts: Vec<usize> =
        accepted.iter().map(|c| c.start_position).collect();

    let chapters: Vec<Chapter> = accepted
        .into_iter()
        .enumerate()
        .map(|(i, candidate)| {
            let start = candidate.start_position.min(options.content_length);
            let end = starts
                .get(i + 1)
                .copied()
                .unwrap_or(options.content_length)
                .max(start);

            let mut chapter = Chapter::new(
                i as u32 + 1,
                candidate.title,
                candidate.level,
                start,
                candidate.raw_confidence,
            );
            chapter.end_position = Some(end);
            chapter.word_count = Some(end - start);
            chapter.page_number =
                Some(estimate_page(start, options.content_length, pages));
            chapter
        })
        .collect();

    tracing::debug!(kept = chapters.len(), "merged heading candidates");
    chapters
}
