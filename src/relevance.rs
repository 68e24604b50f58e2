//! Ranking, snippet and page helpers shared by search and TOC generation.

/// Characters of context kept on each side of a match.
pub const SNIPPET_RADIUS: usize = 30;

/// Maximum snippet length in characters before truncation.
pub const SNIPPET_MAX_CHARS: usize = 100;

const WHOLE_WORD_BONUS: f32 = 0.3;
const LINE_START_BONUS: f32 = 0.2;

/// Relevance of a plain-text `term` found on `line`, in `[0, 1]`.
///
/// Short lines dominated by the term rank higher, with bonuses when the term
/// appears as a standalone token and when the line opens with it.
///
/// ```
/// use folio::relevance::plain_relevance;
///
/// let score = plain_relevance("cat", "The cat sat on a mat", false);
/// assert!(score > 0.4 && score < 0.5);
/// ```
pub fn plain_relevance(term: &str, line: &str, case_sensitive: bool) -> f32 {
    let line_len = line.chars().count();
    if line_len == 0 {
        return 0.0;
    }
    let term_len = term.chars().count();
    let mut score = term_len as f32 / line_len as f32;

    if has_whole_word(term, line, case_sensitive) {
        score += WHOLE_WORD_BONUS;
    }
    if !term.is_empty()
        && line
            .trim_start()
            .to_lowercase()
            .starts_with(&term.to_lowercase())
    {
        score += LINE_START_BONUS;
    }

    score.min(1.0)
}

/// Whether some whitespace-delimited token of `line` equals `term`.
pub fn has_whole_word(term: &str, line: &str, case_sensitive: bool) -> bool {
    if case_sensitive {
        line.split_whitespace().any(|token| token == term)
    } else {
        let term = term.to_lowercase();
        line.split_whitespace()
            .any(|token| token.to_lowercase() == term)
    }
}

/// Map from character index to byte index, with one trailing entry for the
/// end of the text.
pub fn char_to_byte(text: &str) -> Vec<usize> {
    text.char_indices()
        .map(|(byte_idx, _)| byte_idx)
        .chain(std::iter::once(text.len()))
        .collect()
}

/// Context around the character range `[start, end)` of `text`.
///
/// Takes [`SNIPPET_RADIUS`] characters on either side, folds line breaks to
/// spaces and truncates to [`SNIPPET_MAX_CHARS`] with `...`.
pub fn snippet(
    text: &str,
    char_to_byte: &[usize],
    start: usize,
    end: usize,
) -> String {
    let char_count = char_to_byte.len().saturating_sub(1);
    let from = start.saturating_sub(SNIPPET_RADIUS).min(char_count);
    let to = (end + SNIPPET_RADIUS).min(char_count).max(from);

    let window: String = text[char_to_byte[from]..char_to_byte[to]]
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();

    if window.chars().count() > SNIPPET_MAX_CHARS {
        let mut truncated: String =
            window.chars().take(SNIPPET_MAX_CHARS).collect();
        truncated.push_str("...");
        truncated
    } else {
        window
    }
}

/// Page count for a text of `content_length` characters.
pub fn total_pages(content_length: usize, chars_per_page: usize) -> u32 {
    let pages = content_length.div_ceil(chars_per_page.max(1));
    u32::try_from(pages).unwrap_or(u32::MAX).max(1)
}

/// 1-based page holding `position`, proportional to its place in the text.
///
/// ```
/// use folio::relevance::estimate_page;
///
/// assert_eq!(estimate_page(0, 1000, 10), 1);
/// assert_eq!(estimate_page(450, 1000, 10), 5);
/// assert_eq!(estimate_page(5000, 1000, 10), 10);
/// ```
pub fn estimate_page(
    position: usize,
    content_length: usize,
    total_pages: u32,
) -> u32 {
    let total_pages = total_pages.max(1);
    if content_length == 0 {
        return 1;
    }
    let fraction = position as f64 / content_length as f64;
    let page = (fraction * f64::from(total_pages)).ceil();
    (page as u32).clamp(1, total_pages)
}
