//! Title heuristics that nudge a candidate's pattern weight up or down.

use crate::detect::ChapterCandidate;

/// Adjustment applied per heuristic.
const STEP: f32 = 0.1;

/// Inclusive bounds on a plausible heading length, in characters.
const MIN_TITLE_CHARS: usize = 3;
const MAX_TITLE_CHARS: usize = 50;

const CJK_KEYWORDS: &[&str] = &[
    "章", "节", "回", "卷", "部", "篇", "集", "楔子", "序章", "尾声", "后记",
    "番外",
];

const LATIN_KEYWORDS: &[&str] = &[
    "chapter", "section", "part", "book", "volume", "prologue", "epilogue",
    "appendix",
];

const SENTENCE_TERMINALS: &[char] = &['.', '!', '?', '。', '！', '？', '…'];

/// Score a title starting from `base`, clamped to `[0, 1]`.
///
/// ```
/// use folio::confidence::score_title;
///
/// assert_eq!(score_title("第一章 开始", 0.9), 1.0);
/// assert!(score_title("SHOUTING HEADLINE!", 0.5) < 0.5);
/// ```
pub fn score_title(title: &str, base: f32) -> f32 {
    let title = title.trim();
    let mut score = base;

    let length = title.chars().count();
    if (MIN_TITLE_CHARS..=MAX_TITLE_CHARS).contains(&length) {
        score += STEP;
    }
    if contains_keyword(title) {
        score += STEP;
    }
    if is_single_case(title) {
        score -= STEP;
    }
    if ends_with_sentence_terminal(title) {
        score -= STEP;
    }

    clamp_unit(score)
}

/// Rescore every candidate in place from its raw pattern weight.
pub fn score_candidates(candidates: &mut [ChapterCandidate]) {
    for candidate in candidates.iter_mut() {
        candidate.raw_confidence =
            score_title(&candidate.title, candidate.raw_confidence);
    }
}

pub fn contains_keyword(title: &str) -> bool {
    if CJK_KEYWORDS.iter().any(|kw| title.contains(kw)) {
        return true;
    }
    let lower = title.to_lowercase();
    LATIN_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

/// True when the title has cased letters and they are all upper case or all
/// lower case. Scripts without case never trigger this.
fn is_single_case(title: &str) -> bool {
    let mut upper = false;
    let mut lower = false;
    for c in title.chars() {
        if c.is_uppercase() {
            upper = true;
        } else if c.is_lowercase() {
            lower = true;
        }
    }
    upper != lower
}

fn ends_with_sentence_terminal(title: &str) -> bool {
    title
        .chars()
        .last()
        .is_some_and(|c| SENTENCE_TERMINALS.contains(&c))
}

/// NaN collapses to zero so a bad weight can never escape the unit range.
fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn good_length_and_keyword_add_up() {
        assert!(close(score_title("Chapter One", 0.5), 0.7));
    }

    #[test]
    fn title_case_is_not_penalized() {
        // Mixed case, no keyword, good length.
        assert!(close(score_title("The Storm", 0.5), 0.6));
    }

    #[test]
    fn all_upper_is_penalized() {
        assert!(close(score_title("THE STORM", 0.5), 0.5));
    }

    #[test]
    fn all_lower_is_penalized() {
        assert!(close(score_title("the storm", 0.5), 0.5));
    }

    #[test]
    fn sentence_punctuation_is_penalized() {
        assert!(close(score_title("The Storm.", 0.5), 0.5));
        assert!(close(score_title("风暴来了。", 0.5), 0.5));
    }

    #[test]
    fn cjk_titles_have_no_case_penalty() {
        assert!(close(score_title("风暴来了", 0.5), 0.6));
    }

    #[test]
    fn short_and_long_titles_get_no_length_bonus() {
        assert!(close(score_title("Ab", 0.5), 0.5));
        let long = "A".to_string() + &"b".repeat(60);
        assert!(close(score_title(&long, 0.5), 0.5));
    }

    #[test]
    fn result_is_clamped_high() {
        assert_eq!(score_title("Chapter Nine", 0.95), 1.0);
    }

    #[test]
    fn worst_case_penalties_clamp_to_zero() {
        assert_eq!(score_title("ab.", 0.0), 0.0);
        assert_eq!(score_title("x!", 0.05), 0.0);
    }

    #[test]
    fn nan_weight_becomes_zero() {
        assert_eq!(score_title("Chapter 1", f32::NAN), 0.0);
    }

    #[test]
    fn candidates_are_rescored_in_place() {
        let mut candidates = vec![ChapterCandidate {
            title: "Chapter 1 Arrival".to_string(),
            level: 1,
            start_position: 0,
            raw_confidence: 0.85,
        }];
        score_candidates(&mut candidates);
        assert_eq!(candidates[0].raw_confidence, 1.0);
    }
}
