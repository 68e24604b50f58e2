//! Property-based tests for the generation and ranking pipeline.
//!
//! Invariants checked:
//! - Scores: adjusted confidence and plain relevance stay in [0, 1]
//! - Nesting: depth-first order of a built forest equals input order
//! - Ranges: generated chapters are ordered and only nest, never straddle
//! - Determinism: identical input yields an identical forest

use folio::{
    Chapter,
    GenerationConfig,
    MemoryCorpus,
    QueryEngine,
    SearchQuery,
    TableOfContents,
    TocGenerator,
    confidence::score_title,
    hierarchy::build_forest,
    relevance::plain_relevance,
};
use proptest::prelude::*;

// =============================================================================
// Test Generators
// =============================================================================

/// Levels starting at 1 that never deepen by more than one step.
fn well_formed_levels() -> impl Strategy<Value = Vec<u32>> {
    prop::collection::vec(0u32..4, 1..40).prop_map(|steps| {
        let mut levels = vec![1];
        for step in steps {
            let prev = *levels.last().unwrap_or(&1);
            // step 0 deepens by one, anything else picks a level <= prev
            let next = if step == 0 { prev + 1 } else { step.min(prev) };
            levels.push(next);
        }
        levels
    })
}

/// A book of 2..8 chapters, some with sections, separated by filler text.
fn book() -> impl Strategy<Value = String> {
    prop::collection::vec((5usize..15, any::<bool>()), 2..8).prop_map(
        |chapters| {
            let mut text = String::new();
            for (i, (filler, has_section)) in chapters.into_iter().enumerate() {
                let n = i + 1;
                text.push_str(&format!("第{n}章 标题{n}\n"));
                text.push_str(&"lorem ipsum ".repeat(filler));
                text.push('\n');
                if has_section {
                    text.push_str(&format!("第{n}节 小节\n"));
                    text.push_str(&"dolor sit amet ".repeat(filler));
                    text.push('\n');
                }
            }
            text
        },
    )
}

// =============================================================================
// Invariant Helpers
// =============================================================================

fn flat_chapters(levels: &[u32]) -> Vec<Chapter> {
    levels
        .iter()
        .enumerate()
        .map(|(i, &level)| {
            Chapter::new(i as u32 + 1, format!("c{i}"), level, i * 100, 1.0)
        })
        .collect()
}

/// (id, number of ancestors) in depth-first order.
fn dfs_depths(chapters: &[Chapter], depth: u32, out: &mut Vec<(u32, u32)>) {
    for chapter in chapters {
        out.push((chapter.id, depth));
        dfs_depths(&chapter.children, depth + 1, out);
    }
}

fn ranges(toc: &TableOfContents) -> Vec<(usize, usize)> {
    toc.flatten()
        .iter()
        .map(|c| (c.start_position, c.end_position.unwrap_or(usize::MAX)))
        .collect()
}

fn nest_or_disjoint(a: (usize, usize), b: (usize, usize)) -> bool {
    let disjoint = a.1 <= b.0 || b.1 <= a.0;
    let a_in_b = b.0 <= a.0 && a.1 <= b.1;
    let b_in_a = a.0 <= b.0 && b.1 <= a.1;
    disjoint || a_in_b || b_in_a
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn adjusted_confidence_is_bounded(
        title in ".{0,80}",
        base in -2.0f32..3.0,
    ) {
        let score = score_title(&title, base);
        prop_assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn plain_relevance_is_bounded(
        term in "[a-zA-Z ]{1,10}",
        line in ".{0,120}",
        case_sensitive in any::<bool>(),
    ) {
        let score = plain_relevance(&term, &line, case_sensitive);
        prop_assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn regex_matches_score_exactly_one(
        words in prop::collection::vec("[a-z]{1,8}", 1..20),
    ) {
        let corpus = MemoryCorpus::new().with("doc", words.join("\n"));
        let query = SearchQuery {
            use_regex: true,
            ..SearchQuery::new("[a-z]+")
        };
        let report = QueryEngine::new(2000).search(&query, &corpus).unwrap();
        prop_assert_eq!(report.results.len(), words.len());
        prop_assert!(report.results.iter().all(|r| r.relevance == 1.0));
    }

    #[test]
    fn forest_preserves_input_order(
        levels in prop::collection::vec(0u32..5, 0..40),
    ) {
        let forest = build_forest(flat_chapters(&levels));
        let mut seen = Vec::new();
        dfs_depths(&forest, 0, &mut seen);
        let ids: Vec<u32> = seen.iter().map(|(id, _)| *id).collect();
        let expected: Vec<u32> = (1..=levels.len() as u32).collect();
        prop_assert_eq!(ids, expected);
    }

    #[test]
    fn ancestor_count_matches_level(levels in well_formed_levels()) {
        let forest = build_forest(flat_chapters(&levels));
        let mut seen = Vec::new();
        dfs_depths(&forest, 0, &mut seen);
        for (id, depth) in seen {
            prop_assert_eq!(depth, levels[id as usize - 1] - 1);
        }
    }

    #[test]
    fn generated_ranges_are_ordered_and_nested(text in book()) {
        let toc = TocGenerator::new()
            .generate("book", &text, &GenerationConfig::default())
            .unwrap();
        prop_assert!(!toc.chapters.is_empty());

        let ranges = ranges(&toc);
        prop_assert!(ranges.windows(2).all(|w| w[0].0 < w[1].0));
        for (i, a) in ranges.iter().enumerate() {
            for b in &ranges[i + 1..] {
                prop_assert!(nest_or_disjoint(*a, *b));
            }
        }
        prop_assert!(toc.flatten().iter().all(|c| c.confidence >= 0.6));
    }

    #[test]
    fn regeneration_is_deterministic(text in book()) {
        let generator = TocGenerator::new();
        let config = GenerationConfig::default();
        let first = generator.generate("book", &text, &config).unwrap();
        let second = generator.generate("book", &text, &config).unwrap();
        prop_assert_eq!(first.chapters, second.chapters);
        prop_assert_eq!(first.overall_confidence, second.overall_confidence);
    }
}
