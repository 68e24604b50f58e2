//! Weighted heading rules and their compiled form.
//!
//! A [`Pattern`] is plain configuration: a regular expression, the nesting
//! level a match implies, a base weight in `[0, 1]` and a label. Rules are
//! tried in declared order and the first match on a line wins, so more
//! specific rules must come before looser ones.
//!
//! Level 0 is reserved for containers above chapters (volumes, parts, books);
//! level 1 is a chapter, 2 a section, and so on.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Label of the Markdown heading rule. Lines matched by it take their level
/// from the number of leading `#` characters.
pub const MARKDOWN_LABEL: &str = "markdown_heading";

const CJK_NUMERALS: &str = "零〇一二三四五六七八九十百千万两";

const NUMBER_WORDS: &str = "one|two|three|four|five|six|seven|eight|nine|ten|\
     eleven|twelve|thirteen|fourteen|fifteen|sixteen|seventeen|eighteen|\
     nineteen|twenty";

/// A single heading rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub regex: String,
    pub level_hint: u32,
    pub weight: f32,
    pub label: String,
}

impl Pattern {
    pub fn new(
        regex: impl Into<String>,
        level_hint: u32,
        weight: f32,
        label: impl Into<String>,
    ) -> Self {
        Self {
            regex: regex.into(),
            level_hint,
            weight,
            label: label.into(),
        }
    }

    pub fn is_markdown(&self) -> bool {
        self.label == MARKDOWN_LABEL
    }
}

/// The built-in rule set, most specific first.
///
/// ```
/// use folio::pattern::{default_patterns, PatternSet};
///
/// let set = PatternSet::compile(&default_patterns());
/// assert!(set.rejected().is_empty());
/// assert_eq!(set.first_match("第一章 开始").unwrap().level_hint, 1);
/// ```
pub fn default_patterns() -> Vec<Pattern> {
    let n = CJK_NUMERALS;
    vec![
        Pattern::new(r"^#{1,6}\s+\S", 1, 0.95, MARKDOWN_LABEL),
        Pattern::new(
            format!(r"^[【\[「]第[{n}\d]+[章节回][】\]」]\s*.*"),
            1,
            0.9,
            "chinese_chapter_bracket",
        ),
        Pattern::new(
            format!(r"^第[{n}\d]+章(?:[:：\s].*)?$"),
            1,
            0.9,
            "chinese_chapter",
        ),
        Pattern::new(
            format!(r"^(?:第[{n}\d]+[卷部篇]|卷[{n}\d]+)(?:[:：\s].*)?$"),
            0,
            0.85,
            "chinese_volume",
        ),
        Pattern::new(
            format!(r"(?i)^chapter\s+(?:\d+|[ivxlcdm]+|{NUMBER_WORDS})\b.*"),
            1,
            0.85,
            "english_chapter",
        ),
        Pattern::new(
            format!(
                r"(?i)^(?:part|volume|book)\s+(?:\d+|[ivxlcdm]+|{NUMBER_WORDS})\b.*"
            ),
            0,
            0.8,
            "english_part",
        ),
        Pattern::new(
            format!(r"^第[{n}\d]+[节回](?:[:：\s].*)?$"),
            2,
            0.75,
            "chinese_section",
        ),
        Pattern::new(
            r"(?i)^section\s+(?:\d+(?:\.\d+)*|[ivxlcdm]+)\b.*",
            2,
            0.7,
            "english_section",
        ),
        Pattern::new(
            concat!(
                r"^(?:楔子|序章|序言|序幕|引子|前言|尾声|后记|终章|番外)",
                r"(?:[:：\s].*)?$",
            ),
            1,
            0.7,
            "chinese_prologue",
        ),
        Pattern::new(
            concat!(
                r"(?i)^(?:prologue|epilogue|introduction|preface|foreword",
                r"|afterword|appendix)\b.*",
            ),
            1,
            0.7,
            "english_prologue",
        ),
        Pattern::new(
            r"^\d{1,3}\.\d{1,3}(?:\.\d{1,3})?\s+\S.*",
            2,
            0.6,
            "dotted_numbering",
        ),
        Pattern::new(
            format!(r"^[{n}]+[、.]\s*\S.*"),
            1,
            0.55,
            "chinese_enumeration",
        ),
        Pattern::new(r"^\d{1,4}[.、]\s*\S.{1,}", 1, 0.5, "numbered_line"),
    ]
}

/// A rule that failed to compile and was left out of a [`PatternSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternError {
    pub label: String,
    pub message: String,
}

impl std::fmt::Display for PatternError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "pattern '{}': {}", self.label, self.message)
    }
}

/// A rule paired with its compiled expression.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub regex: Regex,
    pub level_hint: u32,
    pub weight: f32,
    pub label: String,
    pub markdown: bool,
}

/// Rules compiled once per generation call, in declared order.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    rules: Vec<CompiledPattern>,
    rejected: Vec<PatternError>,
}

impl PatternSet {
    /// Compile every rule, skipping (and recording) the ones whose regex is
    /// malformed. Never fails as a whole.
    pub fn compile(patterns: &[Pattern]) -> Self {
        let mut set = Self::default();
        for pattern in patterns {
            match compile_one(pattern) {
                Ok(rule) => set.rules.push(rule),
                Err(e) => {
                    tracing::warn!(
                        label = %pattern.label,
                        error = %e,
                        "skipping malformed heading pattern"
                    );
                    set.rejected.push(PatternError {
                        label: pattern.label.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }
        set
    }

    pub fn rules(&self) -> &[CompiledPattern] {
        &self.rules
    }

    /// Rules that were reported and skipped during compilation.
    pub fn rejected(&self) -> &[PatternError] {
        &self.rejected
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The first rule, in declared order, that matches `line`.
    pub fn first_match(&self, line: &str) -> Option<&CompiledPattern> {
        self.rules.iter().find(|rule| rule.regex.is_match(line))
    }
}

fn compile_one(pattern: &Pattern) -> Result<CompiledPattern> {
    let regex =
        Regex::new(&pattern.regex).map_err(|source| Error::InvalidPattern {
            label: pattern.label.clone(),
            source,
        })?;
    Ok(CompiledPattern {
        regex,
        level_hint: pattern.level_hint,
        weight: pattern.weight.clamp(0.0, 1.0),
        label: pattern.label.clone(),
        markdown: pattern.is_markdown(),
    })
}

/// Load a rule set from a JSON array of patterns.
pub fn load_patterns(path: &std::path::Path) -> Result<Vec<Pattern>> {
    let contents = std::fs::read_to_string(path)?;
    let patterns: Vec<Pattern> = serde_json::from_str(&contents)?;
    Ok(patterns)
}
