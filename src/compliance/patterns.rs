//! Prohibited-language pattern matcher
//!
//! Deterministic, case-insensitive scan of text against an ordered phrase
//! catalog. The catalog is versioned so that changes to it show up in audit
//! trails, and its order fixes the order of reported violations.

use super::types::{Severity, Violation, ViolationType};
use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Version of the built-in phrase catalog
pub const CATALOG_VERSION: &str = "2024.1";

/// One entry of the prohibited phrase catalog
#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry {
    /// Stable identifier
    pub id: &'static str,
    /// Canonical phrase reported in `blocked_phrases`
    pub phrase: &'static str,
    /// Regex, compiled case-insensitively
    pub pattern: &'static str,
}

/// Built-in catalog, in reporting order.
pub const PHRASE_CATALOG: &[CatalogEntry] = &[
    CatalogEntry { id: "you_should", phrase: "you should", pattern: r"\byou\s+should\b" },
    CatalogEntry { id: "you_must", phrase: "you must", pattern: r"\byou\s+must\b" },
    CatalogEntry { id: "you_need_to", phrase: "you need to", pattern: r"\byou\s+need\s+to\b" },
    CatalogEntry { id: "i_recommend", phrase: "i recommend", pattern: r"\bi\s+recommend\b" },
    CatalogEntry { id: "i_advise", phrase: "i advise", pattern: r"\bi\s+advise\b" },
    CatalogEntry { id: "my_advice", phrase: "my advice is", pattern: r"\bmy\s+(?:legal\s+)?advice\s+is\b" },
    CatalogEntry { id: "as_your_attorney", phrase: "as your attorney", pattern: r"\bas\s+your\s+(?:attorney|lawyer|counsel)\b" },
    CatalogEntry { id: "file_a_lawsuit", phrase: "file a lawsuit", pattern: r"\bfile\s+a\s+lawsuit\b" },
    CatalogEntry { id: "sue_them", phrase: "sue them", pattern: r"\bsue\s+(?:them|him|her)\b" },
    CatalogEntry { id: "you_will_win", phrase: "you will win", pattern: r"\byou\s+will\s+win\b" },
    CatalogEntry { id: "you_will_lose", phrase: "you will lose", pattern: r"\byou\s+will\s+lose\b" },
    CatalogEntry { id: "i_guarantee", phrase: "i guarantee", pattern: r"\bi\s+guarantee\b" },
    CatalogEntry { id: "strong_case", phrase: "you have a strong case", pattern: r"\byou\s+have\s+a\s+(?:strong|winning|solid)\s+case\b" },
    CatalogEntry { id: "this_is_legal", phrase: "this is legal", pattern: r"\bthis\s+is\s+legal\b" },
    CatalogEntry { id: "this_is_illegal", phrase: "this is illegal", pattern: r"\bthis\s+is\s+illegal\b" },
    CatalogEntry { id: "in_your_case", phrase: "in your case", pattern: r"\bin\s+your\s+case\b" },
    CatalogEntry { id: "you_are_entitled", phrase: "you are entitled to", pattern: r"\byou\s+are\s+entitled\s+to\b" },
];

/// Operator-supplied catalog extension (from configuration)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomPattern {
    pub name: String,
    pub pattern: String,
}

struct CompiledPattern {
    id: String,
    regex: Regex,
}

/// Stateless prohibited-language detector
pub struct PatternMatcher {
    patterns: Vec<CompiledPattern>,
}

impl PatternMatcher {
    /// Matcher over the built-in catalog.
    pub fn new() -> Self {
        let patterns = PHRASE_CATALOG
            .iter()
            .filter_map(|entry| match compile(entry.pattern) {
                Ok(regex) => Some(CompiledPattern {
                    id: entry.id.to_string(),
                    regex,
                }),
                Err(e) => {
                    tracing::error!(pattern = entry.id, error = %e, "Skipping invalid catalog pattern");
                    None
                }
            })
            .collect();
        Self { patterns }
    }

    /// Built-in catalog followed by custom patterns, in the given order.
    ///
    /// A custom pattern that matches the empty string would flag every text
    /// and is rejected.
    pub fn with_custom(custom: &[CustomPattern]) -> Result<Self> {
        let mut matcher = Self::new();
        for def in custom {
            let regex = compile(&def.pattern).map_err(|e| {
                Error::Config(format!(
                    "Invalid regex pattern for custom phrase '{}': {}",
                    def.name, e
                ))
            })?;
            if regex.is_match("") {
                return Err(Error::Config(format!(
                    "Custom phrase '{}' matches empty text: {}",
                    def.name, def.pattern
                )));
            }
            matcher.patterns.push(CompiledPattern {
                id: def.name.clone(),
                regex,
            });
        }
        Ok(matcher)
    }

    /// Emit one `prohibited_language` violation per match, catalog order
    /// first, left to right within each entry.
    pub fn detect(&self, text: &str) -> Vec<Violation> {
        let mut violations = Vec::new();
        for pattern in &self.patterns {
            for mat in pattern.regex.find_iter(text) {
                violations.push(
                    Violation::new(
                        ViolationType::ProhibitedLanguage,
                        format!("Prohibited phrase detected: '{}'", mat.as_str()),
                        Severity::High,
                    )
                    .with_phrase(mat.as_str(), mat.start()),
                );
            }
        }
        violations
    }

    /// Identifiers of the catalog entries present in `text`, each at most once.
    pub fn present_entries(&self, text: &str) -> Vec<&str> {
        self.patterns
            .iter()
            .filter(|p| p.regex.is_match(text))
            .map(|p| p.id.as_str())
            .collect()
    }

    /// Check if text contains any catalog phrase
    pub fn contains_prohibited(&self, text: &str) -> bool {
        self.patterns.iter().any(|p| p.regex.is_match(text))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl Default for PatternMatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Canonical form of a matched phrase: lowercase, single-spaced.
pub fn normalize_phrase(matched: &str) -> String {
    matched
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Distinct blocked phrases from pattern violations, in first-seen order.
pub fn blocked_phrases(violations: &[Violation]) -> Vec<String> {
    let mut phrases: Vec<String> = Vec::new();
    for phrase in violations
        .iter()
        .filter(|v| v.violation_type == ViolationType::ProhibitedLanguage)
        .filter_map(|v| v.phrase.as_deref())
        .map(normalize_phrase)
    {
        if !phrases.contains(&phrase) {
            phrases.push(phrase);
        }
    }
    phrases
}

fn compile(pattern: &str) -> std::result::Result<Regex, regex::Error> {
    Regex::new(&format!("(?i){}", pattern))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_compiles_completely() {
        assert_eq!(PatternMatcher::new().len(), PHRASE_CATALOG.len());
    }

    #[test]
    fn test_detect_case_insensitive() {
        let matcher = PatternMatcher::new();
        let violations = matcher.detect("YOU SHOULD read this.");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].violation_type, ViolationType::ProhibitedLanguage);
        assert_eq!(violations[0].severity, Severity::High);
        assert_eq!(violations[0].phrase.as_deref(), Some("YOU SHOULD"));
        assert_eq!(violations[0].position, Some(0));
    }

    #[test]
    fn test_detect_catalog_then_position_order() {
        let matcher = PatternMatcher::new();
        let text = "You will win. You should wait. Then you should sign.";
        let violations = matcher.detect(text);
        let phrases: Vec<_> = violations
            .iter()
            .map(|v| (normalize_phrase(v.phrase.as_deref().unwrap()), v.position.unwrap()))
            .collect();
        assert_eq!(phrases[0].0, "you should");
        assert_eq!(phrases[1].0, "you should");
        assert!(phrases[0].1 < phrases[1].1);
        assert_eq!(phrases[2].0, "you will win");
        assert_eq!(phrases[2].1, 0);
    }

    #[test]
    fn test_detect_clean_text() {
        let matcher = PatternMatcher::new();
        assert!(matcher
            .detect("This document outlines a standard service agreement template.")
            .is_empty());
        assert!(matcher.detect("").is_empty());
    }

    #[test]
    fn test_word_boundaries() {
        let matcher = PatternMatcher::new();
        assert!(matcher.detect("Whether this is legally binding depends.").is_empty());
        assert!(!matcher.detect("Honestly, this is legal.").is_empty());
    }

    #[test]
    fn test_present_entries_distinct() {
        let matcher = PatternMatcher::new();
        let entries = matcher.present_entries("you should, you should, I recommend");
        assert_eq!(entries, vec!["you_should", "i_recommend"]);
    }

    #[test]
    fn test_custom_patterns() {
        let matcher = PatternMatcher::with_custom(&[CustomPattern {
            name: "take_my_word".to_string(),
            pattern: r"\btake\s+my\s+word\b".to_string(),
        }])
        .unwrap();
        assert_eq!(matcher.len(), PHRASE_CATALOG.len() + 1);
        assert!(matcher.contains_prohibited("Take my word for it"));
    }

    #[test]
    fn test_custom_pattern_invalid() {
        let result = PatternMatcher::with_custom(&[CustomPattern {
            name: "broken".to_string(),
            pattern: "(unclosed".to_string(),
        }]);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_custom_pattern_matching_empty_text_rejected() {
        for pattern in ["z*", "(?:legal)?", "advice|"] {
            let result = PatternMatcher::with_custom(&[CustomPattern {
                name: "too_broad".to_string(),
                pattern: pattern.to_string(),
            }]);
            assert!(
                matches!(result, Err(Error::Config(ref m)) if m.contains("too_broad")),
                "{} accepted",
                pattern
            );
        }
    }

    #[test]
    fn test_blocked_phrases_dedup_and_normalize() {
        let matcher = PatternMatcher::new();
        let violations = matcher.detect("You  should go. you should stay. You will win.");
        assert_eq!(blocked_phrases(&violations), vec!["you should", "you will win"]);
    }

    #[test]
    fn test_non_ascii_input() {
        let matcher = PatternMatcher::new();
        let violations = matcher.detect("Ünïcödé — you must ✓");
        assert_eq!(violations.len(), 1);
        assert_eq!(normalize_phrase(violations[0].phrase.as_deref().unwrap()), "you must");
    }
}
