//! Substitution table and disclaimer catalog
//!
//! Replacements are chosen so that none of them reintroduces a phrase the
//! pattern matcher flags, which keeps repeated moderate sanitization from
//! ever increasing the number of detectable phrases.

use crate::compliance::ContentType;

/// Marker every disclaimer block opens with
pub const SUPERVISION_MARKER: &str = "ATTORNEY SUPERVISION REQUIRED";

/// Marker stating the content is informational only
pub const NOT_LEGAL_ADVICE_MARKER: &str = "NOT LEGAL ADVICE";

/// Review status line carried by every disclaimer block
pub const PENDING_REVIEW_STATUS: &str = "Status: PENDING ATTORNEY REVIEW";

/// Replacement for execution-date placeholders in contract templates
pub const EXECUTION_DATE_PENDING: &str = "[EXECUTION DATE - PENDING ATTORNEY REVIEW]";

/// Heading of the standing contract clause
pub const SUPERVISION_CLAUSE_HEADING: &str = "ATTORNEY SUPERVISION CLAUSE";

/// Body of the standing contract clause
pub const SUPERVISION_CLAUSE_BODY: &str = "This agreement was prepared with the assistance of automated tools and is subject to review by a licensed attorney. It shall not be executed until that review is complete and the reviewing attorney has approved its terms.";

/// One phrase rewrite
#[derive(Debug, Clone, Copy)]
pub struct Substitution {
    pub id: &'static str,
    /// Regex, compiled case-insensitively
    pub pattern: &'static str,
    pub replacement: &'static str,
}

/// Phrase rewrites, in application order. Covers every built-in catalog
/// entry plus a few adjacent advisory forms.
pub const SUBSTITUTIONS: &[Substitution] = &[
    Substitution { id: "you_should", pattern: r"\byou\s+should\b", replacement: "it is generally advisable to" },
    Substitution { id: "you_must", pattern: r"\byou\s+must\b", replacement: "it may be necessary to" },
    Substitution { id: "you_need_to", pattern: r"\byou\s+need\s+to\b", replacement: "it may be helpful to" },
    Substitution { id: "i_recommend", pattern: r"\bi\s+recommend\b", replacement: "it may be worth considering" },
    Substitution { id: "i_advise", pattern: r"\bi\s+advise\b", replacement: "it may be worth considering" },
    Substitution { id: "i_suggest", pattern: r"\bi\s+suggest\b", replacement: "it may be worth considering" },
    Substitution { id: "my_advice", pattern: r"\bmy\s+(?:legal\s+)?advice\s+is\b", replacement: "general information suggests" },
    Substitution { id: "as_your_attorney", pattern: r"\bas\s+your\s+(?:attorney|lawyer|counsel)\b", replacement: "as a general informational resource" },
    Substitution { id: "file_a_lawsuit", pattern: r"\bfile\s+a\s+lawsuit\b", replacement: "consider whether legal action may be appropriate" },
    Substitution { id: "sue_them", pattern: r"\bsue\s+(?:them|him|her)\b", replacement: "explore potential legal remedies" },
    Substitution { id: "you_will_win", pattern: r"\byou\s+will\s+win\b", replacement: "you may have options in" },
    Substitution { id: "you_will_lose", pattern: r"\byou\s+will\s+lose\b", replacement: "you may face challenges in" },
    Substitution { id: "i_guarantee", pattern: r"\bi\s+guarantee\b", replacement: "it is possible that" },
    Substitution { id: "strong_case", pattern: r"\byou\s+have\s+a\s+(?:strong|winning|solid)\s+case\b", replacement: "the facts described may support certain legal arguments" },
    Substitution { id: "this_is_legal", pattern: r"\bthis\s+is\s+legal\b", replacement: "this may be permissible under applicable law" },
    Substitution { id: "this_is_illegal", pattern: r"\bthis\s+is\s+illegal\b", replacement: "this may raise legal concerns under applicable law" },
    Substitution { id: "in_your_case", pattern: r"\bin\s+your\s+case\b", replacement: "in situations like the one described" },
    Substitution { id: "you_are_entitled", pattern: r"\byou\s+are\s+entitled\s+to\b", replacement: "individuals may be entitled to" },
];

/// Disclaimer catalog key for a content type
pub fn disclaimer_key(content_type: ContentType) -> &'static str {
    match content_type {
        ContentType::Contract => "contract",
        ContentType::LegalQa => "legal_advice",
        ContentType::Template => "template",
        ContentType::General => "general",
    }
}

fn disclaimer_body(content_type: ContentType) -> &'static str {
    match content_type {
        ContentType::Contract => {
            "This contract was generated with automated assistance for informational purposes only and does not constitute legal advice. A licensed attorney must review and approve it before it is signed or relied upon."
        }
        ContentType::LegalQa => {
            "This response provides general legal information for educational purposes only and does not constitute legal advice. No attorney relationship is formed. A licensed attorney in the relevant jurisdiction can address specific circumstances."
        }
        ContentType::Template => {
            "This template is provided for informational purposes only and does not constitute legal advice. Requirements differ between jurisdictions, and a licensed attorney must review the completed document before use."
        }
        ContentType::General => {
            "This content is general information only and does not constitute legal advice. A licensed attorney must review it before it is relied upon."
        }
    }
}

/// Full disclaimer block for a content type.
pub fn disclaimer_block(content_type: ContentType) -> String {
    format!(
        "---\n{}\n{}: {}\n{}\n---",
        SUPERVISION_MARKER,
        NOT_LEGAL_ADVICE_MARKER,
        disclaimer_body(content_type),
        PENDING_REVIEW_STATUS
    )
}

/// Standing supervision clause appended to contract templates.
pub fn supervision_clause(include_execution_date: bool) -> String {
    let mut clause = format!("{}\n{}", SUPERVISION_CLAUSE_HEADING, SUPERVISION_CLAUSE_BODY);
    if include_execution_date {
        clause.push_str(&format!("\nExecution Date: {}", EXECUTION_DATE_PENDING));
    }
    clause
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compliance::patterns::PatternMatcher;
    use crate::compliance::ContextRuleEvaluator;

    const ALL_TYPES: [ContentType; 4] = [
        ContentType::Contract,
        ContentType::LegalQa,
        ContentType::Template,
        ContentType::General,
    ];

    #[test]
    fn test_replacements_are_catalog_free() {
        let matcher = PatternMatcher::new();
        for sub in SUBSTITUTIONS {
            assert!(
                !matcher.contains_prohibited(sub.replacement),
                "replacement for {} reintroduces a catalog phrase",
                sub.id
            );
        }
    }

    #[test]
    fn test_every_catalog_entry_has_substitution() {
        for entry in crate::compliance::patterns::PHRASE_CATALOG {
            assert!(
                SUBSTITUTIONS.iter().any(|s| s.id == entry.id),
                "no substitution for catalog entry {}",
                entry.id
            );
        }
    }

    #[test]
    fn test_disclaimers_carry_markers() {
        for ct in ALL_TYPES {
            let block = disclaimer_block(ct);
            assert!(block.contains(SUPERVISION_MARKER));
            assert!(block.contains(NOT_LEGAL_ADVICE_MARKER));
            assert!(block.contains(PENDING_REVIEW_STATUS));
        }
    }

    #[test]
    fn test_disclaimers_pass_detectors() {
        let matcher = PatternMatcher::new();
        let rules = ContextRuleEvaluator::default();
        for ct in ALL_TYPES {
            let block = disclaimer_block(ct);
            assert!(!matcher.contains_prohibited(&block), "{} disclaimer", ct);
            assert!(rules.evaluate(&block, ct).is_empty(), "{} disclaimer", ct);
        }
        let clause = supervision_clause(true);
        assert!(!matcher.contains_prohibited(&clause));
        assert!(rules.evaluate(&clause, ContentType::Contract).is_empty());
    }

    #[test]
    fn test_disclaimer_keys() {
        assert_eq!(disclaimer_key(ContentType::LegalQa), "legal_advice");
        assert_eq!(disclaimer_key(ContentType::General), "general");
    }
}
