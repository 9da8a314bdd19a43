//! Content sanitization
//!
//! Rewrites risky legal text into a hedged, disclaimed form. Sanitized
//! output is never final: every [`SanitizationResult`] still requires
//! attorney review.

pub mod catalog;
pub mod content;

pub use catalog::{NOT_LEGAL_ADVICE_MARKER, SUPERVISION_MARKER};
pub use content::ContentSanitizer;

use crate::error::Error;
use serde::{Deserialize, Serialize};

/// How aggressively content is rewritten
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SanitizationLevel {
    /// Disclaimer wrapping only
    Minimal,
    /// Phrase substitution plus disclaimers
    Moderate,
    /// Model-driven rewrite, falling back to moderate
    #[default]
    Comprehensive,
}

impl SanitizationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Minimal => "minimal",
            Self::Moderate => "moderate",
            Self::Comprehensive => "comprehensive",
        }
    }
}

impl std::fmt::Display for SanitizationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SanitizationLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "minimal" => Ok(Self::Minimal),
            "moderate" => Ok(Self::Moderate),
            "comprehensive" => Ok(Self::Comprehensive),
            other => Err(Error::Config(format!(
                "Unknown sanitization level '{}' (expected minimal, moderate or comprehensive)",
                other
            ))),
        }
    }
}

/// One rewrite applied to the content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentChange {
    pub original: String,
    pub replacement: String,
    /// Byte offset in the input text
    pub position: usize,
    pub reason: String,
}

/// Output of a sanitization pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SanitizationResult {
    pub sanitized_content: String,
    pub changes_made: Vec<ContentChange>,
    pub disclaimers_added: Vec<String>,
    /// Catalog phrases found in the input
    pub blocked_phrases: Vec<String>,
    pub confidence_score: f64,
    /// Always true
    pub requires_review: bool,
}

/// Lightweight re-check of already sanitized text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_compliant: bool,
    pub issues: Vec<String>,
    pub confidence: f64,
    pub recommendations: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_parse() {
        assert_eq!("Moderate".parse::<SanitizationLevel>().unwrap(), SanitizationLevel::Moderate);
        assert_eq!(
            " comprehensive ".parse::<SanitizationLevel>().unwrap(),
            SanitizationLevel::Comprehensive
        );
        assert!("aggressive".parse::<SanitizationLevel>().is_err());
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let result = SanitizationResult {
            sanitized_content: "x".into(),
            changes_made: vec![],
            disclaimers_added: vec![],
            blocked_phrases: vec![],
            confidence_score: 0.9,
            requires_review: true,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["sanitizedContent"], "x");
        assert_eq!(json["requiresReview"], true);
    }
}
