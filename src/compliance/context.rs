//! Content-type specific rule evaluation
//!
//! Rules are data: each [`ContextRuleDef`] names the content type it applies
//! to, a trigger pattern, an optional negation pattern that suppresses it,
//! and the violation it produces. Operators extend the table from
//! configuration without touching code.

use super::types::{ContentType, Severity, Violation, ViolationType};
use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A single context rule as configured
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextRuleDef {
    pub name: String,
    pub content_type: ContentType,
    /// Trigger regex (case-insensitive)
    pub pattern: String,
    /// Suppresses the rule when this regex also matches anywhere in the text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unless: Option<String>,
    pub violation_type: ViolationType,
    pub severity: Severity,
    pub message: String,
}

impl ContextRuleDef {
    fn new(
        name: &str,
        content_type: ContentType,
        pattern: &str,
        violation_type: ViolationType,
        severity: Severity,
        message: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            content_type,
            pattern: pattern.to_string(),
            unless: None,
            violation_type,
            severity,
            message: message.to_string(),
        }
    }

    fn unless(mut self, pattern: &str) -> Self {
        self.unless = Some(pattern.to_string());
        self
    }
}

/// Built-in rule table
pub fn default_context_rules() -> Vec<ContextRuleDef> {
    use ContentType::{Contract, LegalQa, Template};
    use Severity::{Critical, High, Medium};
    use ViolationType::{AttorneyClientPrivilege, DirectLegalAdvice, LegalRecommendation};

    vec![
        ContextRuleDef::new(
            "contract_privilege",
            Contract,
            r"\battorney[\s-]+client\s+privileged?\b|\bprivileged\s+(?:and|&)\s+confidential\b|\bthis\s+communication\s+is\s+privileged\b",
            AttorneyClientPrivilege,
            Critical,
            "Contract content invokes attorney-client privilege",
        ),
        ContextRuleDef::new(
            "contract_legal_advice",
            Contract,
            r"\blegal\s+advice\b",
            DirectLegalAdvice,
            High,
            "Contract content presents itself as legal advice",
        )
        .unless(r"\bnot\s+(?:constitute\s+)?legal\s+advice\b"),
        ContextRuleDef::new(
            "qa_you_should",
            LegalQa,
            r"\byou\s+should\b",
            DirectLegalAdvice,
            High,
            "Legal Q&A answer directs the reader ('you should')",
        ),
        ContextRuleDef::new(
            "qa_you_must",
            LegalQa,
            r"\byou\s+must\b",
            DirectLegalAdvice,
            High,
            "Legal Q&A answer directs the reader ('you must')",
        ),
        ContextRuleDef::new(
            "qa_i_recommend",
            LegalQa,
            r"\bi\s+(?:recommend|advise)\b",
            DirectLegalAdvice,
            High,
            "Legal Q&A answer gives a personal recommendation",
        ),
        ContextRuleDef::new(
            "qa_best_course",
            LegalQa,
            r"\b(?:the\s+)?best\s+course\s+of\s+action\b",
            DirectLegalAdvice,
            High,
            "Legal Q&A answer prescribes a course of action",
        ),
        ContextRuleDef::new(
            "template_universal_enforceability",
            Template,
            r"\b(?:enforceable|valid)\s+in\s+all\s+(?:states|jurisdictions)\b",
            LegalRecommendation,
            Medium,
            "Template asserts enforceability in every jurisdiction",
        ),
    ]
}

struct CompiledRule {
    def: ContextRuleDef,
    pattern: Regex,
    unless: Option<Regex>,
}

/// Evaluates the rule table against a piece of content
pub struct ContextRuleEvaluator {
    rules: Vec<CompiledRule>,
}

impl ContextRuleEvaluator {
    /// Compile a rule table. Invalid regexes are configuration errors.
    pub fn new(defs: Vec<ContextRuleDef>) -> Result<Self> {
        let rules = defs
            .into_iter()
            .map(|def| {
                let pattern = compile(&def.pattern).map_err(|e| {
                    Error::Config(format!("Invalid pattern for context rule '{}': {}", def.name, e))
                })?;
                let unless = def
                    .unless
                    .as_deref()
                    .map(compile)
                    .transpose()
                    .map_err(|e| {
                        Error::Config(format!(
                            "Invalid negation pattern for context rule '{}': {}",
                            def.name, e
                        ))
                    })?;
                Ok(CompiledRule { def, pattern, unless })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// One violation per rule for this content type whose trigger matches
    /// and whose negation does not.
    pub fn evaluate(&self, text: &str, content_type: ContentType) -> Vec<Violation> {
        self.rules
            .iter()
            .filter(|rule| rule.def.content_type == content_type)
            .filter(|rule| rule.pattern.is_match(text))
            .filter(|rule| !rule.unless.as_ref().is_some_and(|u| u.is_match(text)))
            .map(|rule| {
                Violation::new(
                    rule.def.violation_type,
                    rule.def.message.clone(),
                    rule.def.severity,
                )
            })
            .collect()
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

impl Default for ContextRuleEvaluator {
    fn default() -> Self {
        let rules = default_context_rules()
            .into_iter()
            .filter_map(|def| {
                let pattern = compile(&def.pattern).ok()?;
                let unless = match def.unless.as_deref().map(compile) {
                    Some(Ok(re)) => Some(re),
                    Some(Err(_)) => return None,
                    None => None,
                };
                Some(CompiledRule { def, pattern, unless })
            })
            .collect();
        Self { rules }
    }
}

fn compile(pattern: &str) -> std::result::Result<Regex, regex::Error> {
    Regex::new(&format!("(?i){}", pattern))
}
