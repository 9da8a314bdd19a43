//! Content sanitizer
//!
//! Three levels of rewriting, each followed by the same disclaimer wrapping
//! and post-hoc confidence scoring:
//!
//! ```text
//! minimal       : text ─────────────────────────────────────┐
//! moderate      : text ─► substitution table ───────────────┤
//! comprehensive : text ─► model rewrite ─► substitution ────┤
//!                      └─(capability failure)─► moderate ───┤ (confidence ≤ 0.6)
//!                                                           ▼
//!                             disclaimer ⏎ body ⏎ disclaimer ─► score
//! ```

use super::catalog::{
    disclaimer_block, disclaimer_key, supervision_clause, EXECUTION_DATE_PENDING,
    NOT_LEGAL_ADVICE_MARKER, SUBSTITUTIONS, SUPERVISION_MARKER,
};
use super::{ContentChange, SanitizationLevel, SanitizationResult, ValidationReport};
use crate::compliance::patterns::{blocked_phrases, PatternMatcher};
use crate::compliance::ContentType;
use crate::llm::{guarded_complete, ReasoningModel};
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;

/// Score of sanitized text before penalties and bonuses
pub const BASE_CONFIDENCE: f64 = 0.9;
/// Ceiling on the score when the comprehensive rewrite fell back to moderate
pub const DEGRADED_CONFIDENCE: f64 = 0.6;
const PHRASE_PENALTY: f64 = 0.1;
const MARKER_BONUS: f64 = 0.05;

const EXECUTION_DATE_PLACEHOLDER: &str =
    r"(?i)\[\s*(?:execution\s+date|date\s+of\s+execution)\s*\]|\{\{\s*execution_date\s*\}\}";

struct CompiledSubstitution {
    id: &'static str,
    regex: Regex,
    replacement: &'static str,
}

/// Body text after the level-specific rewrite, before wrapping
struct Rewrite {
    body: String,
    changes: Vec<ContentChange>,
    degraded: bool,
}

/// Sanitizer over the shared pattern matcher and an optional reasoning model
pub struct ContentSanitizer {
    matcher: Arc<PatternMatcher>,
    substitutions: Vec<CompiledSubstitution>,
    execution_date: Option<Regex>,
    model: Option<Arc<dyn ReasoningModel>>,
    rewrite_timeout: Duration,
}

impl ContentSanitizer {
    pub fn new(matcher: Arc<PatternMatcher>) -> Self {
        let substitutions = SUBSTITUTIONS
            .iter()
            .filter_map(|sub| match Regex::new(&format!("(?i){}", sub.pattern)) {
                Ok(regex) => Some(CompiledSubstitution {
                    id: sub.id,
                    regex,
                    replacement: sub.replacement,
                }),
                Err(e) => {
                    tracing::error!(substitution = sub.id, error = %e, "Skipping invalid substitution pattern");
                    None
                }
            })
            .collect();

        let execution_date = Regex::new(EXECUTION_DATE_PLACEHOLDER)
            .map_err(|e| tracing::error!(error = %e, "Invalid execution date placeholder pattern"))
            .ok();

        Self {
            matcher,
            substitutions,
            execution_date,
            model: None,
            rewrite_timeout: Duration::from_secs(20),
        }
    }

    /// Enable comprehensive rewriting through `model`.
    pub fn with_model(mut self, model: Arc<dyn ReasoningModel>, timeout: Duration) -> Self {
        self.model = Some(model);
        self.rewrite_timeout = timeout;
        self
    }

    /// Rewrite `text` at `level` and wrap it in the disclaimer block for
    /// `content_type`.
    pub async fn sanitize(
        &self,
        text: &str,
        content_type: ContentType,
        level: SanitizationLevel,
    ) -> SanitizationResult {
        let rewrite = self.rewrite(text, content_type, level).await;
        self.finish(text, content_type, rewrite, Vec::new())
    }

    /// Contract-template sanitization: the regular rewrite plus the standing
    /// supervision clause and a pending-review execution date.
    pub async fn sanitize_contract(&self, text: &str, level: SanitizationLevel) -> SanitizationResult {
        let mut rewrite = self.rewrite(text, ContentType::Contract, level).await;

        let (body, date_changes) = self.mark_execution_date(&rewrite.body);
        let clause = supervision_clause(date_changes.is_empty());
        rewrite.body = format!("{}\n\n{}", body, clause);
        rewrite.changes.extend(date_changes);

        self.finish(
            text,
            ContentType::Contract,
            rewrite,
            vec!["attorney supervision clause".to_string()],
        )
    }

    /// Re-run the phrase and disclaimer checks on already sanitized text.
    pub fn validate(&self, text: &str) -> ValidationReport {
        let mut issues: Vec<String> = blocked_phrases(&self.matcher.detect(text))
            .into_iter()
            .map(|phrase| format!("Prohibited phrase still present: '{}'", phrase))
            .collect();
        let phrases_found = !issues.is_empty();

        let missing_supervision = !text.contains(SUPERVISION_MARKER);
        if missing_supervision {
            issues.push("Missing attorney supervision disclaimer".to_string());
        }
        let missing_not_advice = !text.contains(NOT_LEGAL_ADVICE_MARKER);
        if missing_not_advice {
            issues.push("Missing not-legal-advice disclaimer".to_string());
        }

        let mut recommendations = Vec::new();
        if phrases_found {
            recommendations.push("Remove or rephrase prohibited advisory phrases".to_string());
        }
        if missing_supervision || missing_not_advice {
            recommendations.push("Add the required disclaimer block".to_string());
        }
        recommendations.push("Submit content for attorney review before delivery".to_string());

        ValidationReport {
            is_compliant: issues.is_empty(),
            issues,
            confidence: self.score(text),
            recommendations,
        }
    }

    /// Post-hoc confidence: base score, minus a penalty per catalog entry
    /// still present, plus a bonus per disclaimer marker, clamped to [0, 1].
    pub fn score(&self, text: &str) -> f64 {
        let remaining = self.matcher.present_entries(text).len() as f64;
        let mut score = BASE_CONFIDENCE - PHRASE_PENALTY * remaining;
        if text.contains(SUPERVISION_MARKER) {
            score += MARKER_BONUS;
        }
        if text.contains(NOT_LEGAL_ADVICE_MARKER) {
            score += MARKER_BONUS;
        }
        score.clamp(0.0, 1.0)
    }

    async fn rewrite(&self, text: &str, content_type: ContentType, level: SanitizationLevel) -> Rewrite {
        match level {
            SanitizationLevel::Minimal => Rewrite {
                body: text.to_string(),
                changes: Vec::new(),
                degraded: false,
            },
            SanitizationLevel::Moderate => {
                let (body, changes) = self.substitute(text);
                Rewrite {
                    body,
                    changes,
                    degraded: false,
                }
            }
            SanitizationLevel::Comprehensive => match self.model_rewrite(text, content_type).await {
                Some(rewritten) => {
                    // Residual pass in case the model left catalog phrases behind.
                    let (body, residual) = self.substitute(&rewritten);
                    let mut changes = vec![ContentChange {
                        original: text.to_string(),
                        replacement: rewritten,
                        position: 0,
                        reason: "comprehensive rewrite".to_string(),
                    }];
                    changes.extend(residual);
                    Rewrite {
                        body,
                        changes,
                        degraded: false,
                    }
                }
                None => {
                    let (body, changes) = self.substitute(text);
                    Rewrite {
                        body,
                        changes,
                        degraded: true,
                    }
                }
            },
        }
    }

    async fn model_rewrite(&self, text: &str, content_type: ContentType) -> Option<String> {
        let Some(model) = self.model.as_ref() else {
            tracing::warn!("No reasoning model configured, falling back to moderate sanitization");
            return None;
        };

        let prompt = rewrite_prompt(text, content_type);
        let raw = guarded_complete(model.as_ref(), &prompt, self.rewrite_timeout)
            .await
            .ok()?;

        let rewritten = raw
            .trim()
            .trim_start_matches("```text")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim();
        if rewritten.is_empty() {
            tracing::warn!("Comprehensive rewrite returned only formatting, falling back");
            return None;
        }
        Some(rewritten.to_string())
    }

    /// Apply the substitution table in one left-to-right pass over `text`.
    /// Overlapping matches resolve to the earliest start, then table order.
    fn substitute(&self, text: &str) -> (String, Vec<ContentChange>) {
        let mut hits: Vec<(usize, usize, usize)> = self
            .substitutions
            .iter()
            .enumerate()
            .flat_map(|(order, sub)| {
                sub.regex
                    .find_iter(text)
                    .map(move |m| (m.start(), order, m.end()))
            })
            .collect();
        hits.sort_unstable();

        let mut out = String::with_capacity(text.len());
        let mut changes = Vec::new();
        let mut cursor = 0;
        for (start, order, end) in hits {
            if start < cursor {
                continue;
            }
            let sub = &self.substitutions[order];
            let original = &text[start..end];
            let replacement = match_case(original, sub.replacement);

            out.push_str(&text[cursor..start]);
            out.push_str(&replacement);
            changes.push(ContentChange {
                original: original.to_string(),
                replacement,
                position: start,
                reason: format!("phrase substitution ({})", sub.id),
            });
            cursor = end;
        }
        out.push_str(&text[cursor..]);
        (out, changes)
    }

    fn mark_execution_date(&self, body: &str) -> (String, Vec<ContentChange>) {
        let Some(re) = self.execution_date.as_ref() else {
            return (body.to_string(), Vec::new());
        };
        let changes: Vec<ContentChange> = re
            .find_iter(body)
            .map(|m| ContentChange {
                original: m.as_str().to_string(),
                replacement: EXECUTION_DATE_PENDING.to_string(),
                position: m.start(),
                reason: "execution date pending attorney review".to_string(),
            })
            .collect();
        let marked = re.replace_all(body, EXECUTION_DATE_PENDING).into_owned();
        (marked, changes)
    }

    fn finish(
        &self,
        input: &str,
        content_type: ContentType,
        rewrite: Rewrite,
        mut extra_disclaimers: Vec<String>,
    ) -> SanitizationResult {
        let block = disclaimer_block(content_type);
        let key = disclaimer_key(content_type);
        let sanitized_content = format!("{}\n\n{}\n\n{}", block, rewrite.body, block);

        let mut disclaimers_added = vec![format!("{} (prepended)", key), format!("{} (appended)", key)];
        disclaimers_added.append(&mut extra_disclaimers);

        let mut confidence_score = self.score(&sanitized_content);
        if rewrite.degraded {
            confidence_score = confidence_score.min(DEGRADED_CONFIDENCE);
        }

        tracing::debug!(
            content_type = %content_type,
            changes = rewrite.changes.len(),
            confidence = confidence_score,
            degraded = rewrite.degraded,
            "Content sanitized"
        );

        SanitizationResult {
            sanitized_content,
            changes_made: rewrite.changes,
            disclaimers_added,
            blocked_phrases: blocked_phrases(&self.matcher.detect(input)),
            confidence_score,
            requires_review: true,
        }
    }
}

/// Instructions for the model-driven rewrite.
pub fn rewrite_prompt(text: &str, content_type: ContentType) -> String {
    format!(
        r#"Rewrite the following {content_type} content so that it conveys general legal information instead of legal advice.

Rules:
- Turn imperative or advisory statements into conditional, informational statements
- Remove any language implying an attorney-client relationship or privilege
- Introduce qualifying language such as "may", "might" and "generally"
- Preserve the informational value and structure of the original
- Do not add disclaimers; they are added separately

Return only the rewritten text.

Content:
<<<
{text}
>>>"#
    )
}

/// Carry a leading capital from the matched text over to its replacement.
fn match_case(original: &str, replacement: &str) -> String {
    let starts_upper = original.chars().next().is_some_and(|c| c.is_uppercase());
    let mut chars = replacement.chars();
    match chars.next() {
        Some(first) if starts_upper => first.to_uppercase().chain(chars).collect(),
        _ => replacement.to_string(),
    }
}
