//! Model-backed semantic UPL analysis
//!
//! Builds a compliance-review prompt, calls the reasoning model through the
//! guarded wrapper, and parses the first well-formed JSON block in the reply.
//!
//! Outcomes:
//! - model answered with a parseable block → its violations and confidence
//! - model answered with nothing parseable → no violations, confidence 0.5
//! - model call failed or timed out → one `analysis_error` violation,
//!   confidence 0.0

use super::types::{ContentType, Severity, Violation, ViolationType};
use crate::llm::{guarded_complete, ReasoningModel};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Confidence reported when the model reply could not be parsed
pub const INCONCLUSIVE_CONFIDENCE: f64 = 0.5;

/// How the semantic stage ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    Completed,
    Inconclusive,
    Failed,
}

/// Result of the semantic stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticAnalysis {
    pub violations: Vec<Violation>,
    pub confidence: f64,
    pub summary: String,
    pub status: AnalysisStatus,
}

impl SemanticAnalysis {
    fn failed(reason: impl std::fmt::Display) -> Self {
        Self {
            violations: vec![Violation::new(
                ViolationType::AnalysisError,
                format!("Semantic analysis unavailable: {}", reason),
                Severity::Medium,
            )],
            confidence: 0.0,
            summary: "Semantic analysis failed".to_string(),
            status: AnalysisStatus::Failed,
        }
    }

    fn inconclusive() -> Self {
        Self {
            violations: Vec::new(),
            confidence: INCONCLUSIVE_CONFIDENCE,
            summary: "Semantic analysis inconclusive: response was not structured".to_string(),
            status: AnalysisStatus::Inconclusive,
        }
    }
}

/// Shape the model is asked to answer in
#[derive(Debug, Deserialize)]
struct ModelVerdict {
    violations: Vec<ModelViolation>,
    #[serde(default = "default_confidence")]
    confidence: f64,
    #[serde(default)]
    summary: String,
}

#[derive(Debug, Deserialize)]
struct ModelViolation {
    #[serde(rename = "type", alias = "category", default)]
    kind: String,
    #[serde(default)]
    severity: Option<String>,
    #[serde(default, alias = "excerpt", alias = "text")]
    text_excerpt: Option<String>,
    #[serde(default, alias = "message", alias = "reason")]
    explanation: Option<String>,
}

fn default_confidence() -> f64 {
    INCONCLUSIVE_CONFIDENCE
}

/// Semantic analyzer over a reasoning model
pub struct SemanticAnalyzer {
    model: Arc<dyn ReasoningModel>,
    timeout: Duration,
}

impl SemanticAnalyzer {
    pub fn new(model: Arc<dyn ReasoningModel>, timeout: Duration) -> Self {
        Self { model, timeout }
    }

    /// Analyze `text`. Never fails; degraded outcomes are encoded in the result.
    pub async fn analyze(&self, text: &str, content_type: ContentType) -> SemanticAnalysis {
        let prompt = Self::review_prompt(text, content_type);

        let raw = match guarded_complete(self.model.as_ref(), &prompt, self.timeout).await {
            Ok(raw) => raw,
            Err(failure) => return SemanticAnalysis::failed(failure),
        };

        match parse_verdict(&raw) {
            Some(verdict) => {
                let violations: Vec<Violation> =
                    verdict.violations.into_iter().map(into_violation).collect();
                tracing::debug!(
                    content_type = %content_type,
                    violation_count = violations.len(),
                    confidence = verdict.confidence,
                    "Semantic analysis completed"
                );
                SemanticAnalysis {
                    violations,
                    confidence: clamp_unit(verdict.confidence),
                    summary: verdict.summary,
                    status: AnalysisStatus::Completed,
                }
            }
            None => {
                tracing::warn!(
                    content_type = %content_type,
                    response_len = raw.len(),
                    "Semantic analysis response contained no structured block"
                );
                SemanticAnalysis::inconclusive()
            }
        }
    }

    /// The compliance-review task description sent to the model.
    pub fn review_prompt(text: &str, content_type: ContentType) -> String {
        format!(
            r#"You are a legal compliance reviewer screening AI-generated content for Unauthorized Practice of Law (UPL) risk before it reaches a non-attorney user.

Content type: {content_type}

Identify every passage that falls into one of these risk categories:
1. direct_legal_advice: tells the reader what they personally should or must do about a legal matter
2. case_specific_guidance: applies the law to the reader's own facts, dispute, or situation
3. legal_conclusion: states legal conclusions or predicts the outcome of a legal matter
4. attorney_client_privilege: implies an attorney-client relationship, representation, or privilege
5. legal_recommendation: explicitly recommends taking a legal action (suing, filing, signing, settling)

Flag when in doubt. General legal information that is clearly informational is not a violation.

Respond ONLY with a JSON object of this exact shape:
{{"violations": [{{"type": "<category>", "severity": "low|medium|high|critical", "text_excerpt": "<quoted passage>", "explanation": "<why>"}}], "confidence": <0.0-1.0>, "summary": "<one sentence>"}}

If nothing is found, return an empty violations array with your confidence.

Content to review:
<<<
{text}
>>>"#
        )
    }
}

/// Scan a raw model reply for the first JSON object that matches the verdict shape.
fn parse_verdict(raw: &str) -> Option<ModelVerdict> {
    raw.char_indices()
        .filter(|(_, c)| *c == '{')
        .find_map(|(idx, _)| {
            serde_json::Deserializer::from_str(&raw[idx..])
                .into_iter::<ModelVerdict>()
                .next()
                .and_then(|parsed| parsed.ok())
        })
}

fn into_violation(raw: ModelViolation) -> Violation {
    let violation_type = ViolationType::from_model_label(&raw.kind);
    let severity = raw
        .severity
        .as_deref()
        .map(Severity::parse_lossy)
        .unwrap_or(Severity::Medium);
    let message = raw
        .explanation
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("Semantic analysis flagged {}", violation_type));

    let violation = Violation::new(violation_type, message, severity);
    match raw.text_excerpt.filter(|e| !e.trim().is_empty()) {
        Some(excerpt) => violation.with_excerpt(excerpt),
        None => violation,
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockReasoningModel;

    fn analyzer(model: MockReasoningModel) -> SemanticAnalyzer {
        SemanticAnalyzer::new(Arc::new(model), Duration::from_millis(200))
    }

    #[tokio::test]
    async fn test_parses_structured_reply() {
        let a = analyzer(MockReasoningModel::fixed(
            r#"{"violations": [{"type": "case_specific_guidance", "severity": "high", "text_excerpt": "in your situation", "explanation": "applies law to reader"}], "confidence": 0.92, "summary": "one issue"}"#,
        ));
        let result = a.analyze("text", ContentType::LegalQa).await;
        assert_eq!(result.status, AnalysisStatus::Completed);
        assert_eq!(result.confidence, 0.92);
        assert_eq!(result.violations.len(), 1);
        let v = &result.violations[0];
        assert_eq!(v.violation_type, ViolationType::CaseSpecificGuidance);
        assert_eq!(v.severity, Severity::High);
        assert_eq!(v.text_excerpt.as_deref(), Some("in your situation"));
        assert_eq!(v.message, "applies law to reader");
        assert!(v.phrase.is_none());
    }

    #[tokio::test]
    async fn test_finds_block_inside_prose() {
        let a = analyzer(MockReasoningModel::fixed(
            "Sure! Here is my review {not json} and then:\n```json\n{\"violations\": [], \"confidence\": 0.97, \"summary\": \"clean\"}\n```\nThanks.",
        ));
        let result = a.analyze("text", ContentType::General).await;
        assert_eq!(result.status, AnalysisStatus::Completed);
        assert!(result.violations.is_empty());
        assert_eq!(result.confidence, 0.97);
        assert_eq!(result.summary, "clean");
    }

    #[tokio::test]
    async fn test_unstructured_reply_is_inconclusive() {
        let a = analyzer(MockReasoningModel::fixed("Looks fine to me."));
        let result = a.analyze("text", ContentType::General).await;
        assert_eq!(result.status, AnalysisStatus::Inconclusive);
        assert!(result.violations.is_empty());
        assert_eq!(result.confidence, INCONCLUSIVE_CONFIDENCE);
    }

    #[tokio::test]
    async fn test_model_failure_is_analysis_error() {
        let a = analyzer(MockReasoningModel::failing("401 unauthorized"));
        let result = a.analyze("text", ContentType::Contract).await;
        assert_eq!(result.status, AnalysisStatus::Failed);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].violation_type, ViolationType::AnalysisError);
        assert_eq!(result.violations[0].severity, Severity::Medium);
    }

    #[tokio::test]
    async fn test_model_timeout_is_analysis_error() {
        let a = analyzer(
            MockReasoningModel::fixed(r#"{"violations": [], "confidence": 1.0}"#)
                .with_delay(Duration::from_secs(2)),
        );
        let result = a.analyze("text", ContentType::General).await;
        assert_eq!(result.status, AnalysisStatus::Failed);
        assert!(result.violations[0].message.contains("timed out"));
    }

    #[tokio::test]
    async fn test_confidence_clamped_and_defaults() {
        let a = analyzer(MockReasoningModel::fixed(
            r#"{"violations": [{"category": "unknown thing"}], "confidence": 3.5}"#,
        ));
        let result = a.analyze("text", ContentType::General).await;
        assert_eq!(result.confidence, 1.0);
        let v = &result.violations[0];
        assert_eq!(v.violation_type, ViolationType::DirectLegalAdvice);
        assert_eq!(v.severity, Severity::Medium);
        assert!(v.text_excerpt.is_none());
    }

    #[test]
    fn test_clamp_unit_bounds_every_input() {
        assert_eq!(clamp_unit(f64::NAN), 0.0);
        assert_eq!(clamp_unit(-0.2), 0.0);
        assert_eq!(clamp_unit(f64::INFINITY), 1.0);
        assert_eq!(clamp_unit(0.42), 0.42);
    }

    #[tokio::test]
    async fn test_prompt_carries_text_and_categories() {
        let model = Arc::new(MockReasoningModel::fixed(r#"{"violations": []}"#));
        let a = SemanticAnalyzer::new(model.clone(), Duration::from_secs(1));
        let result = a.analyze("Sign it today.", ContentType::Contract).await;
        assert_eq!(result.confidence, INCONCLUSIVE_CONFIDENCE);

        let prompt = &model.prompts()[0];
        assert!(prompt.contains("Sign it today."));
        assert!(prompt.contains("Content type: contract"));
        assert!(prompt.contains("attorney_client_privilege"));
        assert!(prompt.contains("Flag when in doubt"));
    }

    #[test]
    fn test_parse_verdict_skips_nested_objects() {
        // The inner object lacks `violations`, so only the outer one parses.
        let raw = r#"prefix {"violations": [{"type": "direct_legal_advice"}], "confidence": 0.4}"#;
        let verdict = parse_verdict(raw).unwrap();
        assert_eq!(verdict.violations.len(), 1);
        assert_eq!(verdict.confidence, 0.4);
        assert!(parse_verdict(r#"{"type": "x"}"#).is_none());
    }
}
