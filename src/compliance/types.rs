//! Compliance decision types shared by the detectors and the aggregator

use serde::{Deserialize, Serialize};

/// Severity of a single violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Lenient parse used for model output. Unknown values become `Medium`.
    pub fn parse_lossy(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "low" => Self::Low,
            "high" => Self::High,
            "critical" => Self::Critical,
            _ => Self::Medium,
        }
    }
}

/// Category of an unauthorized-practice-of-law finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationType {
    /// Direct legal advice addressed to the reader
    DirectLegalAdvice,
    /// Recommendation of a legal course of action, or a predicted outcome
    LegalRecommendation,
    /// Guidance tailored to the reader's own case
    CaseSpecificGuidance,
    /// A phrase from the prohibited-language catalog
    ProhibitedLanguage,
    /// Language implying an attorney-client relationship or privilege
    AttorneyClientPrivilege,
    /// The pipeline itself failed; the decision was forced closed
    SystemError,
    /// The semantic analysis capability failed or timed out
    AnalysisError,
    /// The subsystem is administratively in maintenance mode
    MaintenanceMode,
}

impl ViolationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DirectLegalAdvice => "direct_legal_advice",
            Self::LegalRecommendation => "legal_recommendation",
            Self::CaseSpecificGuidance => "case_specific_guidance",
            Self::ProhibitedLanguage => "prohibited_language",
            Self::AttorneyClientPrivilege => "attorney_client_privilege",
            Self::SystemError => "system_error",
            Self::AnalysisError => "analysis_error",
            Self::MaintenanceMode => "maintenance_mode",
        }
    }

    /// Map a model-reported category to a violation type.
    ///
    /// Unrecognised categories are treated as direct advice: the model was
    /// told to flag when in doubt, so an unknown flag is still a flag.
    pub fn from_model_label(label: &str) -> Self {
        match label.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "legal_recommendation" | "legal_action_recommendation" | "legal_conclusion"
            | "legal_prediction" => Self::LegalRecommendation,
            "case_specific_guidance" | "case_specific" => Self::CaseSpecificGuidance,
            "attorney_client_privilege" | "attorney_client" => Self::AttorneyClientPrivilege,
            "prohibited_language" => Self::ProhibitedLanguage,
            _ => Self::DirectLegalAdvice,
        }
    }
}

impl std::fmt::Display for ViolationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of content being screened. Selects context rules and disclaimers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Contract,
    LegalQa,
    Template,
    #[default]
    General,
}

impl ContentType {
    /// Normalize a caller-supplied content type. Unknown values fall back to
    /// `General` instead of failing the check.
    pub fn parse_lossy(s: &str) -> Self {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "contract" | "contracts" => Self::Contract,
            "legal_qa" | "qa" | "legal_advice" | "legal_question" => Self::LegalQa,
            "template" | "document_template" => Self::Template,
            _ => Self::General,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contract => "contract",
            Self::LegalQa => "legal_qa",
            Self::Template => "template",
            Self::General => "general",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single finding from one of the detectors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    #[serde(rename = "type")]
    pub violation_type: ViolationType,
    pub message: String,
    pub severity: Severity,
    /// Matched text (pattern hits only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phrase: Option<String>,
    /// Byte offset of the match in the checked text (pattern hits only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
    /// Excerpt quoted by the model (semantic hits only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_excerpt: Option<String>,
}

impl Violation {
    pub fn new(violation_type: ViolationType, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            violation_type,
            message: message.into(),
            severity,
            phrase: None,
            position: None,
            text_excerpt: None,
        }
    }

    pub fn with_phrase(mut self, phrase: impl Into<String>, position: usize) -> Self {
        self.phrase = Some(phrase.into());
        self.position = Some(position);
        self
    }

    pub fn with_excerpt(mut self, excerpt: impl Into<String>) -> Self {
        self.text_excerpt = Some(excerpt.into());
        self
    }
}

/// Outcome of a single compliance check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceResult {
    /// True iff no detector reported a violation
    pub is_compliant: bool,
    /// Violations in detection order: pattern, semantic, contextual
    pub violations: Vec<Violation>,
    /// Confidence reported by the semantic stage (0.0 when it failed)
    pub confidence_score: f64,
    /// Safe-to-display fallback, only present for non-compliant content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sanitized_content: Option<String>,
    pub requires_attorney_review: bool,
    /// Lowercased catalog phrases matched by the pattern stage
    pub blocked_phrases: Vec<String>,
    pub recommendations: Vec<String>,
}

impl ComplianceResult {
    /// Administrative fail-closed result returned while in maintenance mode.
    pub fn maintenance() -> Self {
        Self {
            is_compliant: false,
            violations: vec![Violation::new(
                ViolationType::MaintenanceMode,
                "Compliance system is in maintenance mode; content cannot be released",
                Severity::Critical,
            )],
            confidence_score: 0.0,
            sanitized_content: None,
            requires_attorney_review: true,
            blocked_phrases: Vec::new(),
            recommendations: vec![CLOSING_RECOMMENDATIONS[0].to_string()],
        }
    }

    /// Result returned when enforcement is explicitly disabled.
    pub fn pass_through(supervision_required: bool) -> Self {
        Self {
            is_compliant: true,
            violations: Vec::new(),
            confidence_score: 1.0,
            sanitized_content: None,
            requires_attorney_review: supervision_required,
            blocked_phrases: Vec::new(),
            recommendations: Vec::new(),
        }
    }

    /// Systemic fail-closed result: the pipeline broke, so nothing passes.
    pub fn fail_closed(reason: impl std::fmt::Display) -> Self {
        let violations = vec![Violation::new(
            ViolationType::SystemError,
            format!("Compliance check failed: {}", reason),
            Severity::Critical,
        )];
        let recommendations = recommendations_for(&violations);
        Self {
            is_compliant: false,
            violations,
            confidence_score: 0.0,
            sanitized_content: None,
            requires_attorney_review: true,
            blocked_phrases: Vec::new(),
            recommendations,
        }
    }

    pub fn has_violation(&self, violation_type: ViolationType) -> bool {
        self.violations
            .iter()
            .any(|v| v.violation_type == violation_type)
    }

    /// Highest severity among the violations, if any
    pub fn max_severity(&self) -> Option<Severity> {
        self.violations.iter().map(|v| v.severity).max()
    }
}

/// Remediation hint per violation type, in output order.
const RECOMMENDATIONS: &[(ViolationType, &str)] = &[
    (
        ViolationType::ProhibitedLanguage,
        "Remove or rephrase prohibited advisory phrases",
    ),
    (
        ViolationType::DirectLegalAdvice,
        "Rephrase direct advice as general legal information",
    ),
    (
        ViolationType::LegalRecommendation,
        "Replace recommendations and outcome predictions with neutral descriptions of available options",
    ),
    (
        ViolationType::CaseSpecificGuidance,
        "Remove guidance tailored to the reader's specific situation",
    ),
    (
        ViolationType::AttorneyClientPrivilege,
        "Remove language implying an attorney-client relationship or privilege",
    ),
    (
        ViolationType::AnalysisError,
        "Automated semantic analysis was incomplete; rely on attorney review",
    ),
    (
        ViolationType::SystemError,
        "Compliance pipeline failed; withhold content until it is re-checked",
    ),
];

/// Recommendations appended to every non-short-circuited decision.
pub const CLOSING_RECOMMENDATIONS: [&str; 2] = [
    "Submit content for attorney review before delivery",
    "Ensure required legal disclaimers are present",
];

/// Build the recommendation list for a set of violations.
pub fn recommendations_for(violations: &[Violation]) -> Vec<String> {
    let mut out: Vec<String> = RECOMMENDATIONS
        .iter()
        .filter(|(kind, _)| violations.iter().any(|v| v.violation_type == *kind))
        .map(|(_, text)| text.to_string())
        .collect();
    out.extend(CLOSING_RECOMMENDATIONS.iter().map(|s| s.to_string()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_parse_lossy() {
        assert_eq!(ContentType::parse_lossy("contract"), ContentType::Contract);
        assert_eq!(ContentType::parse_lossy("Legal-QA"), ContentType::LegalQa);
        assert_eq!(ContentType::parse_lossy("legal_advice"), ContentType::LegalQa);
        assert_eq!(ContentType::parse_lossy("template"), ContentType::Template);
        assert_eq!(ContentType::parse_lossy("weird"), ContentType::General);
        assert_eq!(ContentType::parse_lossy(""), ContentType::General);
    }

    #[test]
    fn test_violation_type_from_model_label() {
        assert_eq!(
            ViolationType::from_model_label("case specific guidance"),
            ViolationType::CaseSpecificGuidance
        );
        assert_eq!(
            ViolationType::from_model_label("attorney-client privilege"),
            ViolationType::AttorneyClientPrivilege
        );
        assert_eq!(
            ViolationType::from_model_label("legal_prediction"),
            ViolationType::LegalRecommendation
        );
        assert_eq!(
            ViolationType::from_model_label("something new"),
            ViolationType::DirectLegalAdvice
        );
    }

    #[test]
    fn test_violation_serialization() {
        let v = Violation::new(ViolationType::ProhibitedLanguage, "hit", Severity::High)
            .with_phrase("you should", 0);
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["type"], "prohibited_language");
        assert_eq!(json["severity"], "high");
        assert_eq!(json["position"], 0);
        assert!(json.get("textExcerpt").is_none());
    }

    #[test]
    fn test_maintenance_result() {
        let result = ComplianceResult::maintenance();
        assert!(!result.is_compliant);
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].severity, Severity::Critical);
        assert!(result.has_violation(ViolationType::MaintenanceMode));
        assert!(result.sanitized_content.is_none());
    }

    #[test]
    fn test_fail_closed_result() {
        let result = ComplianceResult::fail_closed("boom");
        assert!(!result.is_compliant);
        assert!(result.requires_attorney_review);
        assert!(result.has_violation(ViolationType::SystemError));
        assert_eq!(result.max_severity(), Some(Severity::Critical));
    }

    #[test]
    fn test_recommendations_order_and_closing() {
        let violations = vec![
            Violation::new(ViolationType::AttorneyClientPrivilege, "a", Severity::Critical),
            Violation::new(ViolationType::ProhibitedLanguage, "b", Severity::High),
            Violation::new(ViolationType::ProhibitedLanguage, "c", Severity::High),
        ];
        let recs = recommendations_for(&violations);
        assert_eq!(recs.len(), 4);
        assert!(recs[0].contains("prohibited advisory phrases"));
        assert!(recs[1].contains("attorney-client"));
        assert_eq!(recs[2], CLOSING_RECOMMENDATIONS[0]);
        assert_eq!(recs[3], CLOSING_RECOMMENDATIONS[1]);
    }

    #[test]
    fn test_recommendations_empty_violations() {
        let recs = recommendations_for(&[]);
        assert_eq!(recs, CLOSING_RECOMMENDATIONS.map(String::from).to_vec());
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert_eq!(Severity::parse_lossy("HIGH"), Severity::High);
        assert_eq!(Severity::parse_lossy("urgent"), Severity::Medium);
    }
}
