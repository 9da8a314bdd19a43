//! Unauthorized-practice-of-law compliance checking
//!
//! Three detectors feed one aggregator:
//!
//! - [`PatternMatcher`]: deterministic prohibited-phrase catalog
//! - [`SemanticAnalyzer`]: reasoning-model review, degrades on failure
//! - [`ContextRuleEvaluator`]: content-type specific rules
//!
//! [`ComplianceEngine::check`] combines them, sanitizes non-compliant
//! content, and audits every decision.

pub mod context;
pub mod engine;
pub mod handler;
pub mod patterns;
pub mod semantic;
pub mod types;

pub use context::{default_context_rules, ContextRuleDef, ContextRuleEvaluator};
pub use engine::{ComplianceEngine, ComplianceStatus, SystemStatus};
pub use handler::compliance_router;
pub use patterns::{CustomPattern, PatternMatcher, CATALOG_VERSION};
pub use semantic::{AnalysisStatus, SemanticAnalysis, SemanticAnalyzer};
pub use types::{ComplianceResult, ContentType, Severity, Violation, ViolationType};
