//! LexGuard - Unauthorized-practice-of-law screening for AI-generated legal text
//!
//! LexGuard sits between a legal-content generator and the end user. Every
//! piece of generated text is screened for UPL risk; risky text is rewritten
//! into a hedged, disclaimed form and flagged for attorney review.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────────┐
//! │                        ComplianceEngine::check                      │
//! │                                                                     │
//! │   maintenance? ──► fail closed        enforcement off? ──► pass     │
//! │                                                                     │
//! │  ┌───────────────┐  ┌──────────────────┐  ┌──────────────────────┐ │
//! │  │PatternMatcher │  │ SemanticAnalyzer │  │ ContextRuleEvaluator │ │
//! │  │ phrase catalog│  │ ReasoningModel   │  │ per content type     │ │
//! │  └───────┬───────┘  └────────┬─────────┘  └──────────┬───────────┘ │
//! │          └──────────────┬────┴────────────────────────┘             │
//! │                         ▼                                           │
//! │              aggregate ─► ContentSanitizer (if non-compliant)       │
//! │                         │                                           │
//! │       error / panic / timeout ─► fail closed (system_error)         │
//! └─────────────────────────┼───────────────────────────────────────────┘
//!                           ▼
//!                 AuditWriter (always) ─► AuditLog / JsonlAuditStore
//! ```
//!
//! ## Safety properties
//!
//! - No path returns an error instead of a decision
//! - Capability failures become violations, never silent passes
//! - Sanitized content always carries the supervision disclaimer at both ends
//!   and always requires attorney review
//!
//! ## Modules
//!
//! - [`compliance`]: detectors, aggregator and HTTP handlers
//! - [`sanitizer`]: substitution table, disclaimers, rewriting and scoring
//! - [`llm`]: reasoning-model capability, safe-call wrapper, HTTP client
//! - [`audit`]: audit records and stores
//! - [`config`]: configuration management
//! - [`api`]: HTTP application assembly

pub mod api;
pub mod audit;
pub mod compliance;
pub mod config;
pub mod error;
pub mod llm;
pub mod sanitizer;

pub use compliance::{ComplianceEngine, ComplianceResult, ComplianceStatus, ContentType, Violation};
pub use config::LexGuardConfig;
pub use error::{Error, Result};
pub use sanitizer::{ContentSanitizer, SanitizationLevel, SanitizationResult, ValidationReport};
