//! Compliance aggregator
//!
//! Runs the three detectors for one piece of content and folds their
//! findings into a single [`ComplianceResult`]. Every path ends in a
//! decision: administrative switches short-circuit, detector failures
//! degrade into violations, and anything that escapes the pipeline
//! (panic, overall timeout) becomes a fail-closed `system_error`.
//!
//! ```text
//! check(text, type)
//!   ├─ maintenance_mode ─────────────► maintenance result
//!   ├─ enforcement = disabled ───────► pass-through result
//!   └─ spawn ─► join!(patterns, semantic, context)
//!                 └─► aggregate ─► sanitize (if non-compliant)
//!        (panic | timeout) ─► fail_closed
//!   audit (always, inside a detached task so a dropped caller still
//!          leaves a record)
//! ```

use super::context::ContextRuleEvaluator;
use super::patterns::{blocked_phrases, PatternMatcher};
use super::semantic::SemanticAnalyzer;
use super::types::{recommendations_for, ComplianceResult, ContentType};
use crate::audit::{AuditLog, AuditRecord, AuditStore, AuditWriter, JsonlAuditStore};
use crate::config::{ComplianceConfig, EnforcementMode, LexGuardConfig};
use crate::error::Result;
use crate::llm::ReasoningModel;
use crate::sanitizer::{ContentSanitizer, SanitizationLevel, SanitizationResult, ValidationReport};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Operational state reported by the status endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemStatus {
    Operational,
    PassThrough,
    Maintenance,
}

/// Status introspection snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceStatus {
    pub mode: EnforcementMode,
    pub supervision_required: bool,
    pub maintenance_mode: bool,
    pub system_status: SystemStatus,
    pub checks_in_window: u64,
    pub violations_in_window: u64,
    /// Fraction of compliant checks in the window (1.0 when empty)
    pub compliance_rate: f64,
    pub window_hours: u32,
}

/// The compliance decision engine.
///
/// Cheap to clone; all components are shared.
#[derive(Clone)]
pub struct ComplianceEngine {
    config: Arc<ComplianceConfig>,
    patterns: Arc<PatternMatcher>,
    semantic: Arc<SemanticAnalyzer>,
    context: Arc<ContextRuleEvaluator>,
    sanitizer: Arc<ContentSanitizer>,
    audit: AuditWriter,
    log: Arc<AuditLog>,
}

impl ComplianceEngine {
    /// Engine with an in-memory audit log of default capacity.
    pub fn new(config: ComplianceConfig, model: Arc<dyn ReasoningModel>) -> Result<Self> {
        Self::with_audit(config, model, Arc::new(AuditLog::default()), Vec::new())
    }

    /// Engine recording into `log` plus any additional stores.
    pub fn with_audit(
        config: ComplianceConfig,
        model: Arc<dyn ReasoningModel>,
        log: Arc<AuditLog>,
        extra_stores: Vec<Arc<dyn AuditStore>>,
    ) -> Result<Self> {
        config.validate()?;
        let patterns = Arc::new(PatternMatcher::with_custom(&config.custom_patterns)?);
        let context = Arc::new(ContextRuleEvaluator::new(config.context_rules.clone())?);
        let semantic = Arc::new(SemanticAnalyzer::new(model.clone(), config.semantic_timeout()));
        let sanitizer = Arc::new(
            ContentSanitizer::new(patterns.clone()).with_model(model, config.rewrite_timeout()),
        );

        let mut stores: Vec<Arc<dyn AuditStore>> = vec![log.clone()];
        stores.extend(extra_stores);

        tracing::info!(
            enforcement = config.enforcement.as_str(),
            supervision_required = config.supervision_required,
            maintenance_mode = config.maintenance_mode,
            patterns = patterns.len(),
            context_rules = context.rule_count(),
            audit_stores = stores.len(),
            "Compliance engine initialized"
        );

        Ok(Self {
            config: Arc::new(config),
            patterns,
            semantic,
            context,
            sanitizer,
            audit: AuditWriter::new(stores),
            log,
        })
    }

    /// Build from the full configuration, opening the JSONL store when
    /// persistence is enabled.
    pub async fn from_config(config: &LexGuardConfig, model: Arc<dyn ReasoningModel>) -> Result<Self> {
        config.validate()?;
        let log = Arc::new(AuditLog::new(config.audit.capacity));

        let mut extra: Vec<Arc<dyn AuditStore>> = Vec::new();
        if config.audit.persistence.enabled {
            let store = JsonlAuditStore::new(Path::new("."), config.audit.persistence.clone()).await?;
            tracing::info!("Audit persistence enabled at {}", store.active_path().display());
            extra.push(Arc::new(store));
        }

        Self::with_audit(config.compliance.clone(), model, log, extra)
    }

    /// Screen `text` and return the compliance decision. Never fails.
    ///
    /// The decision and its audit record are produced by a detached task, so
    /// the record is written even if the caller stops waiting.
    pub async fn check(&self, text: &str, content_type: ContentType) -> ComplianceResult {
        let engine = self.clone();
        let owned = text.to_string();
        let task = tokio::spawn(async move {
            let result = engine.decide(&owned, content_type).await;
            engine.record(&owned, content_type, &result).await;
            result
        });

        match task.await {
            Ok(result) => result,
            Err(join_err) => {
                tracing::error!(content_type = %content_type, error = %join_err, "Compliance task aborted");
                let result =
                    ComplianceResult::fail_closed(format!("compliance task aborted: {}", join_err));
                self.record(text, content_type, &result).await;
                result
            }
        }
    }

    async fn record(&self, text: &str, content_type: ContentType, result: &ComplianceResult) {
        tracing::info!(
            content_type = %content_type,
            is_compliant = result.is_compliant,
            violation_count = result.violations.len(),
            confidence = result.confidence_score,
            requires_review = result.requires_attorney_review,
            "Compliance check completed"
        );

        let record = AuditRecord::from_check(
            text,
            content_type,
            result,
            self.config.enforcement.as_str(),
            self.config.sanitization_level.as_str(),
        );
        self.audit.record(&record).await;
    }

    async fn decide(&self, text: &str, content_type: ContentType) -> ComplianceResult {
        if self.config.maintenance_mode {
            tracing::warn!(content_type = %content_type, "Maintenance mode active, failing check closed");
            return ComplianceResult::maintenance();
        }
        if self.config.enforcement == EnforcementMode::Disabled {
            tracing::warn!(
                content_type = %content_type,
                "Compliance enforcement disabled, passing content through unchecked"
            );
            return ComplianceResult::pass_through(self.config.supervision_required);
        }

        let engine = self.clone();
        let owned = text.to_string();
        let mut handle =
            tokio::spawn(async move { engine.run_pipeline(&owned, content_type).await });

        let budget = self.config.check_timeout();
        match tokio::time::timeout(budget, &mut handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => {
                tracing::error!(content_type = %content_type, error = %join_err, "Compliance pipeline task aborted");
                ComplianceResult::fail_closed(format!("pipeline task aborted: {}", join_err))
            }
            Err(_) => {
                handle.abort();
                tracing::error!(
                    content_type = %content_type,
                    timeout_ms = budget.as_millis() as u64,
                    "Compliance check timed out"
                );
                ComplianceResult::fail_closed(format!(
                    "check exceeded its {}ms budget",
                    budget.as_millis()
                ))
            }
        }
    }

    async fn run_pipeline(&self, text: &str, content_type: ContentType) -> ComplianceResult {
        let (pattern_hits, semantic, context_hits) = tokio::join!(
            async { self.patterns.detect(text) },
            self.semantic.analyze(text, content_type),
            async { self.context.evaluate(text, content_type) },
        );

        let blocked = blocked_phrases(&pattern_hits);
        let mut violations = pattern_hits;
        violations.extend(semantic.violations);
        violations.extend(context_hits);

        let confidence_score = semantic.confidence;
        let is_compliant = violations.is_empty();
        let requires_attorney_review = !is_compliant
            || self.config.supervision_required
            || confidence_score < self.config.review_confidence_threshold;

        let sanitized_content = if is_compliant {
            None
        } else {
            let sanitized = self
                .sanitizer
                .sanitize(text, content_type, self.config.sanitization_level)
                .await;
            Some(sanitized.sanitized_content)
        };

        let recommendations = recommendations_for(&violations);

        ComplianceResult {
            is_compliant,
            violations,
            confidence_score,
            sanitized_content,
            requires_attorney_review,
            blocked_phrases: blocked,
            recommendations,
        }
    }

    /// Standalone sanitization, outside a compliance decision.
    pub async fn sanitize(
        &self,
        text: &str,
        content_type: ContentType,
        level: Option<SanitizationLevel>,
    ) -> SanitizationResult {
        let level = level.unwrap_or(self.config.sanitization_level);
        self.sanitizer.sanitize(text, content_type, level).await
    }

    /// Contract-template sanitization.
    pub async fn sanitize_contract(&self, text: &str, level: Option<SanitizationLevel>) -> SanitizationResult {
        let level = level.unwrap_or(self.config.sanitization_level);
        self.sanitizer.sanitize_contract(text, level).await
    }

    /// Lightweight re-check of sanitized text.
    pub fn validate(&self, text: &str) -> ValidationReport {
        self.sanitizer.validate(text)
    }

    /// Current flags plus statistics for the configured window.
    pub async fn status(&self) -> ComplianceStatus {
        let window_hours = self.config.status_window_hours;
        let since = chrono::Utc::now() - chrono::Duration::hours(i64::from(window_hours));
        let stats = self.log.window_stats(since).await;

        let system_status = if self.config.maintenance_mode {
            SystemStatus::Maintenance
        } else if self.config.enforcement == EnforcementMode::Disabled {
            SystemStatus::PassThrough
        } else {
            SystemStatus::Operational
        };

        ComplianceStatus {
            mode: self.config.enforcement,
            supervision_required: self.config.supervision_required,
            maintenance_mode: self.config.maintenance_mode,
            system_status,
            checks_in_window: stats.checks,
            violations_in_window: stats.violations,
            compliance_rate: stats.compliance_rate(),
            window_hours,
        }
    }

    /// Most recent audit records, newest first.
    pub async fn recent_audit(&self, limit: usize) -> Vec<AuditRecord> {
        self.log.recent(limit).await
    }

    pub fn config(&self) -> &ComplianceConfig {
        &self.config
    }
}
