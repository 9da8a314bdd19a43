//! LexGuard configuration management
//!
//! Configuration is an immutable value: the engine captures it at
//! construction and reads the administrative flags from it once per check.

use crate::audit::PersistenceConfig;
use crate::compliance::context::{default_context_rules, ContextRuleDef};
use crate::compliance::patterns::CustomPattern;
use crate::error::{Error, Result};
use crate::llm::{ModelProvider, RetryConfig};
use crate::sanitizer::SanitizationLevel;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main LexGuard configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LexGuardConfig {
    /// Compliance decision settings
    #[serde(default)]
    pub compliance: ComplianceConfig,

    /// Reasoning-model settings
    #[serde(default)]
    pub model: ModelConfig,

    /// Audit log settings
    #[serde(default)]
    pub audit: AuditConfig,

    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
}

impl LexGuardConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot honour.
    pub fn validate(&self) -> Result<()> {
        self.compliance.validate()?;

        let model_budget = self
            .compliance
            .semantic_timeout_ms
            .min(self.compliance.rewrite_timeout_ms);
        if self.model.retry.budget_ms > model_budget {
            return Err(Error::Config(format!(
                "model.retry.budget_ms ({}) must fit within the semantic and rewrite timeouts ({}ms)",
                self.model.retry.budget_ms, model_budget
            )));
        }
        Ok(())
    }
}

/// Whether compliance enforcement runs at all
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnforcementMode {
    /// Every check runs the full detector pipeline
    #[default]
    Enforced,
    /// Checks pass content through without detection. Must be set explicitly.
    Disabled,
}

impl EnforcementMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enforced => "enforced",
            Self::Disabled => "disabled",
        }
    }
}

/// Compliance decision configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplianceConfig {
    /// Enforcement on/off
    pub enforcement: EnforcementMode,

    /// Require attorney review on every decision
    pub supervision_required: bool,

    /// Fail every check closed
    pub maintenance_mode: bool,

    /// Sanitization level applied to non-compliant content
    pub sanitization_level: SanitizationLevel,

    /// Budget for the semantic analysis model call
    pub semantic_timeout_ms: u64,

    /// Budget for the comprehensive-rewrite model call
    pub rewrite_timeout_ms: u64,

    /// Budget for a whole check; exceeding it fails the check closed.
    /// Must exceed the semantic and rewrite budgets combined.
    pub check_timeout_ms: u64,

    /// Width of the status statistics window
    pub status_window_hours: u32,

    /// Semantic confidence below which attorney review is mandatory
    pub review_confidence_threshold: f64,

    /// Extra prohibited phrases appended to the built-in catalog
    pub custom_patterns: Vec<CustomPattern>,

    /// Content-type specific rules
    pub context_rules: Vec<ContextRuleDef>,
}

impl Default for ComplianceConfig {
    fn default() -> Self {
        Self {
            enforcement: EnforcementMode::Enforced,
            supervision_required: true,
            maintenance_mode: false,
            sanitization_level: SanitizationLevel::Comprehensive,
            semantic_timeout_ms: 30_000,
            rewrite_timeout_ms: 20_000,
            check_timeout_ms: 60_000,
            status_window_hours: 24,
            review_confidence_threshold: 0.8,
            custom_patterns: Vec::new(),
            context_rules: default_context_rules(),
        }
    }
}

impl ComplianceConfig {
    /// Checks the review threshold and the timeout budgets. The check
    /// budget must exceed one semantic call plus one rewrite call.
    pub fn validate(&self) -> Result<()> {
        let threshold = self.review_confidence_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(Error::Config(format!(
                "review_confidence_threshold must be within [0, 1], got {}",
                threshold
            )));
        }
        if self.semantic_timeout_ms == 0 || self.rewrite_timeout_ms == 0 {
            return Err(Error::Config(
                "semantic_timeout_ms and rewrite_timeout_ms must be positive".to_string(),
            ));
        }
        let model_calls = self.semantic_timeout_ms.saturating_add(self.rewrite_timeout_ms);
        if self.check_timeout_ms <= model_calls {
            return Err(Error::Config(format!(
                "check_timeout_ms ({}) must exceed semantic_timeout_ms + rewrite_timeout_ms ({})",
                self.check_timeout_ms, model_calls
            )));
        }
        Ok(())
    }

    pub fn semantic_timeout(&self) -> Duration {
        Duration::from_millis(self.semantic_timeout_ms)
    }

    pub fn rewrite_timeout(&self) -> Duration {
        Duration::from_millis(self.rewrite_timeout_ms)
    }

    pub fn check_timeout(&self) -> Duration {
        Duration::from_millis(self.check_timeout_ms)
    }
}

/// Reasoning-model configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Wire protocol of the endpoint
    pub provider: ModelProvider,

    /// Custom base URL (provider default when unset)
    pub base_url: Option<String>,

    /// Model identifier
    pub model: String,

    /// Environment variable holding the API key
    pub api_key_env: String,

    /// Maximum tokens per completion
    pub max_tokens: u32,

    /// Retry policy at the HTTP boundary
    pub retry: RetryConfig,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: ModelProvider::Anthropic,
            base_url: None,
            model: "claude-sonnet-4-20250514".to_string(),
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            max_tokens: 2048,
            retry: RetryConfig::default(),
        }
    }
}

/// Audit log configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Records kept in memory for status queries
    pub capacity: usize,

    /// JSONL persistence
    pub persistence: PersistenceConfig,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            capacity: 10_000,
            persistence: PersistenceConfig::default(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Allowed CORS origins (empty = any)
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 18791,
            cors_origins: Vec::new(),
        }
    }
}
