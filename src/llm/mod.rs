//! Reasoning-model capability
//!
//! The semantic analyzer and the comprehensive sanitizer both depend on an
//! external model that turns a prompt into text. The capability sits behind
//! the [`ReasoningModel`] trait so it can be swapped or mocked, and every call
//! from decision logic goes through [`guarded_complete`], which turns
//! timeouts and transport failures into a [`CapabilityFailure`] value rather
//! than an error the caller has to propagate.
//!
//! ```text
//! SemanticAnalyzer ──┐
//!                    ├──► guarded_complete(timeout) ──► ReasoningModel
//! ContentSanitizer ──┘          │                          ├── HttpReasoningModel (+ with_retry)
//!                               ▼                          └── MockReasoningModel
//!                  Ok(text) | Err(CapabilityFailure)
//! ```

pub mod http;
pub mod mock;
pub mod retry;

pub use http::{HttpReasoningModel, ModelProvider};
pub use mock::MockReasoningModel;
pub use retry::{with_retry, AttemptOutcome, RetryConfig};

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;

/// External reasoning-model capability: prompt in, text out.
#[async_trait]
pub trait ReasoningModel: Send + Sync {
    /// Complete a prompt. Errors must be distinguishable from a successful
    /// response that simply reports no findings.
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Human-readable name (used in logs).
    fn name(&self) -> &str;
}

/// Stand-in used when no model can be configured. Every call fails, so the
/// semantic stage degrades to `analysis_error` instead of passing content.
pub struct UnavailableModel {
    reason: String,
}

impl UnavailableModel {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl ReasoningModel for UnavailableModel {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        Err(Error::Model(format!("reasoning model unavailable: {}", self.reason)))
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}

/// Why a guarded capability call produced no usable text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapabilityFailure {
    /// The call did not finish within the budget
    Timeout(Duration),
    /// The capability returned an error
    Failed(String),
    /// The capability answered with nothing
    Empty,
}

impl std::fmt::Display for CapabilityFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout(d) => write!(f, "model call timed out after {}ms", d.as_millis()),
            Self::Failed(msg) => write!(f, "model call failed: {}", msg),
            Self::Empty => write!(f, "model returned an empty response"),
        }
    }
}

/// Call the model with a timeout, converting every failure mode into a
/// [`CapabilityFailure`]. Never retries; retries belong to the model
/// implementation.
pub async fn guarded_complete(
    model: &dyn ReasoningModel,
    prompt: &str,
    timeout: Duration,
) -> std::result::Result<String, CapabilityFailure> {
    let outcome = match tokio::time::timeout(timeout, model.complete(prompt)).await {
        Err(_) => Err(CapabilityFailure::Timeout(timeout)),
        Ok(Err(e)) => Err(CapabilityFailure::Failed(e.to_string())),
        Ok(Ok(text)) if text.trim().is_empty() => Err(CapabilityFailure::Empty),
        Ok(Ok(text)) => Ok(text),
    };

    if let Err(ref failure) = outcome {
        tracing::warn!(model = model.name(), error = %failure, "Reasoning model call degraded");
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_guarded_complete_ok() {
        let model = MockReasoningModel::fixed("hello");
        let out = guarded_complete(&model, "p", Duration::from_secs(1)).await;
        assert_eq!(out, Ok("hello".to_string()));
    }

    #[tokio::test]
    async fn test_guarded_complete_error() {
        let model = MockReasoningModel::failing("auth failed");
        let out = guarded_complete(&model, "p", Duration::from_secs(1)).await;
        match out {
            Err(CapabilityFailure::Failed(msg)) => assert!(msg.contains("auth failed")),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_guarded_complete_empty() {
        let model = MockReasoningModel::fixed("   \n");
        let out = guarded_complete(&model, "p", Duration::from_secs(1)).await;
        assert_eq!(out, Err(CapabilityFailure::Empty));
    }

    #[tokio::test]
    async fn test_guarded_complete_timeout() {
        let model = MockReasoningModel::fixed("late").with_delay(Duration::from_millis(200));
        let out = guarded_complete(&model, "p", Duration::from_millis(10)).await;
        assert_eq!(out, Err(CapabilityFailure::Timeout(Duration::from_millis(10))));
    }

    #[tokio::test]
    async fn test_unavailable_model_fails() {
        let model = UnavailableModel::new("API key not set");
        let out = guarded_complete(&model, "p", Duration::from_secs(1)).await;
        match out {
            Err(CapabilityFailure::Failed(msg)) => assert!(msg.contains("API key not set")),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_failure_display() {
        let f = CapabilityFailure::Failed(Error::Model("503".into()).to_string());
        assert!(f.to_string().contains("503"));
        assert!(CapabilityFailure::Timeout(Duration::from_millis(5))
            .to_string()
            .contains("5ms"));
    }
}
