//! Bounded retry for reasoning-model HTTP calls
//!
//! Transient statuses (429, 500, 502, 503 and Anthropic's 529 by default)
//! are retried with exponential backoff. A `Retry-After` header from the
//! server replaces the computed backoff. Every call carries a time budget
//! that fits inside the caller's model-call timeout; a retry whose wait
//! would overrun it is not attempted and the last failure is returned.

use crate::error::{Error, Result};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

/// Retry policy at the HTTP boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt (0 = single attempt)
    pub max_retries: u32,
    /// First backoff step in milliseconds
    pub base_delay_ms: u64,
    /// Ceiling for a computed backoff step
    pub max_delay_ms: u64,
    /// Wall-clock budget for all attempts of one call, including waits
    pub budget_ms: u64,
    /// HTTP status codes that trigger a retry
    pub retryable_status_codes: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay_ms: 500,
            max_delay_ms: 8_000,
            budget_ms: 15_000,
            retryable_status_codes: vec![429, 500, 502, 503, 529],
        }
    }
}

impl RetryConfig {
    /// Single attempt, no waiting
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    pub fn is_retryable_status(&self, status: StatusCode) -> bool {
        self.retryable_status_codes.contains(&status.as_u16())
    }

    pub fn budget(&self) -> Duration {
        Duration::from_millis(self.budget_ms)
    }

    /// `base * 2^attempt`, capped at `max_delay_ms`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        Duration::from_millis(
            self.base_delay_ms
                .saturating_mul(factor)
                .min(self.max_delay_ms),
        )
    }

    /// Wait before retrying after failed attempt `attempt`. A server hint is
    /// taken as-is; the budget check decides whether it is affordable.
    pub fn next_delay(&self, attempt: u32, server_hint: Option<Duration>) -> Duration {
        server_hint.unwrap_or_else(|| self.backoff(attempt))
    }
}

/// Read a `Retry-After` header given as delta-seconds or as an HTTP date.
/// Dates in the past mean "retry now".
pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    let at = chrono::DateTime::parse_from_rfc2822(value).ok()?;
    let wait = at.with_timezone(&chrono::Utc) - chrono::Utc::now();
    Some(wait.to_std().unwrap_or(Duration::ZERO))
}

/// Outcome of a single attempt, used by the retry loop
#[derive(Debug)]
pub enum AttemptOutcome<T> {
    Success(T),
    /// Failed with a retryable status
    Retryable {
        status: StatusCode,
        body: String,
        retry_after: Option<Duration>,
    },
    /// Failed in a way retrying cannot fix
    Fatal(Error),
}

/// Why the loop stopped retrying
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GiveUp {
    RetriesExhausted,
    BudgetExhausted,
}

impl GiveUp {
    fn as_str(&self) -> &'static str {
        match self {
            Self::RetriesExhausted => "retries exhausted",
            Self::BudgetExhausted => "retry budget exhausted",
        }
    }
}

/// Run `operation` until it succeeds, fails fatally, or the retry count or
/// time budget runs out. `operation` receives the 0-based attempt number.
pub async fn with_retry<T, F, Fut>(config: &RetryConfig, operation: F) -> Result<T>
where
    F: Fn(u32) -> Fut,
    Fut: std::future::Future<Output = AttemptOutcome<T>>,
{
    let started = Instant::now();
    let mut statuses: Vec<u16> = Vec::new();
    let mut attempt = 0;

    loop {
        let (status, body, hint) = match operation(attempt).await {
            AttemptOutcome::Success(value) => {
                if attempt > 0 {
                    tracing::info!(attempts = attempt + 1, "Model request recovered after transient failures");
                }
                return Ok(value);
            }
            AttemptOutcome::Fatal(err) => return Err(err),
            AttemptOutcome::Retryable {
                status,
                body,
                retry_after,
            } => (status, body, retry_after),
        };
        statuses.push(status.as_u16());

        let delay = config.next_delay(attempt, hint);
        let give_up = if attempt >= config.max_retries {
            Some(GiveUp::RetriesExhausted)
        } else if started.elapsed() + delay > config.budget() {
            Some(GiveUp::BudgetExhausted)
        } else {
            None
        };

        if let Some(reason) = give_up {
            tracing::warn!(
                status = status.as_u16(),
                attempts = statuses.len(),
                reason = reason.as_str(),
                "Model request abandoned"
            );
            return Err(Error::Model(format!(
                "{} after {} attempt(s), statuses {:?}: {}",
                reason.as_str(),
                statuses.len(),
                statuses,
                body
            )));
        }

        tracing::warn!(
            status = status.as_u16(),
            attempt = attempt + 1,
            delay_ms = delay.as_millis() as u64,
            server_hint = hint.is_some(),
            "Transient model failure, retrying"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
