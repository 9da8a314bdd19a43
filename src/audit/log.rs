//! Bounded in-memory audit log
//!
//! Keeps the most recent records for status queries. Oldest records are
//! evicted once capacity is reached; the total count keeps growing.

use super::{AuditRecord, AuditStore};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tokio::sync::RwLock;

/// Aggregate counts over a time window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowStats {
    /// Checks recorded in the window
    pub checks: u64,
    /// Sum of violation counts over those checks
    pub violations: u64,
    /// Checks that ended compliant
    pub compliant: u64,
}

impl WindowStats {
    /// Fraction of compliant checks, 1.0 for an empty window.
    pub fn compliance_rate(&self) -> f64 {
        if self.checks == 0 {
            1.0
        } else {
            self.compliant as f64 / self.checks as f64
        }
    }
}

#[derive(Debug)]
struct Inner {
    records: VecDeque<AuditRecord>,
    total_count: u64,
}

/// In-memory audit log with bounded capacity
#[derive(Debug)]
pub struct AuditLog {
    inner: RwLock<Inner>,
    capacity: usize,
}

impl AuditLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: RwLock::new(Inner {
                records: VecDeque::with_capacity(capacity.min(1024)),
                total_count: 0,
            }),
            capacity,
        }
    }

    /// Record an audit entry, evicting the oldest when full
    pub async fn push(&self, record: AuditRecord) {
        let mut inner = self.inner.write().await;
        if inner.records.len() >= self.capacity {
            inner.records.pop_front();
        }
        inner.records.push_back(record);
        inner.total_count += 1;
    }

    /// Get recent records (newest first)
    pub async fn recent(&self, limit: usize) -> Vec<AuditRecord> {
        let inner = self.inner.read().await;
        inner.records.iter().rev().take(limit).cloned().collect()
    }

    /// Counts for records at or after `since`
    pub async fn window_stats(&self, since: DateTime<Utc>) -> WindowStats {
        let since_ms = since.timestamp_millis();
        let inner = self.inner.read().await;
        inner
            .records
            .iter()
            .filter(|r| r.timestamp >= since_ms)
            .fold(WindowStats::default(), |mut stats, r| {
                stats.checks += 1;
                stats.violations += r.violation_count as u64;
                if r.is_compliant {
                    stats.compliant += 1;
                }
                stats
            })
    }

    /// Total number of records ever written
    pub async fn total_count(&self) -> u64 {
        self.inner.read().await.total_count
    }

    /// Number of records currently held
    pub async fn len(&self) -> usize {
        self.inner.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.records.is_empty()
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new(10_000)
    }
}

#[async_trait]
impl AuditStore for AuditLog {
    async fn append(&self, record: &AuditRecord) -> Result<()> {
        self.push(record.clone()).await;
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compliance::{ComplianceResult, ContentType};

    fn record(compliant: bool) -> AuditRecord {
        let result = if compliant {
            ComplianceResult::pass_through(false)
        } else {
            ComplianceResult::fail_closed("x")
        };
        AuditRecord::from_check("t", ContentType::General, &result, "enforced", "moderate")
    }

    #[tokio::test]
    async fn test_bounded_capacity() {
        let log = AuditLog::new(3);
        for _ in 0..5 {
            log.push(record(true)).await;
        }
        assert_eq!(log.len().await, 3);
        assert_eq!(log.total_count().await, 5);
    }

    #[tokio::test]
    async fn test_recent_newest_first() {
        let log = AuditLog::new(10);
        let first = record(true);
        let second = record(false);
        log.push(first.clone()).await;
        log.push(second.clone()).await;
        let recent = log.recent(1).await;
        assert_eq!(recent, vec![second]);
        assert_eq!(log.recent(10).await.len(), 2);
    }

    #[tokio::test]
    async fn test_window_stats() {
        let log = AuditLog::new(10);
        let mut old = record(false);
        old.timestamp -= 48 * 3_600_000;
        log.push(old).await;
        log.push(record(true)).await;
        log.push(record(false)).await;

        let stats = log
            .window_stats(Utc::now() - chrono::Duration::hours(24))
            .await;
        assert_eq!(stats.checks, 2);
        assert_eq!(stats.compliant, 1);
        assert_eq!(stats.violations, 1);
        assert_eq!(stats.compliance_rate(), 0.5);
    }

    #[tokio::test]
    async fn test_empty_window_rate() {
        let log = AuditLog::default();
        let stats = log.window_stats(Utc::now()).await;
        assert_eq!(stats, WindowStats::default());
        assert_eq!(stats.compliance_rate(), 1.0);
        assert!(log.is_empty().await);
    }

    #[tokio::test]
    async fn test_append_through_store_trait() {
        let log = AuditLog::new(2);
        let store: &dyn AuditStore = &log;
        store.append(&record(true)).await.unwrap();
        assert_eq!(log.len().await, 1);
        assert_eq!(store.name(), "memory");
    }
}
