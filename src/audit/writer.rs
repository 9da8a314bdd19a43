//! Fan-out audit writer
//!
//! Appends each record to every configured store. A failing store is
//! reported through `tracing::error!` and never reaches the caller: the
//! compliance decision has already been made by the time it is audited.

use super::{AuditRecord, AuditStore};
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct AuditWriter {
    stores: Vec<Arc<dyn AuditStore>>,
}

impl AuditWriter {
    pub fn new(stores: Vec<Arc<dyn AuditStore>>) -> Self {
        Self { stores }
    }

    pub fn with_store(mut self, store: Arc<dyn AuditStore>) -> Self {
        self.stores.push(store);
        self
    }

    /// Append `record` to every store. Never fails.
    pub async fn record(&self, record: &AuditRecord) {
        for store in &self.stores {
            if let Err(e) = store.append(record).await {
                tracing::error!(
                    store = store.name(),
                    record_id = %record.id,
                    error = %e,
                    "Failed to write compliance audit record"
                );
            }
        }
    }

    pub fn store_count(&self) -> usize {
        self.stores.len()
    }
}

impl std::fmt::Debug for AuditWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditWriter")
            .field("stores", &self.stores.iter().map(|s| s.name()).collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditLog;
    use crate::compliance::{ComplianceResult, ContentType};
    use crate::error::{Error, Result};
    use async_trait::async_trait;

    struct BrokenStore;

    #[async_trait]
    impl AuditStore for BrokenStore {
        async fn append(&self, _record: &AuditRecord) -> Result<()> {
            Err(Error::Audit("disk full".to_string()))
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    #[tokio::test]
    async fn test_failing_store_does_not_block_others() {
        let log = Arc::new(AuditLog::new(10));
        let writer = AuditWriter::default()
            .with_store(Arc::new(BrokenStore))
            .with_store(log.clone());
        let record = AuditRecord::from_check(
            "text",
            ContentType::General,
            &ComplianceResult::maintenance(),
            "enforced",
            "comprehensive",
        );
        writer.record(&record).await;
        assert_eq!(log.len().await, 1);
        assert_eq!(writer.store_count(), 2);
    }
}
