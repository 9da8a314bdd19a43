//! Compliance audit trail
//!
//! One immutable [`AuditRecord`] is written per compliance check, whatever
//! the outcome. Records hold a hash of the checked text, never the text
//! itself.
//!
//! ```text
//! ComplianceEngine::check ─► AuditWriter::record ─┬─► AuditLog        (bounded, in memory, status window)
//!                                                 └─► JsonlAuditStore (append-only file, rotated)
//! ```

pub mod log;
pub mod persistence;
pub mod writer;

pub use log::{AuditLog, WindowStats};
pub use persistence::{JsonlAuditStore, PersistenceConfig};
pub use writer::AuditWriter;

use crate::compliance::{ComplianceResult, ContentType, Violation};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A single compliance decision as persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    /// Unique record ID
    pub id: String,
    /// Milliseconds since epoch
    pub timestamp: i64,
    /// SHA-256 hex digest of the checked text
    pub content_hash: String,
    /// Byte length of the checked text
    pub content_length: usize,
    pub content_type: ContentType,
    pub is_compliant: bool,
    pub violation_count: usize,
    pub violations: Vec<Violation>,
    pub confidence_score: f64,
    pub requires_attorney_review: bool,
    /// Enforcement mode in effect for the check
    pub compliance_mode: String,
    /// Sanitization level in effect for the check
    pub compliance_level: String,
}

impl AuditRecord {
    pub fn from_check(
        text: &str,
        content_type: ContentType,
        result: &ComplianceResult,
        compliance_mode: &str,
        compliance_level: &str,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            content_hash: content_hash(text),
            content_length: text.len(),
            content_type,
            is_compliant: result.is_compliant,
            violation_count: result.violations.len(),
            violations: result.violations.clone(),
            confidence_score: result.confidence_score,
            requires_attorney_review: result.requires_attorney_review,
            compliance_mode: compliance_mode.to_string(),
            compliance_level: compliance_level.to_string(),
        }
    }
}

/// SHA-256 hex digest of `text`.
pub fn content_hash(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

/// Append-only sink for audit records.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Append one record.
    async fn append(&self, record: &AuditRecord) -> Result<()>;

    /// Store name (used in logs).
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_from_check() {
        let result = ComplianceResult::fail_closed("boom");
        let record = AuditRecord::from_check(
            "some text",
            ContentType::Contract,
            &result,
            "enforced",
            "comprehensive",
        );
        assert!(!record.is_compliant);
        assert_eq!(record.violation_count, 1);
        assert_eq!(record.content_length, 9);
        assert_eq!(record.content_hash.len(), 64);
        assert_eq!(record.compliance_mode, "enforced");
        assert!(uuid::Uuid::parse_str(&record.id).is_ok());
    }

    #[test]
    fn test_content_hash_is_stable() {
        assert_eq!(
            content_hash("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_ne!(content_hash("abc"), content_hash("abd"));
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let record = AuditRecord::from_check(
            "x",
            ContentType::General,
            &ComplianceResult::pass_through(false),
            "disabled",
            "moderate",
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["contentType"], "general");
        assert_eq!(json["isCompliant"], true);
        assert_eq!(json["complianceLevel"], "moderate");
        assert!(json.get("text").is_none());
    }
}
