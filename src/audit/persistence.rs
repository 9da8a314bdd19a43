//! JSONL-based audit record persistence with file rotation.
//!
//! Appends records to `records.jsonl`. When the file exceeds
//! `max_file_bytes` it is renamed with a timestamp suffix and a fresh file is
//! started. Old rotated files are pruned to keep at most `max_rotated_files`.

use super::{AuditRecord, AuditStore};
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;

const ACTIVE_FILE: &str = "records.jsonl";
const ROTATED_PREFIX: &str = "records-";

/// Configuration for audit persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Whether persistence is enabled.
    pub enabled: bool,
    /// Directory for audit files, relative to the working directory.
    pub dir: String,
    /// Maximum size of the active JSONL file before rotation (bytes).
    pub max_file_bytes: u64,
    /// Maximum number of rotated files to keep.
    pub max_rotated_files: usize,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: "audit".to_string(),
            max_file_bytes: 10 * 1024 * 1024, // 10 MB
            max_rotated_files: 5,
        }
    }
}

/// Append-only JSONL audit store.
pub struct JsonlAuditStore {
    dir: PathBuf,
    active_path: PathBuf,
    config: PersistenceConfig,
    /// Serializes rotate-then-append so concurrent checks never interleave lines.
    write_lock: Mutex<()>,
}

impl JsonlAuditStore {
    /// Create the store, ensuring `base_dir/config.dir` exists.
    pub async fn new(base_dir: &Path, config: PersistenceConfig) -> Result<Self> {
        let dir = base_dir.join(&config.dir);
        fs::create_dir_all(&dir).await.map_err(|e| {
            Error::Audit(format!(
                "Failed to create audit directory {}: {}",
                dir.display(),
                e
            ))
        })?;
        let active_path = dir.join(ACTIVE_FILE);
        Ok(Self {
            dir,
            active_path,
            config,
            write_lock: Mutex::new(()),
        })
    }

    /// Load all records from the active file.
    pub async fn load_all(&self) -> Vec<AuditRecord> {
        load_from_file(&self.active_path).await
    }

    /// Load the most recent `limit` records from the active file, oldest first.
    pub async fn load_recent(&self, limit: usize) -> Vec<AuditRecord> {
        let all = self.load_all().await;
        if all.len() <= limit {
            all
        } else {
            all[all.len() - limit..].to_vec()
        }
    }

    pub fn active_path(&self) -> &Path {
        &self.active_path
    }

    async fn maybe_rotate(&self) -> Result<()> {
        let meta = match fs::metadata(&self.active_path).await {
            Ok(m) => m,
            Err(_) => return Ok(()), // file doesn't exist yet
        };
        if meta.len() < self.config.max_file_bytes {
            return Ok(());
        }

        let ts = chrono::Utc::now().format("%Y%m%dT%H%M%S%.6f").to_string();
        let mut rotated = self.dir.join(format!("{}{}.jsonl", ROTATED_PREFIX, ts));
        let mut counter = 1u32;
        while fs::try_exists(&rotated).await.unwrap_or(false) {
            rotated = self
                .dir
                .join(format!("{}{}-{}.jsonl", ROTATED_PREFIX, ts, counter));
            counter += 1;
        }
        fs::rename(&self.active_path, &rotated)
            .await
            .map_err(|e| Error::Audit(format!("Failed to rotate audit file: {}", e)))?;
        tracing::debug!("Rotated audit file to {}", rotated.display());

        self.prune_rotated().await
    }

    /// Delete the oldest rotated files beyond `max_rotated_files`.
    async fn prune_rotated(&self) -> Result<()> {
        let mut rotated = self.rotated_files().await?;
        while rotated.len() > self.config.max_rotated_files {
            let oldest = rotated.remove(0);
            if let Err(e) = fs::remove_file(&oldest).await {
                tracing::warn!("Failed to prune audit file {}: {}", oldest.display(), e);
            }
        }
        Ok(())
    }

    /// Rotated files, oldest first.
    pub async fn rotated_files(&self) -> Result<Vec<PathBuf>> {
        let mut rotated = Vec::new();
        let mut entries = fs::read_dir(&self.dir)
            .await
            .map_err(|e| Error::Audit(format!("Failed to read audit dir: {}", e)))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Error::Audit(format!("Failed to read dir entry: {}", e)))?
        {
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with(ROTATED_PREFIX) && name.ends_with(".jsonl") {
                rotated.push(entry.path());
            }
        }
        rotated.sort();
        Ok(rotated)
    }
}

#[async_trait]
impl AuditStore for JsonlAuditStore {
    async fn append(&self, record: &AuditRecord) -> Result<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        self.maybe_rotate().await?;

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.active_path)
            .await
            .map_err(|e| {
                Error::Audit(format!(
                    "Failed to open audit file {}: {}",
                    self.active_path.display(),
                    e
                ))
            })?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| Error::Audit(format!("Failed to write audit record: {}", e)))?;
        file.flush()
            .await
            .map_err(|e| Error::Audit(format!("Failed to flush audit record: {}", e)))?;
        Ok(())
    }

    fn name(&self) -> &str {
        "jsonl"
    }
}

/// Read records from a single JSONL file, skipping unparseable lines.
async fn load_from_file(path: &Path) -> Vec<AuditRecord> {
    let file = match fs::File::open(path).await {
        Ok(f) => f,
        Err(_) => return Vec::new(),
    };
    let mut lines = BufReader::new(file).lines();
    let mut records = Vec::new();
    while let Ok(Some(line)) = lines.next_line().await {
        if let Ok(record) = serde_json::from_str::<AuditRecord>(&line) {
            records.push(record);
        }
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compliance::{ComplianceResult, ContentType};

    fn record(text: &str) -> AuditRecord {
        AuditRecord::from_check(
            text,
            ContentType::LegalQa,
            &ComplianceResult::fail_closed("test"),
            "enforced",
            "comprehensive",
        )
    }

    #[tokio::test]
    async fn test_append_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlAuditStore::new(dir.path(), PersistenceConfig::default())
            .await
            .unwrap();
        store.append(&record("a")).await.unwrap();
        store.append(&record("b")).await.unwrap();

        let loaded = store.load_all().await;
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].content_hash, crate::audit::content_hash("a"));
        assert_eq!(store.load_recent(1).await[0].content_hash, crate::audit::content_hash("b"));
    }

    #[tokio::test]
    async fn test_skips_corrupt_lines() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlAuditStore::new(dir.path(), PersistenceConfig::default())
            .await
            .unwrap();
        store.append(&record("a")).await.unwrap();
        let mut file = fs::OpenOptions::new()
            .append(true)
            .open(store.active_path())
            .await
            .unwrap();
        file.write_all(b"{not json\n").await.unwrap();
        store.append(&record("b")).await.unwrap();
        assert_eq!(store.load_all().await.len(), 2);
    }

    #[tokio::test]
    async fn test_rotation_and_pruning() {
        let dir = tempfile::tempdir().unwrap();
        let config = PersistenceConfig {
            enabled: true,
            dir: "audit".to_string(),
            max_file_bytes: 1,
            max_rotated_files: 2,
        };
        let store = JsonlAuditStore::new(dir.path(), config).await.unwrap();
        for i in 0..5 {
            store.append(&record(&i.to_string())).await.unwrap();
        }
        // Every append after the first rotates the previous single-record file.
        assert_eq!(store.load_all().await.len(), 1);
        assert_eq!(store.rotated_files().await.unwrap().len(), 2);
    }
}
