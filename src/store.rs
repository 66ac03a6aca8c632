//! Upload/delete orchestration over the blob store and the registry.
//!
//! [`LeadStore`] is the single writer seam: it validates uploads, keeps the
//! registry and the blob store consistent (a file is either fully stored and
//! registered, or neither), and repairs divergence via [`LeadStore::reconcile`].
//!
//! Operations on the same file name are serialized through a per-name async
//! mutex; operations on unrelated names never block each other. Blob I/O is
//! bounded by the configured upload timeout, after which the operation fails
//! with a retryable storage error.

use chrono::Utc;
use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{info, warn};

use crate::blobstore::BlobStore;
use crate::classify::classify;
use crate::config::{Config, UploadConfig};
use crate::count::count_records;
use crate::error::{Result, StoreError};
use crate::models::{Aggregate, FileRecord};
use crate::registry::{ListFilter, Registry};

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Valid blobs that had no registry entry and were registered.
    pub adopted: u64,
    /// Registry entries whose blob was missing; removed.
    pub dangling_removed: u64,
    /// Unparseable blobs with no registry entry; deleted.
    pub orphans_deleted: u64,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.dangling_removed == 0 && self.orphans_deleted == 0
    }
}

/// The file inventory: registry + blob store + per-name write serialization.
pub struct LeadStore {
    registry: Registry,
    blobs: Arc<dyn BlobStore>,
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
    upload_cfg: UploadConfig,
}

impl LeadStore {
    /// Build an unseeded store over any [`BlobStore`]. The registry starts
    /// empty; run [`LeadStore::reconcile`] to seed it.
    pub fn new(blobs: Arc<dyn BlobStore>, upload_cfg: UploadConfig) -> Self {
        Self {
            registry: Registry::new(),
            blobs,
            locks: Mutex::new(HashMap::new()),
            upload_cfg,
        }
    }

    /// Open the store against the configured filesystem root and seed the
    /// registry with a reconciliation scan of the blobs found there.
    pub async fn open(config: &Config) -> Result<Self> {
        let blobs = crate::blobstore::FsBlobStore::open(
            &config.storage.root,
            &config.upload.allowed_extensions,
        )?;
        let store = Self::new(Arc::new(blobs), config.upload.clone());
        let report = store.reconcile().await?;
        if !report.is_clean() {
            warn!(
                dangling = report.dangling_removed,
                orphans = report.orphans_deleted,
                "repaired registry/storage divergence at startup"
            );
        }
        Ok(store)
    }

    /// Validate, store, count, classify, and register one uploaded file.
    ///
    /// On unparseable content the just-written blob is deleted again, so a
    /// failed upload leaves no registry entry and no blob.
    pub async fn upload(&self, name: &str, bytes: &[u8]) -> Result<FileRecord> {
        self.validate_name(name)?;

        if bytes.len() as u64 > self.upload_cfg.max_bytes {
            return Err(StoreError::Validation(format!(
                "'{}' exceeds the maximum upload size of {} bytes",
                name, self.upload_cfg.max_bytes
            )));
        }

        let lock = self.lock_for(name);
        let _guard = lock.lock().await;

        self.bounded(self.blobs.put(name, bytes)).await?;

        let summary = count_records(bytes);
        if !summary.valid {
            // Roll the blob back; the upload must leave no partial state.
            let _ = self.bounded(self.blobs.delete(name)).await;
            return Err(StoreError::Validation(format!(
                "'{}' could not be parsed as CSV",
                name
            )));
        }

        let record = FileRecord {
            name: name.to_string(),
            size_bytes: bytes.len() as u64,
            record_count: summary.records,
            industry: classify(name),
            uploaded_at: Utc::now(),
        };
        self.registry.upsert(record.clone());

        info!(
            name = %record.name,
            records = record.record_count,
            industry = ?record.industry,
            "registered upload"
        );
        Ok(record)
    }

    /// Remove a file from the registry and the blob store.
    ///
    /// The registry entry goes first, so a partial failure never leaves an
    /// entry pointing at a missing blob. A blob-delete failure is retried
    /// once; if it still fails the blob stays behind as an orphan for the
    /// next reconciliation pass and the error is reported as retryable.
    pub async fn delete(&self, name: &str) -> Result<()> {
        let lock = self.lock_for(name);
        let _guard = lock.lock().await;

        if !self.registry.remove(name) {
            return Err(StoreError::NotFound(format!("no such file: '{}'", name)));
        }

        match self.bounded(self.blobs.delete(name)).await {
            Ok(_) => {}
            Err(first) => {
                warn!(name, error = %first, "blob delete failed, retrying");
                if let Err(err) = self.bounded(self.blobs.delete(name)).await {
                    warn!(name, error = %err, "blob delete failed twice; orphan left for reconciliation");
                    return Err(err);
                }
            }
        }

        info!(name, "deleted file");
        Ok(())
    }

    /// Fetch a file's bytes. The registry is the authoritative existence
    /// check: an unregistered name is not found regardless of blob presence.
    pub async fn download(&self, name: &str) -> Result<Vec<u8>> {
        if !self.registry.contains(name) {
            return Err(StoreError::NotFound(format!("no such file: '{}'", name)));
        }

        match self.bounded(self.blobs.get(name)).await? {
            Some(bytes) => Ok(bytes),
            None => {
                warn!(name, "registered file has no backing blob");
                Err(StoreError::Consistency(format!(
                    "stored data for '{}' is missing; run reconcile",
                    name
                )))
            }
        }
    }

    /// Diff the blob store against the registry in both directions and
    /// repair: adopt valid unregistered blobs, delete unparseable ones, and
    /// drop registry entries whose blob is gone.
    pub async fn reconcile(&self) -> Result<ReconcileReport> {
        let mut report = ReconcileReport::default();

        let blobs = self.blobs.list().await?;
        let blob_names: Vec<&str> = blobs.iter().map(|b| b.name.as_str()).collect();

        for record in self.registry.snapshot() {
            if !blob_names.contains(&record.name.as_str()) {
                let lock = self.lock_for(&record.name);
                let _guard = lock.lock().await;
                if self.registry.remove(&record.name) {
                    warn!(name = %record.name, "removed registry entry with no backing blob");
                    report.dangling_removed += 1;
                }
            }
        }

        for blob in &blobs {
            if self.registry.contains(&blob.name) {
                continue;
            }
            let lock = self.lock_for(&blob.name);
            let _guard = lock.lock().await;
            if self.registry.contains(&blob.name) {
                continue; // registered while we waited for the lock
            }

            let Some(bytes) = self.blobs.get(&blob.name).await? else {
                continue; // deleted while we waited for the lock
            };

            let summary = count_records(&bytes);
            if summary.valid {
                self.registry.upsert(FileRecord {
                    name: blob.name.clone(),
                    size_bytes: blob.size_bytes,
                    record_count: summary.records,
                    industry: classify(&blob.name),
                    uploaded_at: blob.modified,
                });
                report.adopted += 1;
            } else {
                warn!(name = %blob.name, "deleting unparseable orphan blob");
                self.blobs.delete(&blob.name).await?;
                report.orphans_deleted += 1;
            }
        }

        Ok(report)
    }

    pub fn list(&self, filter: &ListFilter) -> Vec<FileRecord> {
        self.registry.list(filter)
    }

    pub fn aggregate(&self) -> Aggregate {
        self.registry.aggregate()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    fn validate_name(&self, name: &str) -> Result<()> {
        if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            return Err(StoreError::Validation(format!(
                "invalid file name: '{}'",
                name
            )));
        }

        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);
        let accepted = match ext {
            Some(ref ext) => self
                .upload_cfg
                .allowed_extensions
                .iter()
                .any(|a| a.eq_ignore_ascii_case(ext)),
            None => false,
        };
        if !accepted {
            return Err(StoreError::Validation(format!(
                "only .{} files are accepted",
                self.upload_cfg.allowed_extensions.join("/.")
            )));
        }
        Ok(())
    }

    fn lock_for(&self, name: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap();
        locks
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    async fn bounded<T>(&self, op: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(Duration::from_secs(self.upload_cfg.timeout_secs), op).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Storage("operation timed out".to_string())),
        }
    }
}
