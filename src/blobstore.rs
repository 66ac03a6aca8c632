//! Blob storage for raw CSV bytes, addressed by file name.
//!
//! The store is deliberately dumb: it knows nothing about records or
//! industries, only named byte blobs. [`FsBlobStore`] keeps one file per
//! blob in a flat directory; [`MemoryBlobStore`] backs tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use uuid::Uuid;
use walkdir::WalkDir;

use crate::error::{Result, StoreError};

/// Metadata for one stored blob, as reported by [`BlobStore::list`].
#[derive(Debug, Clone)]
pub struct BlobInfo {
    pub name: String,
    pub size_bytes: u64,
    pub modified: DateTime<Utc>,
}

/// Name-addressed storage for raw file bytes.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under `name`, replacing any existing blob.
    async fn put(&self, name: &str, bytes: &[u8]) -> Result<()>;

    /// Fetch a blob's bytes, or `None` if no blob has that name.
    async fn get(&self, name: &str) -> Result<Option<Vec<u8>>>;

    /// Remove a blob. Returns whether a blob existed and was removed.
    async fn delete(&self, name: &str) -> Result<bool>;

    /// Enumerate all stored blobs, sorted by name.
    async fn list(&self) -> Result<Vec<BlobInfo>>;
}

/// Filesystem-backed blob store: a flat directory of CSV files.
///
/// Writes go to a hidden temp file first and are renamed into place, so a
/// concurrent reader never observes a half-written blob and a crash never
/// leaves a partial file under a registered name.
pub struct FsBlobStore {
    root: PathBuf,
    accepted: GlobSet,
}

impl FsBlobStore {
    /// Open (and create if missing) the storage root. `extensions` selects
    /// which files [`BlobStore::list`] reports, e.g. `["csv"]`.
    pub fn open(root: &Path, extensions: &[String]) -> Result<Self> {
        std::fs::create_dir_all(root)?;

        let mut builder = GlobSetBuilder::new();
        for ext in extensions {
            let glob = Glob::new(&format!("*.{}", ext))
                .map_err(|e| StoreError::Storage(e.to_string()))?;
            builder.add(glob);
        }
        let accepted = builder
            .build()
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        Ok(Self {
            root: root.to_path_buf(),
            accepted,
        })
    }

    fn blob_path(&self, name: &str) -> Result<PathBuf> {
        if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            return Err(StoreError::Storage(format!("invalid blob name: '{}'", name)));
        }
        Ok(self.root.join(name))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, name: &str, bytes: &[u8]) -> Result<()> {
        let path = self.blob_path(name)?;
        let tmp = self.root.join(format!(".tmp-{}", Uuid::new_v4()));

        tokio::fs::write(&tmp, bytes).await?;
        if let Err(err) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(err.into());
        }
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Option<Vec<u8>>> {
        let path = self.blob_path(name)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        let path = self.blob_path(name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    async fn list(&self) -> Result<Vec<BlobInfo>> {
        let mut blobs = Vec::new();

        for entry in WalkDir::new(&self.root).max_depth(1) {
            let entry = entry.map_err(|e| StoreError::Storage(e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().to_string();
            // Skip in-flight temp files and anything outside the accepted set.
            if name.starts_with('.') || !self.accepted.is_match(&name) {
                continue;
            }

            let metadata = entry.metadata().map_err(|e| StoreError::Storage(e.to_string()))?;
            let modified_secs = metadata
                .modified()
                .unwrap_or(std::time::SystemTime::UNIX_EPOCH)
                .duration_since(std::time::SystemTime::UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs() as i64;

            blobs.push(BlobInfo {
                name,
                size_bytes: metadata.len(),
                modified: DateTime::from_timestamp(modified_secs, 0).unwrap_or_default(),
            });
        }

        blobs.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(blobs)
    }
}

/// In-memory blob store for tests.
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, (Vec<u8>, DateTime<Utc>)>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, name: &str, bytes: &[u8]) -> Result<()> {
        let mut blobs = self.blobs.write().unwrap();
        blobs.insert(name.to_string(), (bytes.to_vec(), Utc::now()));
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Option<Vec<u8>>> {
        let blobs = self.blobs.read().unwrap();
        Ok(blobs.get(name).map(|(bytes, _)| bytes.clone()))
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        let mut blobs = self.blobs.write().unwrap();
        Ok(blobs.remove(name).is_some())
    }

    async fn list(&self) -> Result<Vec<BlobInfo>> {
        let blobs = self.blobs.read().unwrap();
        let mut infos: Vec<BlobInfo> = blobs
            .iter()
            .map(|(name, (bytes, modified))| BlobInfo {
                name: name.clone(),
                size_bytes: bytes.len() as u64,
                modified: *modified,
            })
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(infos)
    }
}
