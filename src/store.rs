//! File/object storage access and key naming conventions.
//!
//! Dataset lists live under `DatasetList-YYYY-MM-DD.json`, one blob per
//! snapshot date; session datasets live under `<CODE>-<session_id>.json`.
//! Both names must be reproduced bit-exactly for compatibility with
//! existing stores.

use crate::error::SyncError;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

/// Prefix shared by all cached dataset list blobs.
pub const DATASET_LIST_PREFIX: &str = "DatasetList-";

/// Key for the dataset list snapshot taken on `date`.
pub fn dataset_list_key(date: NaiveDate) -> String {
    format!("{}{}.json", DATASET_LIST_PREFIX, date.format("%Y-%m-%d"))
}

/// Key for the dataset of `session_id` in the region `code`.
pub fn dataset_key(code: &str, session_id: u64) -> String {
    format!("{}-{}.json", code, session_id)
}

/// Extracts the snapshot date embedded in a dataset list key.
///
/// Returns `None` for keys that do not match the recognized naming
/// pattern; such blobs are ignored during cache resolution.
pub fn dataset_list_date(key: &str) -> Option<NaiveDate> {
    let date = key
        .strip_prefix(DATASET_LIST_PREFIX)?
        .strip_suffix(".json")?;
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

/// A durable key/value text store for manifests and dataset payloads.
///
/// Keys are flat strings; durability is the implementation's concern.
/// All blobs are written whole and never partially updated.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Lists all keys starting with `prefix`, in lexicographic order.
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, SyncError>;

    /// Uploads `content` under `key`, overwriting any existing blob.
    async fn upload(&self, key: &str, content: &str) -> Result<(), SyncError>;

    /// Downloads the blob stored under `key`.
    ///
    /// Fails with [`SyncError::NotFound`] if the key does not exist.
    async fn download(&self, key: &str) -> Result<String, SyncError>;

    /// Short label identifying the storage method, recorded in ledger rows.
    fn method(&self) -> &str;
}

/// Blob store backed by a flat directory on the local filesystem.
pub struct FsStore {
    dir: PathBuf,
}

impl FsStore {
    /// Opens (and creates if needed) the storage directory.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, SyncError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

#[async_trait]
impl BlobStore for FsStore {
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, SyncError> {
        let mut keys = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if let Some(name) = entry.file_name().to_str() {
                if name.starts_with(prefix) {
                    keys.push(name.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }

    async fn upload(&self, key: &str, content: &str) -> Result<(), SyncError> {
        tokio::fs::write(self.path_for(key), content).await?;
        Ok(())
    }

    async fn download(&self, key: &str) -> Result<String, SyncError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(SyncError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn method(&self) -> &str {
        "FILE"
    }
}

/// In-memory blob store, useful for tests and dry runs.
#[derive(Default)]
pub struct MemoryStore {
    blobs: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobStore for MemoryStore {
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, SyncError> {
        let blobs = self.blobs.lock().unwrap();
        Ok(blobs
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn upload(&self, key: &str, content: &str) -> Result<(), SyncError> {
        self.blobs
            .lock()
            .unwrap()
            .insert(key.to_string(), content.to_string());
        Ok(())
    }

    async fn download(&self, key: &str) -> Result<String, SyncError> {
        self.blobs
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| SyncError::NotFound(key.to_string()))
    }

    fn method(&self) -> &str {
        "MEMORY"
    }
}
