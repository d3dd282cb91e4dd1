//! Persistent key-value storage areas.
//!
//! A storage area is shared by every context, so each `set` replaces a
//! record atomically: readers see either the old value or the new one.
//!
//! The file backend keeps one JSON document per key:
//!   Linux:   ~/.config/snapdropper/<key>.json
//!   macOS:   ~/Library/Application Support/snapdropper/<key>.json
//!   Windows: %APPDATA%/snapdropper/<key>.json

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::StorageError;

/// Storage quota of the extension's local area, in bytes.
pub const DEFAULT_QUOTA_BYTES: u64 = 5_000_000;

#[async_trait]
pub trait StorageArea: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError>;

    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError>;

    async fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Total bytes this area may hold.
    fn quota_bytes(&self) -> u64;
}

/// A single record may not exceed the area's quota.
fn check_quota(needed: u64, quota: u64) -> Result<(), StorageError> {
    if needed > quota {
        return Err(StorageError::QuotaExceeded { needed, quota });
    }
    Ok(())
}

/// In-memory area, used by tests and ephemeral embeddings.
pub struct MemoryStorage {
    records: RwLock<HashMap<String, Value>>,
    quota: u64,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::with_quota(DEFAULT_QUOTA_BYTES)
    }

    pub fn with_quota(quota: u64) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            quota,
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageArea for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.records.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec(&value).map_err(|e| StorageError::Io(e.to_string()))?;
        check_quota(bytes.len() as u64, self.quota)?;

        self.records.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.records.write().await.remove(key);
        Ok(())
    }

    fn quota_bytes(&self) -> u64 {
        self.quota
    }
}

/// Directory-backed area. Writes go to `<key>.json.partial` first and are
/// renamed into place.
pub struct FileStorage {
    dir: PathBuf,
    quota: u64,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>, quota: u64) -> Self {
        Self {
            dir: dir.into(),
            quota,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

#[async_trait]
impl StorageArea for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let path = self.path_for(key)?;
        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::Io(e.to_string())),
        };

        serde_json::from_slice(&raw)
            .map(Some)
            .map_err(|e| StorageError::Corrupt {
                key: key.to_string(),
                reason: e.to_string(),
            })
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let bytes = serde_json::to_vec(&value).map_err(|e| StorageError::Io(e.to_string()))?;

        check_quota(bytes.len() as u64, self.quota)?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| StorageError::Io(format!("Failed to create storage dir: {}", e)))?;

        let partial = self.dir.join(format!("{}.json.partial", key));
        tokio::fs::write(&partial, &bytes)
            .await
            .map_err(|e| StorageError::Io(format!("Failed to write {}: {}", key, e)))?;
        tokio::fs::rename(&partial, &path)
            .await
            .map_err(|e| StorageError::Io(format!("Failed to finalize {}: {}", key, e)))?;

        log::debug!("[STORE] Wrote {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e.to_string())),
        }
    }

    fn quota_bytes(&self) -> u64 {
        self.quota
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn file_storage_round_trips_values() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("area"), DEFAULT_QUOTA_BYTES);

        assert_eq!(storage.get("settings").await.unwrap(), None);
        storage.set("settings", json!({ "autoSave": true })).await.unwrap();
        assert_eq!(
            storage.get("settings").await.unwrap(),
            Some(json!({ "autoSave": true }))
        );
        assert!(!dir.path().join("area/settings.json.partial").exists());

        storage.remove("settings").await.unwrap();
        storage.remove("settings").await.unwrap();
        assert_eq!(storage.get("settings").await.unwrap(), None);
    }

    #[tokio::test]
    async fn file_storage_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path(), DEFAULT_QUOTA_BYTES);
        let result = storage.set("../escape", json!(1)).await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn oversized_write_keeps_previous_value() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path(), 64);
        storage.set("screenshots", json!(["small"])).await.unwrap();

        let big = json!(["x".repeat(100)]);
        let result = storage.set("screenshots", big).await;
        assert!(matches!(result, Err(StorageError::QuotaExceeded { .. })));
        assert_eq!(storage.get("screenshots").await.unwrap(), Some(json!(["small"])));
    }

    #[tokio::test]
    async fn memory_storage_enforces_quota() {
        let storage = MemoryStorage::with_quota(64);
        storage.set("screenshots", json!(["small"])).await.unwrap();

        let result = storage.set("screenshots", json!(["x".repeat(100)])).await;
        assert!(matches!(
            result,
            Err(StorageError::QuotaExceeded { quota: 64, .. })
        ));
        assert_eq!(storage.get("screenshots").await.unwrap(), Some(json!(["small"])));
    }

    #[tokio::test]
    async fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("settings.json"), b"{not json").unwrap();
        let storage = FileStorage::new(dir.path(), DEFAULT_QUOTA_BYTES);
        assert!(matches!(
            storage.get("settings").await,
            Err(StorageError::Corrupt { .. })
        ));
    }
}
