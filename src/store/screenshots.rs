//! Screenshot collection — newest first, bounded by the `maxImages` setting.

use std::sync::Arc;

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde_json::Value;
use tokio::sync::Mutex;

use super::{SettingsStore, StorageArea};
use crate::error::SnapError;
use crate::model::{now_millis, CaptureType, Screenshot, ScreenshotInput};

pub const SCREENSHOTS_KEY: &str = "screenshots";

/// Rough size of one stored screenshot, used to estimate capacity.
pub const AVERAGE_SCREENSHOT_BYTES: u64 = 100_000;

pub(crate) const MIN_CAPACITY: usize = 10;
const MAX_CAPACITY: usize = 100;

/// How many screenshots a storage quota can be expected to hold.
///
/// An estimate only: real captures vary widely in size.
pub fn calculate_max_capacity(quota_bytes: u64) -> usize {
    let estimate = (quota_bytes / AVERAGE_SCREENSHOT_BYTES).min(MAX_CAPACITY as u64) as usize;
    estimate.clamp(MIN_CAPACITY, MAX_CAPACITY)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    pub capture_type: Option<CaptureType>,
    pub limit: Option<usize>,
}

pub struct ScreenshotStore {
    storage: Arc<dyn StorageArea>,
    settings: Arc<SettingsStore>,
    write_lock: Mutex<()>,
}

impl ScreenshotStore {
    pub fn new(storage: Arc<dyn StorageArea>, settings: Arc<SettingsStore>) -> Self {
        Self {
            storage,
            settings,
            write_lock: Mutex::new(()),
        }
    }

    pub fn calculate_max_capacity(&self) -> usize {
        calculate_max_capacity(self.storage.quota_bytes())
    }

    async fn load(&self) -> Result<Vec<Screenshot>, SnapError> {
        match self.storage.get(SCREENSHOTS_KEY).await? {
            None => Ok(Vec::new()),
            Some(value) => serde_json::from_value(value)
                .map_err(|e| SnapError::Storage(format!("Screenshot collection is corrupt: {}", e))),
        }
    }

    async fn persist(&self, screenshots: &[Screenshot]) -> Result<(), SnapError> {
        let value = serde_json::to_value(screenshots)
            .map_err(|e| SnapError::Storage(e.to_string()))?;
        self.storage.set(SCREENSHOTS_KEY, value).await?;
        Ok(())
    }

    /// Stores a capture at the front of the collection and evicts the oldest
    /// records beyond the retention limit. Returns the new id.
    pub async fn save(&self, input: ScreenshotInput) -> Result<String, SnapError> {
        let _guard = self.write_lock.lock().await;

        let limit = self
            .settings
            .get()
            .await?
            .max_images
            .clamp(MIN_CAPACITY, self.calculate_max_capacity());

        let mut screenshots = self.load().await?;
        let id = generate_id();
        screenshots.insert(0, Screenshot::from_input(id.clone(), input));

        let evicted = screenshots.len().saturating_sub(limit);
        screenshots.truncate(limit);
        self.persist(&screenshots).await?;

        log::info!(
            "[STORE] Screenshot saved, id: {} ({} kept, {} evicted)",
            id,
            screenshots.len(),
            evicted
        );
        Ok(id)
    }

    /// Screenshots newest first, optionally filtered by type and capped.
    pub async fn list(&self, options: ListOptions) -> Result<Vec<Screenshot>, SnapError> {
        let screenshots = self.load().await?;
        let limit = options.limit.unwrap_or(usize::MAX);

        Ok(screenshots
            .into_iter()
            .filter(|s| options.capture_type.map_or(true, |t| s.capture_type == t))
            .take(limit)
            .collect())
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<Screenshot>, SnapError> {
        Ok(self.load().await?.into_iter().find(|s| s.id == id))
    }

    /// Removes the screenshot with `id`; absent ids are ignored.
    pub async fn delete_by_id(&self, id: &str) -> Result<(), SnapError> {
        let _guard = self.write_lock.lock().await;

        let mut screenshots = self.load().await?;
        let before = screenshots.len();
        screenshots.retain(|s| s.id != id);

        if screenshots.len() == before {
            log::debug!("[STORE] Delete of unknown id {} ignored", id);
            return Ok(());
        }

        self.persist(&screenshots).await?;
        log::info!("[STORE] Screenshot deleted, id: {}", id);
        Ok(())
    }

    pub async fn clear_all(&self) -> Result<(), SnapError> {
        let _guard = self.write_lock.lock().await;
        self.storage.set(SCREENSHOTS_KEY, Value::Array(Vec::new())).await?;
        log::info!("[STORE] All screenshots cleared");
        Ok(())
    }
}

/// Millisecond timestamp followed by a random base36 suffix.
fn generate_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(|c| (c as char).to_ascii_lowercase())
        .collect();
    format!("{}{}", now_millis(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Dimensions;
    use crate::store::{MemoryStorage, SettingsPatch};

    fn input(n: i64, capture_type: CaptureType) -> ScreenshotInput {
        ScreenshotInput {
            image_data: format!("data:image/png;base64,{}", n),
            url: format!("https://example.com/{}", n),
            title: format!("Page {}", n),
            capture_type,
            dimensions: Dimensions::default(),
            timestamp: n,
        }
    }

    async fn store_with_limit(max_images: usize) -> ScreenshotStore {
        let storage: Arc<dyn StorageArea> = Arc::new(MemoryStorage::new());
        let settings = Arc::new(SettingsStore::new(storage.clone()));
        settings
            .update(SettingsPatch {
                max_images: Some(max_images),
                ..SettingsPatch::default()
            })
            .await
            .unwrap();
        ScreenshotStore::new(storage, settings)
    }

    #[test]
    fn capacity_follows_quota_within_bounds() {
        assert_eq!(calculate_max_capacity(5_000_000), 50);
        assert_eq!(calculate_max_capacity(100_000), 10);
        assert_eq!(calculate_max_capacity(0), 10);
        assert_eq!(calculate_max_capacity(1_000_000_000), 100);
    }

    #[test]
    fn ids_are_unique() {
        let a = generate_id();
        let b = generate_id();
        assert_ne!(a, b);
        assert!(a.len() > 9);
    }

    #[tokio::test]
    async fn keeps_only_the_newest_max_images() {
        let store = store_with_limit(10).await;
        for n in 0..15 {
            store.save(input(n, CaptureType::Visible)).await.unwrap();
        }

        let all = store.list(ListOptions::default()).await.unwrap();
        let timestamps: Vec<i64> = all.iter().map(|s| s.timestamp).collect();
        assert_eq!(timestamps, (5..15).rev().collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn list_filters_by_type_and_limit() {
        let store = store_with_limit(50).await;
        store.save(input(1, CaptureType::Visible)).await.unwrap();
        store.save(input(2, CaptureType::Selection)).await.unwrap();
        store.save(input(3, CaptureType::Selection)).await.unwrap();

        let selections = store
            .list(ListOptions {
                capture_type: Some(CaptureType::Selection),
                limit: None,
            })
            .await
            .unwrap();
        assert_eq!(selections.iter().map(|s| s.timestamp).collect::<Vec<_>>(), vec![3, 2]);

        let latest = store
            .list(ListOptions {
                capture_type: None,
                limit: Some(1),
            })
            .await
            .unwrap();
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].timestamp, 3);
    }

    #[tokio::test]
    async fn get_and_delete_by_id() {
        let store = store_with_limit(50).await;
        let keep = store.save(input(1, CaptureType::Visible)).await.unwrap();
        let gone = store.save(input(2, CaptureType::Visible)).await.unwrap();

        assert_eq!(store.get_by_id(&gone).await.unwrap().unwrap().timestamp, 2);
        store.delete_by_id(&gone).await.unwrap();
        assert!(store.get_by_id(&gone).await.unwrap().is_none());
        assert!(store.get_by_id(&keep).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn deleting_unknown_id_is_a_no_op() {
        let store = store_with_limit(50).await;
        store.save(input(1, CaptureType::Visible)).await.unwrap();
        let before = store.list(ListOptions::default()).await.unwrap();

        store.delete_by_id("does-not-exist").await.unwrap();
        assert_eq!(store.list(ListOptions::default()).await.unwrap(), before);
    }

    #[tokio::test]
    async fn clear_all_empties_the_collection() {
        let store = store_with_limit(50).await;
        store.save(input(1, CaptureType::Visible)).await.unwrap();
        store.clear_all().await.unwrap();
        assert!(store.list(ListOptions::default()).await.unwrap().is_empty());
    }
}
