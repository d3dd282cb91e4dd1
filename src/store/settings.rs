//! User settings — a small record merged over defaults on every read.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;

use super::{StorageArea, StorageError};
use crate::error::SnapError;
use crate::store::screenshots::MIN_CAPACITY;

pub const SETTINGS_KEY: &str = "settings";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub auto_clipboard: bool,
    pub auto_save: bool,
    /// Sub-folder of the download directory used by auto-save.
    pub save_location: String,
    pub max_images: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_clipboard: true,
            auto_save: false,
            save_location: String::new(),
            max_images: 50,
        }
    }
}

/// A partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_clipboard: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_save: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_images: Option<usize>,
}

impl Settings {
    fn apply(&mut self, patch: SettingsPatch) {
        if let Some(auto_clipboard) = patch.auto_clipboard {
            self.auto_clipboard = auto_clipboard;
        }
        if let Some(auto_save) = patch.auto_save {
            self.auto_save = auto_save;
        }
        if let Some(save_location) = patch.save_location {
            self.save_location = save_location;
        }
        if let Some(max_images) = patch.max_images {
            self.max_images = max_images;
        }
    }

    /// Rebuilds settings from whatever was persisted.
    ///
    /// Each stored field overrides its default on its own, so a record with
    /// one bad field still keeps the good ones.
    fn from_stored(stored: Option<Value>) -> Self {
        let mut settings = Settings::default();
        let Some(stored) = stored else {
            return settings;
        };
        let Value::Object(fields) = stored else {
            log::warn!("[SETTINGS] Stored settings are not an object, using defaults");
            return settings;
        };

        for (key, value) in fields {
            let patch = serde_json::from_value::<SettingsPatch>(Value::Object(
                [(key.clone(), value)].into_iter().collect(),
            ));
            match patch {
                Ok(patch) => settings.apply(patch),
                Err(e) => log::warn!("[SETTINGS] Ignoring stored field '{}': {}", key, e),
            }
        }
        settings
    }
}

/// Choices offered for `maxImages`: 10 to `capacity` in steps of 10, with
/// `capacity` itself always last.
pub fn max_images_options(capacity: usize) -> Vec<usize> {
    let capacity = capacity.max(MIN_CAPACITY);
    let mut options: Vec<usize> = (MIN_CAPACITY..=capacity).step_by(10).collect();
    if options.last() != Some(&capacity) {
        options.push(capacity);
    }
    options
}

pub struct SettingsStore {
    storage: Arc<dyn StorageArea>,
    write_lock: Mutex<()>,
}

impl SettingsStore {
    pub fn new(storage: Arc<dyn StorageArea>) -> Self {
        Self {
            storage,
            write_lock: Mutex::new(()),
        }
    }

    /// Current settings, defaults filled in for anything not persisted.
    pub async fn get(&self) -> Result<Settings, SnapError> {
        let stored = match self.storage.get(SETTINGS_KEY).await {
            Ok(stored) => stored,
            Err(StorageError::Corrupt { reason, .. }) => {
                log::warn!("[SETTINGS] Stored settings unreadable ({}), using defaults", reason);
                None
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Settings::from_stored(stored))
    }

    /// Merges `patch` into the stored record and returns the result.
    pub async fn update(&self, patch: SettingsPatch) -> Result<Settings, SnapError> {
        let _guard = self.write_lock.lock().await;

        let mut settings = self.get().await?;
        settings.apply(patch);

        let value = serde_json::to_value(&settings)
            .map_err(|e| SnapError::Storage(e.to_string()))?;
        self.storage.set(SETTINGS_KEY, value).await?;

        log::info!("[SETTINGS] Saved: {:?}", settings);
        Ok(settings)
    }

    /// Sets the retention limit, which must lie within `[10, capacity]`.
    pub async fn set_max_images(
        &self,
        max_images: usize,
        capacity: usize,
    ) -> Result<Settings, SnapError> {
        if max_images < MIN_CAPACITY || max_images > capacity {
            return Err(SnapError::Validation(format!(
                "Max images must be between {} and {}",
                MIN_CAPACITY, capacity
            )));
        }
        self.update(SettingsPatch {
            max_images: Some(max_images),
            ..SettingsPatch::default()
        })
        .await
    }
}
