//! Persistent state shared by every context.
//!
//! Two records live in the storage area: the screenshot collection and the
//! settings object. Each has exactly one owner in this module.

mod backend;
mod screenshots;
mod settings;

pub use backend::{FileStorage, MemoryStorage, StorageArea, DEFAULT_QUOTA_BYTES};
pub use screenshots::{
    calculate_max_capacity, ListOptions, ScreenshotStore, AVERAGE_SCREENSHOT_BYTES,
    SCREENSHOTS_KEY,
};
pub use settings::{max_images_options, Settings, SettingsPatch, SettingsStore, SETTINGS_KEY};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage I/O failed: {0}")]
    Io(String),

    #[error("Stored record '{key}' is corrupt: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Write of {needed} bytes exceeds the {quota} byte storage quota")]
    QuotaExceeded { needed: u64, quota: u64 },
}
