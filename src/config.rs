//! Runtime configuration.
//!
//! Defaults put persistent state in the platform config directory:
//!   macOS:   ~/Library/Application Support/snapdropper/
//!   Linux:   ~/.config/snapdropper/
//!   Windows: %APPDATA%/snapdropper/
//!
//! Every value can be overridden from the environment (or a `.env` file).

use std::path::PathBuf;
use std::time::Duration;

use crate::capture::{CAPTURE_TIMEOUT, REQUEST_TIMEOUT};
use crate::error::SnapError;
use crate::store::DEFAULT_QUOTA_BYTES;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub download_dir: PathBuf,
    pub storage_quota_bytes: u64,
    pub capture_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("snapdropper"),
            download_dir: dirs::download_dir().unwrap_or_else(|| PathBuf::from(".")),
            storage_quota_bytes: DEFAULT_QUOTA_BYTES,
            capture_timeout: CAPTURE_TIMEOUT,
            request_timeout: REQUEST_TIMEOUT,
        }
    }
}

impl AppConfig {
    /// Loads `.env` if present, then reads `SNAPDROPPER_*` variables.
    pub fn from_env() -> Result<Self, SnapError> {
        if let Ok(path) = dotenvy::dotenv() {
            log::debug!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SnapError> {
        let mut config = Self::default();

        if let Some(dir) = lookup("SNAPDROPPER_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("SNAPDROPPER_DOWNLOAD_DIR") {
            config.download_dir = PathBuf::from(dir);
        }
        if let Some(quota) = lookup("SNAPDROPPER_STORAGE_QUOTA") {
            config.storage_quota_bytes = parse_number("SNAPDROPPER_STORAGE_QUOTA", &quota)?;
        }
        if let Some(ms) = lookup("SNAPDROPPER_CAPTURE_TIMEOUT_MS") {
            config.capture_timeout =
                Duration::from_millis(parse_number("SNAPDROPPER_CAPTURE_TIMEOUT_MS", &ms)?);
        }
        if let Some(ms) = lookup("SNAPDROPPER_REQUEST_TIMEOUT_MS") {
            config.request_timeout =
                Duration::from_millis(parse_number("SNAPDROPPER_REQUEST_TIMEOUT_MS", &ms)?);
        }

        Ok(config)
    }
}

fn parse_number(key: &str, raw: &str) -> Result<u64, SnapError> {
    raw.trim()
        .parse()
        .map_err(|e| SnapError::Config(format!("{}={:?}: {}", key, raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_use_config_dir() {
        let config = AppConfig::default();
        assert!(config.data_dir.ends_with("snapdropper"));
        assert_eq!(config.storage_quota_bytes, 5_000_000);
        assert_eq!(config.capture_timeout, Duration::from_secs(10));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn overrides_apply() {
        let vars: HashMap<&str, &str> = [
            ("SNAPDROPPER_DATA_DIR", "/tmp/snap"),
            ("SNAPDROPPER_STORAGE_QUOTA", "10000000"),
            ("SNAPDROPPER_CAPTURE_TIMEOUT_MS", "2500"),
        ]
        .into_iter()
        .collect();

        let config = AppConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/snap"));
        assert_eq!(config.storage_quota_bytes, 10_000_000);
        assert_eq!(config.capture_timeout, Duration::from_millis(2500));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn bad_number_is_a_config_error() {
        let result = AppConfig::from_lookup(|k| {
            (k == "SNAPDROPPER_REQUEST_TIMEOUT_MS").then(|| "soon".to_string())
        });
        assert!(matches!(result, Err(SnapError::Config(_))));
    }
}
