//! Writing screenshots into the user's download folder.

use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};

use crate::capture::codec::EncodedImage;
use crate::error::SnapError;
use crate::model::CaptureType;

pub const FILE_PREFIX: &str = "snapdropper";

/// `snapdropper-<type>-<ISO 8601 timestamp>.png`, with `:` and `.` in the
/// timestamp replaced by `-` so the name is valid on every filesystem.
pub fn export_filename(capture_type: CaptureType, timestamp_ms: i64) -> String {
    let at = DateTime::<Utc>::from_timestamp_millis(timestamp_ms).unwrap_or_else(Utc::now);
    let stamp = at
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("{}-{}-{}.png", FILE_PREFIX, capture_type, stamp)
}

pub struct Exporter {
    download_dir: PathBuf,
}

impl Exporter {
    pub fn new(download_dir: impl Into<PathBuf>) -> Self {
        Self {
            download_dir: download_dir.into(),
        }
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Folder for exports. `save_location` names a sub-folder of the
    /// download directory; anything that would escape it is ignored.
    pub fn target_dir(&self, save_location: &str) -> PathBuf {
        let location = save_location.trim();
        if location.is_empty() {
            return self.download_dir.clone();
        }

        let relative = Path::new(location);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            log::warn!(
                "[EXPORT] Save location '{}' leaves the download folder, using the folder root",
                location
            );
            return self.download_dir.clone();
        }

        self.download_dir.join(relative)
    }

    /// Writes `image` under the export folder and returns the file path.
    pub async fn save(
        &self,
        image: &EncodedImage,
        capture_type: CaptureType,
        timestamp_ms: i64,
        save_location: &str,
    ) -> Result<PathBuf, SnapError> {
        let dir = self.target_dir(save_location);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| SnapError::Storage(format!("Failed to create {}: {}", dir.display(), e)))?;

        let path = dir.join(export_filename(capture_type, timestamp_ms));
        tokio::fs::write(&path, &image.bytes)
            .await
            .map_err(|e| SnapError::Storage(format!("Failed to write {}: {}", path.display(), e)))?;

        log::info!("[EXPORT] Saved {} ({} bytes)", path.display(), image.bytes.len());
        Ok(path)
    }
}
