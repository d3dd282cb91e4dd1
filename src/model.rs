//! Records shared by every context: capture kinds, selections, screenshots.

use serde::{Deserialize, Serialize};

/// Minimum width and height, in viewport pixels, of a usable selection.
pub const MIN_SELECTION_SIZE: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureType {
    Visible,
    Selection,
    /// Reserved by the message vocabulary; never produced.
    Full,
}

impl CaptureType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureType::Visible => "visible",
            CaptureType::Selection => "selection",
            CaptureType::Full => "full",
        }
    }
}

impl std::fmt::Display for CaptureType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rectangle in viewport pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Selection {
    /// Builds the rectangle spanned by two drag corners, in any order.
    pub fn from_corners(start: (i32, i32), end: (i32, i32)) -> Self {
        // Corners left of or above the viewport are pinned to its edge.
        let (x0, y0) = (start.0.max(0), start.1.max(0));
        let (x1, y1) = (end.0.max(0), end.1.max(0));
        Self {
            x: x0.min(x1) as u32,
            y: y0.min(y1) as u32,
            width: x1.abs_diff(x0),
            height: y1.abs_diff(y0),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.width >= MIN_SELECTION_SIZE && self.height >= MIN_SELECTION_SIZE
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// A capture as produced by the host, before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotInput {
    /// Data URL of the encoded image.
    pub image_data: String,
    pub url: String,
    pub title: String,
    #[serde(rename = "type")]
    pub capture_type: CaptureType,
    /// `{0, 0}` when the consumer determines the size from the image.
    #[serde(default)]
    pub dimensions: Dimensions,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

/// A persisted capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Screenshot {
    pub id: String,
    pub image_data: String,
    pub url: String,
    pub title: String,
    #[serde(rename = "type")]
    pub capture_type: CaptureType,
    #[serde(default)]
    pub dimensions: Dimensions,
    pub timestamp: i64,
}

impl Screenshot {
    pub fn from_input(id: String, input: ScreenshotInput) -> Self {
        Self {
            id,
            image_data: input.image_data,
            url: input.url,
            title: input.title,
            capture_type: input.capture_type,
            dimensions: input.dimensions,
            timestamp: input.timestamp,
        }
    }
}

pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
