//! Image clipboard access.

use std::borrow::Cow;

use arboard::{Clipboard, ImageData};

use crate::capture::codec::EncodedImage;
use crate::error::SnapError;

/// Destination for copied screenshots.
pub trait ClipboardSink: Send + Sync {
    /// Places `image` on the clipboard as an image payload. Blocking.
    fn write_image(&self, image: &EncodedImage) -> Result<(), SnapError>;
}

/// The operating system clipboard.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

impl ClipboardSink for SystemClipboard {
    fn write_image(&self, image: &EncodedImage) -> Result<(), SnapError> {
        let rgba = image.decode()?.to_rgba8();
        let (width, height) = rgba.dimensions();

        let img_data = ImageData {
            width: width as usize,
            height: height as usize,
            bytes: Cow::Owned(rgba.into_raw()),
        };

        let mut clipboard = Clipboard::new()
            .map_err(|e| SnapError::Clipboard(format!("Failed to access clipboard: {}", e)))?;
        clipboard
            .set_image(img_data)
            .map_err(|e| SnapError::Clipboard(format!("Failed to copy image: {}", e)))?;

        log::info!("[CLIPBOARD] Copied {}x{} image", width, height);
        Ok(())
    }
}
