//! Capture coordinator — the control surface's side of the capture handshake.
//!
//! Sends typed requests to the background host, gives up waiting after a
//! client-side timeout, and runs the auto-save / auto-clipboard policies
//! after every successful capture.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::codec::EncodedImage;
use super::host::{is_restricted_url, Browser, HostChannel};
use crate::clipboard::ClipboardSink;
use crate::error::SnapError;
use crate::export::Exporter;
use crate::model::{Screenshot, ScreenshotInput, Selection};
use crate::protocol::{Request, Response};
use crate::store::SettingsStore;

/// Ceiling for a direct capture round trip.
pub const CAPTURE_TIMEOUT: Duration = Duration::from_secs(10);
/// Ceiling for any other request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct CaptureCoordinator {
    browser: Arc<dyn Browser>,
    host: Arc<dyn HostChannel>,
    settings: Arc<SettingsStore>,
    exporter: Arc<Exporter>,
    clipboard: Arc<dyn ClipboardSink>,
    capture_timeout: Duration,
    request_timeout: Duration,
    busy: AtomicBool,
}

/// Clears the busy flag however the request ends.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn hold(flag: &'a AtomicBool) -> Self {
        if flag.swap(true, Ordering::SeqCst) {
            log::debug!("[CAPTURE] Request started while another is in flight");
        }
        Self(flag)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl CaptureCoordinator {
    pub fn new(
        browser: Arc<dyn Browser>,
        host: Arc<dyn HostChannel>,
        settings: Arc<SettingsStore>,
        exporter: Arc<Exporter>,
        clipboard: Arc<dyn ClipboardSink>,
    ) -> Self {
        Self {
            browser,
            host,
            settings,
            exporter,
            clipboard,
            capture_timeout: CAPTURE_TIMEOUT,
            request_timeout: REQUEST_TIMEOUT,
            busy: AtomicBool::new(false),
        }
    }

    pub fn with_timeouts(mut self, capture: Duration, request: Duration) -> Self {
        self.capture_timeout = capture;
        self.request_timeout = request;
        self
    }

    /// True while a capture request is awaiting its response.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    async fn request(&self, request: Request, timeout: Duration) -> Result<Response, SnapError> {
        let name = request.name();
        let _busy = BusyGuard::hold(&self.busy);

        // Detached so the host operation outlives a timed-out caller.
        let host = Arc::clone(&self.host);
        let task = tokio::spawn(async move { host.send(request).await });

        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(response)) => response.into_result(),
            Ok(Err(e)) => {
                log::error!("[CAPTURE] {} host task failed: {}", name, e);
                Err(SnapError::CaptureFailed(format!("Host task failed: {}", e)))
            }
            Err(_) => {
                log::warn!("[CAPTURE] {} timed out after {}ms", name, timeout.as_millis());
                Err(SnapError::TimedOut(timeout))
            }
        }
    }

    /// Liveness probe of the background host.
    pub async fn ping(&self) -> Result<(), SnapError> {
        self.request(Request::TestConnection, self.request_timeout).await?;
        Ok(())
    }

    pub async fn capture_visible(&self) -> Result<ScreenshotInput, SnapError> {
        log::info!("[CAPTURE] Capturing visible area");
        let screenshot = self
            .request(Request::CaptureVisible, self.capture_timeout)
            .await?
            .into_screenshot()?;

        self.after_capture(&screenshot).await;
        Ok(screenshot)
    }

    /// Asks the active page to show the selection overlay.
    ///
    /// Once this returns, the control surface should dismiss itself so the
    /// user can drag over the page.
    pub async fn begin_selection(&self) -> Result<(), SnapError> {
        let tab = self
            .browser
            .active_tab()
            .await
            .ok_or(SnapError::NoActiveTarget)?;
        if is_restricted_url(&tab.url) {
            return Err(SnapError::TargetNotCapturable(tab.url));
        }

        self.request(Request::InitSelectionMode, self.request_timeout)
            .await?;
        log::info!("[CAPTURE] Selection mode active in tab {}", tab.id);
        Ok(())
    }

    pub async fn capture_selection(&self, selection: Selection) -> Result<ScreenshotInput, SnapError> {
        if !selection.is_valid() {
            return Err(SnapError::Validation(format!(
                "Selection {}x{} is too small",
                selection.width, selection.height
            )));
        }

        let screenshot = self
            .request(Request::CaptureSelection { selection }, self.capture_timeout)
            .await?
            .into_screenshot()?;

        self.after_capture(&screenshot).await;
        Ok(screenshot)
    }

    /// Best-effort policies read from the settings at call time. Failures
    /// are logged and never reach the caller.
    async fn after_capture(&self, screenshot: &ScreenshotInput) {
        let settings = match self.settings.get().await {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("[CAPTURE] Skipping auto actions, settings unavailable: {}", e);
                return;
            }
        };
        if !settings.auto_save && !settings.auto_clipboard {
            return;
        }

        let image = match EncodedImage::from_data_url(&screenshot.image_data) {
            Ok(image) => image,
            Err(e) => {
                log::warn!("[CAPTURE] Skipping auto actions, bad image payload: {}", e);
                return;
            }
        };

        if settings.auto_save {
            if let Err(e) = self
                .exporter
                .save(
                    &image,
                    screenshot.capture_type,
                    screenshot.timestamp,
                    &settings.save_location,
                )
                .await
            {
                log::warn!("[EXPORT] Auto-save failed: {}", e);
            }
        }

        if settings.auto_clipboard {
            if let Err(e) = self.write_clipboard(image).await {
                log::warn!("[CLIPBOARD] Auto-copy failed: {}", e);
            }
        }
    }

    async fn write_clipboard(&self, image: EncodedImage) -> Result<(), SnapError> {
        let clipboard = self.clipboard.clone();
        tokio::task::spawn_blocking(move || clipboard.write_image(&image))
            .await
            .map_err(|e| SnapError::Clipboard(format!("Clipboard task failed: {}", e)))?
    }

    /// Gallery action: write a stored screenshot to the download folder.
    pub async fn download(&self, screenshot: &Screenshot) -> Result<PathBuf, SnapError> {
        let image = EncodedImage::from_data_url(&screenshot.image_data)?;
        let settings = self.settings.get().await?;
        self.exporter
            .save(
                &image,
                screenshot.capture_type,
                screenshot.timestamp,
                &settings.save_location,
            )
            .await
    }

    /// Gallery action: copy a stored screenshot to the clipboard.
    pub async fn copy_to_clipboard(&self, screenshot: &Screenshot) -> Result<(), SnapError> {
        let image = EncodedImage::from_data_url(&screenshot.image_data)?;
        self.write_clipboard(image).await
    }
}
