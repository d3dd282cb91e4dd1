//! Privileged capture host — the background context.
//!
//! This is the infrastructure layer: it talks to the browser through the
//! `Browser` trait and answers typed requests from the other contexts.

use std::sync::{Arc, LazyLock};
use std::time::Instant;

use async_trait::async_trait;
use regex::Regex;

use super::codec::{self, EncodedImage};
use crate::error::SnapError;
use crate::model::{now_millis, CaptureType, Dimensions, ScreenshotInput, Selection};
use crate::protocol::{Request, Response};

pub type TabId = u32;

/// The page currently focused in the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tab {
    pub id: TabId,
    pub url: String,
    pub title: String,
}

/// Browser primitives available to privileged contexts.
#[async_trait]
pub trait Browser: Send + Sync {
    /// The active tab of the current window, if any.
    async fn active_tab(&self) -> Option<Tab>;

    /// Pixels of the visible viewport of the active tab.
    async fn capture_visible_tab(&self) -> Result<EncodedImage, String>;

    /// Delivers a request to the page context of `tab`. Fails when no
    /// listener is present there.
    async fn send_to_tab(&self, tab: TabId, request: Request) -> Result<Response, String>;
}

/// Anything that answers requests addressed to the background context.
#[async_trait]
pub trait HostChannel: Send + Sync {
    async fn send(&self, request: Request) -> Response;
}

static RESTRICTED_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?i)(chrome|chrome-extension|chrome-search|chrome-untrusted|edge|brave|opera|vivaldi|devtools|view-source|about|moz-extension|resource):",
    )
    .expect("valid regex")
});

/// True for internal browser pages no extension may script or capture.
pub fn is_restricted_url(url: &str) -> bool {
    RESTRICTED_URL.is_match(url.trim())
}

pub struct BackgroundHost {
    browser: Arc<dyn Browser>,
}

impl BackgroundHost {
    pub fn new(browser: Arc<dyn Browser>) -> Self {
        log::info!("[HOST] Capture host ready");
        Self { browser }
    }

    /// Single dispatch point for every request reaching this context.
    pub async fn dispatch(&self, request: Request) -> Response {
        log::debug!("[HOST] Message received: {}", request.name());

        match request {
            Request::CaptureVisible => self.capture_visible().await.into(),
            Request::InitSelectionMode => self.init_selection().await.into(),
            Request::CaptureSelection { selection } => {
                self.capture_selection(selection).await.into()
            }
            Request::TestConnection => Response::with_data("Connected"),
            Request::CaptureFullPage => Response::error_message("Unknown message type"),
        }
    }

    async fn active_tab(&self) -> Result<Tab, SnapError> {
        self.browser.active_tab().await.ok_or(SnapError::NoActiveTarget)
    }

    async fn grab(&self) -> Result<EncodedImage, SnapError> {
        let start = Instant::now();
        let image = self
            .browser
            .capture_visible_tab()
            .await
            .map_err(SnapError::CaptureFailed)?;
        log::info!(
            "[HOST] Visible tab captured in {}ms — {} bytes",
            start.elapsed().as_millis(),
            image.bytes.len()
        );
        Ok(image)
    }

    async fn capture_visible(&self) -> Result<Response, SnapError> {
        let tab = self.active_tab().await?;
        let image = self.grab().await?;

        Ok(Response::captured(&ScreenshotInput {
            image_data: image.to_data_url(),
            url: tab.url,
            title: tab.title,
            capture_type: CaptureType::Visible,
            // Determined by the consumer from the image itself.
            dimensions: Dimensions::default(),
            timestamp: now_millis(),
        }))
    }

    async fn init_selection(&self) -> Result<Response, SnapError> {
        let tab = self.active_tab().await?;
        if is_restricted_url(&tab.url) {
            return Err(SnapError::TargetNotCapturable(tab.url));
        }

        let response = self
            .browser
            .send_to_tab(tab.id, Request::InitSelectionMode)
            .await
            .map_err(SnapError::TargetUnreachable)?;
        if !response.success {
            return Err(SnapError::TargetUnreachable(
                response.error.unwrap_or_else(|| "Failed to start selection mode".into()),
            ));
        }

        log::info!("[HOST] Selection mode started in tab {}", tab.id);
        Ok(Response::with_data("Selection mode started"))
    }

    async fn capture_selection(&self, selection: Selection) -> Result<Response, SnapError> {
        log::info!(
            "[HOST] Capturing selection {}x{} at {},{}",
            selection.width, selection.height, selection.x, selection.y
        );
        let tab = self.active_tab().await?;
        let image = self.grab().await?;

        let start = Instant::now();
        let cropped = codec::crop(&image, selection)?;
        log::info!(
            "[HOST] Cropped to selection in {}ms — {} bytes",
            start.elapsed().as_millis(),
            cropped.bytes.len()
        );

        Ok(Response::captured(&ScreenshotInput {
            image_data: cropped.to_data_url(),
            url: tab.url,
            title: tab.title,
            capture_type: CaptureType::Selection,
            dimensions: Dimensions {
                width: selection.width,
                height: selection.height,
            },
            timestamp: now_millis(),
        }))
    }
}

#[async_trait]
impl HostChannel for BackgroundHost {
    async fn send(&self, request: Request) -> Response {
        self.dispatch(request).await
    }
}
