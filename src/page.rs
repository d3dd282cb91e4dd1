//! Page context — lives inside the captured page.
//!
//! Owns at most one selection overlay at a time. The overlay is created when
//! the host asks for selection mode and destroyed as soon as it reaches a
//! terminal state.

use std::time::Duration;

use crate::capture::CaptureCoordinator;
use crate::model::Selection;
use crate::notice::Notice;
use crate::overlay::{SelectionOverlay, Surface, Viewport};
use crate::protocol::{Request, Response};
use crate::store::ScreenshotStore;

/// Time given to the page to repaint without the overlay before capturing.
pub const HIDE_SETTLE_DELAY: Duration = Duration::from_millis(100);

pub struct PageContext<S: Surface + Default> {
    viewport: Viewport,
    overlay: Option<SelectionOverlay<S>>,
}

impl<S: Surface + Default> PageContext<S> {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            overlay: None,
        }
    }

    /// Single dispatch point for requests delivered to this page.
    pub fn dispatch(&mut self, request: Request) -> Response {
        log::debug!("[PAGE] Message received: {}", request.name());
        match request {
            Request::InitSelectionMode => {
                self.start_selection();
                Response::ok()
            }
            _ => Response::error_message("Unknown message"),
        }
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn overlay(&self) -> Option<&SelectionOverlay<S>> {
        self.overlay.as_ref()
    }

    pub fn start_selection(&mut self) {
        // Fully tear down any previous instance before creating a new one.
        if let Some(mut previous) = self.overlay.take() {
            previous.teardown();
        }

        let mut overlay = SelectionOverlay::new(S::default(), self.viewport);
        overlay.start();
        self.overlay = Some(overlay);
    }

    pub fn pointer_down(&mut self, x: i32, y: i32) {
        if let Some(overlay) = self.overlay.as_mut() {
            overlay.pointer_down(x, y);
        }
    }

    pub fn pointer_move(&mut self, x: i32, y: i32) {
        if let Some(overlay) = self.overlay.as_mut() {
            overlay.pointer_move(x, y);
        }
    }

    /// Returns the finished selection, if the drag produced one.
    pub fn pointer_up(&mut self, x: i32, y: i32) -> Option<Selection> {
        let selection = self.overlay.as_mut()?.pointer_up(x, y);
        self.release_finished();
        selection
    }

    pub fn key_down(&mut self, key: &str) {
        if let Some(overlay) = self.overlay.as_mut() {
            overlay.key_down(key);
        }
        self.release_finished();
    }

    fn release_finished(&mut self) {
        if self.overlay.as_ref().is_some_and(|o| !o.is_active()) {
            self.overlay = None;
        }
    }
}

/// Captures a finished selection through the host and stores the result.
pub async fn submit_selection(
    coordinator: &CaptureCoordinator,
    store: &ScreenshotStore,
    selection: Selection,
) -> Notice {
    tokio::time::sleep(HIDE_SETTLE_DELAY).await;

    log::info!("[PAGE] Sending capture request to host");
    let screenshot = match coordinator.capture_selection(selection).await {
        Ok(screenshot) => screenshot,
        Err(e) => {
            log::error!("[PAGE] Capture failed: {}", e);
            return Notice::error(e.to_string());
        }
    };

    match store.save(screenshot).await {
        Ok(id) => {
            log::info!("[PAGE] Screenshot saved, id: {}", id);
            Notice::success("Screenshot saved!")
        }
        Err(e) => {
            log::error!("[PAGE] Failed to save: {}", e);
            Notice::error("Failed to save screenshot")
        }
    }
}
