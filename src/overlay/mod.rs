//! Selection overlay — the drag-a-rectangle surface shown over the page.
//!
//! Lifecycle: `Idle → Armed → Dragging → Finalized | Cancelled`.
//! Any terminal state detaches listeners and removes the surface; dropping
//! the overlay does the same, so no exit path can leave it behind.

mod canvas;

pub use canvas::{CanvasSurface, BORDER_COLOR, DIM_COLOR};

use crate::model::Selection;

pub const PROMPT: &str = "Click and drag to select area • ESC to cancel";

/// Readout is only drawn once the rectangle exceeds this size.
const READOUT_MIN_WIDTH: u32 = 50;
const READOUT_MIN_HEIGHT: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// What the surface should show after an interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Undimmed rectangle with border and corner handles.
    pub selection: Option<Selection>,
    /// Live `w × h` readout, centered in the selection.
    pub readout: Option<String>,
    pub show_prompt: bool,
}

impl Frame {
    fn armed() -> Self {
        Self {
            selection: None,
            readout: None,
            show_prompt: true,
        }
    }

    fn dragging(selection: Selection) -> Self {
        let readout = (selection.width > READOUT_MIN_WIDTH && selection.height > READOUT_MIN_HEIGHT)
            .then(|| format!("{} × {}", selection.width, selection.height));
        Self {
            selection: Some(selection),
            readout,
            show_prompt: false,
        }
    }
}

/// Where the overlay draws and listens for input.
pub trait Surface: Send {
    /// Creates the full-viewport surface and attaches pointer/key listeners.
    fn mount(&mut self, viewport: Viewport);

    fn render(&mut self, frame: &Frame);

    /// Detaches listeners and removes every injected element. Idempotent.
    fn unmount(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayState {
    Idle,
    Armed,
    Dragging {
        start: (i32, i32),
        current: (i32, i32),
    },
    Finalized(Selection),
    Cancelled,
}

pub struct SelectionOverlay<S: Surface> {
    surface: S,
    viewport: Viewport,
    state: OverlayState,
    mounted: bool,
}

impl<S: Surface> SelectionOverlay<S> {
    pub fn new(surface: S, viewport: Viewport) -> Self {
        Self {
            surface,
            viewport,
            state: OverlayState::Idle,
            mounted: false,
        }
    }

    pub fn state(&self) -> OverlayState {
        self.state
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// True while the overlay accepts input.
    pub fn is_active(&self) -> bool {
        matches!(self.state, OverlayState::Armed | OverlayState::Dragging { .. })
    }

    pub fn start(&mut self) {
        log::info!("[OVERLAY] Starting selection");
        self.teardown();

        self.surface.mount(self.viewport);
        self.mounted = true;
        self.surface.render(&Frame::armed());
        self.state = OverlayState::Armed;
    }

    pub fn pointer_down(&mut self, x: i32, y: i32) {
        if self.is_active() {
            self.state = OverlayState::Dragging {
                start: (x, y),
                current: (x, y),
            };
        }
    }

    pub fn pointer_move(&mut self, x: i32, y: i32) {
        if let OverlayState::Dragging { start, .. } = self.state {
            self.state = OverlayState::Dragging {
                start,
                current: (x, y),
            };
            self.surface
                .render(&Frame::dragging(Selection::from_corners(start, (x, y))));
        }
    }

    /// Ends a drag. Returns the rectangle when it is large enough to capture.
    pub fn pointer_up(&mut self, x: i32, y: i32) -> Option<Selection> {
        let OverlayState::Dragging { start, .. } = self.state else {
            return None;
        };

        let selection = Selection::from_corners(start, (x, y));
        self.teardown();

        if !selection.is_valid() {
            log::info!(
                "[OVERLAY] Selection too small ({}x{}), canceling",
                selection.width,
                selection.height
            );
            self.state = OverlayState::Cancelled;
            return None;
        }

        log::info!(
            "[OVERLAY] Selection complete: {}x{} at {},{}",
            selection.width, selection.height, selection.x, selection.y
        );
        self.state = OverlayState::Finalized(selection);
        Some(selection)
    }

    pub fn key_down(&mut self, key: &str) {
        if key == "Escape" && self.is_active() {
            log::info!("[OVERLAY] Selection canceled");
            self.teardown();
            self.state = OverlayState::Cancelled;
        }
    }

    /// Removes the surface and listeners if present.
    pub fn teardown(&mut self) {
        if self.mounted {
            self.surface.unmount();
            self.mounted = false;
        }
        if self.is_active() {
            self.state = OverlayState::Idle;
        }
    }
}

impl<S: Surface> Drop for SelectionOverlay<S> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Records surface calls so tests can check cleanup.
    #[derive(Default, Clone)]
    struct Recorder {
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Recorder {
        fn calls(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }
    }

    impl Surface for Recorder {
        fn mount(&mut self, viewport: Viewport) {
            self.log
                .lock()
                .unwrap()
                .push(format!("mount {}x{}", viewport.width, viewport.height));
        }

        fn render(&mut self, frame: &Frame) {
            let entry = match (&frame.selection, &frame.readout) {
                (None, _) => "render prompt".to_string(),
                (Some(_), Some(text)) => format!("render {}", text),
                (Some(_), None) => "render rect".to_string(),
            };
            self.log.lock().unwrap().push(entry);
        }

        fn unmount(&mut self) {
            self.log.lock().unwrap().push("unmount".into());
        }
    }

    fn overlay() -> (SelectionOverlay<Recorder>, Recorder) {
        let recorder = Recorder::default();
        let viewport = Viewport { width: 800, height: 600 };
        (SelectionOverlay::new(recorder.clone(), viewport), recorder)
    }

    #[test]
    fn drag_finalizes_normalized_rectangle() {
        let (mut overlay, recorder) = overlay();
        overlay.start();
        assert_eq!(overlay.state(), OverlayState::Armed);

        overlay.pointer_down(300, 200);
        overlay.pointer_move(150, 120);
        overlay.pointer_move(100, 50);
        let selection = overlay.pointer_up(100, 50);

        let expected = Selection { x: 100, y: 50, width: 200, height: 150 };
        assert_eq!(selection, Some(expected));
        assert_eq!(overlay.state(), OverlayState::Finalized(expected));
        assert_eq!(
            recorder.calls(),
            vec![
                "mount 800x600",
                "render prompt",
                "render 150 × 80",
                "render 200 × 150",
                "unmount",
            ]
        );
    }

    #[test]
    fn small_drag_cancels_silently() {
        let (mut overlay, recorder) = overlay();
        overlay.start();
        overlay.pointer_down(10, 10);
        overlay.pointer_move(15, 200);
        assert_eq!(overlay.pointer_up(15, 200), None);
        assert_eq!(overlay.state(), OverlayState::Cancelled);
        assert_eq!(recorder.calls().last().unwrap(), "unmount");
    }

    #[test]
    fn readout_hidden_for_narrow_rectangles() {
        let (mut overlay, recorder) = overlay();
        overlay.start();
        overlay.pointer_down(0, 0);
        overlay.pointer_move(50, 100);
        assert_eq!(recorder.calls().last().unwrap(), "render rect");
    }

    #[test]
    fn escape_cancels_while_armed_or_dragging() {
        let (mut overlay, recorder) = overlay();
        overlay.start();
        overlay.key_down("Escape");
        assert_eq!(overlay.state(), OverlayState::Cancelled);

        overlay.start();
        overlay.pointer_down(0, 0);
        overlay.pointer_move(100, 100);
        overlay.key_down("Enter");
        assert!(overlay.is_active());
        overlay.key_down("Escape");
        assert_eq!(overlay.state(), OverlayState::Cancelled);
        assert_eq!(overlay.pointer_up(100, 100), None);

        let unmounts = recorder.calls().iter().filter(|c| *c == "unmount").count();
        assert_eq!(unmounts, 2);
    }

    #[test]
    fn restart_tears_down_previous_instance_first() {
        let (mut overlay, recorder) = overlay();
        overlay.start();
        overlay.pointer_down(5, 5);
        overlay.start();

        assert_eq!(overlay.state(), OverlayState::Armed);
        assert_eq!(
            recorder.calls(),
            vec!["mount 800x600", "render prompt", "unmount", "mount 800x600", "render prompt"]
        );
    }

    #[test]
    fn pointer_events_before_start_are_ignored() {
        let (mut overlay, recorder) = overlay();
        overlay.pointer_down(0, 0);
        overlay.pointer_move(100, 100);
        assert_eq!(overlay.pointer_up(100, 100), None);
        assert_eq!(overlay.state(), OverlayState::Idle);
        assert!(recorder.calls().is_empty());
    }

    #[test]
    fn dropping_an_active_overlay_unmounts_it() {
        let (mut overlay, recorder) = overlay();
        overlay.start();
        overlay.pointer_down(0, 0);
        drop(overlay);
        assert_eq!(recorder.calls().last().unwrap(), "unmount");
    }
}
