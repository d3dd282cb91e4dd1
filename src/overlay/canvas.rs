//! Raster surface: draws the overlay into an RGBA buffer the size of the
//! viewport, the way the page overlay paints its canvas.

use image::{Rgba, RgbaImage};

use super::{Frame, Surface, Viewport};
use crate::model::Selection;

/// rgba(0, 0, 0, 0.5)
pub const DIM_COLOR: Rgba<u8> = Rgba([0, 0, 0, 128]);
/// #0078d4
pub const BORDER_COLOR: Rgba<u8> = Rgba([0x00, 0x78, 0xd4, 0xff]);
const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

const BORDER_WIDTH: i64 = 2;
const HANDLE_SIZE: i64 = 8;

#[derive(Debug, Default)]
pub struct CanvasSurface {
    canvas: Option<RgbaImage>,
    listening: bool,
    prompt_visible: bool,
    readout: Option<String>,
}

impl CanvasSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn canvas(&self) -> Option<&RgbaImage> {
        self.canvas.as_ref()
    }

    pub fn is_mounted(&self) -> bool {
        self.canvas.is_some()
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    pub fn prompt_visible(&self) -> bool {
        self.prompt_visible
    }

    pub fn readout(&self) -> Option<&str> {
        self.readout.as_deref()
    }
}

impl Surface for CanvasSurface {
    fn mount(&mut self, viewport: Viewport) {
        self.canvas = Some(RgbaImage::from_pixel(
            viewport.width,
            viewport.height,
            DIM_COLOR,
        ));
        self.listening = true;
        self.prompt_visible = true;
        self.readout = None;
    }

    fn render(&mut self, frame: &Frame) {
        let Some(canvas) = self.canvas.as_mut() else {
            return;
        };

        for pixel in canvas.pixels_mut() {
            *pixel = DIM_COLOR;
        }
        if let Some(selection) = frame.selection {
            draw_selection(canvas, selection);
        }

        self.prompt_visible = frame.show_prompt;
        self.readout = frame.readout.clone();
    }

    fn unmount(&mut self) {
        self.canvas = None;
        self.listening = false;
        self.prompt_visible = false;
        self.readout = None;
    }
}

fn draw_selection(canvas: &mut RgbaImage, selection: Selection) {
    let (x, y) = (selection.x as i64, selection.y as i64);
    let (w, h) = (selection.width as i64, selection.height as i64);
    let half = BORDER_WIDTH / 2;

    fill_rect(canvas, x, y, w, h, CLEAR);

    // Stroke straddles the rectangle edge.
    fill_rect(canvas, x - half, y - half, w + BORDER_WIDTH, BORDER_WIDTH, BORDER_COLOR);
    fill_rect(canvas, x - half, y + h - half, w + BORDER_WIDTH, BORDER_WIDTH, BORDER_COLOR);
    fill_rect(canvas, x - half, y - half, BORDER_WIDTH, h + BORDER_WIDTH, BORDER_COLOR);
    fill_rect(canvas, x + w - half, y - half, BORDER_WIDTH, h + BORDER_WIDTH, BORDER_COLOR);

    let offset = HANDLE_SIZE / 2;
    for (cx, cy) in [(x, y), (x + w, y), (x, y + h), (x + w, y + h)] {
        fill_rect(canvas, cx - offset, cy - offset, HANDLE_SIZE, HANDLE_SIZE, BORDER_COLOR);
    }
}

/// Fills a rectangle, clipped to the canvas.
fn fill_rect(canvas: &mut RgbaImage, x: i64, y: i64, w: i64, h: i64, color: Rgba<u8>) {
    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + w).min(canvas.width() as i64);
    let y1 = (y + h).min(canvas.height() as i64);

    for py in y0..y1 {
        for px in x0..x1 {
            canvas.put_pixel(px as u32, py as u32, color);
        }
    }
}
