//! Drawing surfaces.
//!
//! A [`Surface`] is whatever the painter draws onto: a screen widget, a
//! printer, an export backend. Every coordinate and pen width it receives is
//! already in device units.
//!
//! [`RecordingSurface`] keeps the primitive calls as a list of [`DrawOp`]s
//! instead of rasterising them. Tests assert against the list and the CLI
//! writes it out as JSON.

use serde::Serialize;

use crate::geometry::{Point, Rect};
use crate::image_loader::RasterImage;
use crate::picture::Picture;
use crate::style::{Color, Font, Pen};
use crate::text::{TextBlock, TextLine};
use crate::units::DeviceMetrics;

pub trait Surface {
    /// Resolution and kind of the underlying device.
    fn metrics(&self) -> DeviceMetrics;

    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, dx: f64, dy: f64);
    fn scale(&mut self, sx: f64, sy: f64);

    /// Pen for subsequent outlines and lines. Width is in device units.
    fn set_pen(&mut self, pen: Pen);
    /// Font for subsequent text. Size is in device units.
    fn set_font(&mut self, font: &Font, color: Color);

    fn fill_rect(&mut self, rect: Rect, color: Color);
    /// Outline `rect` with the current pen.
    fn draw_rect(&mut self, rect: Rect);
    fn draw_line(&mut self, from: Point, to: Point);

    /// Draw pre-laid-out text with its top-left corner at `origin`.
    fn draw_text_layout(&mut self, origin: Point, block: &TextBlock);
    /// Draw an image at its native pixel size.
    fn draw_image(&mut self, origin: Point, image: &RasterImage);
    /// Replay a picture's commands.
    fn draw_picture(&mut self, origin: Point, picture: &Picture);
}

/// One recorded surface call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum DrawOp {
    Save,
    Restore,
    Translate {
        dx: f64,
        dy: f64,
    },
    Scale {
        sx: f64,
        sy: f64,
    },
    SetPen {
        pen: Pen,
    },
    SetFont {
        font: Font,
        color: Color,
    },
    FillRect {
        rect: Rect,
        color: Color,
    },
    DrawRect {
        rect: Rect,
    },
    DrawLine {
        from: Point,
        to: Point,
    },
    DrawText {
        origin: Point,
        lines: Vec<TextLine>,
    },
    DrawImage {
        origin: Point,
        width: u32,
        height: u32,
    },
    DrawPicture {
        origin: Point,
        bounds: Rect,
        commands: usize,
    },
}

/// A surface that records instead of drawing.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    metrics: DeviceMetrics,
    ops: Vec<DrawOp>,
    depth: usize,
}

impl RecordingSurface {
    pub fn new(metrics: DeviceMetrics) -> Self {
        Self {
            metrics,
            ops: Vec::new(),
            depth: 0,
        }
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<DrawOp> {
        self.ops
    }

    /// Current save/restore nesting.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.ops)
    }
}

impl Surface for RecordingSurface {
    fn metrics(&self) -> DeviceMetrics {
        self.metrics
    }

    fn save(&mut self) {
        self.depth += 1;
        self.ops.push(DrawOp::Save);
    }

    fn restore(&mut self) {
        if self.depth == 0 {
            log::warn!("restore without matching save");
            return;
        }
        self.depth -= 1;
        self.ops.push(DrawOp::Restore);
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.ops.push(DrawOp::Translate { dx, dy });
    }

    fn scale(&mut self, sx: f64, sy: f64) {
        self.ops.push(DrawOp::Scale { sx, sy });
    }

    fn set_pen(&mut self, pen: Pen) {
        self.ops.push(DrawOp::SetPen { pen });
    }

    fn set_font(&mut self, font: &Font, color: Color) {
        self.ops.push(DrawOp::SetFont {
            font: font.clone(),
            color,
        });
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.ops.push(DrawOp::FillRect { rect, color });
    }

    fn draw_rect(&mut self, rect: Rect) {
        self.ops.push(DrawOp::DrawRect { rect });
    }

    fn draw_line(&mut self, from: Point, to: Point) {
        self.ops.push(DrawOp::DrawLine { from, to });
    }

    fn draw_text_layout(&mut self, origin: Point, block: &TextBlock) {
        self.ops.push(DrawOp::DrawText {
            origin,
            lines: block.lines.clone(),
        });
    }

    fn draw_image(&mut self, origin: Point, image: &RasterImage) {
        self.ops.push(DrawOp::DrawImage {
            origin,
            width: image.width_px,
            height: image.height_px,
        });
    }

    fn draw_picture(&mut self, origin: Point, picture: &Picture) {
        self.ops.push(DrawOp::DrawPicture {
            origin,
            bounds: picture.bounds,
            commands: picture.commands.len(),
        });
    }
}
