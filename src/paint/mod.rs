//! # Paint Pipeline
//!
//! Walks a laid-out [`BoxTree`] and issues drawing primitives on a
//! [`Surface`]. Painting is two passes over the whole tree: a fill pass
//! (backgrounds, text, checkbox marks, images) followed by a border pass, so
//! a frame's border is never covered by the fill of a later sibling.
//!
//! Rectangles are converted from mm to device units per primitive. The tree
//! is borrowed immutably; nothing here changes a rectangle.

pub mod surface;

use crate::boxtree::{BoxTree, ImageContent, NodeId, NodeKind};
use crate::error::ReportError;
use crate::font::FontContext;
use crate::geometry::{Point, Rect};
use crate::image_loader::RasterImage;
use crate::picture::Picture;
use crate::style::{Color, Font, Pen};
use crate::text::{substitute_page_count, TextLayout};
use crate::units::{self, points_to_mm, to_device, to_device_x, to_device_y, DeviceMetrics, POINTS_PER_INCH};

pub use self::surface::{DrawOp, RecordingSurface, Surface};

/// Which of the two passes is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintMode {
    Fill,
    Border,
}

/// Per-cycle render settings.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    /// Substituted for `@{n}`.
    pub page_count: u32,
    /// Node drawn with the selection highlight.
    pub selected: Option<NodeId>,
    /// Highlight the parent frame of editable text.
    pub mark_editable: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            page_count: 1,
            selected: None,
            mark_editable: false,
        }
    }
}

pub struct Painter<'f> {
    font_context: &'f FontContext,
    options: RenderOptions,
    text_layout: TextLayout,
}

impl<'f> Painter<'f> {
    pub fn new(font_context: &'f FontContext, options: RenderOptions) -> Self {
        Self {
            font_context,
            options,
            text_layout: TextLayout::new(),
        }
    }

    /// Fill pass over the whole tree, then border pass.
    pub fn draw_tree(&self, tree: &BoxTree<'_>, surface: &mut dyn Surface) -> Result<(), ReportError> {
        if tree.is_empty() {
            return Ok(());
        }
        self.paint(tree, tree.root(), surface, PaintMode::Fill)?;
        self.paint(tree, tree.root(), surface, PaintMode::Border)
    }

    /// Paint one node, and for frames their children, in the given mode.
    pub fn paint(
        &self,
        tree: &BoxTree<'_>,
        id: NodeId,
        surface: &mut dyn Surface,
        mode: PaintMode,
    ) -> Result<(), ReportError> {
        match (&tree.node(id).kind, mode) {
            (NodeKind::Frame | NodeKind::Report, _) => self.paint_frame(tree, id, surface, mode),
            (NodeKind::Text { text }, PaintMode::Fill) => self.paint_text(tree, id, text, surface),
            (NodeKind::Check { checked }, PaintMode::Fill) => match checked {
                Some(checked) => self.paint_check(tree, id, *checked, surface),
                None => Ok(()),
            },
            (
                NodeKind::Image {
                    content,
                    suppress_print,
                },
                PaintMode::Fill,
            ) => {
                self.paint_image(tree, id, content.as_ref(), *suppress_print, surface);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn paint_frame(
        &self,
        tree: &BoxTree<'_>,
        id: NodeId,
        surface: &mut dyn Surface,
        mode: PaintMode,
    ) -> Result<(), ReportError> {
        let metrics = surface.metrics();

        if mode == PaintMode::Fill {
            let rect = to_device(&tree.rect(id), &metrics);
            let fill = if self.options.selected == Some(id) {
                Some(Color::SELECTION)
            } else {
                tree.node(id).item.fill
            };
            if let Some(color) = fill.filter(|_| !rect.is_empty()) {
                surface.fill_rect(rect, color);
            }
        }

        for &child in tree.children(id) {
            self.paint(tree, child, surface, mode)?;
        }

        if mode == PaintMode::Border {
            self.paint_borders(tree, id, surface, &metrics);
        }
        Ok(())
    }

    fn paint_borders(&self, tree: &BoxTree<'_>, id: NodeId, surface: &mut dyn Surface, metrics: &DeviceMetrics) {
        let rect = tree.rect(id);
        let sides = tree.borders(id);

        let edges = [
            (sides.top, rect.top_left(), rect.top_right(), true),
            (sides.bottom, rect.bottom_left(), rect.bottom_right(), true),
            (sides.left, rect.top_left(), rect.bottom_left(), false),
            (sides.right, rect.top_right(), rect.bottom_right(), false),
        ];

        for (pen, from, to, horizontal) in edges {
            let Some(pen) = pen.filter(Pen::is_visible) else {
                continue;
            };
            let from = units::point_to_device(from, metrics);
            let to = units::point_to_device(to, metrics);
            if from == to {
                continue;
            }

            let width_mm = points_to_mm(pen.width);
            let width = if horizontal {
                to_device_y(width_mm, metrics)
            } else {
                to_device_x(width_mm, metrics)
            };
            surface.set_pen(Pen { width, ..pen });
            surface.draw_line(from, to);
        }
    }

    fn paint_text(&self, tree: &BoxTree<'_>, id: NodeId, text: &str, surface: &mut dyn Surface) -> Result<(), ReportError> {
        let metrics = surface.metrics();
        let node = tree.node(id);
        let style = tree.effective_text_style(id)?;

        if self.options.mark_editable && node.item.edit_id.is_some() {
            if let Some(parent) = node.parent {
                let parent_rect = to_device(&tree.rect(parent), &metrics);
                if !parent_rect.is_empty() {
                    surface.fill_rect(parent_rect, Color::YELLOW);
                }
            }
        }

        let text = substitute_page_count(text, self.options.page_count);
        let rect = to_device(&tree.rect(id), &metrics).adjusted(0.0, 0.0, 1.0, 1.0);
        let block = self.text_layout.layout_block(
            self.font_context,
            &text,
            &style.font,
            rect.width,
            metrics.dpi_x / POINTS_PER_INCH,
            metrics.dpi_y / POINTS_PER_INCH,
            node.item.alignment.horizontal,
        );

        let device_font = Font {
            size: style.font.size * metrics.dpi_y / POINTS_PER_INCH,
            ..style.font.clone()
        };
        surface.set_font(&device_font, style.color);
        surface.draw_text_layout(rect.top_left(), &block);
        Ok(())
    }

    fn paint_check(&self, tree: &BoxTree<'_>, id: NodeId, checked: bool, surface: &mut dyn Surface) -> Result<(), ReportError> {
        let metrics = surface.metrics();
        let rect = to_device(&tree.rect(id), &metrics);
        let side = rect.width.min(rect.height);
        if side <= 0.0 {
            log::debug!("{}: no room for a checkbox", tree.describe(id));
            return Ok(());
        }

        let font = &tree.effective_text_style(id)?.font;
        let leading = to_device_y(points_to_mm(self.font_context.leading(font)), &metrics);
        let alignment = tree.node(id).item.alignment;
        let square = Rect::new(
            rect.left + (rect.width - side) * alignment.horizontal.fraction(),
            rect.top + (rect.height - side) * alignment.vertical.fraction() - leading,
            side,
            side,
        );

        surface.set_pen(Pen::solid(1.0, Color::BLACK));
        surface.draw_rect(square);
        if checked {
            surface.set_pen(Pen::solid(1.0, Color::MAROON));
            surface.draw_line(square.top_left(), square.bottom_right());
            surface.draw_line(square.bottom_left(), square.top_right());
        }
        Ok(())
    }

    fn paint_image(
        &self,
        tree: &BoxTree<'_>,
        id: NodeId,
        content: Option<&ImageContent>,
        suppress_print: bool,
        surface: &mut dyn Surface,
    ) {
        let metrics = surface.metrics();
        if suppress_print && metrics.is_native_printer() {
            log::info!("{}: image suppressed on printer", tree.describe(id));
            return;
        }
        let Some(content) = content else {
            return;
        };

        let rect = to_device(&tree.rect(id), &metrics);
        match content {
            ImageContent::Raster(image) => draw_scaled_raster(tree, id, image, rect, surface),
            ImageContent::Picture(picture) => draw_scaled_picture(tree, id, picture, rect, surface),
        }
    }
}

fn draw_scaled_raster(tree: &BoxTree<'_>, id: NodeId, image: &RasterImage, rect: Rect, surface: &mut dyn Surface) {
    if image.is_null() {
        log::warn!("{}: image has no pixels", tree.describe(id));
        return;
    }
    surface.save();
    surface.translate(rect.left, rect.top);
    surface.scale(rect.width / image.width_px as f64, rect.height / image.height_px as f64);
    surface.draw_image(Point::default(), image);
    surface.restore();
}

fn draw_scaled_picture(tree: &BoxTree<'_>, id: NodeId, picture: &Picture, rect: Rect, surface: &mut dyn Surface) {
    let bounds = picture.bounds;
    if bounds.is_empty() {
        log::warn!("{}: picture has no extent", tree.describe(id));
        return;
    }
    surface.save();
    surface.translate(rect.left, rect.top);
    surface.scale(rect.width / bounds.width, rect.height / bounds.height);
    surface.translate(-bounds.left, -bounds.top);
    surface.draw_picture(Point::default(), picture);
    surface.restore();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LayoutEngine;
    use crate::model::ReportItem;
    use crate::style::{Alignment, HAlign, LayoutAxis, Sides, TextStyle, VAlign};
    use crate::units::DeviceKind;

    /// 1 device unit per mm.
    fn mm_metrics() -> DeviceMetrics {
        DeviceMetrics::screen(25.4)
    }

    fn render(root: &ReportItem, page: Rect, metrics: DeviceMetrics, options: RenderOptions) -> Vec<DrawOp> {
        let fc = FontContext::new();
        let mut tree = BoxTree::build(root);
        LayoutEngine::new().layout(&mut tree, page, &fc).unwrap();
        let mut surface = RecordingSurface::new(metrics);
        Painter::new(&fc, options).draw_tree(&tree, &mut surface).unwrap();
        surface.into_ops()
    }

    fn fills(ops: &[DrawOp]) -> Vec<(Rect, Color)> {
        ops.iter()
            .filter_map(|op| match op {
                DrawOp::FillRect { rect, color } => Some((*rect, *color)),
                _ => None,
            })
            .collect()
    }

    fn lines(ops: &[DrawOp]) -> Vec<(Point, Point)> {
        ops.iter()
            .filter_map(|op| match op {
                DrawOp::DrawLine { from, to } => Some((*from, *to)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_fill_then_border_order() {
        let root = ReportItem::frame(vec![ReportItem::frame(vec![])
            .with_height(10.0)
            .with_fill(Color::WHITE)
            .with_border(Pen::solid(1.0, Color::BLACK))]);
        let ops = render(&root, Rect::new(0.0, 0.0, 20.0, 20.0), mm_metrics(), RenderOptions::default());

        let fill_pos = ops.iter().position(|op| matches!(op, DrawOp::FillRect { .. })).unwrap();
        let line_pos = ops.iter().position(|op| matches!(op, DrawOp::DrawLine { .. })).unwrap();
        assert!(fill_pos < line_pos);
        assert_eq!(lines(&ops).len(), 4);
    }

    #[test]
    fn test_selected_frame_highlighted() {
        let root = ReportItem::frame(vec![ReportItem::frame(vec![]).with_height(5.0).with_fill(Color::WHITE)]);
        let fc = FontContext::new();
        let mut tree = BoxTree::build(&root);
        LayoutEngine::new()
            .layout(&mut tree, Rect::new(0.0, 0.0, 10.0, 10.0), &fc)
            .unwrap();
        let child = tree.children(tree.root())[0];
        let options = RenderOptions {
            selected: Some(child),
            ..RenderOptions::default()
        };
        let mut surface = RecordingSurface::new(mm_metrics());
        Painter::new(&fc, options).draw_tree(&tree, &mut surface).unwrap();

        assert_eq!(fills(surface.ops()), vec![(Rect::new(0.0, 0.0, 10.0, 5.0), Color::SELECTION)]);
    }

    #[test]
    fn test_border_widths_per_axis() {
        let pen = Pen::solid(72.0 / 25.4, Color::BLACK); // exactly 1 mm
        let root = ReportItem::frame(vec![]).with_border(pen);
        let metrics = DeviceMetrics {
            dpi_x: 25.4,
            dpi_y: 50.8,
            kind: DeviceKind::Screen,
        };
        let ops = render(&root, Rect::new(0.0, 0.0, 10.0, 10.0), metrics, RenderOptions::default());
        let widths: Vec<f64> = ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::SetPen { pen } => Some(pen.width),
                _ => None,
            })
            .collect();
        // top, bottom use the vertical resolution; left, right the horizontal
        assert_eq!(widths.len(), 4);
        assert!((widths[0] - 2.0).abs() < 1e-9);
        assert!((widths[1] - 2.0).abs() < 1e-9);
        assert!((widths[2] - 1.0).abs() < 1e-9);
        assert!((widths[3] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_width_and_degenerate_sides_skipped() {
        let borders = Sides {
            top: Some(Pen::solid(0.0, Color::BLACK)),
            ..Sides::default()
        };
        let root = ReportItem::frame(vec![ReportItem::frame(vec![])
            .with_border(Pen::solid(1.0, Color::BLACK))
            .with_borders(borders)
            .with_height(0.0)]);
        let ops = render(&root, Rect::new(0.0, 0.0, 10.0, 10.0), mm_metrics(), RenderOptions::default());
        // zero height: left and right collapse to points, top has a zero-width pen
        assert_eq!(lines(&ops), vec![(Point::new(0.0, 0.0), Point::new(10.0, 0.0))]);
    }

    #[test]
    fn test_text_substitutes_page_count() {
        let root = ReportItem::frame(vec![ReportItem::text("Page @{n}")]).with_text_style(TextStyle::default());
        let options = RenderOptions {
            page_count: 7,
            ..RenderOptions::default()
        };
        let ops = render(&root, Rect::new(0.0, 0.0, 100.0, 20.0), mm_metrics(), options);
        let text = ops
            .iter()
            .find_map(|op| match op {
                DrawOp::DrawText { lines, .. } => Some(lines[0].text.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(text, "Page 7");
    }

    #[test]
    fn test_text_font_scaled_to_device() {
        let root = ReportItem::frame(vec![ReportItem::text("x")]).with_text_style(TextStyle::default());
        let ops = render(&root, Rect::new(0.0, 0.0, 50.0, 20.0), DeviceMetrics::screen(144.0), RenderOptions::default());
        let size = ops
            .iter()
            .find_map(|op| match op {
                DrawOp::SetFont { font, .. } => Some(font.size),
                _ => None,
            })
            .unwrap();
        assert!((size - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_mark_editable_fills_parent() {
        let root = ReportItem::frame(vec![ReportItem::frame(vec![ReportItem::text("value").with_edit_id("q1")])
            .with_height(8.0)])
        .with_text_style(TextStyle::default());
        let page = Rect::new(0.0, 0.0, 30.0, 30.0);

        let plain = render(&root, page, mm_metrics(), RenderOptions::default());
        assert!(fills(&plain).is_empty());

        let options = RenderOptions {
            mark_editable: true,
            ..RenderOptions::default()
        };
        let marked = render(&root, page, mm_metrics(), options);
        assert_eq!(fills(&marked), vec![(Rect::new(0.0, 0.0, 30.0, 8.0), Color::YELLOW)]);
    }

    #[test]
    fn test_checkbox_square_and_cross() {
        let style = TextStyle::default();
        let fc = FontContext::new();
        let leading = points_to_mm(fc.leading(&style.font));

        let root = ReportItem::frame(vec![ReportItem::check("@{check:1}")
            .with_size(10.0, 4.0)
            .with_alignment(Alignment::new(HAlign::Center, VAlign::Top))])
        .with_text_style(style);
        let ops = render(&root, Rect::new(0.0, 0.0, 10.0, 10.0), mm_metrics(), RenderOptions::default());

        let square = ops
            .iter()
            .find_map(|op| match op {
                DrawOp::DrawRect { rect } => Some(*rect),
                _ => None,
            })
            .unwrap();
        assert!((square.left - 3.0).abs() < 1e-9);
        assert!((square.top + leading).abs() < 1e-9);
        assert_eq!((square.width, square.height), (4.0, 4.0));

        let cross = lines(&ops);
        assert_eq!(cross.len(), 2);
        assert_eq!(cross[0], (square.top_left(), square.bottom_right()));
        assert_eq!(cross[1], (square.bottom_left(), square.top_right()));
        assert!(ops.contains(&DrawOp::SetPen {
            pen: Pen::solid(1.0, Color::MAROON)
        }));
    }

    #[test]
    fn test_checkbox_unchecked_and_invalid() {
        let root = ReportItem::frame(vec![
            ReportItem::check("@{check:0}").with_height(5.0),
            ReportItem::check("@{check:yes}").with_height(5.0),
        ])
        .with_text_style(TextStyle::default());
        let ops = render(&root, Rect::new(0.0, 0.0, 10.0, 10.0), mm_metrics(), RenderOptions::default());
        let rects = ops.iter().filter(|op| matches!(op, DrawOp::DrawRect { .. })).count();
        assert_eq!(rects, 1);
        assert!(lines(&ops).is_empty());
    }

    fn png_uri(width: u32, height: u32) -> String {
        use base64::Engine;
        let img = image::RgbaImage::new(width, height);
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(encoder, img.as_raw(), width, height, image::ColorType::Rgba8).unwrap();
        format!("data:image/png;base64,{}", base64::engine::general_purpose::STANDARD.encode(&buf))
    }

    #[test]
    fn test_raster_item_scaled_to_fit() {
        let root = ReportItem::frame(vec![
            ReportItem::frame(vec![]).with_width(10.0),
            ReportItem::raster(&png_uri(100, 50)).with_size(20.0, 20.0),
        ])
        .with_layout(LayoutAxis::Horizontal);
        let ops = render(&root, Rect::new(0.0, 0.0, 40.0, 20.0), mm_metrics(), RenderOptions::default());

        assert_eq!(
            ops,
            vec![
                DrawOp::Save,
                DrawOp::Translate { dx: 10.0, dy: 0.0 },
                DrawOp::Scale { sx: 0.2, sy: 0.4 },
                DrawOp::DrawImage {
                    origin: Point::default(),
                    width: 100,
                    height: 50
                },
                DrawOp::Restore,
            ]
        );
    }

    #[test]
    fn test_null_raster_skipped() {
        let root = ReportItem::frame(vec![]);
        let tree = BoxTree::build(&root);
        let image = RasterImage::from_rgba(0, 50, vec![]);
        let mut surface = RecordingSurface::new(mm_metrics());
        draw_scaled_raster(&tree, tree.root(), &image, Rect::new(0.0, 0.0, 20.0, 20.0), &mut surface);
        assert!(surface.ops().is_empty());
    }

    #[test]
    fn test_picture_translated_by_bounds_origin() {
        let root = ReportItem::frame(vec![ReportItem::svg(r#"<rect x="10" y="5" width="40" height="10"/>"#)
            .with_size(20.0, 20.0)]);
        let ops = render(&root, Rect::new(0.0, 0.0, 20.0, 20.0), mm_metrics(), RenderOptions::default());
        assert_eq!(
            ops,
            vec![
                DrawOp::Save,
                DrawOp::Translate { dx: 0.0, dy: 0.0 },
                DrawOp::Scale { sx: 0.5, sy: 2.0 },
                DrawOp::Translate { dx: -10.0, dy: -5.0 },
                DrawOp::DrawPicture {
                    origin: Point::default(),
                    bounds: Rect::new(10.0, 5.0, 40.0, 10.0),
                    commands: 9
                },
                DrawOp::Restore,
            ]
        );
    }

    #[test]
    fn test_suppressed_image_not_printed() {
        let root = ReportItem::frame(vec![ReportItem::svg(r#"<rect width="4" height="4"/>"#)
            .with_size(10.0, 10.0)
            .suppress_print()]);
        let page = Rect::new(0.0, 0.0, 10.0, 10.0);

        let printed = render(&root, page, DeviceMetrics::printer(25.4, 25.4), RenderOptions::default());
        assert!(printed.is_empty());

        let screen = render(&root, page, mm_metrics(), RenderOptions::default());
        assert!(screen.iter().any(|op| matches!(op, DrawOp::DrawPicture { .. })));
    }
}
