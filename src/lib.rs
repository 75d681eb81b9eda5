//! # Report Paint
//!
//! A box-layout and paint engine for printable reports.
//!
//! A report is a tree of items (frames, text, checkboxes, images) with
//! declared sizes in millimetres, insets, alignment flags and fill ratios.
//! The engine computes the final rectangle of every item in a single
//! top-down pass and then paints the tree onto any [`paint::Surface`]:
//! a screen preview, a printer, or the recording surface used by tests and
//! the CLI.
//!
//! ## Architecture
//!
//! ```text
//! Input (JSON/API)
//!       ↓
//!   [model]    - Report items, page size, custom fonts
//!       ↓
//!   [boxtree]  - Arena of nodes with mutable rectangles, style caches
//!       ↓
//!   [layout]   - Measure, place, grow springs, align (mm)
//!       ↓
//!   [paint]    - Fill pass, border pass (device units via [units])
//!       ↓
//!   Surface    - Screen, printer, or recorded draw ops
//! ```

pub mod boxtree;
pub mod error;
pub mod font;
pub mod geometry;
pub mod image_loader;
pub mod layout;
pub mod model;
pub mod paint;
pub mod picture;
pub mod style;
pub mod text;
pub mod units;

use boxtree::BoxTree;
use error::ReportError;
use font::FontContext;
use layout::LayoutEngine;
use model::ReportDocument;
use paint::{DrawOp, Painter, RecordingSurface, RenderOptions};
use units::DeviceMetrics;

/// Build the box tree for a document and lay it out on its page.
pub fn layout_document<'a>(
    document: &'a ReportDocument,
    font_context: &FontContext,
) -> Result<BoxTree<'a>, ReportError> {
    let mut tree = BoxTree::build(&document.root);
    LayoutEngine::new().layout(&mut tree, document.page_rect(), font_context)?;
    Ok(tree)
}

/// Paint settings derived from the document: page count and the selected
/// node, resolved from its item id.
pub fn render_options(document: &ReportDocument, tree: &BoxTree<'_>) -> RenderOptions {
    let selected = document.selected.as_deref().and_then(|id| {
        let found = tree.find_by_id(id);
        if found.is_none() {
            log::warn!("selected item '{}' not found", id);
        }
        found
    });

    RenderOptions {
        page_count: document.page_count,
        selected,
        mark_editable: false,
    }
}

/// Lay out and paint a document, returning the recorded draw operations.
///
/// This is the primary entry point.
pub fn render(document: &ReportDocument, metrics: DeviceMetrics) -> Result<Vec<DrawOp>, ReportError> {
    let mut font_context = FontContext::new();
    document.register_fonts(&mut font_context);

    let tree = layout_document(document, &font_context)?;
    let painter = Painter::new(&font_context, render_options(document, &tree));
    let mut surface = RecordingSurface::new(metrics);
    painter.draw_tree(&tree, &mut surface)?;
    Ok(surface.into_ops())
}

/// Render a document described as JSON.
pub fn render_json(json: &str, metrics: DeviceMetrics) -> Result<Vec<DrawOp>, ReportError> {
    let document = ReportDocument::from_json(json)?;
    render(&document, metrics)
}
