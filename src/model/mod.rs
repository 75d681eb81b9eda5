//! # Report Model
//!
//! The input representation: a report document holding page geometry, the
//! total page count used by `@{n}` tokens, custom fonts, and a tree of report
//! items. Items are read-only for the duration of a render cycle; the box
//! tree built from them owns all mutable layout state.
//!
//! All lengths here are document units (millimetres) except font sizes and
//! pen widths, which are printer points.

use serde::{Deserialize, Serialize};

use crate::error::ReportError;
use crate::font::FontContext;
use crate::geometry::Rect;
use crate::style::{Alignment, Color, Inset, LayoutAxis, Pen, Sides, TextStyle};

/// A complete report ready for layout and paint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDocument {
    /// Page size. Defaults to A4.
    #[serde(default)]
    pub page: PageSize,

    /// Total number of pages, substituted for `@{n}` in text items.
    #[serde(default = "default_page_count")]
    pub page_count: u32,

    /// The page root. Usually a `Report` item.
    pub root: ReportItem,

    /// Custom fonts to register before layout.
    #[serde(default)]
    pub fonts: Vec<FontEntry>,

    /// Id of the item to highlight as selected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<String>,
}

fn default_page_count() -> u32 {
    1
}

impl ReportDocument {
    /// Parse a document from JSON and normalise it.
    pub fn from_json(json: &str) -> Result<Self, ReportError> {
        let mut document: ReportDocument = serde_json::from_str(json)?;
        document.root.normalize();
        Ok(document)
    }

    /// The page rectangle in mm, anchored at the origin.
    pub fn page_rect(&self) -> Rect {
        let (width, height) = self.page.dimensions();
        Rect::new(0.0, 0.0, width, height)
    }

    /// Register every custom font with the context. Fonts that fail to
    /// decode are logged and skipped; text then measures with the fallback.
    pub fn register_fonts(&self, font_context: &mut FontContext) {
        use base64::Engine;
        for entry in &self.fonts {
            let b64 = match entry.src.find(";base64,") {
                Some(pos) => &entry.src[pos + 8..],
                None => entry.src.as_str(),
            };
            match base64::engine::general_purpose::STANDARD.decode(b64.trim()) {
                Ok(data) => {
                    font_context
                        .registry_mut()
                        .register(&entry.family, entry.weight, entry.italic, &data);
                }
                Err(e) => log::warn!("font '{}' has invalid base64 data: {}", entry.family, e),
            }
        }
    }
}

/// A custom font to register with the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontEntry {
    /// Font family name (e.g. "Inter", "Roboto").
    pub family: String,
    /// Base64-encoded font data, or a data URI (e.g. "data:font/ttf;base64,...").
    pub src: String,
    #[serde(default = "default_weight")]
    pub weight: u32,
    #[serde(default)]
    pub italic: bool,
}

fn default_weight() -> u32 {
    400
}

/// Standard page sizes in millimetres.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum PageSize {
    #[default]
    A4,
    A3,
    A5,
    Letter,
    Legal,
    Custom {
        width: f64,
        height: f64,
    },
}

impl PageSize {
    /// Returns (width, height) in mm.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            PageSize::A4 => (210.0, 297.0),
            PageSize::A3 => (297.0, 420.0),
            PageSize::A5 => (148.0, 210.0),
            PageSize::Letter => (215.9, 279.4),
            PageSize::Legal => (215.9, 355.6),
            PageSize::Custom { width, height } => (*width, *height),
        }
    }
}

/// One element of the report tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportItem {
    /// What kind of item this is.
    #[serde(default)]
    pub kind: ItemKind,

    /// Direction children flow in.
    #[serde(default)]
    pub layout: LayoutAxis,

    #[serde(default)]
    pub alignment: Alignment,

    /// Margin applied on all four sides before children are placed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inset: Option<Inset>,

    /// Share of the parent's free height; `Some(0.0)` takes an equal part of
    /// whatever the explicit ratios leave over. `None` means a fixed item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_ratio: Option<f64>,

    /// Declared width in mm.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,

    /// Declared height in mm.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<Color>,

    /// Pen shared by all four sides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border: Option<Pen>,

    /// Per-side pens overriding `border`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub borders: Option<Sides<Pen>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_style: Option<TextStyle>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Marks a text item as bound to an editable source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edit_id: Option<String>,

    #[serde(default)]
    pub children: Vec<ReportItem>,
}

/// The closed set of item kinds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ItemKind {
    /// A plain container.
    #[default]
    Frame,
    /// Wrapped text. `@{n}` is replaced with the page count.
    Text { text: String },
    /// A checkbox mark; the payload must be `@{check:<digit>}`.
    Check { text: String },
    /// A raster image or vector picture scaled onto the item rectangle.
    Image {
        payload: ImagePayload,
        #[serde(default, rename = "suppressPrint")]
        suppress_print: bool,
    },
    /// The page root.
    Report,
}

impl ItemKind {
    pub fn name(&self) -> &'static str {
        match self {
            ItemKind::Frame => "Frame",
            ItemKind::Text { .. } => "Text",
            ItemKind::Check { .. } => "Check",
            ItemKind::Image { .. } => "Image",
            ItemKind::Report => "Report",
        }
    }
}

/// Source of an image item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ImagePayload {
    /// Data URI, file path, or bare base64 of a JPEG/PNG.
    Raster { src: String },
    /// SVG markup.
    Svg { content: String },
}

impl ReportItem {
    fn with_kind(kind: ItemKind, children: Vec<ReportItem>) -> Self {
        Self {
            kind,
            children,
            ..Default::default()
        }
    }

    /// Create a Frame item with children.
    pub fn frame(children: Vec<ReportItem>) -> Self {
        Self::with_kind(ItemKind::Frame, children)
    }

    /// Create a Report (page root) item with children.
    pub fn report(children: Vec<ReportItem>) -> Self {
        Self::with_kind(ItemKind::Report, children)
    }

    pub fn text(text: &str) -> Self {
        Self::with_kind(
            ItemKind::Text {
                text: text.to_string(),
            },
            vec![],
        )
    }

    /// Create a Check item from a raw payload.
    pub fn check(payload: &str) -> Self {
        Self::with_kind(
            ItemKind::Check {
                text: payload.to_string(),
            },
            vec![],
        )
    }

    pub fn raster(src: &str) -> Self {
        Self::with_kind(
            ItemKind::Image {
                payload: ImagePayload::Raster {
                    src: src.to_string(),
                },
                suppress_print: false,
            },
            vec![],
        )
    }

    pub fn svg(content: &str) -> Self {
        Self::with_kind(
            ItemKind::Image {
                payload: ImagePayload::Svg {
                    content: content.to_string(),
                },
                suppress_print: false,
            },
            vec![],
        )
    }

    pub fn with_layout(mut self, layout: LayoutAxis) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn with_inset(mut self, horizontal: f64, vertical: f64) -> Self {
        self.inset = Some(Inset::new(horizontal, vertical));
        self
    }

    pub fn with_fill_ratio(mut self, ratio: f64) -> Self {
        self.fill_ratio = Some(ratio);
        self
    }

    pub fn with_width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }

    pub fn with_height(mut self, height: f64) -> Self {
        self.height = Some(height);
        self
    }

    pub fn with_size(self, width: f64, height: f64) -> Self {
        self.with_width(width).with_height(height)
    }

    pub fn with_fill(mut self, color: Color) -> Self {
        self.fill = Some(color);
        self
    }

    pub fn with_border(mut self, pen: Pen) -> Self {
        self.border = Some(pen);
        self
    }

    pub fn with_borders(mut self, borders: Sides<Pen>) -> Self {
        self.borders = Some(borders);
        self
    }

    pub fn with_text_style(mut self, style: TextStyle) -> Self {
        self.text_style = Some(style);
        self
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_edit_id(mut self, edit_id: &str) -> Self {
        self.edit_id = Some(edit_id.to_string());
        self
    }

    /// Marks an image item as screen-only.
    pub fn suppress_print(mut self) -> Self {
        if let ItemKind::Image { suppress_print, .. } = &mut self.kind {
            *suppress_print = true;
        }
        self
    }

    /// Fix up values the layout engine does not accept, recursively.
    /// A negative fill ratio means "not a spring".
    pub fn normalize(&mut self) {
        if self.fill_ratio.is_some_and(|r| r < 0.0 || r.is_nan()) {
            log::warn!(
                "negative fill ratio on {} item {:?}, treating as fixed",
                self.kind.name(),
                self.id
            );
            self.fill_ratio = None;
        }
        for child in &mut self.children {
            child.normalize();
        }
    }
}
