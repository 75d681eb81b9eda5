//! # Style System
//!
//! Visual attributes of report items: fill colour, border pens, text style,
//! alignment flags and the child flow axis.
//!
//! Items carry these as optional values. Most of them are strictly local;
//! the text style is the exception and is inherited from the nearest ancestor
//! that defines one (see [`crate::boxtree::BoxTree::effective_text_style`]).

use serde::{Deserialize, Serialize};

/// An RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "ColorRepr")]
pub struct Color {
    pub r: f64, // 0.0 - 1.0
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

/// Accepted JSON spellings of a colour: `"#rrggbb"`, `"#rgb"`, a few
/// names, or an explicit `{ r, g, b, a }` object.
#[derive(Deserialize)]
#[serde(untagged)]
enum ColorRepr {
    Named(String),
    Rgba {
        r: f64,
        g: f64,
        b: f64,
        #[serde(default = "opaque")]
        a: f64,
    },
}

fn opaque() -> f64 {
    1.0
}

impl From<ColorRepr> for Color {
    fn from(repr: ColorRepr) -> Self {
        match repr {
            ColorRepr::Named(s) => Color::parse(&s).unwrap_or(Color::BLACK),
            ColorRepr::Rgba { r, g, b, a } => Color { r, g, b, a },
        }
    }
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };
    pub const YELLOW: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 0.0,
        a: 1.0,
    };
    pub const MAROON: Color = Color {
        r: 128.0 / 255.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
    /// Fill used for the interactively selected frame (`#FFEEEE`).
    pub const SELECTION: Color = Color {
        r: 1.0,
        g: 238.0 / 255.0,
        b: 238.0 / 255.0,
        a: 1.0,
    };

    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn hex(hex: &str) -> Self {
        Self::parse_hex(hex).unwrap_or(Color::BLACK)
    }

    fn parse_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        let (r, g, b) = match hex.len() {
            3 => {
                let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).ok()?;
                let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).ok()?;
                let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).ok()?;
                (r, g, b)
            }
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                (r, g, b)
            }
            _ => return None,
        };
        Some(Self {
            r: r as f64 / 255.0,
            g: g as f64 / 255.0,
            b: b as f64 / 255.0,
            a: 1.0,
        })
    }

    /// Parse a hex colour or one of the named colours reports use.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.starts_with('#') {
            return Self::parse_hex(s);
        }
        match s.to_lowercase().as_str() {
            "black" => Some(Color::BLACK),
            "white" => Some(Color::WHITE),
            "yellow" => Some(Color::YELLOW),
            "maroon" => Some(Color::MAROON),
            "red" => Some(Color::rgb(1.0, 0.0, 0.0)),
            "green" => Some(Color::rgb(0.0, 128.0 / 255.0, 0.0)),
            "blue" => Some(Color::rgb(0.0, 0.0, 1.0)),
            "gray" | "grey" => Some(Color::rgb(128.0 / 255.0, 128.0 / 255.0, 128.0 / 255.0)),
            "silver" => Some(Color::rgb(192.0 / 255.0, 192.0 / 255.0, 192.0 / 255.0)),
            "teal" => Some(Color::rgb(0.0, 128.0 / 255.0, 128.0 / 255.0)),
            _ => Self::parse_hex(s),
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PenStyle {
    NoPen,
    #[default]
    Solid,
    Dash,
    Dot,
}

/// A line stroke. Width is in printer points (1/72 inch); zero width
/// means the stroke is not drawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pen {
    #[serde(default = "default_pen_width")]
    pub width: f64,
    #[serde(default)]
    pub color: Color,
    #[serde(default)]
    pub style: PenStyle,
}

fn default_pen_width() -> f64 {
    1.0
}

impl Pen {
    pub fn solid(width: f64, color: Color) -> Self {
        Self {
            width,
            color,
            style: PenStyle::Solid,
        }
    }

    /// True if drawing with this pen leaves a mark.
    pub fn is_visible(&self) -> bool {
        self.width != 0.0 && self.style != PenStyle::NoPen
    }
}

/// Per-side values (left, top, right, bottom).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sides<T> {
    pub left: Option<T>,
    pub top: Option<T>,
    pub right: Option<T>,
    pub bottom: Option<T>,
}

impl<T> Default for Sides<T> {
    fn default() -> Self {
        Self {
            left: None,
            top: None,
            right: None,
            bottom: None,
        }
    }
}

impl<T: Copy> Sides<T> {
    pub fn uniform(v: T) -> Self {
        Self {
            left: Some(v),
            top: Some(v),
            right: Some(v),
            bottom: Some(v),
        }
    }

    /// Per-side override first, shared default second.
    pub fn resolve(overrides: Option<&Sides<T>>, shared: Option<T>) -> Sides<T> {
        let pick = |side: Option<T>| side.or(shared);
        match overrides {
            Some(o) => Sides {
                left: pick(o.left),
                top: pick(o.top),
                right: pick(o.right),
                bottom: pick(o.bottom),
            },
            None => Sides {
                left: shared,
                top: shared,
                right: shared,
                bottom: shared,
            },
        }
    }
}

/// Font selection. Size is in printer points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Font {
    #[serde(default = "default_family")]
    pub family: String,
    #[serde(default = "default_font_size")]
    pub size: f64,
    #[serde(default = "default_weight")]
    pub weight: u32,
    #[serde(default)]
    pub italic: bool,
}

fn default_family() -> String {
    "Helvetica".to_string()
}

fn default_font_size() -> f64 {
    10.0
}

fn default_weight() -> u32 {
    400
}

impl Default for Font {
    fn default() -> Self {
        Self {
            family: default_family(),
            size: default_font_size(),
            weight: default_weight(),
            italic: false,
        }
    }
}

/// Text appearance: font plus the pen colour used to draw glyphs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    #[serde(default)]
    pub font: Font,
    #[serde(default)]
    pub color: Color,
}

/// Direction children flow in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayoutAxis {
    Horizontal,
    #[default]
    Vertical,
    /// Children are stacked at the container origin.
    None,
}

impl LayoutAxis {
    pub fn orthogonal(&self) -> LayoutAxis {
        match self {
            LayoutAxis::Horizontal => LayoutAxis::Vertical,
            LayoutAxis::Vertical => LayoutAxis::Horizontal,
            LayoutAxis::None => LayoutAxis::None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VAlign {
    #[default]
    Top,
    Center,
    Bottom,
}

impl HAlign {
    /// Share of the free space placed before the content.
    pub fn fraction(&self) -> f64 {
        match self {
            HAlign::Left => 0.0,
            HAlign::Center => 0.5,
            HAlign::Right => 1.0,
        }
    }
}

impl VAlign {
    pub fn fraction(&self) -> f64 {
        match self {
            VAlign::Top => 0.0,
            VAlign::Center => 0.5,
            VAlign::Bottom => 1.0,
        }
    }
}

/// Alignment flags, one per axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alignment {
    #[serde(default)]
    pub horizontal: HAlign,
    #[serde(default)]
    pub vertical: VAlign,
}

impl Alignment {
    pub fn new(horizontal: HAlign, vertical: VAlign) -> Self {
        Self {
            horizontal,
            vertical,
        }
    }

    /// Left/top alignment needs no adjustment at all.
    pub fn is_default(&self) -> bool {
        self.horizontal == HAlign::Left && self.vertical == VAlign::Top
    }

    /// Alignment fraction along the given axis.
    pub fn fraction(&self, axis: LayoutAxis) -> f64 {
        match axis {
            LayoutAxis::Horizontal => self.horizontal.fraction(),
            LayoutAxis::Vertical => self.vertical.fraction(),
            LayoutAxis::None => 0.0,
        }
    }
}

/// Margins applied inside a container before its children are placed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Inset {
    #[serde(default)]
    pub horizontal: f64,
    #[serde(default)]
    pub vertical: f64,
}

impl Inset {
    pub fn new(horizontal: f64, vertical: f64) -> Self {
        Self {
            horizontal,
            vertical,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_hex() {
        let c = Color::hex("#FFEEEE");
        assert_eq!(c, Color::SELECTION);
        let short = Color::hex("#fff");
        assert_eq!(short, Color::WHITE);
    }

    #[test]
    fn test_color_named() {
        assert_eq!(Color::parse("maroon"), Some(Color::MAROON));
        assert_eq!(Color::parse("no-such-colour"), None);
    }

    #[test]
    fn test_color_deserialize_forms() {
        let a: Color = serde_json::from_str("\"#ff0000\"").unwrap();
        assert_eq!(a, Color::rgb(1.0, 0.0, 0.0));
        let b: Color = serde_json::from_str("{\"r\": 0.5, \"g\": 0.5, \"b\": 0.5}").unwrap();
        assert_eq!(b.a, 1.0);
    }

    #[test]
    fn test_pen_visibility() {
        assert!(Pen::solid(0.5, Color::BLACK).is_visible());
        assert!(!Pen::solid(0.0, Color::BLACK).is_visible());
        let no_pen = Pen {
            style: PenStyle::NoPen,
            ..Pen::solid(1.0, Color::BLACK)
        };
        assert!(!no_pen.is_visible());
    }

    #[test]
    fn test_sides_resolve_override_wins() {
        let shared = Pen::solid(1.0, Color::BLACK);
        let thick = Pen::solid(3.0, Color::BLACK);
        let overrides = Sides {
            bottom: Some(thick),
            ..Default::default()
        };
        let resolved = Sides::resolve(Some(&overrides), Some(shared));
        assert_eq!(resolved.top, Some(shared));
        assert_eq!(resolved.bottom, Some(thick));

        let none: Sides<Pen> = Sides::resolve(None, None);
        assert!(none.left.is_none());
    }

    #[test]
    fn test_alignment_fraction() {
        let a = Alignment::new(HAlign::Center, VAlign::Bottom);
        assert_eq!(a.fraction(LayoutAxis::Horizontal), 0.5);
        assert_eq!(a.fraction(LayoutAxis::Vertical), 1.0);
        assert!(!a.is_default());
        assert!(Alignment::default().is_default());
    }
}
