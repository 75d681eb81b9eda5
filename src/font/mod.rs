//! # Font Metrics
//!
//! Character advance widths and vertical metrics for text reflow and
//! checkbox placement.
//!
//! Standard families (Helvetica, Courier) come with built-in metrics so a
//! report renders without any font files. Custom TrueType/OpenType fonts can
//! be registered at runtime; their metrics are read with ttf-parser. Unknown
//! families fall back to Helvetica.

mod metrics;

pub use metrics::StandardFontMetrics;
use std::collections::HashMap;

use crate::style::Font;

/// A font registry that maps font family + weight + style to font data.
pub struct FontRegistry {
    fonts: HashMap<FontKey, FontData>,
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct FontKey {
    pub family: String,
    pub weight: u32,
    pub italic: bool,
}

#[derive(Debug, Clone)]
pub enum FontData {
    /// A built-in family with tabulated metrics.
    Standard(StandardFont),
    /// A TrueType/OpenType font registered by the document.
    Custom {
        /// Parsed metrics from ttf-parser, if the data was readable.
        metrics: Option<CustomFontMetrics>,
    },
}

/// Parsed metrics from a TrueType/OpenType font via ttf-parser.
#[derive(Debug, Clone)]
pub struct CustomFontMetrics {
    pub units_per_em: u16,
    pub advance_widths: HashMap<char, u16>,
    pub default_advance: u16,
    pub ascender: i16,
    pub descender: i16,
    pub line_gap: i16,
}

impl CustomFontMetrics {
    /// Get the advance width of a character in points.
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        let w = self
            .advance_widths
            .get(&ch)
            .copied()
            .unwrap_or(self.default_advance);
        (w as f64 / self.units_per_em as f64) * font_size
    }

    /// Parse metrics from font data using ttf-parser.
    pub fn from_font_data(data: &[u8]) -> Option<Self> {
        let face = ttf_parser::Face::parse(data, 0).ok()?;
        let units_per_em = face.units_per_em();

        let mut advance_widths = HashMap::new();
        let mut default_advance = 0u16;

        // Latin, Greek, Cyrillic and general punctuation cover report text
        for code in 32u32..=0x2FFF {
            if let Some(ch) = char::from_u32(code) {
                if let Some(glyph_id) = face.glyph_index(ch) {
                    let advance = face.glyph_hor_advance(glyph_id).unwrap_or(0);
                    advance_widths.insert(ch, advance);
                    if ch == ' ' {
                        default_advance = advance;
                    }
                }
            }
        }

        if default_advance == 0 {
            default_advance = units_per_em / 2;
        }

        Some(CustomFontMetrics {
            units_per_em,
            advance_widths,
            default_advance,
            ascender: face.ascender(),
            descender: face.descender(),
            line_gap: face.line_gap(),
        })
    }

    fn vertical(&self) -> VerticalMetrics {
        let em = self.units_per_em as f64;
        VerticalMetrics {
            ascent: self.ascender as f64 / em,
            descent: -(self.descender as f64) / em,
            line_gap: self.line_gap as f64 / em,
        }
    }
}

/// Built-in font families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    Courier,
}

impl StandardFont {
    pub fn metrics(&self) -> &'static StandardFontMetrics {
        match self {
            Self::Helvetica => &metrics::HELVETICA,
            Self::HelveticaBold => &metrics::HELVETICA_BOLD,
            Self::Courier => &metrics::COURIER,
        }
    }
}

/// Ascent, descent and line gap as fractions of the em size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerticalMetrics {
    pub ascent: f64,
    pub descent: f64,
    pub line_gap: f64,
}

impl Default for FontRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FontRegistry {
    pub fn new() -> Self {
        let mut fonts = HashMap::new();

        let standard_mappings = vec![
            (("Helvetica", 400), StandardFont::Helvetica),
            (("Helvetica", 700), StandardFont::HelveticaBold),
            (("Courier", 400), StandardFont::Courier),
            // Monospace: bold glyphs keep the regular advance width
            (("Courier", 700), StandardFont::Courier),
        ];

        for ((family, weight), font) in standard_mappings {
            // Oblique variants share the upright advance widths
            for italic in [false, true] {
                fonts.insert(
                    FontKey {
                        family: family.to_string(),
                        weight,
                        italic,
                    },
                    FontData::Standard(font),
                );
            }
        }

        Self { fonts }
    }

    /// Look up a font, falling back to Helvetica if not found.
    pub fn resolve(&self, family: &str, weight: u32, italic: bool) -> &FontData {
        let key = FontKey {
            family: family.to_string(),
            weight,
            italic,
        };
        if let Some(font) = self.fonts.get(&key) {
            return font;
        }

        // Try with normalized weight (snap to 400 or 700)
        let snapped_weight = if weight >= 600 { 700 } else { 400 };
        let key = FontKey {
            family: family.to_string(),
            weight: snapped_weight,
            italic,
        };
        if let Some(font) = self.fonts.get(&key) {
            return font;
        }

        match self.fonts.get(&FontKey {
            family: "Helvetica".to_string(),
            weight: snapped_weight,
            italic,
        }) {
            Some(font) => font,
            None => &HELVETICA_FALLBACK,
        }
    }

    /// Register a custom font from raw TTF/OTF bytes. Returns false if the
    /// data could not be parsed; measurement then falls back to Helvetica.
    pub fn register(&mut self, family: &str, weight: u32, italic: bool, data: &[u8]) -> bool {
        let metrics = CustomFontMetrics::from_font_data(data);
        let parsed = metrics.is_some();
        if !parsed {
            log::warn!("font '{}' ({}) could not be parsed", family, weight);
        }
        self.fonts.insert(
            FontKey {
                family: family.to_string(),
                weight,
                italic,
            },
            FontData::Custom { metrics },
        );
        parsed
    }
}

static HELVETICA_FALLBACK: FontData = FontData::Standard(StandardFont::Helvetica);

/// Shared font context used by layout and paint.
/// Provides text measurement in points.
#[derive(Default)]
pub struct FontContext {
    registry: FontRegistry,
}

impl FontContext {
    pub fn new() -> Self {
        Self {
            registry: FontRegistry::new(),
        }
    }

    /// Get the advance width of a single character in points.
    pub fn char_width(&self, ch: char, font: &Font) -> f64 {
        match self.registry.resolve(&font.family, font.weight, font.italic) {
            FontData::Standard(std_font) => std_font.metrics().char_width(ch, font.size),
            FontData::Custom {
                metrics: Some(m), ..
            } => m.char_width(ch, font.size),
            FontData::Custom { metrics: None } => {
                StandardFont::Helvetica.metrics().char_width(ch, font.size)
            }
        }
    }

    /// Measure the width of a string in points.
    pub fn measure_string(&self, text: &str, font: &Font) -> f64 {
        text.chars().map(|ch| self.char_width(ch, font)).sum()
    }

    fn vertical_metrics(&self, font: &Font) -> VerticalMetrics {
        match self.registry.resolve(&font.family, font.weight, font.italic) {
            FontData::Standard(std_font) => std_font.metrics().vertical,
            FontData::Custom {
                metrics: Some(m), ..
            } => m.vertical(),
            FontData::Custom { metrics: None } => StandardFont::Helvetica.metrics().vertical,
        }
    }

    /// Height of one line (ascent + descent) in points.
    pub fn line_height(&self, font: &Font) -> f64 {
        let v = self.vertical_metrics(font);
        (v.ascent + v.descent) * font.size
    }

    /// Extra space between consecutive lines in points.
    pub fn leading(&self, font: &Font) -> f64 {
        self.vertical_metrics(font).line_gap * font.size
    }

    pub fn ascent(&self, font: &Font) -> f64 {
        self.vertical_metrics(font).ascent * font.size
    }

    /// Access the underlying font registry mutably.
    pub fn registry_mut(&mut self) -> &mut FontRegistry {
        &mut self.registry
    }
}
