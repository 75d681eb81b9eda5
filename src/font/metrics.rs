//! Tabulated advance widths for the built-in families, in 1/1000 em
//! for the printable ASCII range.

use super::VerticalMetrics;

pub struct StandardFontMetrics {
    /// Widths for U+0020..=U+007E.
    pub widths: [u16; 95],
    /// Width used outside the tabulated range.
    pub default_width: u16,
    pub vertical: VerticalMetrics,
}

impl StandardFontMetrics {
    /// Advance width of `ch` in points.
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        let code = ch as u32;
        let w = if (32..=126).contains(&code) {
            self.widths[(code - 32) as usize]
        } else {
            self.default_width
        };
        w as f64 / 1000.0 * font_size
    }
}

const SANS_VERTICAL: VerticalMetrics = VerticalMetrics {
    ascent: 0.905,
    descent: 0.212,
    line_gap: 0.033,
};

#[rustfmt::skip]
pub static HELVETICA: StandardFontMetrics = StandardFontMetrics {
    widths: [
        278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556,                               // '0'..'9'
        278, 278, 584, 584, 584, 556, 1015,                                             // ':'..'@'
        667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,                // 'A'..'M'
        722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,                // 'N'..'Z'
        278, 278, 278, 469, 556, 333,                                                   // '['..'`'
        556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,                // 'a'..'m'
        556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,                // 'n'..'z'
        334, 260, 334, 584,                                                             // '{'..'~'
    ],
    default_width: 556,
    vertical: SANS_VERTICAL,
};

#[rustfmt::skip]
pub static HELVETICA_BOLD: StandardFontMetrics = StandardFontMetrics {
    widths: [
        278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
        333, 333, 584, 584, 584, 611, 975,
        722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
        722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
        333, 278, 333, 584, 556, 333,
        556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
        611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
        389, 280, 389, 584,
    ],
    default_width: 611,
    vertical: SANS_VERTICAL,
};

pub static COURIER: StandardFontMetrics = StandardFontMetrics {
    widths: [600; 95],
    default_width: 600,
    vertical: VerticalMetrics {
        ascent: 0.832,
        descent: 0.300,
        line_gap: 0.0,
    },
};
