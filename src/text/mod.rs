//! # Text Layout
//!
//! Substitution tokens and line breaking for text nodes.
//!
//! Wrapping is "word boundary or anywhere": lines break at UAX#14 break
//! opportunities when possible, and a word wider than the line is split
//! between characters rather than overflowing. Explicit newlines always
//! break.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use unicode_linebreak::{linebreaks, BreakOpportunity};

use crate::font::FontContext;
use crate::style::{Font, HAlign};

/// Replaced with the total page count in text nodes.
pub const PAGE_COUNT_TOKEN: &str = "@{n}";

static CHECK_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^@\{check:(\d)\}$").expect("checkbox pattern is a valid regex")
});

/// Replace the page-count token with `page_count`. Checkbox tokens are left
/// alone; they only mean something in checkbox nodes.
pub fn substitute_page_count(text: &str, page_count: u32) -> Cow<'_, str> {
    if text.contains('@') && text.contains(PAGE_COUNT_TOKEN) {
        Cow::Owned(text.replace(PAGE_COUNT_TOKEN, &page_count.to_string()))
    } else {
        Cow::Borrowed(text)
    }
}

/// Parse a checkbox payload. `Some(true)` for `@{check:1}`, `Some(false)`
/// for any other digit, `None` if the text is not a checkbox payload.
pub fn parse_check(text: &str) -> Option<bool> {
    CHECK_PATTERN
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|digit| digit.as_str() == "1")
}

/// A line of text after line-breaking. Widths are in points.
#[derive(Debug, Clone)]
pub struct BrokenLine {
    /// The text as a string.
    pub text: String,
    /// Total width of the line, trailing spaces excluded.
    pub width: f64,
}

/// A positioned line inside a [`TextBlock`], in device units relative to
/// the block origin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextLine {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Fully laid-out text ready to hand to a surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextBlock {
    pub lines: Vec<TextLine>,
    /// Total height including leading between lines.
    pub height: f64,
}

impl TextBlock {
    /// All line texts joined with newlines.
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Compute UAX#14 break opportunities indexed by char position.
///
/// Returns a vec of length `text.chars().count()`. Each entry is the break
/// opportunity *before* that character position. Index 0 is always `None`.
fn compute_break_opportunities(text: &str) -> Vec<Option<BreakOpportunity>> {
    let char_count = text.chars().count();
    let mut result = vec![None; char_count];

    // linebreaks() yields byte offsets of the start of the next segment
    let byte_to_char: Vec<usize> = {
        let mut map = vec![0usize; text.len() + 1];
        let mut char_idx = 0;
        for (byte_idx, _) in text.char_indices() {
            map[byte_idx] = char_idx;
            char_idx += 1;
        }
        map[text.len()] = char_idx;
        map
    };

    for (byte_offset, opp) in linebreaks(text) {
        let char_idx = byte_to_char[byte_offset];
        if char_idx < char_count {
            result[char_idx] = Some(opp);
        }
    }

    result
}

fn is_newline(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

#[derive(Default)]
pub struct TextLayout;

impl TextLayout {
    pub fn new() -> Self {
        Self
    }

    /// Break a string into lines that fit within `max_width` points.
    pub fn break_into_lines(
        &self,
        font_context: &FontContext,
        text: &str,
        max_width: f64,
        font: &Font,
    ) -> Vec<BrokenLine> {
        if text.is_empty() {
            return vec![BrokenLine {
                text: String::new(),
                width: 0.0,
            }];
        }

        let chars: Vec<char> = text.chars().collect();
        let char_widths: Vec<f64> = chars
            .iter()
            .map(|&ch| {
                if is_newline(ch) {
                    0.0
                } else {
                    font_context.char_width(ch, font)
                }
            })
            .collect();
        let break_opps = compute_break_opportunities(text);

        let mut lines = Vec::new();
        let mut line_start = 0;
        let mut line_width = 0.0;
        let mut last_break_point: Option<usize> = None;

        for (i, &ch) in chars.iter().enumerate() {
            let char_width = char_widths[i];

            if i > 0 {
                match break_opps[i] {
                    Some(BreakOpportunity::Mandatory) => {
                        let end = if is_newline(chars[i - 1]) { i - 1 } else { i };
                        lines.push(self.make_line(&chars[line_start..end], &char_widths[line_start..end]));
                        line_start = i;
                        line_width = 0.0;
                        last_break_point = None;
                    }
                    Some(BreakOpportunity::Allowed) => {
                        last_break_point = Some(i - 1);
                    }
                    None => {}
                }
            }

            if is_newline(ch) {
                // A CR of a CRLF pair belongs to the same break
                if i == line_start {
                    line_start = i + 1;
                }
                continue;
            }

            if line_width + char_width > max_width && line_start < i {
                if let Some(bp) = last_break_point.filter(|&bp| bp >= line_start) {
                    let break_at = bp + 1;
                    lines.push(self.make_line(&chars[line_start..break_at], &char_widths[line_start..break_at]));
                    line_start = break_at;
                    line_width = char_widths[line_start..=i].iter().sum();
                    last_break_point = None;
                    continue;
                }

                // No word boundary on this line: break anywhere
                lines.push(self.make_line(&chars[line_start..i], &char_widths[line_start..i]));
                line_start = i;
                line_width = char_width;
                last_break_point = None;
                continue;
            }

            line_width += char_width;
        }

        if line_start < chars.len() {
            lines.push(self.make_line(&chars[line_start..], &char_widths[line_start..]));
        } else if chars.last().copied().is_some_and(is_newline) {
            // Trailing newline opens an empty last line
            lines.push(self.make_line(&[], &[]));
        }

        lines
    }

    fn make_line(&self, chars: &[char], widths: &[f64]) -> BrokenLine {
        let visible: Vec<(char, f64)> = chars
            .iter()
            .zip(widths.iter())
            .filter(|(c, _)| !is_newline(**c))
            .map(|(c, w)| (*c, *w))
            .collect();
        let mut width: f64 = visible.iter().map(|(_, w)| w).sum();

        // Trailing spaces do not count towards the width
        for (c, w) in visible.iter().rev() {
            if *c != ' ' {
                break;
            }
            width -= w;
        }

        BrokenLine {
            text: visible.iter().map(|(c, _)| c).collect(),
            width,
        }
    }

    /// Lay out `text` into a block `width` device units wide.
    ///
    /// `scale_x` / `scale_y` are device units per point on each axis. Line
    /// heights accumulate line height plus leading between lines; each line is
    /// placed horizontally per `align`.
    pub fn layout_block(
        &self,
        font_context: &FontContext,
        text: &str,
        font: &Font,
        width: f64,
        scale_x: f64,
        scale_y: f64,
        align: HAlign,
    ) -> TextBlock {
        let max_width_pt = if scale_x > 0.0 { width / scale_x } else { 0.0 };
        let line_height = font_context.line_height(font) * scale_y;
        let leading = font_context.leading(font) * scale_y;

        let mut height = 0.0;
        let mut lines = Vec::new();
        for broken in self.break_into_lines(font_context, text, max_width_pt, font) {
            if height > 0.0 {
                height += leading;
            }
            let line_width = broken.width * scale_x;
            let x = ((width - line_width) * align.fraction()).max(0.0);
            lines.push(TextLine {
                text: broken.text,
                x,
                y: height,
                width: line_width,
                height: line_height,
            });
            height += line_height;
        }

        TextBlock { lines, height }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn helvetica(size: f64) -> Font {
        Font {
            size,
            ..Font::default()
        }
    }

    #[test]
    fn test_single_line() {
        let lines = TextLayout::new().break_into_lines(&FontContext::new(), "Hello", 200.0, &helvetica(12.0));
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "Hello");
    }

    #[test]
    fn test_line_break_at_space() {
        let lines =
            TextLayout::new().break_into_lines(&FontContext::new(), "Hello World", 40.0, &helvetica(12.0));
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text.trim_end(), "Hello");
        assert_eq!(lines[1].text, "World");
    }

    #[test]
    fn test_long_word_breaks_anywhere() {
        let fc = FontContext::new();
        let font = helvetica(10.0);
        let lines = TextLayout::new().break_into_lines(&fc, "Supercalifragilistic", 30.0, &font);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(line.width <= 30.0 + 1e-9, "line '{}' too wide", line.text);
        }
        let joined: String = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(joined, "Supercalifragilistic");
    }

    #[test]
    fn test_explicit_newline() {
        let lines =
            TextLayout::new().break_into_lines(&FontContext::new(), "Hello\nWorld", 200.0, &helvetica(12.0));
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "Hello");
        assert_eq!(lines[1].text, "World");
    }

    #[test]
    fn test_empty_string() {
        let lines = TextLayout::new().break_into_lines(&FontContext::new(), "", 200.0, &helvetica(12.0));
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].width, 0.0);
    }

    #[test]
    fn test_page_count_substitution() {
        assert_eq!(substitute_page_count("Page @{n}", 7), "Page 7");
        assert_eq!(substitute_page_count("@{n}/@{n}", 3), "3/3");
        assert!(matches!(substitute_page_count("plain", 7), Cow::Borrowed(_)));
        // checkbox tokens are not resolved in ordinary text
        assert_eq!(substitute_page_count("@{check:1}", 7), "@{check:1}");
    }

    #[test]
    fn test_parse_check() {
        assert_eq!(parse_check("@{check:1}"), Some(true));
        assert_eq!(parse_check("@{check:0}"), Some(false));
        assert_eq!(parse_check("@{check:7}"), Some(false));
        assert_eq!(parse_check("@{check:12}"), None);
        assert_eq!(parse_check(" @{check:1}"), None);
        assert_eq!(parse_check("yes"), None);
    }

    #[test]
    fn test_layout_block_accumulates_leading() {
        let fc = FontContext::new();
        let font = helvetica(10.0);
        let block = TextLayout::new().layout_block(&fc, "a\nb\nc", &font, 500.0, 1.0, 1.0, HAlign::Left);
        assert_eq!(block.lines.len(), 3);
        let lh = fc.line_height(&font);
        let lead = fc.leading(&font);
        assert!((block.lines[1].y - (lh + lead)).abs() < 1e-9);
        assert!((block.height - (3.0 * lh + 2.0 * lead)).abs() < 1e-9);
    }

    #[test]
    fn test_layout_block_right_aligned() {
        let fc = FontContext::new();
        let font = helvetica(10.0);
        let block = TextLayout::new().layout_block(&fc, "ab", &font, 100.0, 2.0, 2.0, HAlign::Right);
        let line = &block.lines[0];
        assert!((line.x + line.width - 100.0).abs() < 1e-9);
        assert!((line.width - fc.measure_string("ab", &font) * 2.0).abs() < 1e-9);
    }
}
