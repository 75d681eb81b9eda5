//! # Vector Pictures
//!
//! Parses a subset of SVG into a recorded command list with a bounding
//! rectangle. Painting a picture translates by the negated top-left of that
//! bounding rectangle, so the picture's own coordinate origin never matters.
//!
//! Supports: rect, circle, ellipse, line, polyline, polygon, path, g (group).
//! Path commands: M, L, H, V, C, Q, Z (absolute + relative).

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Serialize;

use crate::geometry::Rect;
use crate::style::Color;

/// Drawing commands recorded in a picture.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PictureCommand {
    MoveTo(f64, f64),
    LineTo(f64, f64),
    CurveTo(f64, f64, f64, f64, f64, f64),
    ClosePath,
    SetFill(Color),
    SetStroke(Color, f64),
    Fill,
    Stroke,
    FillAndStroke,
    Save,
    Restore,
}

/// A recorded vector drawing and the rectangle its geometry covers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Picture {
    pub commands: Vec<PictureCommand>,
    pub bounds: Rect,
}

impl Picture {
    /// Parse SVG markup. Fails only on malformed XML; unknown elements are
    /// ignored.
    pub fn from_svg(content: &str) -> Result<Picture, String> {
        let mut builder = PictureBuilder::default();
        let mut reader = Reader::from_str(content);
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => builder.element(&e, true),
                Ok(Event::Empty(e)) => builder.element(&e, false),
                Ok(Event::End(e)) => {
                    if e.name().as_ref() == b"g" {
                        builder.end_group();
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(format!(
                        "Malformed SVG at position {}: {}",
                        reader.buffer_position(),
                        e
                    ))
                }
                _ => {}
            }
            buf.clear();
        }

        Ok(builder.finish())
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[derive(Clone, Copy)]
struct PaintState {
    fill: Option<Color>,
    stroke: Option<Color>,
    stroke_width: f64,
}

impl Default for PaintState {
    fn default() -> Self {
        Self {
            fill: Some(Color::BLACK),
            stroke: None,
            stroke_width: 1.0,
        }
    }
}

#[derive(Default)]
struct PictureBuilder {
    commands: Vec<PictureCommand>,
    states: Vec<PaintState>,
    bounds: Option<Rect>,
}

impl PictureBuilder {
    fn current(&self) -> PaintState {
        self.states.last().copied().unwrap_or_default()
    }

    fn element(&mut self, e: &BytesStart, is_start: bool) {
        let state = self.resolve_state(e);
        let tag = e.name();

        let path = match tag.as_ref() {
            b"g" => {
                if is_start {
                    self.commands.push(PictureCommand::Save);
                    self.states.push(state);
                }
                return;
            }
            b"rect" => {
                let x = attr_f64(e, "x");
                let y = attr_f64(e, "y");
                let w = attr_f64(e, "width");
                let h = attr_f64(e, "height");
                vec![
                    PictureCommand::MoveTo(x, y),
                    PictureCommand::LineTo(x + w, y),
                    PictureCommand::LineTo(x + w, y + h),
                    PictureCommand::LineTo(x, y + h),
                    PictureCommand::ClosePath,
                ]
            }
            b"circle" => {
                let r = attr_f64(e, "r");
                ellipse_path(attr_f64(e, "cx"), attr_f64(e, "cy"), r, r)
            }
            b"ellipse" => ellipse_path(
                attr_f64(e, "cx"),
                attr_f64(e, "cy"),
                attr_f64(e, "rx"),
                attr_f64(e, "ry"),
            ),
            b"line" => {
                let line = vec![
                    PictureCommand::MoveTo(attr_f64(e, "x1"), attr_f64(e, "y1")),
                    PictureCommand::LineTo(attr_f64(e, "x2"), attr_f64(e, "y2")),
                ];
                // Lines are never filled
                self.emit(PaintState { fill: None, ..state }, line);
                return;
            }
            b"polyline" | b"polygon" => {
                let points = parse_points(&attr(e, "points").unwrap_or_default());
                let Some((&(x0, y0), rest)) = points.split_first() else {
                    return;
                };
                let mut cmds = vec![PictureCommand::MoveTo(x0, y0)];
                cmds.extend(rest.iter().map(|&(x, y)| PictureCommand::LineTo(x, y)));
                if tag.as_ref() == b"polygon" {
                    cmds.push(PictureCommand::ClosePath);
                }
                cmds
            }
            b"path" => parse_path_data(&attr(e, "d").unwrap_or_default()),
            _ => return,
        };

        self.emit(state, path);
    }

    fn end_group(&mut self) {
        if self.states.pop().is_some() {
            self.commands.push(PictureCommand::Restore);
        }
    }

    fn resolve_state(&self, e: &BytesStart) -> PaintState {
        let inherited = self.current();
        let paint = |name: &str, fallback: Option<Color>| match attr(e, name) {
            Some(v) if v.trim() == "none" => None,
            Some(v) => parse_svg_color(&v).or(fallback),
            None => fallback,
        };
        PaintState {
            fill: paint("fill", inherited.fill),
            stroke: paint("stroke", inherited.stroke),
            stroke_width: attr(e, "stroke-width")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(inherited.stroke_width),
        }
    }

    fn emit(&mut self, state: PaintState, path: Vec<PictureCommand>) {
        if path.is_empty() || (state.fill.is_none() && state.stroke.is_none()) {
            return;
        }

        for cmd in &path {
            self.include(cmd);
        }

        self.commands.push(PictureCommand::Save);
        if let Some(color) = state.fill {
            self.commands.push(PictureCommand::SetFill(color));
        }
        if let Some(color) = state.stroke {
            self.commands.push(PictureCommand::SetStroke(color, state.stroke_width));
        }
        self.commands.extend(path);
        self.commands.push(match (state.fill, state.stroke) {
            (Some(_), Some(_)) => PictureCommand::FillAndStroke,
            (Some(_), None) => PictureCommand::Fill,
            _ => PictureCommand::Stroke,
        });
        self.commands.push(PictureCommand::Restore);
    }

    /// Grow the bounding rectangle by the points of one path command.
    /// Curve control points are included, which may overestimate.
    fn include(&mut self, cmd: &PictureCommand) {
        let points: Vec<(f64, f64)> = match *cmd {
            PictureCommand::MoveTo(x, y) | PictureCommand::LineTo(x, y) => vec![(x, y)],
            PictureCommand::CurveTo(x1, y1, x2, y2, x, y) => vec![(x1, y1), (x2, y2), (x, y)],
            _ => return,
        };
        for (x, y) in points {
            let point = Rect::new(x, y, 0.0, 0.0);
            self.bounds = Some(match self.bounds {
                Some(b) => b.union(&point),
                None => point,
            });
        }
    }

    fn finish(self) -> Picture {
        Picture {
            commands: self.commands,
            bounds: self.bounds.unwrap_or_default(),
        }
    }
}

/// Cubic bezier approximation of an ellipse.
fn ellipse_path(cx: f64, cy: f64, rx: f64, ry: f64) -> Vec<PictureCommand> {
    const KAPPA: f64 = 0.5522847498;
    let kx = rx * KAPPA;
    let ky = ry * KAPPA;

    vec![
        PictureCommand::MoveTo(cx + rx, cy),
        PictureCommand::CurveTo(cx + rx, cy + ky, cx + kx, cy + ry, cx, cy + ry),
        PictureCommand::CurveTo(cx - kx, cy + ry, cx - rx, cy + ky, cx - rx, cy),
        PictureCommand::CurveTo(cx - rx, cy - ky, cx - kx, cy - ry, cx, cy - ry),
        PictureCommand::CurveTo(cx + kx, cy - ry, cx + rx, cy - ky, cx + rx, cy),
        PictureCommand::ClosePath,
    ]
}

#[derive(Debug, Clone, PartialEq)]
enum PathToken {
    Command(char),
    Number(f64),
}

/// Split path data into command letters and numbers. A '-' starts a new
/// number unless it follows an exponent.
fn tokenize_path(d: &str) -> Vec<PathToken> {
    let mut tokens = Vec::new();
    let mut number = String::new();

    let flush = |number: &mut String, tokens: &mut Vec<PathToken>| {
        if let Ok(v) = number.parse::<f64>() {
            tokens.push(PathToken::Number(v));
        }
        number.clear();
    };

    for ch in d.chars() {
        match ch {
            'e' | 'E' if !number.is_empty() => number.push(ch),
            c if c.is_ascii_alphabetic() => {
                flush(&mut number, &mut tokens);
                tokens.push(PathToken::Command(c));
            }
            '-' if !number.is_empty() && !number.ends_with(['e', 'E']) => {
                flush(&mut number, &mut tokens);
                number.push(ch);
            }
            c if c.is_ascii_digit() || c == '.' || c == '-' || c == '+' => number.push(c),
            _ => flush(&mut number, &mut tokens),
        }
    }
    flush(&mut number, &mut tokens);

    tokens
}

/// Parse an SVG path `d` attribute into drawing commands.
fn parse_path_data(d: &str) -> Vec<PictureCommand> {
    let tokens = tokenize_path(d);
    let mut commands = Vec::new();
    let (mut cx, mut cy) = (0.0f64, 0.0f64);
    let (mut sx, mut sy) = (0.0f64, 0.0f64);
    let mut i = 0;

    // Take `n` numbers following position `i`, if present
    let take = |i: &mut usize, n: usize| -> Option<Vec<f64>> {
        let slice = tokens.get(*i..*i + n)?;
        let nums: Vec<f64> = slice
            .iter()
            .filter_map(|t| match t {
                PathToken::Number(v) => Some(*v),
                PathToken::Command(_) => None,
            })
            .collect();
        if nums.len() == n {
            *i += n;
            Some(nums)
        } else {
            None
        }
    };

    while i < tokens.len() {
        let PathToken::Command(cmd) = tokens[i] else {
            i += 1;
            continue;
        };
        i += 1;
        let relative = cmd.is_ascii_lowercase();

        match cmd.to_ascii_uppercase() {
            'M' => {
                let mut first = true;
                while let Some(n) = take(&mut i, 2) {
                    let (ox, oy) = if relative { (cx, cy) } else { (0.0, 0.0) };
                    cx = ox + n[0];
                    cy = oy + n[1];
                    if first {
                        sx = cx;
                        sy = cy;
                        commands.push(PictureCommand::MoveTo(cx, cy));
                        first = false;
                    } else {
                        // Extra pairs are implicit line-tos
                        commands.push(PictureCommand::LineTo(cx, cy));
                    }
                }
            }
            'L' => {
                while let Some(n) = take(&mut i, 2) {
                    let (ox, oy) = if relative { (cx, cy) } else { (0.0, 0.0) };
                    cx = ox + n[0];
                    cy = oy + n[1];
                    commands.push(PictureCommand::LineTo(cx, cy));
                }
            }
            'H' => {
                while let Some(n) = take(&mut i, 1) {
                    cx = if relative { cx + n[0] } else { n[0] };
                    commands.push(PictureCommand::LineTo(cx, cy));
                }
            }
            'V' => {
                while let Some(n) = take(&mut i, 1) {
                    cy = if relative { cy + n[0] } else { n[0] };
                    commands.push(PictureCommand::LineTo(cx, cy));
                }
            }
            'C' => {
                while let Some(n) = take(&mut i, 6) {
                    let (ox, oy) = if relative { (cx, cy) } else { (0.0, 0.0) };
                    cx = ox + n[4];
                    cy = oy + n[5];
                    commands.push(PictureCommand::CurveTo(
                        ox + n[0],
                        oy + n[1],
                        ox + n[2],
                        oy + n[3],
                        cx,
                        cy,
                    ));
                }
            }
            'Q' => {
                while let Some(n) = take(&mut i, 4) {
                    let (ox, oy) = if relative { (cx, cy) } else { (0.0, 0.0) };
                    let (qx, qy) = (ox + n[0], oy + n[1]);
                    let (ex, ey) = (ox + n[2], oy + n[3]);
                    // Elevate the quadratic to a cubic
                    commands.push(PictureCommand::CurveTo(
                        cx + 2.0 / 3.0 * (qx - cx),
                        cy + 2.0 / 3.0 * (qy - cy),
                        ex + 2.0 / 3.0 * (qx - ex),
                        ey + 2.0 / 3.0 * (qy - ey),
                        ex,
                        ey,
                    ));
                    cx = ex;
                    cy = ey;
                }
            }
            'Z' => {
                commands.push(PictureCommand::ClosePath);
                cx = sx;
                cy = sy;
            }
            other => log::debug!("unsupported path command '{}'", other),
        }
    }

    commands
}

/// Parse an SVG color: hex, `rgb(r, g, b)` or a named colour.
fn parse_svg_color(s: &str) -> Option<Color> {
    let s = s.trim();
    if let Some(inner) = s.strip_prefix("rgb(").and_then(|r| r.strip_suffix(')')) {
        let parts: Vec<f64> = inner
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .ok()?;
        return match parts.as_slice() {
            [r, g, b] => Some(Color::rgb(r / 255.0, g / 255.0, b / 255.0)),
            _ => None,
        };
    }
    Color::parse(s)
}

/// Parse a points attribute such as "10,20 30,40".
fn parse_points(s: &str) -> Vec<(f64, f64)> {
    let nums: Vec<f64> = s
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter_map(|s| s.parse::<f64>().ok())
        .collect();

    nums.chunks_exact(2).map(|c| (c[0], c[1])).collect()
}

fn attr(e: &BytesStart, name: &str) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == name.as_bytes())
        .and_then(|a| String::from_utf8(a.value.to_vec()).ok())
}

fn attr_f64(e: &BytesStart, name: &str) -> f64 {
    attr(e, name).and_then(|s| s.trim().parse().ok()).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_bounds() {
        let pic = Picture::from_svg(r##"<rect x="10" y="20" width="100" height="50" fill="#ff0000"/>"##)
            .unwrap();
        assert_eq!(pic.bounds, Rect::new(10.0, 20.0, 100.0, 50.0));
        assert!(pic
            .commands
            .iter()
            .any(|c| matches!(c, PictureCommand::SetFill(col) if col.r == 1.0)));
        assert!(pic.commands.contains(&PictureCommand::Fill));
    }

    #[test]
    fn test_circle_bounds() {
        let pic = Picture::from_svg(r#"<svg><circle cx="50" cy="40" r="10" fill="blue"/></svg>"#).unwrap();
        assert!((pic.bounds.left - 40.0).abs() < 1e-9);
        assert!((pic.bounds.top - 30.0).abs() < 1e-9);
        assert!((pic.bounds.width - 20.0).abs() < 1e-9);
        assert!(pic.commands.iter().any(|c| matches!(c, PictureCommand::CurveTo(..))));
    }

    #[test]
    fn test_line_is_stroked_only() {
        let pic = Picture::from_svg(r#"<line x1="0" y1="0" x2="100" y2="100" stroke="black"/>"#).unwrap();
        assert!(pic.commands.contains(&PictureCommand::Stroke));
        assert!(!pic.commands.iter().any(|c| matches!(c, PictureCommand::SetFill(_))));
    }

    #[test]
    fn test_group_inherits_fill_none() {
        let pic = Picture::from_svg(r#"<g fill="none"><rect width="5" height="5"/></g>"#).unwrap();
        // nothing visible inside the group: only the group save/restore remain
        assert_eq!(pic.commands, vec![PictureCommand::Save, PictureCommand::Restore]);
    }

    #[test]
    fn test_path_absolute_and_relative() {
        let cmds = parse_path_data("M 10 20 L 30 40 Z");
        assert_eq!(cmds[0], PictureCommand::MoveTo(10.0, 20.0));
        assert_eq!(cmds[1], PictureCommand::LineTo(30.0, 40.0));
        assert_eq!(cmds[2], PictureCommand::ClosePath);

        let rel = parse_path_data("m10,20l5,5h-10v-3");
        assert_eq!(rel[1], PictureCommand::LineTo(15.0, 25.0));
        assert_eq!(rel[2], PictureCommand::LineTo(5.0, 25.0));
        assert_eq!(rel[3], PictureCommand::LineTo(5.0, 22.0));
    }

    #[test]
    fn test_tokenize_negative_and_exponent() {
        let tokens = tokenize_path("M1-2 3e-1,4");
        assert_eq!(
            tokens,
            vec![
                PathToken::Command('M'),
                PathToken::Number(1.0),
                PathToken::Number(-2.0),
                PathToken::Number(0.3),
                PathToken::Number(4.0),
            ]
        );
    }

    #[test]
    fn test_svg_color_forms() {
        assert_eq!(parse_svg_color("rgb(255, 0, 0)"), Some(Color::rgb(1.0, 0.0, 0.0)));
        assert_eq!(parse_svg_color("#000"), Some(Color::BLACK));
        assert_eq!(parse_svg_color("nonsense"), None);
    }

    #[test]
    fn test_empty_and_malformed() {
        let empty = Picture::from_svg("").unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.bounds, Rect::default());
        assert!(Picture::from_svg("<svg><rect></svg>").is_err());
    }
}
