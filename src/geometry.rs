//! # Geometry
//!
//! Rectangle and point value types. Layout works exclusively in document
//! units (millimetres); the paint pipeline reuses the same types for device
//! coordinates after conversion through [`crate::units`].
//!
//! Degenerate rectangles (zero or even negative extent) are legal values.
//! Nothing here panics or reports errors; consumers decide what a degenerate
//! rectangle means for them via [`Rect::is_valid`].

use serde::{Deserialize, Serialize};

/// Comparison tolerance for rect arithmetic.
pub const EPSILON: f64 = 1e-6;

/// A point in document or device units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle: top-left corner plus extent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Build a rectangle from two opposite corners.
    pub fn from_points(top_left: Point, bottom_right: Point) -> Self {
        Self {
            left: top_left.x,
            top: top_left.y,
            width: bottom_right.x - top_left.x,
            height: bottom_right.y - top_left.y,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn top_left(&self) -> Point {
        Point::new(self.left, self.top)
    }

    pub fn top_right(&self) -> Point {
        Point::new(self.right(), self.top)
    }

    pub fn bottom_left(&self) -> Point {
        Point::new(self.left, self.bottom())
    }

    pub fn bottom_right(&self) -> Point {
        Point::new(self.right(), self.bottom())
    }

    /// True iff both extents are non-negative.
    pub fn is_valid(&self) -> bool {
        self.width >= 0.0 && self.height >= 0.0
    }

    /// True if the rectangle covers no area.
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.left += dx;
        self.top += dy;
    }

    /// Shrink by fixed margins on each side. Margins may be negative, which
    /// grows the rectangle instead.
    pub fn inset(&self, left: f64, top: f64, right: f64, bottom: f64) -> Rect {
        Rect {
            left: self.left + left,
            top: self.top + top,
            width: self.width - left - right,
            height: self.height - top - bottom,
        }
    }

    /// Move each edge independently: `dl`/`dt` are added to the left/top
    /// edge, `dr`/`db` to the right/bottom edge.
    pub fn adjusted(&self, dl: f64, dt: f64, dr: f64, db: f64) -> Rect {
        Rect::from_points(
            Point::new(self.left + dl, self.top + dt),
            Point::new(self.right() + dr, self.bottom() + db),
        )
    }

    /// Smallest rectangle containing both.
    pub fn union(&self, other: &Rect) -> Rect {
        let left = self.left.min(other.left);
        let top = self.top.min(other.top);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(left, top, right - left, bottom - top)
    }

    /// Overlapping area of both, or `None` if they do not overlap.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let left = self.left.max(other.left);
        let top = self.top.max(other.top);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right < left || bottom < top {
            return None;
        }
        Some(Rect::new(left, top, right - left, bottom - top))
    }

    /// Containment check with [`EPSILON`] tolerance on every edge.
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.left >= self.left - EPSILON
            && other.top >= self.top - EPSILON
            && other.right() <= self.right() + EPSILON
            && other.bottom() <= self.bottom() + EPSILON
    }

    /// Clamp negative extents to zero.
    pub fn normalized_size(&self) -> Rect {
        Rect {
            width: self.width.max(0.0),
            height: self.height.max(0.0),
            ..*self
        }
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{:.2}, {:.2} {:.2}x{:.2}]",
            self.left, self.top, self.width, self.height
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inset_shrinks_every_side() {
        let r = Rect::new(10.0, 20.0, 100.0, 50.0).inset(1.0, 2.0, 3.0, 4.0);
        assert_eq!(r, Rect::new(11.0, 22.0, 96.0, 44.0));
    }

    #[test]
    fn test_inset_can_go_invalid() {
        let r = Rect::new(0.0, 0.0, 3.0, 3.0).inset(2.0, 2.0, 2.0, 2.0);
        assert!(!r.is_valid());
        assert!(Rect::new(0.0, 0.0, 0.0, 0.0).is_valid());
    }

    #[test]
    fn test_union() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 20.0, 10.0, 5.0);
        assert_eq!(a.union(&b), Rect::new(0.0, 0.0, 15.0, 25.0));
    }

    #[test]
    fn test_intersect() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);
        assert_eq!(a.intersect(&b), Some(Rect::new(5.0, 5.0, 5.0, 5.0)));
        assert_eq!(a.intersect(&Rect::new(20.0, 20.0, 1.0, 1.0)), None);
    }

    #[test]
    fn test_adjusted_moves_edges() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0).adjusted(0.0, 0.0, 1.0, 1.0);
        assert_eq!(r, Rect::new(0.0, 0.0, 11.0, 11.0));
    }

    #[test]
    fn test_contains_rect_tolerates_rounding() {
        let outer = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(outer.contains_rect(&Rect::new(0.0, 0.0, 10.0 + 1e-9, 10.0)));
        assert!(!outer.contains_rect(&Rect::new(0.0, 0.0, 10.1, 10.0)));
    }
}
