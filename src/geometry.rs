//! Structures used to map areas on the screen
//!
//! Tab positions are window edges, so rectangles are stored edge-wise
//! (`left`, `top`, `right`, `bottom`) rather than as origin plus size.

use serde::{Deserialize, Serialize};
use std::{
    fmt,
    ops::{Add, AddAssign, Sub, SubAssign},
};

// =============================== Point ==============================
// ====================================================================

/// A position on the screen
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X-coordinate
    pub x: f32,
    /// Y-coordinate
    pub y: f32,
}

impl Point {
    /// Create a new [`Point`]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Check if [`Point`] is `(0, 0)`
    pub fn is_zero(self) -> bool {
        self.x == 0. && self.y == 0.
    }

    /// Check if [`Point`] is contained within the given [`Rect`]
    pub fn is_inside(self, rect: Rect) -> bool {
        rect.contains(self)
    }

    /// Return the [`Point`] relative to the given [`Point`]
    pub fn relative(self, p: Self) -> Self {
        Self {
            x: self.x - p.x,
            y: self.y - p.y,
        }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "x: {}, y: {}", self.x, self.y)
    }
}

impl Add for Point {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self::Output {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl Sub for Point {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        Self::Output {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

// ============================== Extents =============================
// ====================================================================

/// Space a decorator adds around a window on each side.
///
/// The `top` extent includes the tab bar height for looks that have one.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extents {
    /// Extent on the top
    pub top:    f32,
    /// Extent on the right
    pub right:  f32,
    /// Extent on the bottom
    pub bottom: f32,
    /// Extent on the left
    pub left:   f32,
}

impl Extents {
    /// No [`Extents`]
    pub const EMPTY: Self = Self {
        left:   0.,
        right:  0.,
        top:    0.,
        bottom: 0.,
    };

    /// Create a new [`Extents`]
    pub const fn new(top: f32, right: f32, bottom: f32, left: f32) -> Self {
        Self { top, right, bottom, left }
    }
}

// =============================== Rect ===============================
// ====================================================================

/// An axis-aligned rectangle in screen coordinates
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Position of the left edge
    pub left:   f32,
    /// Position of the top edge
    pub top:    f32,
    /// Position of the right edge
    pub right:  f32,
    /// Position of the bottom edge
    pub bottom: f32,
}

impl Rect {
    /// Create a new [`Rect`] from its four edges
    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self { left, top, right, bottom }
    }

    /// Create a zeroed [`Rect`]
    pub fn zeroed() -> Self {
        Self::default()
    }

    /// Width of the [`Rect`]
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    /// Height of the [`Rect`]
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// A [`Rect`] is valid when its edges are ordered
    pub fn is_valid(&self) -> bool {
        self.left <= self.right && self.top <= self.bottom
    }

    /// Return the top left [`Point`]
    pub const fn left_top(&self) -> Point {
        Point { x: self.left, y: self.top }
    }

    /// Return the top right [`Point`]
    pub const fn right_top(&self) -> Point {
        Point { x: self.right, y: self.top }
    }

    /// Return the bottom left [`Point`]
    pub const fn left_bottom(&self) -> Point {
        Point { x: self.left, y: self.bottom }
    }

    /// Return the bottom right [`Point`]
    pub const fn right_bottom(&self) -> Point {
        Point { x: self.right, y: self.bottom }
    }

    /// Test whether the given [`Point`] is contained within the [`Rect`]
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left
            && point.x <= self.right
            && point.y >= self.top
            && point.y <= self.bottom
    }

    /// Test whether two [`Rect`]s overlap
    pub fn intersects(&self, other: Self) -> bool {
        self.left <= other.right
            && other.left <= self.right
            && self.top <= other.bottom
            && other.top <= self.bottom
    }

    /// Return the smallest [`Rect`] containing both
    pub fn union(&self, other: Self) -> Self {
        Self {
            left:   self.left.min(other.left),
            top:    self.top.min(other.top),
            right:  self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }

    /// Shrink the [`Rect`] by `dx`/`dy` on each side; negative values grow it
    pub fn inset_by(self, dx: f32, dy: f32) -> Self {
        Self {
            left:   self.left + dx,
            top:    self.top + dy,
            right:  self.right - dx,
            bottom: self.bottom - dy,
        }
    }

    /// Translate the [`Rect`] by `dx`/`dy`
    pub fn offset_by(self, dx: f32, dy: f32) -> Self {
        Self {
            left:   self.left + dx,
            top:    self.top + dy,
            right:  self.right + dx,
            bottom: self.bottom + dy,
        }
    }

    /// Translate the [`Rect`] so its top-left corner lands on `point`
    pub fn offset_to(self, point: Point) -> Self {
        self.offset_by(point.x - self.left, point.y - self.top)
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {})",
            self.left, self.top, self.right, self.bottom
        )
    }
}

impl Add<Extents> for Rect {
    type Output = Self;

    fn add(self, extents: Extents) -> Self::Output {
        Self::Output {
            left:   self.left - extents.left,
            top:    self.top - extents.top,
            right:  self.right + extents.right,
            bottom: self.bottom + extents.bottom,
        }
    }
}

impl Sub<Extents> for Rect {
    type Output = Self;

    fn sub(self, extents: Extents) -> Self::Output {
        Self::Output {
            left:   self.left + extents.left,
            top:    self.top + extents.top,
            right:  self.right - extents.right,
            bottom: self.bottom - extents.bottom,
        }
    }
}

impl AddAssign<Extents> for Rect {
    fn add_assign(&mut self, extents: Extents) {
        *self = *self + extents;
    }
}

impl SubAssign<Extents> for Rect {
    fn sub_assign(&mut self, extents: Extents) {
        *self = *self - extents;
    }
}

#[cfg(test)]
mod tests {
    use super::{Extents, Point, Rect};

    #[test]
    fn inflate_and_deflate_are_inverse() {
        let frame = Rect::new(10., 20., 110., 220.);
        let decor = Extents::new(27., 6., 5., 5.);

        let complete = frame + decor;
        assert_eq!(complete, Rect::new(5., -7., 116., 225.));
        assert_eq!(complete - decor, frame);
    }

    #[test]
    fn intersection_includes_touching_edges() {
        let a = Rect::new(0., 0., 100., 100.);
        assert!(a.intersects(Rect::new(100., 0., 200., 100.)));
        assert!(!a.intersects(Rect::new(100.5, 0., 200., 100.)));
    }

    #[test]
    fn contains_is_edge_inclusive() {
        let r = Rect::new(0., 0., 10., 10.);
        assert!(r.contains(Point::new(0., 10.)));
        assert!(!r.contains(Point::new(-0.1, 5.)));
    }
}
