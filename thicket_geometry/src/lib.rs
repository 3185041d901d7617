// Copyright 2026 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Thicket Geometry: point and rectangle operations over [`kurbo`] value types.
//!
//! The scene graph works in world-space pixels with `f64` coordinates. This
//! crate adds the handful of operations the rest of the workspace needs and
//! that [`kurbo`] deliberately leaves out:
//!
//! - componentwise min/max and partial-order tests on [`Point`],
//! - rotation about an arbitrary center ([`Rotation`]) and reflection across
//!   the horizontal/vertical axis through a center ([`FlipAxis`]),
//! - dot/cross products and the Euclidean norm of a point read as a vector,
//! - rectangle corner and edge-midpoint accessors, the `extent` shorthand,
//!   and the half-open containment rule used everywhere by hit testing.
//!
//! Containment is **half-open**: a point is inside a rectangle iff
//! `origin <= point < corner` componentwise. Degenerate rectangles (zero or
//! negative extent) are not errors; they simply fail [`RectExt::has_area`]
//! and become inert.
//!
//! Componentwise point comparisons are not a total order, so they are plain
//! named methods rather than a `PartialOrd` implementation.
//!
//! This crate is `no_std`; enable either the `std` (default) or `libm`
//! feature for floating-point math.

#![no_std]

#[cfg(feature = "std")]
extern crate std;

use kurbo::{Point, Rect, Vec2};

#[cfg(feature = "std")]
#[inline]
fn sin_cos(radians: f64) -> (f64, f64) {
    radians.sin_cos()
}

#[cfg(all(not(feature = "std"), feature = "libm"))]
#[inline]
fn sin_cos(radians: f64) -> (f64, f64) {
    libm::sincos(radians)
}

/// A rotation applied about a center point.
///
/// Screen coordinates have `y` growing downward, so [`Rotation::Right`] is
/// the clockwise quarter turn as seen on screen.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Rotation {
    /// Quarter turn clockwise (perpendicular swap `(x, y) -> (-y, x)`).
    Right,
    /// Quarter turn counter-clockwise (perpendicular swap `(x, y) -> (y, -x)`).
    Left,
    /// Half turn: point reflection through the center.
    HalfTurn,
    /// An arbitrary angle in degrees, applied via the standard rotation matrix.
    Degrees(f64),
}

/// The mirror axis for [`PointExt::flipped_about`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FlipAxis {
    /// Mirror across the horizontal line through the center (negates `y` offsets).
    Horizontal,
    /// Mirror across the vertical line through the center (negates `x` offsets).
    Vertical,
}

/// Extension operations on [`Point`].
pub trait PointExt {
    /// Componentwise minimum.
    fn min_components(self, other: Point) -> Point;
    /// Componentwise maximum.
    fn max_components(self, other: Point) -> Point;
    /// Whether both components are `<=` the other point's. Not a total order.
    fn each_le(self, other: Point) -> bool;
    /// Whether both components are `<` the other point's. Not a total order.
    fn each_lt(self, other: Point) -> bool;
    /// Dot product, reading both points as vectors from the origin.
    fn dot(self, other: Point) -> f64;
    /// 2D cross product (`x1*y2 - y1*x2`), reading both points as vectors.
    fn cross(self, other: Point) -> f64;
    /// Euclidean norm of the point read as a vector from the origin.
    fn norm(self) -> f64;
    /// This point rotated about `center`.
    fn rotated_about(self, rotation: Rotation, center: Point) -> Point;
    /// This point mirrored across the given axis through `center`.
    fn flipped_about(self, axis: FlipAxis, center: Point) -> Point;
}

impl PointExt for Point {
    #[inline]
    fn min_components(self, other: Point) -> Point {
        Point::new(self.x.min(other.x), self.y.min(other.y))
    }

    #[inline]
    fn max_components(self, other: Point) -> Point {
        Point::new(self.x.max(other.x), self.y.max(other.y))
    }

    #[inline]
    fn each_le(self, other: Point) -> bool {
        self.x <= other.x && self.y <= other.y
    }

    #[inline]
    fn each_lt(self, other: Point) -> bool {
        self.x < other.x && self.y < other.y
    }

    #[inline]
    fn dot(self, other: Point) -> f64 {
        self.x * other.x + self.y * other.y
    }

    #[inline]
    fn cross(self, other: Point) -> f64 {
        self.x * other.y - self.y * other.x
    }

    #[inline]
    fn norm(self) -> f64 {
        self.to_vec2().hypot()
    }

    fn rotated_about(self, rotation: Rotation, center: Point) -> Point {
        let offset = self - center;
        let rotated = match rotation {
            Rotation::Right => Vec2::new(-offset.y, offset.x),
            Rotation::Left => Vec2::new(offset.y, -offset.x),
            Rotation::HalfTurn => -offset,
            Rotation::Degrees(degrees) => {
                let (s, c) = sin_cos(degrees.to_radians());
                Vec2::new(offset.x * c - offset.y * s, offset.x * s + offset.y * c)
            }
        };
        center + rotated
    }

    fn flipped_about(self, axis: FlipAxis, center: Point) -> Point {
        match axis {
            FlipAxis::Horizontal => Point::new(self.x, center.y * 2.0 - self.y),
            FlipAxis::Vertical => Point::new(center.x * 2.0 - self.x, self.y),
        }
    }
}

/// Extension operations on [`Rect`].
///
/// `kurbo` already provides `width`, `height`, `center`, `union`, and a
/// clamped `intersect`; this trait adds the accessors and guards the scene
/// graph needs on top.
pub trait RectExt {
    /// Top-left corner (the origin).
    fn top_left(self) -> Point;
    /// Top-right corner.
    fn top_right(self) -> Point;
    /// Bottom-left corner.
    fn bottom_left(self) -> Point;
    /// Bottom-right corner (the corner opposite the origin).
    fn bottom_right(self) -> Point;
    /// Midpoint of the top edge.
    fn top_center(self) -> Point;
    /// Midpoint of the bottom edge.
    fn bottom_center(self) -> Point;
    /// Midpoint of the left edge.
    fn left_center(self) -> Point;
    /// Midpoint of the right edge.
    fn right_center(self) -> Point;
    /// All four corners, in the order top-left, bottom-left, bottom-right, top-right.
    fn corners(self) -> [Point; 4];
    /// Width and height as a vector (`corner - origin`). May be negative for
    /// degenerate rectangles.
    fn extent(self) -> Vec2;
    /// Whether the rectangle has strictly positive width and height.
    ///
    /// This is the guard applied before drawing a region or honoring a damage
    /// rectangle; anything failing it is inert, not an error.
    fn has_area(self) -> bool;
    /// Half-open containment: `origin <= point < corner` componentwise.
    fn contains_half_open(self, point: Point) -> bool;
    /// Whether `other` lies entirely within this rectangle (edges included).
    fn contains_rect(self, other: Rect) -> bool;
}

impl RectExt for Rect {
    #[inline]
    fn top_left(self) -> Point {
        Point::new(self.x0, self.y0)
    }

    #[inline]
    fn top_right(self) -> Point {
        Point::new(self.x1, self.y0)
    }

    #[inline]
    fn bottom_left(self) -> Point {
        Point::new(self.x0, self.y1)
    }

    #[inline]
    fn bottom_right(self) -> Point {
        Point::new(self.x1, self.y1)
    }

    #[inline]
    fn top_center(self) -> Point {
        Point::new(self.center().x, self.y0)
    }

    #[inline]
    fn bottom_center(self) -> Point {
        Point::new(self.center().x, self.y1)
    }

    #[inline]
    fn left_center(self) -> Point {
        Point::new(self.x0, self.center().y)
    }

    #[inline]
    fn right_center(self) -> Point {
        Point::new(self.x1, self.center().y)
    }

    #[inline]
    fn corners(self) -> [Point; 4] {
        [
            self.top_left(),
            self.bottom_left(),
            self.bottom_right(),
            self.top_right(),
        ]
    }

    #[inline]
    fn extent(self) -> Vec2 {
        Vec2::new(self.x1 - self.x0, self.y1 - self.y0)
    }

    #[inline]
    fn has_area(self) -> bool {
        self.x1 > self.x0 && self.y1 > self.y0
    }

    #[inline]
    fn contains_half_open(self, point: Point) -> bool {
        point.x >= self.x0 && point.x < self.x1 && point.y >= self.y0 && point.y < self.y1
    }

    #[inline]
    fn contains_rect(self, other: Rect) -> bool {
        self.x0 <= other.x0 && self.y0 <= other.y0 && other.x1 <= self.x1 && other.y1 <= self.y1
    }
}
