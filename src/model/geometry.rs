//! Rectangles and points in two coordinate systems: monitor pixels (`i32`) and
//! the unit square (`f64`), where `(0, 0, 1, 1)` covers a monitor's working area.

use std::fmt;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

use crate::layout_engine::Direction;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point<T> {
    pub x: T,
    pub y: T,
}

impl<T> Point<T> {
    pub const fn new(x: T, y: T) -> Self { Self { x, y } }
}

impl<T: Add<Output = T>> Add for Point<T> {
    type Output = Point<T>;

    fn add(self, rhs: Self) -> Self::Output { Point::new(self.x + rhs.x, self.y + rhs.y) }
}

impl<T: Sub<Output = T>> Sub for Point<T> {
    type Output = Point<T>;

    fn sub(self, rhs: Self) -> Self::Output { Point::new(self.x - rhs.x, self.y - rhs.y) }
}

impl<T: fmt::Display> fmt::Display for Point<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "({}, {})", self.x, self.y) }
}

/// Axis-aligned rectangle. Width and height are allowed to be negative; the
/// consumers that care clamp or skip such rectangles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect<T> {
    pub x: T,
    pub y: T,
    pub width: T,
    pub height: T,
}

impl<T> Rect<T> {
    pub const fn new(x: T, y: T, width: T, height: T) -> Self { Self { x, y, width, height } }
}

impl<T: Copy + PartialOrd + Add<Output = T>> Rect<T> {
    pub fn origin(&self) -> Point<T> { Point::new(self.x, self.y) }

    /// Half-open containment: the left and top edges are inside, the right and
    /// bottom edges are not.
    pub fn contains(&self, point: Point<T>) -> bool {
        self.x <= point.x
            && point.x < self.x + self.width
            && self.y <= point.y
            && point.y < self.y + self.height
    }
}

impl<T: fmt::Display> fmt::Display for Rect<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(x: {}, y: {}, w: {}, h: {})", self.x, self.y, self.width, self.height)
    }
}

impl Rect<i32> {
    pub fn center(&self) -> Point<i32> {
        Point::new(self.x + self.width / 2, self.y + self.height / 2)
    }

    /// Maps a unit-square rectangle into this (pixel) rectangle.
    pub fn to_monitor(&self, unit: Rect<f64>) -> Rect<i32> {
        Rect::new(
            self.x + round_half_even(unit.x * self.width as f64),
            self.y + round_half_even(unit.y * self.height as f64),
            round_half_even(unit.width * self.width as f64),
            round_half_even(unit.height * self.height as f64),
        )
    }

    /// Maps a pixel point into the unit square of this rectangle.
    pub fn to_unit_point(&self, point: Point<i32>) -> Point<f64> {
        if self.width == 0 || self.height == 0 {
            return Point::new(0.0, 0.0);
        }
        Point::new(
            (point.x - self.x) as f64 / self.width as f64,
            (point.y - self.y) as f64 / self.height as f64,
        )
    }

    /// Normalizes a pixel rectangle against this one. The origin is clamped so
    /// that the normalized rectangle stays inside the unit square whenever it
    /// fits.
    pub fn normalize(&self, rect: Rect<i32>) -> Rect<f64> {
        if self.width == 0 || self.height == 0 {
            return Rect::UNIT;
        }

        let width = rect.width as f64 / self.width as f64;
        let height = rect.height as f64 / self.height as f64;
        let x = (rect.x - self.x) as f64 / self.width as f64;
        let y = (rect.y - self.y) as f64 / self.height as f64;

        Rect::new(
            clamp_origin(x, width),
            clamp_origin(y, height),
            width,
            height,
        )
    }
}

impl Rect<f64> {
    pub const UNIT: Rect<f64> = Rect::new(0.0, 0.0, 1.0, 1.0);

    /// Splits the rectangle along both diagonals and reports which of the four
    /// triangles the point falls in. The point is expected to be inside.
    pub fn direction_to_point(&self, point: Point<f64>) -> Direction {
        let normalized = Point::new(point.x - self.x, point.y - self.y);
        let gradient = self.height / self.width;

        // Top-left to bottom-right diagonal.
        let first = normalized.x * gradient;
        // Bottom-left to top-right diagonal.
        let second = self.height - first;

        let above_first = first >= normalized.y;
        let above_second = second >= normalized.y;

        match (above_first, above_second) {
            (true, true) => Direction::UP,
            (true, false) => Direction::RIGHT,
            (false, true) => Direction::LEFT,
            (false, false) => Direction::DOWN,
        }
    }
}

fn clamp_origin(origin: f64, size: f64) -> f64 {
    if size >= 1.0 {
        return 0.0;
    }
    origin.clamp(0.0, 1.0 - size)
}

/// Rounds to the nearest integer, ties to even.
pub(crate) fn round_half_even(value: f64) -> i32 { value.round_ties_even() as i32 }
