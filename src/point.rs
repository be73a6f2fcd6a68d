//! A 2D point in either user or device space, depending on context.

use crate::error::{Error, Result};

/// An immutable 2D point.
///
/// Coordinates must be finite; [`Point::new`] rejects NaN and infinities so
/// that every `Point` that exists in the system is safe to feed into the
/// flattener and rasterizer without further checks.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Point {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
}

impl Point {
    /// The origin.
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    /// Creates a new point, rejecting non-finite coordinates.
    #[inline]
    pub fn new(x: f64, y: f64) -> Result<Self> {
        if !x.is_finite() || !y.is_finite() {
            return Err(Error::NonFiniteInput { context: "Point" });
        }
        Ok(Point { x, y })
    }

    /// Creates a point without validating finiteness. Used internally once
    /// a value has already been checked (e.g. results of arithmetic on two
    /// already-finite points).
    #[inline]
    pub(crate) fn new_unchecked(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    /// Translates the point by `(dx, dy)`.
    #[inline]
    pub fn translate(self, dx: f64, dy: f64) -> Self {
        Point::new_unchecked(self.x + dx, self.y + dy)
    }

    /// Scales the point about the origin.
    #[inline]
    pub fn scale(self, sx: f64, sy: f64) -> Self {
        Point::new_unchecked(self.x * sx, self.y * sy)
    }

    /// Rotates the point about the origin by `radians`.
    #[inline]
    pub fn rotate(self, radians: f64) -> Self {
        let (s, c) = radians.sin_cos();
        Point::new_unchecked(self.x * c - self.y * s, self.x * s + self.y * c)
    }

    /// Euclidean distance to `other`.
    #[inline]
    pub fn distance(self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Squared Euclidean length of the vector from the origin to this point.
    #[inline]
    pub fn length_sq(self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    /// Euclidean length of the vector from the origin to this point.
    #[inline]
    pub fn length(self) -> f64 {
        self.length_sq().sqrt()
    }

    /// Dot product, treating both points as vectors from the origin.
    #[inline]
    pub fn dot(self, other: Point) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Returns a unit-length vector in the same direction, or `None` when
    /// the vector is (numerically) zero-length.
    #[inline]
    pub fn normalized(self) -> Option<Self> {
        let len = self.length();
        if len < 1e-12 {
            None
        } else {
            Some(Point::new_unchecked(self.x / len, self.y / len))
        }
    }

    /// The perpendicular (rotated +90 degrees) vector, unnormalized.
    #[inline]
    pub fn perpendicular(self) -> Self {
        Point::new_unchecked(-self.y, self.x)
    }
}

impl std::ops::Sub for Point {
    type Output = Point;
    #[inline]
    fn sub(self, rhs: Point) -> Point {
        Point::new_unchecked(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Add for Point {
    type Output = Point;
    #[inline]
    fn add(self, rhs: Point) -> Point {
        Point::new_unchecked(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Mul<f64> for Point {
    type Output = Point;
    #[inline]
    fn mul(self, rhs: f64) -> Point {
        Point::new_unchecked(self.x * rhs, self.y * rhs)
    }
}
