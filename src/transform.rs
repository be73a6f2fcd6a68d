//! An immutable 2x3 affine transformation matrix with a pre-computed
//! decomposition, mirroring the flags-based caching the teacher crate uses
//! in its own `Transform` (`sx/kx/tx/ky/sy/ty` plus a `TransformFlags` fast
//! path) but exposed in the row convention §3 of the spec names:
//! `x' = a*x + c*y + e; y' = b*x + d*y + f`.

use crate::error::{Error, Result};
use crate::point::Point;

const NEARLY_ZERO: f64 = 1e-4;
const INVERT_EPSILON: f64 = 1e-10;

/// The kind of decomposition a [`Transform2D`] was classified as, used by
/// the fast-shape dispatcher (spec §4.9) to decide whether a rectangle or
/// circle can bypass the general path pipeline.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Orientation {
    /// `b` and `c` are ~0: the transform only scales/translates along the
    /// original axes.
    AxisAligned,
    /// `a` and `d` are ~0: the transform is a 90-degree rotation (plus
    /// scale/translate) swapping the axes.
    Rotated90,
    /// General affine map; neither fast path applies.
    General,
}

/// An immutable affine transform, cached with its own identity/orientation
/// classification so hot paths (fast rect fill, pattern sampling) never
/// recompute `atan2`/`sqrt` on every pixel.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Transform2D {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
    is_identity: bool,
    determinant: f64,
    scale_x: f64,
    scale_y: f64,
    rotation: f64,
    orientation: Orientation,
    is_uniform_scale: bool,
}

impl Default for Transform2D {
    #[inline]
    fn default() -> Self {
        Transform2D::identity()
    }
}

impl Transform2D {
    /// Builds a transform from its six coefficients, validating finiteness
    /// and computing the cached decomposition described in spec §4.2.
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Result<Self> {
        if ![a, b, c, d, e, f].iter().all(|v| v.is_finite()) {
            return Err(Error::NonFiniteInput { context: "Transform2D" });
        }
        Ok(Self::new_unchecked(a, b, c, d, e, f))
    }

    pub(crate) fn new_unchecked(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        let determinant = a * d - b * c;
        let is_identity = a == 1.0 && b == 0.0 && c == 0.0 && d == 1.0 && e == 0.0 && f == 0.0;

        let (orientation, scale_x, scale_y, rotation) = if b.abs() < NEARLY_ZERO && c.abs() < NEARLY_ZERO {
            let rotation = if a < 0.0 { std::f64::consts::PI } else { 0.0 };
            (Orientation::AxisAligned, a.abs(), d.abs(), rotation)
        } else if a.abs() < NEARLY_ZERO && d.abs() < NEARLY_ZERO {
            let rotation = if b > 0.0 {
                std::f64::consts::FRAC_PI_2
            } else {
                -std::f64::consts::FRAC_PI_2
            };
            (Orientation::Rotated90, b.abs(), c.abs(), rotation)
        } else {
            let scale_x = (a * a + b * b).sqrt();
            let scale_y = (c * c + d * d).sqrt();
            let rotation = (-c).atan2(a);
            (Orientation::General, scale_x, scale_y, rotation)
        };

        let is_uniform_scale = (scale_x - scale_y).abs() < NEARLY_ZERO;

        Transform2D {
            a,
            b,
            c,
            d,
            e,
            f,
            is_identity,
            determinant,
            scale_x,
            scale_y,
            rotation,
            orientation,
            is_uniform_scale,
        }
    }

    /// The identity transform.
    #[inline]
    pub fn identity() -> Self {
        Self::new_unchecked(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    /// A pure translation.
    #[inline]
    pub fn from_translate(tx: f64, ty: f64) -> Self {
        Self::new_unchecked(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// A pure (non-uniform) scale about the origin.
    #[inline]
    pub fn from_scale(sx: f64, sy: f64) -> Self {
        Self::new_unchecked(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// A pure rotation about the origin, in radians.
    #[inline]
    pub fn from_rotate(radians: f64) -> Self {
        let (s, c) = radians.sin_cos();
        Self::new_unchecked(c, s, -s, c, 0.0, 0.0)
    }

    /// Returns `true` when this transform does nothing.
    #[inline]
    pub fn is_identity(&self) -> bool {
        self.is_identity
    }

    /// Matrix determinant, `a*d - b*c`.
    #[inline]
    pub fn determinant(&self) -> f64 {
        self.determinant
    }

    /// Cached X scale magnitude from the orientation decomposition.
    #[inline]
    pub fn scale_x(&self) -> f64 {
        self.scale_x
    }

    /// Cached Y scale magnitude from the orientation decomposition.
    #[inline]
    pub fn scale_y(&self) -> f64 {
        self.scale_y
    }

    /// Cached rotation angle, in radians, from the orientation decomposition.
    #[inline]
    pub fn rotation_angle(&self) -> f64 {
        self.rotation
    }

    /// Orientation classification used by the fast-shape dispatcher.
    #[inline]
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// `true` when `|b|, |c| < 1e-4`: axis-aligned scale/translate only.
    #[inline]
    pub fn is_axis_aligned(&self) -> bool {
        self.orientation == Orientation::AxisAligned
    }

    /// `true` when `|a|, |d| < 1e-4`: a 90-degree-rotated axis swap.
    #[inline]
    pub fn is_90_degree_rotated(&self) -> bool {
        self.orientation == Orientation::Rotated90
    }

    /// `true` when the X and Y scale factors are (nearly) equal.
    #[inline]
    pub fn is_uniform_scale(&self) -> bool {
        self.is_uniform_scale
    }

    /// Raw matrix coefficients, `[a, b, c, d, e, f]`.
    #[inline]
    pub fn coefficients(&self) -> [f64; 6] {
        [self.a, self.b, self.c, self.d, self.e, self.f]
    }

    /// Maps a point from the transform's source space to its target space.
    #[inline]
    pub fn transform_point(&self, p: Point) -> Point {
        if self.is_identity {
            return p;
        }
        Point::new_unchecked(
            self.a * p.x + self.c * p.y + self.e,
            self.b * p.x + self.d * p.y + self.f,
        )
    }

    /// Composes `self` with `other`, applying `self` first and `other`
    /// second: `(p -> other(self(p)))`. Matches the standard 3x3 homogeneous
    /// composition, omitting the always-`[0,0,1]` last row.
    pub fn multiply(&self, other: &Transform2D) -> Transform2D {
        if self.is_identity {
            return *other;
        }
        if other.is_identity {
            return *self;
        }

        let a = other.a * self.a + other.c * self.b;
        let b = other.b * self.a + other.d * self.b;
        let c = other.a * self.c + other.c * self.d;
        let d = other.b * self.c + other.d * self.d;
        let e = other.a * self.e + other.c * self.f + other.e;
        let f = other.b * self.e + other.d * self.f + other.f;

        Transform2D::new_unchecked(a, b, c, d, e, f)
    }

    /// Returns a new transform translated by `(dx, dy)` in the transform's
    /// own (pre-transform) space, equivalent to `self.multiply(&Transform2D::from_translate(dx, dy))`.
    #[inline]
    pub fn pre_translate(&self, dx: f64, dy: f64) -> Transform2D {
        self.multiply(&Transform2D::from_translate(dx, dy))
    }

    /// Returns a new transform pre-scaled by `(sx, sy)`.
    #[inline]
    pub fn pre_scale(&self, sx: f64, sy: f64) -> Transform2D {
        self.multiply(&Transform2D::from_scale(sx, sy))
    }

    /// Returns a new transform pre-rotated by `radians`.
    #[inline]
    pub fn pre_rotate(&self, radians: f64) -> Transform2D {
        self.multiply(&Transform2D::from_rotate(radians))
    }

    /// Inverts the transform. Fails with [`Error::NonInvertibleTransform`]
    /// when `|det| < 1e-10` (spec §4.2).
    pub fn invert(&self) -> Result<Transform2D> {
        if self.is_identity {
            return Ok(*self);
        }
        if self.determinant.abs() < INVERT_EPSILON {
            return Err(Error::NonInvertibleTransform);
        }

        let inv_det = 1.0 / self.determinant;
        let a = self.d * inv_det;
        let b = -self.b * inv_det;
        let c = -self.c * inv_det;
        let d = self.a * inv_det;
        let e = -(a * self.e + c * self.f);
        let f = -(b * self.e + d * self.f);

        Ok(Transform2D::new_unchecked(a, b, c, d, e, f))
    }
}
