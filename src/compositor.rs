//! Porter-Duff compositing with per-pixel alpha and a `globalAlpha`
//! multiplier (spec §4.8). Grounded in the teacher's `BlendMode`
//! (`src/blend_mode.rs`: a plain enum dispatched once per span, not per
//! pixel) but restricted to the eleven operators spec §4.8 actually names
//! instead of the teacher's full 27-mode Skia blend table — the teacher's
//! extra modes (`Multiply`, `Screen`, `HardLight`, hue/saturation/color/
//! luminosity, …) have no counterpart in this spec and are not carried.

use crate::color::Color;

/// A Porter-Duff compositing operator (spec §4.8).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CompositeOperator {
    /// `Cs + Cd*(1-as)` — the default.
    SourceOver,
    /// `Cd + Cs*(1-ad)`.
    DestinationOver,
    /// `Cs*ad`.
    SourceIn,
    /// `Cd*as`.
    DestinationIn,
    /// `Cs*(1-ad)`.
    SourceOut,
    /// `Cd*(1-as)`.
    DestinationOut,
    /// `Cs*ad + Cd*(1-as)`.
    SourceAtop,
    /// `Cd*as + Cs*(1-ad)`.
    DestinationAtop,
    /// `Cs*(1-ad) + Cd*(1-as)`.
    Xor,
    /// Unconditionally replaces the destination with `(Cs, as*globalAlpha)`.
    Copy,
    /// Sum of premultiplied colors, channel-saturated at 1.0.
    Lighter,
}

impl Default for CompositeOperator {
    fn default() -> Self {
        CompositeOperator::SourceOver
    }
}

/// Porter-Duff `(Fa, Fb)` coefficient pair: output premultiplied color is
/// `Cs_p*Fa + Cd_p*Fb`, and output alpha is `as*Fa + ad*Fb`, for every
/// operator except [`CompositeOperator::Lighter`] (handled specially
/// below).
fn coefficients(op: CompositeOperator, as_: f64, ad: f64) -> (f64, f64) {
    match op {
        CompositeOperator::SourceOver => (1.0, 1.0 - as_),
        CompositeOperator::DestinationOver => (1.0 - ad, 1.0),
        CompositeOperator::SourceIn => (ad, 0.0),
        CompositeOperator::DestinationIn => (0.0, as_),
        CompositeOperator::SourceOut => (1.0 - ad, 0.0),
        CompositeOperator::DestinationOut => (0.0, 1.0 - as_),
        CompositeOperator::SourceAtop => (ad, 1.0 - as_),
        CompositeOperator::DestinationAtop => (1.0 - ad, as_),
        CompositeOperator::Xor => (1.0 - ad, 1.0 - as_),
        CompositeOperator::Copy => (1.0, 0.0),
        CompositeOperator::Lighter => (1.0, 1.0), // unused; see composite()
    }
}

/// Composes `src` over `dst` under `op` and `global_alpha`, both
/// non-premultiplied (straight alpha), per spec §4.8.
pub fn composite(op: CompositeOperator, src: Color, dst: Color, global_alpha: f64) -> Color {
    let global_alpha = global_alpha.max(0.0).min(1.0);

    if op == CompositeOperator::Copy {
        let as_ = (src.a as f64 / 255.0) * global_alpha;
        return Color::from_rgba8(src.r, src.g, src.b, (as_ * 255.0).round() as u8);
    }

    let as_ = (src.a as f64 / 255.0) * global_alpha;
    let ad = dst.a as f64 / 255.0;

    let srcp = (src.r as f64 * as_, src.g as f64 * as_, src.b as f64 * as_);
    let dstp = (dst.r as f64 * ad, dst.g as f64 * ad, dst.b as f64 * ad);

    let (rp, gp, bp, ao) = if op == CompositeOperator::Lighter {
        let ao = (as_ + ad).min(1.0);
        (
            (srcp.0 + dstp.0).min(255.0),
            (srcp.1 + dstp.1).min(255.0),
            (srcp.2 + dstp.2).min(255.0),
            ao,
        )
    } else {
        let (fa, fb) = coefficients(op, as_, ad);
        let ao = (as_ * fa + ad * fb).max(0.0).min(1.0);
        (srcp.0 * fa + dstp.0 * fb, srcp.1 * fa + dstp.1 * fb, srcp.2 * fa + dstp.2 * fb, ao)
    };

    if ao <= 0.0 {
        return Color::TRANSPARENT;
    }

    Color::from_rgba8(
        (rp / ao).round().max(0.0).min(255.0) as u8,
        (gp / ao).round().max(0.0).min(255.0) as u8,
        (bp / ao).round().max(0.0).min(255.0) as u8,
        (ao * 255.0).round().max(0.0).min(255.0) as u8,
    )
}

/// Convenience for the common case, used by fast paths that never need any
/// operator but source-over (spec §4.9).
#[inline]
pub fn blend_source_over(src: Color, dst: Color, global_alpha: f64) -> Color {
    composite(CompositeOperator::SourceOver, src, dst, global_alpha)
}

/// `true` for operators whose output can include pixels that lie inside the
/// clip region but outside the source shape's coverage (spec §4.8) — the
/// rasterizer must iterate the union of clip and source coverage for these,
/// not only the source's scanline spans.
pub fn touches_outside_source(op: CompositeOperator) -> bool {
    matches!(
        op,
        CompositeOperator::SourceIn
            | CompositeOperator::DestinationIn
            | CompositeOperator::DestinationAtop
            | CompositeOperator::Copy
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_over_with_opaque_source_replaces_destination() {
        let src = Color::from_rgba8(10, 20, 30, 255);
        let dst = Color::from_rgba8(200, 200, 200, 255);
        let out = composite(CompositeOperator::SourceOver, src, dst, 1.0);
        assert_eq!(out, src);
    }

    #[test]
    fn source_over_with_transparent_source_leaves_destination_unchanged() {
        let src = Color::from_rgba8(10, 20, 30, 0);
        let dst = Color::from_rgba8(200, 200, 200, 255);
        let out = composite(CompositeOperator::SourceOver, src, dst, 1.0);
        assert_eq!(out, dst);
    }

    #[test]
    fn copy_replaces_unconditionally_scaled_by_global_alpha() {
        let src = Color::from_rgba8(10, 20, 30, 200);
        let dst = Color::from_rgba8(1, 2, 3, 4);
        let out = composite(CompositeOperator::Copy, src, dst, 0.5);
        assert_eq!((out.r, out.g, out.b), (10, 20, 30));
        assert_eq!(out.a, (200.0 * 0.5).round() as u8);
    }

    #[test]
    fn source_in_clears_outside_intersection() {
        // dst fully transparent -> ad = 0 -> Fa = ad = 0 -> output transparent.
        let src = Color::from_rgba8(255, 0, 0, 255);
        let dst = Color::TRANSPARENT;
        let out = composite(CompositeOperator::SourceIn, src, dst, 1.0);
        assert_eq!(out.a, 0);
    }

    #[test]
    fn lighter_saturates_channels() {
        let src = Color::from_rgba8(200, 200, 200, 255);
        let dst = Color::from_rgba8(200, 200, 200, 255);
        let out = composite(CompositeOperator::Lighter, src, dst, 1.0);
        assert_eq!(out.r, 255);
    }
}
