//! Converts a [`Path`] into polygons of straight line segments, honoring a
//! fixed 0.25px chord tolerance (spec §4.4). Grounded in the teacher's
//! curve-subdivision shape (`src/path_geometry.rs`, `src/geometry.rs`
//! compute chord/tangent relationships for a `Path`'s verbs) but using
//! plain de Casteljau recursion instead of Skia's quadratic-error-bound
//! math, since the spec pins the tolerance and recursion-depth safety stop
//! explicitly rather than leaving them as a tunable.

use crate::path::{point_on_circle, point_on_ellipse, Path, PathCommand};
use crate::point::Point;

/// Chord tolerance, in pixels, below which a flattened curve segment is
/// considered a sufficient approximation of the true curve (spec §4.4).
/// This is a fixed design constant; it must never be exposed as a
/// parameter.
pub const FLATTEN_TOLERANCE: f64 = 0.25;

/// Safety stop on point count per curve, guarding against pathological
/// recursive subdivision (spec §4.4).
const MAX_CURVE_POINTS: usize = 1000;

/// A polygon is an ordered ring of at least 2 points. "Closed" only matters
/// to the caller (the rasterizer always treats rings as closed for fill
/// purposes; the stroke expander cares whether a `ClosePath` was present).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Polygon {
    /// The ordered points of the ring.
    pub points: Vec<Point>,
    /// Whether the originating subpath ended in an explicit `ClosePath`.
    pub closed: bool,
}

impl Polygon {
    fn push_if_new(&mut self, p: Point) {
        if self.points.last().map_or(true, |last| *last != p) {
            self.points.push(p);
        }
    }
}

/// Flattens a [`Path`] into one polygon per subpath, in command order
/// (spec §4.4).
pub fn flatten_path(path: &Path) -> Vec<Polygon> {
    let mut polygons = Vec::new();
    let mut current: Option<Polygon> = None;
    let mut cursor = Point::ZERO;
    let mut subpath_start = Point::ZERO;

    for cmd in path.commands() {
        match *cmd {
            PathCommand::MoveTo(x, y) => {
                if let Some(poly) = current.take() {
                    if poly.points.len() >= 2 {
                        polygons.push(poly);
                    }
                }
                cursor = Point::new_unchecked(x, y);
                subpath_start = cursor;
                let mut poly = Polygon::default();
                poly.points.push(cursor);
                current = Some(poly);
            }
            PathCommand::LineTo(x, y) => {
                let p = Point::new_unchecked(x, y);
                ensure_current(&mut current, cursor);
                current.as_mut().unwrap().push_if_new(p);
                cursor = p;
            }
            PathCommand::QuadraticCurveTo(cpx, cpy, x, y) => {
                ensure_current(&mut current, cursor);
                let cp = Point::new_unchecked(cpx, cpy);
                let end = Point::new_unchecked(x, y);
                flatten_quadratic(cursor, cp, end, current.as_mut().unwrap());
                cursor = end;
            }
            PathCommand::BezierCurveTo(cp1x, cp1y, cp2x, cp2y, x, y) => {
                ensure_current(&mut current, cursor);
                let cp1 = Point::new_unchecked(cp1x, cp1y);
                let cp2 = Point::new_unchecked(cp2x, cp2y);
                let end = Point::new_unchecked(x, y);
                flatten_cubic(cursor, cp1, cp2, end, current.as_mut().unwrap());
                cursor = end;
            }
            PathCommand::Arc { cx, cy, r, a0, a1, ccw } => {
                ensure_current(&mut current, cursor);
                let poly = current.as_mut().unwrap();
                cursor = flatten_arc(cx, cy, r, r, 0.0, a0, a1, ccw, poly);
            }
            PathCommand::Ellipse { cx, cy, rx, ry, rotation, a0, a1, ccw } => {
                ensure_current(&mut current, cursor);
                let poly = current.as_mut().unwrap();
                cursor = flatten_arc(cx, cy, rx, ry, rotation, a0, a1, ccw, poly);
            }
            PathCommand::ArcTo { x1, y1, x2, y2, r } => {
                ensure_current(&mut current, cursor);
                let poly = current.as_mut().unwrap();
                cursor = flatten_arc_to(cursor, Point::new_unchecked(x1, y1), Point::new_unchecked(x2, y2), r, poly);
            }
            PathCommand::ClosePath => {
                if let Some(poly) = current.as_mut() {
                    poly.push_if_new(subpath_start);
                    poly.closed = true;
                }
                cursor = subpath_start;
                if let Some(poly) = current.take() {
                    if poly.points.len() >= 2 {
                        polygons.push(poly);
                    }
                }
            }
        }
    }

    if let Some(poly) = current.take() {
        if poly.points.len() >= 2 {
            polygons.push(poly);
        }
    }

    polygons
}

fn ensure_current(current: &mut Option<Polygon>, cursor: Point) {
    if current.is_none() {
        let mut poly = Polygon::default();
        poly.points.push(cursor);
        *current = Some(poly);
    }
}

/// Recursive midpoint subdivision (de Casteljau) of a quadratic Bezier,
/// terminating when the control point's distance to the chord is within
/// tolerance, or the point budget is exhausted (spec §4.4).
fn flatten_quadratic(p0: Point, p1: Point, p2: Point, out: &mut Polygon) {
    subdivide_quadratic(p0, p1, p2, out, 0);
    out.push_if_new(p2);
}

fn subdivide_quadratic(p0: Point, p1: Point, p2: Point, out: &mut Polygon, depth: u32) {
    if out.points.len() >= MAX_CURVE_POINTS || depth > 30 {
        return;
    }
    if chord_distance(p1, p0, p2) <= FLATTEN_TOLERANCE {
        return;
    }

    let p01 = midpoint(p0, p1);
    let p12 = midpoint(p1, p2);
    let p012 = midpoint(p01, p12);

    subdivide_quadratic(p0, p01, p012, out, depth + 1);
    out.push_if_new(p012);
    subdivide_quadratic(p012, p12, p2, out, depth + 1);
}

/// Recursive midpoint subdivision of a cubic Bezier.
fn flatten_cubic(p0: Point, p1: Point, p2: Point, p3: Point, out: &mut Polygon) {
    subdivide_cubic(p0, p1, p2, p3, out, 0);
    out.push_if_new(p3);
}

fn subdivide_cubic(p0: Point, p1: Point, p2: Point, p3: Point, out: &mut Polygon, depth: u32) {
    if out.points.len() >= MAX_CURVE_POINTS || depth > 30 {
        return;
    }
    let d1 = chord_distance(p1, p0, p3);
    let d2 = chord_distance(p2, p0, p3);
    if d1.max(d2) <= FLATTEN_TOLERANCE {
        return;
    }

    let p01 = midpoint(p0, p1);
    let p12 = midpoint(p1, p2);
    let p23 = midpoint(p2, p3);
    let p012 = midpoint(p01, p12);
    let p123 = midpoint(p12, p23);
    let p0123 = midpoint(p012, p123);

    subdivide_cubic(p0, p01, p012, p0123, out, depth + 1);
    out.push_if_new(p0123);
    subdivide_cubic(p0123, p123, p23, p3, out, depth + 1);
}

#[inline]
fn midpoint(a: Point, b: Point) -> Point {
    Point::new_unchecked((a.x + b.x) * 0.5, (a.y + b.y) * 0.5)
}

/// Perpendicular distance from `p` to the line through `a` and `b` (or to
/// `a` itself when `a == b`).
fn chord_distance(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len = ab.length();
    if len < 1e-12 {
        return p.distance(a);
    }
    ((p.x - a.x) * ab.y - (p.y - a.y) * ab.x).abs() / len
}

/// Flattens a circular or elliptical arc under the tolerance-derived
/// segment count from spec §4.4, applying the arc-angle normalization
/// rules (clockwise/counterclockwise relative to an end < start wraparound)
/// and the ellipse rotation.
fn flatten_arc(
    cx: f64,
    cy: f64,
    rx: f64,
    ry: f64,
    rotation: f64,
    a0: f64,
    a1: f64,
    ccw: bool,
    out: &mut Polygon,
) -> Point {
    let (start, end) = normalize_arc_angles(a0, a1, ccw);
    let r_min = rx.min(ry).max(1e-6);
    let theta_max = 2.0 * (1.0 - (FLATTEN_TOLERANCE / r_min).min(1.0)).max(0.0).acos();
    let sweep = (end - start).abs();
    let n = ((sweep / theta_max.max(1e-9)).ceil() as usize).max(1);

    let mut last = Point::ZERO;
    for i in 0..=n {
        let t = start + (end - start) * (i as f64 / n as f64);
        let p = if rx == ry && rotation == 0.0 {
            point_on_circle(cx, cy, rx, t)
        } else {
            point_on_ellipse(cx, cy, rx, ry, rotation, t)
        };
        out.push_if_new(p);
        last = p;
    }
    last
}

/// Arc-angle normalization: clockwise sweeps with `end < start` gain 2*PI
/// on the end; counterclockwise sweeps with `start < end` gain 2*PI on the
/// start (spec §4.4, §9). HTML5's `ccw == false` is the clockwise default.
fn normalize_arc_angles(a0: f64, a1: f64, ccw: bool) -> (f64, f64) {
    let mut start = a0;
    let mut end = a1;
    if !ccw {
        if end < start {
            end += 2.0 * std::f64::consts::PI;
        }
    } else if start < end {
        start += 2.0 * std::f64::consts::PI;
    }
    (start, end)
}

/// Flattens `ArcTo`: a straight line to the tangent point on
/// `(current -> p1)`, then an arc of radius `r` tangent to both
/// `(p0 -> p1)` and `(p1 -> p2)`, ending at the tangent point on
/// `(p1 -> p2)`. Degenerate inputs fall through to a straight `lineTo(p1)`
/// (spec §4.4).
fn flatten_arc_to(p0: Point, p1: Point, p2: Point, r: f64, out: &mut Polygon) -> Point {
    let in_vec = p1 - p0;
    let out_vec = p2 - p1;
    let in_len = in_vec.length();
    let out_len = out_vec.length();

    if r == 0.0 || in_len < 1e-9 || out_len < 1e-9 {
        out.push_if_new(p1);
        return p1;
    }

    let in_dir = in_vec * (1.0 / in_len);
    let out_dir = out_vec * (1.0 / out_len);

    let cos_theta = in_dir.dot(out_dir).max(-1.0).min(1.0);
    // Collinear points (parallel or anti-parallel): no well-defined tangent
    // circle, fall through to a straight line.
    if (1.0 - cos_theta.abs()).abs() < 1e-9 {
        out.push_if_new(p1);
        return p1;
    }

    // tan(half the turn angle) relates the tangent-line distance to r.
    let turn = cos_theta.acos();
    let tangent_dist = r * (turn / 2.0).tan().abs();
    let tangent_dist = tangent_dist.min(in_len).min(out_len);
    let t1 = p1 - in_dir * tangent_dist;
    let t2 = p1 + out_dir * tangent_dist;

    // Center of the tangent circle lies along the bisector, at distance
    // r / cos(turn/2) from p1.
    let bisector = (in_dir * -1.0 + out_dir).normalized();
    let bisector = match bisector {
        Some(b) => b,
        None => {
            out.push_if_new(p1);
            return p1;
        }
    };
    let center_dist = r / (turn / 2.0).cos().max(1e-9);
    let center = p1 + bisector * center_dist;

    let cross = in_dir.x * out_dir.y - in_dir.y * out_dir.x;
    let ccw = cross > 0.0;

    let a0 = (t1.y - center.y).atan2(t1.x - center.x);
    let a1 = (t2.y - center.y).atan2(t2.x - center.x);

    out.push_if_new(t1);
    flatten_arc(center.x, center.y, r, r, 0.0, a0, a1, ccw, out);
    out.push_if_new(t2);
    t2
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::Path;

    #[test]
    fn one_polygon_per_subpath() {
        let mut p = Path::new();
        p.move_to(0.0, 0.0).unwrap();
        p.line_to(10.0, 0.0).unwrap();
        p.move_to(20.0, 20.0).unwrap();
        p.line_to(30.0, 20.0).unwrap();
        let polys = flatten_path(&p);
        assert_eq!(polys.len(), 2);
    }

    #[test]
    fn close_path_appends_start_vertex() {
        let mut p = Path::new();
        p.rect(0.0, 0.0, 10.0, 10.0).unwrap();
        let polys = flatten_path(&p);
        assert_eq!(polys.len(), 1);
        assert_eq!(*polys[0].points.first().unwrap(), *polys[0].points.last().unwrap());
        assert!(polys[0].closed);
    }

    #[test]
    fn quadratic_flattening_stays_within_tolerance() {
        let mut p = Path::new();
        p.move_to(0.0, 0.0).unwrap();
        p.quadratic_curve_to(50.0, 100.0, 100.0, 0.0).unwrap();
        let polys = flatten_path(&p);
        let pts = &polys[0].points;
        // Sample the true curve at a fine step and ensure the polyline
        // stays within tolerance of every sample (a coarse but effective
        // proxy for "max distance from curve to polyline <= tolerance").
        for i in 0..=200 {
            let t = i as f64 / 200.0;
            let x = (1.0 - t).powi(2) * 0.0 + 2.0 * (1.0 - t) * t * 50.0 + t.powi(2) * 100.0;
            let y = (1.0 - t).powi(2) * 0.0 + 2.0 * (1.0 - t) * t * 100.0 + t.powi(2) * 0.0;
            let sample = Point::new_unchecked(x, y);
            let min_dist = pts
                .windows(2)
                .map(|w| point_segment_distance(sample, w[0], w[1]))
                .fold(f64::INFINITY, f64::min);
            assert!(min_dist <= FLATTEN_TOLERANCE + 1e-6, "min_dist={min_dist}");
        }
    }

    fn point_segment_distance(p: Point, a: Point, b: Point) -> f64 {
        let ab = b - a;
        let len_sq = ab.length_sq();
        if len_sq < 1e-12 {
            return p.distance(a);
        }
        let t = ((p - a).dot(ab) / len_sq).max(0.0).min(1.0);
        let proj = a + ab * t;
        p.distance(proj)
    }

    #[test]
    fn arc_to_falls_through_to_line_when_collinear() {
        let mut p = Path::new();
        p.move_to(0.0, 0.0).unwrap();
        p.arc_to(5.0, 0.0, 10.0, 0.0, 2.0).unwrap();
        let polys = flatten_path(&p);
        assert!(polys[0].points.iter().all(|pt| pt.y.abs() < 1e-9));
    }

    #[test]
    fn arc_to_produces_a_circle_tangent_to_both_segments_at_a_60_degree_corner() {
        // p0 -> p1 along +x, p1 -> p2 turning 60 degrees (not the degenerate
        // 90-degree case where tan/sin of 45 degrees would have masked the
        // earlier tangent_dist/center_dist swap).
        let p0 = Point::new_unchecked(0.0, 0.0);
        let p1 = Point::new_unchecked(10.0, 0.0);
        let turn: f64 = 60.0_f64.to_radians();
        let out_dir = Point::new_unchecked(turn.cos(), turn.sin());
        let p2 = p1 + out_dir * 10.0;
        let r = 2.0;

        let mut poly = Polygon::default();
        poly.points.push(p0);
        let end = flatten_arc_to(p0, p1, p2, r, &mut poly);
        assert_eq!(end, poly.points.last().copied().unwrap());

        // Independently derived tangent circle: center lies on the interior
        // bisector at r/cos(turn/2) from p1; each tangent point is at
        // r*tan(turn/2) from p1 along the respective segment.
        let tangent_dist = r * (turn / 2.0).tan();
        let center_dist = r / (turn / 2.0).cos();
        let in_dir = Point::new_unchecked(1.0, 0.0);
        let bisector = (in_dir * -1.0 + out_dir).normalized().unwrap();
        let center = p1 + bisector * center_dist;
        let t1 = p1 - in_dir * tangent_dist;
        let t2 = p1 + out_dir * tangent_dist;

        // Every arc point (everything flatten_arc_to appended) must sit
        // within tolerance of radius r from this independently-computed
        // center -- the actual tangency check the old inverted formulas
        // failed (they produced a center whose distance to t1 was ~3.76,
        // not r).
        for pt in &poly.points[1..] {
            assert!(
                (pt.distance(center) - r).abs() < 1e-6,
                "point {:?} is not on the tangent circle (dist={})",
                pt,
                pt.distance(center)
            );
        }

        // The tangent points themselves must lie on the original segments,
        // strictly between p1 and the respective far endpoint.
        assert!(t1.distance(p0) < p1.distance(p0));
        assert!(t2.distance(p2) < p1.distance(p2));
        assert!((poly.points[1].distance(t1)) < 1e-6);
        assert!((poly.points.last().unwrap().distance(t2)) < 1e-6);
    }
}
