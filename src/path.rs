//! The path command list (spec §3, §4.4). Grounded in the teacher's
//! `PathBuilder` (`path/src/path_builder.rs`: a verb list plus a flat point
//! list, with an implicit "inject a moveTo" rule for draws from an empty
//! path) but kept as a single mutable, non-consuming builder instead of a
//! builder/immutable-`Path` pair, because the HTML5 canvas model (spec
//! §4.11) needs a "current path" that survives across `fill`/`stroke` calls
//! until `beginPath()` — there is no one point where the path is "finished".

use crate::error::{Error, Result};
use crate::point::Point;

/// One command in a path's command list (spec §3).
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum PathCommand {
    /// Starts a new subpath at `(x, y)`.
    MoveTo(f64, f64),
    /// A straight line from the current point to `(x, y)`.
    LineTo(f64, f64),
    /// A quadratic Bezier curve to `(x, y)` via control point `(cpx, cpy)`.
    QuadraticCurveTo(f64, f64, f64, f64),
    /// A cubic Bezier curve to `(x, y)` via control points `(cp1x, cp1y)`,
    /// `(cp2x, cp2y)`.
    BezierCurveTo(f64, f64, f64, f64, f64, f64),
    /// A circular arc around `(cx, cy)` with radius `r`, from angle `a0` to
    /// `a1`, in the direction given by `ccw`.
    Arc { cx: f64, cy: f64, r: f64, a0: f64, a1: f64, ccw: bool },
    /// An elliptical arc, like [`PathCommand::Arc`] but with independent
    /// radii and a rotation.
    Ellipse { cx: f64, cy: f64, rx: f64, ry: f64, rotation: f64, a0: f64, a1: f64, ccw: bool },
    /// A rounded corner from the current point through `(x1, y1)` to
    /// `(x2, y2)`, with radius `r`.
    ArcTo { x1: f64, y1: f64, x2: f64, y2: f64, r: f64 },
    /// Closes the current subpath with a line back to its start.
    ClosePath,
}

/// An ordered, append-only sequence of path commands (spec §3).
///
/// `Path` is both the builder and the value consumed by the flattener: the
/// [`Context`](crate::context::Context) keeps one live `Path` as its
/// "current path" and clones a cheap snapshot whenever a draw needs an
/// immutable view, matching spec §4.11's requirement that `beginPath`
/// discards the path without otherwise touching context state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
    commands: Vec<PathCommand>,
    /// Start point of the current (last) subpath, used by `close_path` and
    /// by callers that need to know where an implicit moveTo would land.
    current_point: Option<Point>,
    subpath_start: Option<Point>,
}

impl Path {
    /// Creates an empty path.
    pub fn new() -> Self {
        Path::default()
    }

    /// The commands making up this path, in insertion order.
    #[inline]
    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    /// `true` when no commands have been recorded.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// The path's current point (where the next `lineTo` etc. would start
    /// from), if any.
    #[inline]
    pub fn current_point(&self) -> Option<Point> {
        self.current_point
    }

    /// Discards all commands, as `Context::beginPath` does.
    pub fn clear(&mut self) {
        self.commands.clear();
        self.current_point = None;
        self.subpath_start = None;
    }

    fn check_finite(values: &[f64], context: &'static str) -> Result<()> {
        if values.iter().all(|v| v.is_finite()) {
            Ok(())
        } else {
            Err(Error::NonFiniteInput { context })
        }
    }

    /// Starts a new subpath at `(x, y)`.
    pub fn move_to(&mut self, x: f64, y: f64) -> Result<()> {
        Self::check_finite(&[x, y], "moveTo")?;
        self.commands.push(PathCommand::MoveTo(x, y));
        self.current_point = Some(Point::new_unchecked(x, y));
        self.subpath_start = self.current_point;
        Ok(())
    }

    fn ensure_start_point(&mut self) {
        if self.current_point.is_none() {
            self.commands.push(PathCommand::MoveTo(0.0, 0.0));
            self.current_point = Some(Point::ZERO);
            self.subpath_start = Some(Point::ZERO);
        }
    }

    /// A straight line to `(x, y)`. Implicitly moves to `(0, 0)` first if
    /// the path is empty.
    pub fn line_to(&mut self, x: f64, y: f64) -> Result<()> {
        Self::check_finite(&[x, y], "lineTo")?;
        self.ensure_start_point();
        self.commands.push(PathCommand::LineTo(x, y));
        self.current_point = Some(Point::new_unchecked(x, y));
        Ok(())
    }

    /// A quadratic Bezier curve to `(x, y)`.
    pub fn quadratic_curve_to(&mut self, cpx: f64, cpy: f64, x: f64, y: f64) -> Result<()> {
        Self::check_finite(&[cpx, cpy, x, y], "quadraticCurveTo")?;
        self.ensure_start_point();
        self.commands.push(PathCommand::QuadraticCurveTo(cpx, cpy, x, y));
        self.current_point = Some(Point::new_unchecked(x, y));
        Ok(())
    }

    /// A cubic Bezier curve to `(x, y)`.
    pub fn bezier_curve_to(
        &mut self,
        cp1x: f64,
        cp1y: f64,
        cp2x: f64,
        cp2y: f64,
        x: f64,
        y: f64,
    ) -> Result<()> {
        Self::check_finite(&[cp1x, cp1y, cp2x, cp2y, x, y], "bezierCurveTo")?;
        self.ensure_start_point();
        self.commands.push(PathCommand::BezierCurveTo(cp1x, cp1y, cp2x, cp2y, x, y));
        self.current_point = Some(Point::new_unchecked(x, y));
        Ok(())
    }

    /// A circular arc (spec §3, §4.4).
    pub fn arc(&mut self, cx: f64, cy: f64, r: f64, a0: f64, a1: f64, ccw: bool) -> Result<()> {
        Self::check_finite(&[cx, cy, r, a0, a1], "arc")?;
        if r < 0.0 {
            return Err(Error::NegativeRadius { context: "arc" });
        }
        self.commands.push(PathCommand::Arc { cx, cy, r, a0, a1, ccw });
        let end = point_on_circle(cx, cy, r, a1);
        self.current_point = Some(end);
        self.subpath_start = self.subpath_start.or(Some(point_on_circle(cx, cy, r, a0)));
        Ok(())
    }

    /// An elliptical arc (spec §3, §4.4).
    pub fn ellipse(
        &mut self,
        cx: f64,
        cy: f64,
        rx: f64,
        ry: f64,
        rotation: f64,
        a0: f64,
        a1: f64,
        ccw: bool,
    ) -> Result<()> {
        Self::check_finite(&[cx, cy, rx, ry, rotation, a0, a1], "ellipse")?;
        if rx < 0.0 || ry < 0.0 {
            return Err(Error::NegativeRadius { context: "ellipse" });
        }
        self.commands.push(PathCommand::Ellipse { cx, cy, rx, ry, rotation, a0, a1, ccw });
        let end = point_on_ellipse(cx, cy, rx, ry, rotation, a1);
        self.current_point = Some(end);
        Ok(())
    }

    /// A rounded corner tangent to the current point, `(x1, y1)`, and
    /// `(x2, y2)`. Rejects negative radii and non-finite inputs with
    /// distinct error kinds (spec §3, §7).
    pub fn arc_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, r: f64) -> Result<()> {
        Self::check_finite(&[x1, y1, x2, y2, r], "arcTo")?;
        if r < 0.0 {
            return Err(Error::NegativeRadius { context: "arcTo" });
        }
        self.ensure_start_point();
        self.commands.push(PathCommand::ArcTo { x1, y1, x2, y2, r });
        self.current_point = Some(Point::new_unchecked(x2, y2));
        Ok(())
    }

    /// Closes the current subpath, connecting back to its start point.
    pub fn close_path(&mut self) {
        if self.commands.is_empty() {
            return;
        }
        if self.commands.last() != Some(&PathCommand::ClosePath) {
            self.commands.push(PathCommand::ClosePath);
        }
        self.current_point = self.subpath_start;
    }

    /// A rectangle, expanded to `moveTo + 3*lineTo + closePath` (spec §3).
    pub fn rect(&mut self, x: f64, y: f64, w: f64, h: f64) -> Result<()> {
        Self::check_finite(&[x, y, w, h], "rect")?;
        self.move_to(x, y)?;
        self.line_to(x + w, y)?;
        self.line_to(x + w, y + h)?;
        self.line_to(x, y + h)?;
        self.close_path();
        Ok(())
    }
}

pub(crate) fn point_on_circle(cx: f64, cy: f64, r: f64, angle: f64) -> Point {
    Point::new_unchecked(cx + r * angle.cos(), cy + r * angle.sin())
}

pub(crate) fn point_on_ellipse(cx: f64, cy: f64, rx: f64, ry: f64, rotation: f64, angle: f64) -> Point {
    let ex = rx * angle.cos();
    let ey = ry * angle.sin();
    let (s, c) = rotation.sin_cos();
    Point::new_unchecked(cx + ex * c - ey * s, cy + ex * s + ey * c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_expands_to_moveto_and_three_linetos_and_close() {
        let mut p = Path::new();
        p.rect(1.0, 2.0, 3.0, 4.0).unwrap();
        assert_eq!(
            p.commands(),
            &[
                PathCommand::MoveTo(1.0, 2.0),
                PathCommand::LineTo(4.0, 2.0),
                PathCommand::LineTo(4.0, 6.0),
                PathCommand::LineTo(1.0, 6.0),
                PathCommand::ClosePath,
            ]
        );
    }

    #[test]
    fn line_to_on_empty_path_injects_move_to_origin() {
        let mut p = Path::new();
        p.line_to(5.0, 5.0).unwrap();
        assert_eq!(p.commands()[0], PathCommand::MoveTo(0.0, 0.0));
    }

    #[test]
    fn non_finite_inputs_are_rejected() {
        let mut p = Path::new();
        assert!(p.move_to(f64::NAN, 0.0).is_err());
        assert!(p.line_to(f64::INFINITY, 0.0).is_err());
    }

    #[test]
    fn arc_to_rejects_negative_radius() {
        let mut p = Path::new();
        p.move_to(0.0, 0.0).unwrap();
        assert_eq!(
            p.arc_to(1.0, 0.0, 1.0, 1.0, -1.0).unwrap_err(),
            Error::NegativeRadius { context: "arcTo" }
        );
    }

    #[test]
    fn close_path_does_not_duplicate() {
        let mut p = Path::new();
        p.rect(0.0, 0.0, 1.0, 1.0).unwrap();
        p.close_path();
        assert_eq!(p.commands().iter().filter(|c| **c == PathCommand::ClosePath).count(), 1);
    }
}
