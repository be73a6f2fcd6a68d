//! The public drawing surface API (spec §6): a `Context` owning one
//! [`Surface`] plus a stack of [`ContextState`] snapshots. Grounded in the
//! teacher's `Canvas` (`src/canvas.rs`: owns a `Pixmap`, exposes
//! `fill_path`/`stroke_path`/`fill_rect`/`draw_pixmap` as the public
//! surface), generalized here to the full HTML5 Canvas 2D state machine —
//! `save`/`restore`, a live mutable "current path", and the attribute set
//! spec §6 names (`lineWidth`, `lineCap`, … `globalAlpha`).

use std::rc::Rc;

use crate::clip::ClipMask;
use crate::compositor::CompositeOperator;
use crate::error::{Error, Result};
use crate::flatten::flatten_path;
use crate::image::{sample_nearest, source_to_user_transform, DrawImageParams, ImageSource};
use crate::paint::{GradientStop, Paint, RepeatMode};
use crate::path::Path;
use crate::point::Point;
use crate::raster::{self, FillRule};
use crate::shapes;
use crate::stroke::{LineCap, LineJoin, StrokeStyle};
use crate::surface::Surface;
use crate::transform::Transform2D;

/// Everything `save`/`restore` snapshot: the transform, both paints, every
/// stroke attribute, compositing state and the clip mask (spec §6).
#[derive(Clone, Debug)]
struct ContextState {
    transform: Transform2D,
    fill_paint: Paint,
    stroke_paint: Paint,
    line_width: f64,
    line_cap: LineCap,
    line_join: LineJoin,
    miter_limit: f64,
    line_dash: Vec<f64>,
    line_dash_offset: f64,
    global_alpha: f64,
    composite_op: CompositeOperator,
    clip: Option<ClipMask>,
}

impl Default for ContextState {
    fn default() -> Self {
        ContextState {
            transform: Transform2D::identity(),
            fill_paint: Paint::solid(crate::color::Color::BLACK),
            stroke_paint: Paint::solid(crate::color::Color::BLACK),
            line_width: 1.0,
            line_cap: LineCap::default(),
            line_join: LineJoin::default(),
            miter_limit: 10.0,
            line_dash: Vec::new(),
            line_dash_offset: 0.0,
            global_alpha: 1.0,
            composite_op: CompositeOperator::default(),
            clip: None,
        }
    }
}

/// The Canvas 2D drawing context: one mutable surface, a `save`/`restore`
/// state stack, and a live "current path" that persists across `fill`
/// and `stroke` calls until `beginPath` (spec §4.11).
pub struct Context {
    surface: Surface,
    state: ContextState,
    stack: Vec<ContextState>,
    path: Path,
}

impl Context {
    /// Allocates a new context over a fresh, fully transparent surface.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        log::debug!("allocating {}x{} surface", width, height);
        Ok(Context {
            surface: Surface::new(width, height)?,
            state: ContextState::default(),
            stack: Vec::new(),
            path: Path::new(),
        })
    }

    /// The backing pixel buffer.
    #[inline]
    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Canvas width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.surface.width()
    }

    /// Canvas height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.surface.height()
    }

    // ----- save / restore (spec §6) -----

    /// Pushes a copy of the current state (transform, paints, stroke
    /// attributes, `globalAlpha`, composite operator, clip) onto the stack.
    pub fn save(&mut self) {
        log::trace!("save (new depth {})", self.stack.len() + 1);
        self.stack.push(self.state.clone());
    }

    /// Pops the most recently saved state, restoring it. A no-op when the
    /// stack is empty (spec §6).
    pub fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            log::trace!("restore (new depth {})", self.stack.len());
            self.state = state;
        }
    }

    // ----- transform (spec §4.2, §6) -----

    /// Prepends a translation: subsequent drawing is translated by
    /// `(dx, dy)` before the existing transform is applied.
    pub fn translate(&mut self, dx: f64, dy: f64) -> Result<()> {
        let m = Transform2D::new(1.0, 0.0, 0.0, 1.0, dx, dy)?;
        self.state.transform = m.multiply(&self.state.transform);
        Ok(())
    }

    /// Prepends a (non-uniform) scale.
    pub fn scale(&mut self, sx: f64, sy: f64) -> Result<()> {
        let m = Transform2D::new(sx, 0.0, 0.0, sy, 0.0, 0.0)?;
        self.state.transform = m.multiply(&self.state.transform);
        Ok(())
    }

    /// Prepends a rotation, in radians.
    pub fn rotate(&mut self, radians: f64) -> Result<()> {
        if !radians.is_finite() {
            return Err(Error::NonFiniteInput { context: "rotate" });
        }
        let m = Transform2D::from_rotate(radians);
        self.state.transform = m.multiply(&self.state.transform);
        Ok(())
    }

    /// Prepends an arbitrary affine transform, given as `[a, b, c, d, e, f]`.
    pub fn transform(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Result<()> {
        let m = Transform2D::new(a, b, c, d, e, f)?;
        self.state.transform = m.multiply(&self.state.transform);
        Ok(())
    }

    /// Replaces the current transform outright.
    pub fn set_transform(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Result<()> {
        self.state.transform = Transform2D::new(a, b, c, d, e, f)?;
        Ok(())
    }

    /// Resets the current transform to the identity.
    pub fn reset_transform(&mut self) {
        self.state.transform = Transform2D::identity();
    }

    // ----- current path (spec §3, §4.11) -----

    /// Discards the current path.
    pub fn begin_path(&mut self) {
        self.path.clear();
    }

    /// Closes the current subpath.
    pub fn close_path(&mut self) {
        self.path.close_path();
    }

    /// Starts a new subpath at `(x, y)`.
    pub fn move_to(&mut self, x: f64, y: f64) -> Result<()> {
        self.path.move_to(x, y)
    }

    /// A straight line to `(x, y)`.
    pub fn line_to(&mut self, x: f64, y: f64) -> Result<()> {
        self.path.line_to(x, y)
    }

    /// A quadratic Bezier curve to `(x, y)`.
    pub fn quadratic_curve_to(&mut self, cpx: f64, cpy: f64, x: f64, y: f64) -> Result<()> {
        self.path.quadratic_curve_to(cpx, cpy, x, y)
    }

    /// A cubic Bezier curve to `(x, y)`.
    pub fn bezier_curve_to(&mut self, cp1x: f64, cp1y: f64, cp2x: f64, cp2y: f64, x: f64, y: f64) -> Result<()> {
        self.path.bezier_curve_to(cp1x, cp1y, cp2x, cp2y, x, y)
    }

    /// A circular arc.
    pub fn arc(&mut self, cx: f64, cy: f64, r: f64, a0: f64, a1: f64, ccw: bool) -> Result<()> {
        self.path.arc(cx, cy, r, a0, a1, ccw)
    }

    /// An elliptical arc.
    pub fn ellipse(&mut self, cx: f64, cy: f64, rx: f64, ry: f64, rotation: f64, a0: f64, a1: f64, ccw: bool) -> Result<()> {
        self.path.ellipse(cx, cy, rx, ry, rotation, a0, a1, ccw)
    }

    /// A rounded corner tangent to the current point, `(x1, y1)` and
    /// `(x2, y2)`.
    pub fn arc_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, r: f64) -> Result<()> {
        self.path.arc_to(x1, y1, x2, y2, r)
    }

    /// Appends a rectangle subpath.
    pub fn rect(&mut self, x: f64, y: f64, w: f64, h: f64) -> Result<()> {
        self.path.rect(x, y, w, h)
    }

    // ----- paint & stroke attributes (spec §6) -----

    /// Sets the fill paint.
    pub fn set_fill_paint(&mut self, paint: Paint) {
        self.state.fill_paint = paint;
    }

    /// Sets the stroke paint.
    pub fn set_stroke_paint(&mut self, paint: Paint) {
        self.state.stroke_paint = paint;
    }

    /// `lineWidth`; non-positive values are ignored, matching the HTML5
    /// canvas rule that invalid assignments leave the attribute unchanged.
    pub fn set_line_width(&mut self, width: f64) {
        if width.is_finite() && width > 0.0 {
            self.state.line_width = width;
        }
    }

    pub fn set_line_cap(&mut self, cap: LineCap) {
        self.state.line_cap = cap;
    }

    pub fn set_line_join(&mut self, join: LineJoin) {
        self.state.line_join = join;
    }

    /// `miterLimit`; non-positive values are ignored.
    pub fn set_miter_limit(&mut self, limit: f64) {
        if limit.is_finite() && limit > 0.0 {
            self.state.miter_limit = limit;
        }
    }

    /// `globalAlpha`, clamped to `[0, 1]`.
    pub fn set_global_alpha(&mut self, alpha: f64) {
        self.state.global_alpha = alpha.max(0.0).min(1.0);
    }

    pub fn set_composite_operation(&mut self, op: CompositeOperator) {
        self.state.composite_op = op;
    }

    /// Sets the dash pattern. A list containing a negative or non-finite
    /// value is rejected and leaves the pattern unchanged (spec §4.5).
    pub fn set_line_dash(&mut self, dash: Vec<f64>) -> Result<()> {
        if dash.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(Error::NonFiniteInput { context: "setLineDash" });
        }
        self.state.line_dash = dash;
        Ok(())
    }

    pub fn get_line_dash(&self) -> Vec<f64> {
        self.state.line_dash.clone()
    }

    pub fn set_line_dash_offset(&mut self, offset: f64) {
        if offset.is_finite() {
            self.state.line_dash_offset = offset;
        }
    }

    fn stroke_style(&self) -> StrokeStyle {
        StrokeStyle {
            width: self.state.line_width,
            cap: self.state.line_cap,
            join: self.state.line_join,
            miter_limit: self.state.miter_limit,
            dash: self.state.line_dash.clone(),
            dash_offset: self.state.line_dash_offset,
        }
    }

    // ----- drawing operations (spec §4.7, §4.9) -----

    /// Fills the current path using `rule`.
    pub fn fill(&mut self, rule: FillRule) {
        log::debug!("fill rule={:?}", rule);
        let polygons = flatten_path(&self.path);
        raster::fill_polygons(
            &mut self.surface,
            self.state.clip.as_ref(),
            &polygons,
            rule,
            &self.state.transform,
            &self.state.fill_paint,
            self.state.composite_op,
            self.state.global_alpha,
        );
    }

    /// Strokes the current path with the active stroke attributes.
    pub fn stroke(&mut self) {
        log::debug!("stroke width={}", self.state.line_width);
        let polygons = flatten_path(&self.path);
        let style = self.stroke_style();
        let outline = crate::stroke::stroke_to_polygons(&polygons, &style);
        raster::fill_polygons(
            &mut self.surface,
            self.state.clip.as_ref(),
            &outline,
            FillRule::NonZero,
            &self.state.transform,
            &self.state.stroke_paint,
            self.state.composite_op,
            self.state.global_alpha,
        );
    }

    /// Fills an axis-aligned rect without touching the current path,
    /// dispatching to the fast span writer when the transform allows it
    /// (spec §4.9).
    pub fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64) -> Result<()> {
        if !(x.is_finite() && y.is_finite() && w.is_finite() && h.is_finite()) {
            return Err(Error::NonFiniteInput { context: "fillRect" });
        }
        if shapes::supports_fast_path(&self.state.transform) {
            let (x0, y0, x1, y1) = device_rect_bounds(&self.state.transform, x, y, w, h);
            shapes::fill_rect(
                &mut self.surface,
                self.state.clip.as_ref(),
                x0,
                y0,
                x1,
                y1,
                &self.state.transform,
                &self.state.fill_paint,
                self.state.composite_op,
                self.state.global_alpha,
            );
        } else {
            let mut tmp = Path::new();
            tmp.rect(x, y, w, h)?;
            let polygons = flatten_path(&tmp);
            raster::fill_polygons(
                &mut self.surface,
                self.state.clip.as_ref(),
                &polygons,
                FillRule::NonZero,
                &self.state.transform,
                &self.state.fill_paint,
                self.state.composite_op,
                self.state.global_alpha,
            );
        }
        Ok(())
    }

    /// Strokes an axis-aligned rect's outline without touching the current
    /// path.
    pub fn stroke_rect(&mut self, x: f64, y: f64, w: f64, h: f64) -> Result<()> {
        let mut tmp = Path::new();
        tmp.rect(x, y, w, h)?;
        let polygons = flatten_path(&tmp);
        let style = self.stroke_style();
        let outline = crate::stroke::stroke_to_polygons(&polygons, &style);
        raster::fill_polygons(
            &mut self.surface,
            self.state.clip.as_ref(),
            &outline,
            FillRule::NonZero,
            &self.state.transform,
            &self.state.stroke_paint,
            self.state.composite_op,
            self.state.global_alpha,
        );
        Ok(())
    }

    /// Clears an axis-aligned rect to fully transparent, ignoring
    /// `globalAlpha` and the composite operator (spec §4.9) but still
    /// honoring the active clip.
    pub fn clear_rect(&mut self, x: f64, y: f64, w: f64, h: f64) -> Result<()> {
        if !(x.is_finite() && y.is_finite() && w.is_finite() && h.is_finite()) {
            return Err(Error::NonFiniteInput { context: "clearRect" });
        }
        let transparent = Paint::solid(crate::color::Color::TRANSPARENT);
        if shapes::supports_fast_path(&self.state.transform) {
            let (x0, y0, x1, y1) = device_rect_bounds(&self.state.transform, x, y, w, h);
            shapes::fill_rect(
                &mut self.surface,
                self.state.clip.as_ref(),
                x0,
                y0,
                x1,
                y1,
                &self.state.transform,
                &transparent,
                CompositeOperator::Copy,
                1.0,
            );
        } else {
            let mut tmp = Path::new();
            tmp.rect(x, y, w, h)?;
            let polygons = flatten_path(&tmp);
            raster::fill_polygons(
                &mut self.surface,
                self.state.clip.as_ref(),
                &polygons,
                FillRule::NonZero,
                &self.state.transform,
                &transparent,
                CompositeOperator::Copy,
                1.0,
            );
        }
        Ok(())
    }

    // ----- clipping (spec §4.6) -----

    /// Intersects the current clip with the region covered by the current
    /// path under `rule`.
    pub fn clip(&mut self, rule: FillRule) {
        log::debug!("clip rule={:?}", rule);
        let polygons = flatten_path(&self.path);
        let new_mask = raster::rasterize_mask(self.surface.width(), self.surface.height(), &polygons, rule, &self.state.transform);
        match &mut self.state.clip {
            Some(existing) => {
                let _ = existing.intersect(&new_mask);
            }
            None => self.state.clip = Some(new_mask),
        }
    }

    // ----- images (spec §4.10) -----

    /// Draws `image` per `params`, nearest-neighbor sampled (spec §4.10).
    pub fn draw_image(&mut self, image: &ImageSource, params: DrawImageParams) -> Result<()> {
        log::debug!("drawImage {}x{} -> ({}, {}) {}x{}", image.width(), image.height(), params.dx, params.dy, params.dw, params.dh);
        let local_to_device = source_to_user_transform(&params).multiply(&self.state.transform);
        let device_to_source = local_to_device.invert()?;

        let corners = [
            Point::new_unchecked(params.dx, params.dy),
            Point::new_unchecked(params.dx + params.dw, params.dy),
            Point::new_unchecked(params.dx + params.dw, params.dy + params.dh),
            Point::new_unchecked(params.dx, params.dy + params.dh),
        ];
        let device_corners: Vec<Point> = corners.iter().map(|p| self.state.transform.transform_point(*p)).collect();
        let min_x = device_corners.iter().map(|p| p.x).fold(f64::INFINITY, f64::min).floor().max(0.0) as i64;
        let max_x = device_corners.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max).ceil().min(self.surface.width() as f64) as i64;
        let min_y = device_corners.iter().map(|p| p.y).fold(f64::INFINITY, f64::min).floor().max(0.0) as i64;
        let max_y = device_corners.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max).ceil().min(self.surface.height() as f64) as i64;

        for y in min_y..max_y {
            for x in min_x..max_x {
                if let Some(mask) = &self.state.clip {
                    if !mask.get_bit(x, y) {
                        continue;
                    }
                }
                let device_point = Point::new_unchecked(x as f64 + 0.5, y as f64 + 0.5);
                if let Some(color) = sample_nearest(image, &params, &device_to_source, device_point) {
                    let dst = self.surface.get_pixel(x, y).unwrap_or(crate::color::Color::TRANSPARENT);
                    let out = crate::compositor::composite(self.state.composite_op, color, dst, self.state.global_alpha);
                    self.surface.set_pixel(x, y, out);
                }
            }
        }
        Ok(())
    }

    // ----- paint source construction (spec §4.3) -----

    pub fn create_linear_gradient(&self, p0: Point, p1: Point, stops: Vec<GradientStop>) -> Result<Paint> {
        Paint::linear(p0, p1, stops)
    }

    pub fn create_radial_gradient(&self, c0: Point, r0: f64, c1: Point, r1: f64, stops: Vec<GradientStop>) -> Result<Paint> {
        Paint::radial(c0, r0, c1, r1, stops)
    }

    pub fn create_conic_gradient(&self, cx: f64, cy: f64, start_angle: f64, stops: Vec<GradientStop>) -> Result<Paint> {
        Paint::conic(cx, cy, start_angle, stops)
    }

    pub fn create_pattern(&self, image: Rc<ImageSource>, repeat: RepeatMode) -> Paint {
        Paint::pattern(image, repeat, Transform2D::identity())
    }

    // ----- hit testing (spec §6) -----

    /// `true` when `(x, y)` (in the coordinate system active right now)
    /// lies inside the current path under `rule`.
    pub fn is_point_in_path(&self, x: f64, y: f64, rule: FillRule) -> bool {
        let polygons = flatten_path(&self.path);
        raster::point_in_polygons(&polygons, rule, &self.state.transform, Point::new_unchecked(x, y))
    }

    /// `true` when `(x, y)` lies inside the stroked outline of the current
    /// path, under the active stroke attributes.
    pub fn is_point_in_stroke(&self, x: f64, y: f64) -> bool {
        let polygons = flatten_path(&self.path);
        let style = self.stroke_style();
        let outline = crate::stroke::stroke_to_polygons(&polygons, &style);
        raster::point_in_polygons(&outline, FillRule::NonZero, &self.state.transform, Point::new_unchecked(x, y))
    }
}

/// Maps a user-space axis-aligned rect through an axis-aligned `transform`
/// to integer device-pixel bounds `(x0, y0, x1, y1)`.
fn device_rect_bounds(transform: &Transform2D, x: f64, y: f64, w: f64, h: f64) -> (i64, i64, i64, i64) {
    let p0 = transform.transform_point(Point::new_unchecked(x, y));
    let p1 = transform.transform_point(Point::new_unchecked(x + w, y + h));
    let (min_x, max_x) = if p0.x <= p1.x { (p0.x, p1.x) } else { (p1.x, p0.x) };
    let (min_y, max_y) = if p0.y <= p1.y { (p0.y, p1.y) } else { (p1.y, p0.y) };
    (min_x.round() as i64, min_y.round() as i64, max_x.round() as i64, max_y.round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;

    #[test]
    fn fill_rect_writes_opaque_pixels() {
        let mut ctx = Context::new(10, 10).unwrap();
        ctx.set_fill_paint(Paint::solid(Color::from_rgba8(255, 0, 0, 255)));
        ctx.fill_rect(2.0, 2.0, 4.0, 4.0).unwrap();
        assert_eq!(ctx.surface().get_pixel(3, 3), Some(Color::from_rgba8(255, 0, 0, 255)));
        assert_eq!(ctx.surface().get_pixel(9, 9), Some(Color::TRANSPARENT));
    }

    #[test]
    fn clear_rect_ignores_global_alpha() {
        let mut ctx = Context::new(10, 10).unwrap();
        ctx.set_fill_paint(Paint::solid(Color::from_rgba8(255, 0, 0, 255)));
        ctx.fill_rect(0.0, 0.0, 10.0, 10.0).unwrap();
        ctx.set_global_alpha(0.2);
        ctx.clear_rect(2.0, 2.0, 4.0, 4.0).unwrap();
        assert_eq!(ctx.surface().get_pixel(3, 3), Some(Color::TRANSPARENT));
    }

    #[test]
    fn save_restore_round_trips_state() {
        let mut ctx = Context::new(10, 10).unwrap();
        ctx.set_global_alpha(0.5);
        ctx.save();
        ctx.set_global_alpha(1.0);
        ctx.restore();
        assert_eq!(ctx.state.global_alpha, 0.5);
    }

    #[test]
    fn restore_without_save_is_a_noop() {
        let mut ctx = Context::new(10, 10).unwrap();
        ctx.set_global_alpha(0.7);
        ctx.restore();
        assert_eq!(ctx.state.global_alpha, 0.7);
    }

    #[test]
    fn clip_restricts_subsequent_fills() {
        let mut ctx = Context::new(10, 10).unwrap();
        ctx.rect(0.0, 0.0, 4.0, 4.0).unwrap();
        ctx.clip(FillRule::NonZero);
        ctx.begin_path();
        ctx.set_fill_paint(Paint::solid(Color::from_rgba8(0, 255, 0, 255)));
        ctx.fill_rect(0.0, 0.0, 10.0, 10.0).unwrap();
        assert_eq!(ctx.surface().get_pixel(1, 1), Some(Color::from_rgba8(0, 255, 0, 255)));
        assert_eq!(ctx.surface().get_pixel(8, 8), Some(Color::TRANSPARENT));
    }

    #[test]
    fn translate_moves_subsequent_drawing() {
        let mut ctx = Context::new(10, 10).unwrap();
        ctx.translate(5.0, 0.0).unwrap();
        ctx.set_fill_paint(Paint::solid(Color::from_rgba8(1, 1, 1, 255)));
        ctx.fill_rect(0.0, 0.0, 2.0, 2.0).unwrap();
        assert_eq!(ctx.surface().get_pixel(6, 1), Some(Color::from_rgba8(1, 1, 1, 255)));
        assert_eq!(ctx.surface().get_pixel(1, 1), Some(Color::TRANSPARENT));
    }

    #[test]
    fn is_point_in_path_matches_filled_rect() {
        let mut ctx = Context::new(10, 10).unwrap();
        ctx.rect(2.0, 2.0, 4.0, 4.0).unwrap();
        assert!(ctx.is_point_in_path(3.0, 3.0, FillRule::NonZero));
        assert!(!ctx.is_point_in_path(9.0, 9.0, FillRule::NonZero));
    }
}
