//! The image source interface (spec §6) and `drawImage` sampling (spec
//! §4.10). Grounded in the teacher's `Pixmap` as a read-only image source
//! (`Pixmap::pixel`, used identically by `Pattern` in
//! `src/shaders/pattern.rs`) but kept as its own lightweight type rather
//! than reusing the mutable `Surface`, since spec §6 defines the image
//! source interface as `{ width, height, data: RGBA bytes }` independent of
//! the drawing surface.

use crate::color::Color;
use crate::error::{Error, Result};
use crate::point::Point;
use crate::transform::Transform2D;

/// A read-only RGBA image, as accepted by `drawImage` and `createPattern`
/// (spec §6). RGB sources are auto-upgraded to RGBA with alpha 255 at
/// construction (spec §4.10).
#[derive(Clone, Debug, PartialEq)]
pub struct ImageSource {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl ImageSource {
    /// Builds an image source from RGBA bytes (`width * height * 4` bytes).
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 || data.len() != width as usize * height as usize * 4 {
            return Err(Error::InvalidDimension { width, height });
        }
        Ok(ImageSource { data, width, height })
    }

    /// Builds an image source from RGB bytes, upgrading to RGBA with
    /// alpha 255 (spec §4.10).
    pub fn from_rgb(width: u32, height: u32, data: &[u8]) -> Result<Self> {
        if width == 0 || height == 0 || data.len() != width as usize * height as usize * 3 {
            return Err(Error::InvalidDimension { width, height });
        }
        let mut rgba = Vec::with_capacity(width as usize * height as usize * 4);
        for px in data.chunks_exact(3) {
            rgba.extend_from_slice(px);
            rgba.push(255);
        }
        Ok(ImageSource { data: rgba, width, height })
    }

    /// Image width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Reads the pixel at integer coordinates `(x, y)`, or `None` when out
    /// of range.
    #[inline]
    pub fn get_pixel(&self, x: i64, y: i64) -> Option<Color> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        let off = (y as usize * self.width as usize + x as usize) * 4;
        let p = &self.data[off..off + 4];
        Some(Color::from_rgba8(p[0], p[1], p[2], p[3]))
    }
}

/// The source and destination rectangles for a `drawImage` call (spec
/// §4.10).
#[derive(Copy, Clone, Debug)]
pub struct DrawImageParams {
    /// Source rect origin, in the image's own pixel space.
    pub sx: f64,
    /// Source rect origin, in the image's own pixel space.
    pub sy: f64,
    /// Source rect width.
    pub sw: f64,
    /// Source rect height.
    pub sh: f64,
    /// Destination rect origin, in user space.
    pub dx: f64,
    /// Destination rect origin, in user space.
    pub dy: f64,
    /// Destination rect width, in user space.
    pub dw: f64,
    /// Destination rect height, in user space.
    pub dh: f64,
}

impl DrawImageParams {
    /// The 3-argument overload: draw the whole image at `(dx, dy)` at its
    /// native size.
    pub fn whole_image(image: &ImageSource, dx: f64, dy: f64) -> Self {
        DrawImageParams {
            sx: 0.0,
            sy: 0.0,
            sw: image.width() as f64,
            sh: image.height() as f64,
            dx,
            dy,
            dw: image.width() as f64,
            dh: image.height() as f64,
        }
    }

    /// The 5-argument overload: draw the whole image scaled into
    /// `(dx, dy, dw, dh)`.
    pub fn scaled(image: &ImageSource, dx: f64, dy: f64, dw: f64, dh: f64) -> Self {
        DrawImageParams {
            sx: 0.0,
            sy: 0.0,
            sw: image.width() as f64,
            sh: image.height() as f64,
            dx,
            dy,
            dw,
            dh,
        }
    }
}

/// Builds the affine map from source-image pixel space directly to
/// destination user space: translate the source rect's origin to the
/// origin, scale by `dw/sw, dh/sh`, then translate to `(dx, dy)`.
pub fn source_to_user_transform(params: &DrawImageParams) -> Transform2D {
    let sx_scale = if params.sw != 0.0 { params.dw / params.sw } else { 0.0 };
    let sy_scale = if params.sh != 0.0 { params.dh / params.sh } else { 0.0 };
    Transform2D::from_translate(-params.sx, -params.sy)
        .pre_scale(sx_scale, sy_scale)
        .pre_translate(params.dx, params.dy)
}

/// Samples `image` at the source pixel that `device_point` maps back to
/// under `device_to_source` (the inverse of `source_to_user_transform(..)`
/// composed with the current transform), nearest-neighbor, floored (spec
/// §4.10). Returns `None` outside the source rect or at alpha 0 (which
/// leaves the destination untouched under source-over).
pub fn sample_nearest(
    image: &ImageSource,
    params: &DrawImageParams,
    device_to_source: &Transform2D,
    device_point: Point,
) -> Option<Color> {
    let local = device_to_source.transform_point(device_point);
    if local.x < params.sx || local.x >= params.sx + params.sw || local.y < params.sy || local.y >= params.sy + params.sh {
        return None;
    }
    let color = image.get_pixel(local.x.floor() as i64, local.y.floor() as i64)?;
    if color.a == 0 {
        None
    } else {
        Some(color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_sources_are_upgraded_to_opaque_rgba() {
        let img = ImageSource::from_rgb(1, 1, &[10, 20, 30]).unwrap();
        assert_eq!(img.get_pixel(0, 0), Some(Color::from_rgba8(10, 20, 30, 255)));
    }

    #[test]
    fn out_of_range_reads_are_none() {
        let img = ImageSource::from_rgba(2, 2, vec![0; 16]).unwrap();
        assert_eq!(img.get_pixel(5, 5), None);
    }
}
