/*!
A tiny, CPU-only software rasterizer implementing the HTML5 Canvas 2D
drawing model: path building and flattening, scanline polygon fill, stroke
expansion, a 1-bit stencil clip, Porter-Duff compositing, and nearest-
neighbor image/pattern sampling. The rasterizer is intentionally aliased —
there is no anti-aliasing anywhere in this crate.
*/

#![warn(missing_debug_implementations)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::many_single_char_names)]

mod clip;
mod color;
mod compositor;
mod context;
mod error;
mod flatten;
mod image;
mod paint;
mod path;
mod point;
mod raster;
mod shapes;
mod stroke;
mod surface;
mod transform;

pub use clip::ClipMask;
pub use color::Color;
pub use compositor::CompositeOperator;
pub use context::Context;
pub use error::{Error, Result};
pub use flatten::{flatten_path, Polygon, FLATTEN_TOLERANCE};
pub use image::{DrawImageParams, ImageSource};
pub use paint::{GradientStop, Paint, RepeatMode};
pub use path::{Path, PathCommand};
pub use point::Point;
pub use raster::FillRule;
pub use stroke::{LineCap, LineJoin, StrokeStyle};
pub use surface::{Surface, BYTES_PER_PIXEL, MAX_DIMENSION, MAX_PIXELS};
pub use transform::{Orientation, Transform2D};
