//! The error taxonomy raised synchronously at the call site that produced
//! the failure. There are no asynchronous callbacks in this crate: every
//! fallible operation returns a `Result` before it touches the surface, so a
//! rejected command never leaves behind a partial write.

use thiserror::Error;

/// Everything that can go wrong while building or executing a drawing
/// command.
#[derive(Error, Debug, Copy, Clone, PartialEq)]
pub enum Error {
    /// A [`crate::Surface`] was requested larger than 16384 px on an axis,
    /// or with a pixel count above 2^28.
    #[error("surface dimensions {width}x{height} are invalid (max 16384 per axis, max 2^28 pixels)")]
    InvalidDimension {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// A coordinate, radius, or matrix element was NaN or +/-infinity.
    #[error("non-finite input in {context}")]
    NonFiniteInput {
        /// Which operation produced the bad value, e.g. `"arcTo radius"`.
        context: &'static str,
    },

    /// `arcTo` or a radial gradient was given a negative radius.
    #[error("negative radius in {context}")]
    NegativeRadius {
        /// Which operation rejected the radius.
        context: &'static str,
    },

    /// A radial gradient's inner and outer circles were identical.
    #[error("radial gradient inner and outer circles are identical")]
    DegenerateRadialGradient,

    /// [`crate::Transform2D::invert`] was called on a singular matrix.
    #[error("transform is not invertible (|det| < 1e-10)")]
    NonInvertibleTransform,

    /// [`crate::ClipMask::intersect`] was given a mask of a different size.
    #[error("clip mask shapes do not match")]
    ShapeMismatch,

    /// A hit-test or overloaded drawing call received an argument count it
    /// does not know how to dispatch.
    #[error("invalid argument count for {context}")]
    InvalidArgumentCount {
        /// Which overloaded operation failed to dispatch.
        context: &'static str,
    },

    /// The (external) surface serializer was handed a malformed surface.
    #[error("surface serialization failed: {reason}")]
    SurfaceSerializationFailure {
        /// Human-readable reason, forwarded from the serializer.
        reason: &'static str,
    },
}

/// Crate-local result alias.
pub type Result<T> = core::result::Result<T, Error>;
