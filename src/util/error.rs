//! Error types for dpmatch.

use thiserror::Error;

/// Result alias for dpmatch operations.
pub type DpMatchResult<T> = std::result::Result<T, DpMatchError>;

/// Errors that can occur when constructing rasters or running the matcher.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DpMatchError {
    /// An image dimension is zero or too large to address.
    #[error("invalid image dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// A pixel buffer does not match the declared dimensions.
    #[error("buffer holds {got} bytes, dimensions require {needed}")]
    BufferTooSmall { needed: usize, got: usize },
    /// Input and reference images differ in scanline count.
    #[error("input has {input} scanlines, reference has {reference}")]
    HeightMismatch { input: usize, reference: usize },
    /// An index is outside the valid range for the named collection.
    #[error("{context} index {index} out of bounds (len {len})")]
    IndexOutOfBounds {
        index: usize,
        len: usize,
        context: &'static str,
    },
    /// The skip stride must be at least 1.
    #[error("skip must be >= 1, got {skip}")]
    InvalidSkip { skip: i32 },
    /// The worker pool needs at least one thread.
    #[error("worker pool needs at least one thread")]
    InvalidThreadCount,
    /// A parameter fails its domain check.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// A candidate path cost evaluated to NaN during relaxation.
    #[error("non-finite path cost at cell ({x}, {y}) on scanline {column}")]
    NonFiniteCost { x: i32, y: i32, column: i32 },
    /// The backtrace reached a cell without a recorded direction and the
    /// boundary fallback could not make progress.
    #[error("unset path direction at cell ({x}, {y}) on scanline {column}")]
    UnsetDirection { x: i32, y: i32, column: i32 },
    /// Loading or decoding an image failed.
    #[cfg(feature = "image-io")]
    #[error("image i/o failed: {reason}")]
    ImageIo { reason: String },
}
