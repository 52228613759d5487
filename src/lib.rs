//! dpmatch computes per-scanline correspondences between two rectified
//! images with scanline-skipping dynamic programming.
//!
//! A coarse pass solves every `skip`-th scanline with a banded shortest
//! path through the `(input-x, reference-y)` cost table; recursive
//! refinement levels then fill the scanlines in between, copying a
//! neighbor's pattern where the two nearest solved neighbors agree and
//! re-solving a narrowed segment where they do not. Scanline jobs run on a
//! fixed worker pool whose `join` is the barrier between levels.
//!
//! Two cost variants plug into the same engine: [`Matcher::stereo`]
//! recovers left/right disparity, [`Matcher::fusion`] warps a sparse depth
//! raster onto a dense one.

pub mod image;
pub mod util;

mod cost;
mod dp;
mod edges;
mod matcher;
mod pool;
mod store;
pub(crate) mod trace;

pub use cost::CostFunction;
pub use dp::Band;
pub use edges::EdgeMap;
pub use image::{Rgb, RgbImage};
pub use matcher::{FusionConfig, Matcher, StereoConfig};
pub use pool::WorkerPool;
pub use store::UNMATCHED;
pub use util::{DpMatchError, DpMatchResult};
