//! Matcher facade: owns the images, the worker pool, the match store and
//! the per-worker scratch tables, and runs the two matching variants.

use std::sync::Arc;

use crate::cost::fusion::FusionCost;
use crate::cost::stereo::StereoCost;
use crate::dp::{Band, ScratchTables};
use crate::edges::EdgeMap;
use crate::image::{Rgb, RgbImage};
use crate::matcher::scheduler::{Dims, Scheduler};
use crate::pool::WorkerPool;
use crate::store::{MatchStore, UNMATCHED};
use crate::trace::dp_trace;
use crate::util::{DpMatchError, DpMatchResult};

pub(crate) mod scheduler;

/// Parameters of the stereo variant.
///
/// The correspondence band is derived from `max_disparity`: the search runs
/// only to the left in the reference, matching rectified stereo geometry.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StereoConfig {
    /// Stride between directly solved scanlines in the coarse pass.
    pub skip: i32,
    /// Weight of the squared-dissimilarity diagonal penalty.
    pub weight: f64,
    /// Upper bound on the vertical edge-aggregation walk, in pixels.
    pub row_range: i32,
    /// Sobel magnitude above which a pixel counts as an edge.
    pub threshold: u8,
    /// Largest disparity searched, in pixels.
    pub max_disparity: i32,
}

impl Default for StereoConfig {
    fn default() -> Self {
        Self {
            skip: 1,
            weight: 1.0,
            row_range: 8,
            threshold: 40,
            max_disparity: 64,
        }
    }
}

/// Parameters of the fusion variant.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FusionConfig {
    /// Stride between directly solved scanlines in the coarse pass.
    pub skip: i32,
    /// Gradient-disagreement falloff.
    pub sigma_c: f64,
    /// Glue-term falloff.
    pub sigma_g: f64,
    /// Correspondence band half-widths; symmetric by default.
    pub band: Band,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            skip: 8,
            sigma_c: 0.01,
            sigma_g: 0.1,
            band: Band::default(),
        }
    }
}

/// Scanline correspondence engine over a pair of rectified rasters.
pub struct Matcher {
    input: Arc<RgbImage>,
    refer: Arc<RgbImage>,
    pool: WorkerPool,
    store: Arc<MatchStore>,
    scratch: Arc<ScratchTables>,
}

impl Matcher {
    /// Creates a matcher sized to the machine's available parallelism.
    pub fn new(input: RgbImage, reference: RgbImage) -> DpMatchResult<Self> {
        Self::with_pool(input, reference, WorkerPool::with_hardware_parallelism()?)
    }

    /// Creates a matcher with an explicit worker count.
    pub fn with_threads(
        input: RgbImage,
        reference: RgbImage,
        threads: usize,
    ) -> DpMatchResult<Self> {
        Self::with_pool(input, reference, WorkerPool::new(threads)?)
    }

    fn with_pool(input: RgbImage, reference: RgbImage, pool: WorkerPool) -> DpMatchResult<Self> {
        if input.height() != reference.height() {
            return Err(DpMatchError::HeightMismatch {
                input: input.height(),
                reference: reference.height(),
            });
        }
        let store = Arc::new(MatchStore::new(input.height(), input.width()));
        let scratch = Arc::new(ScratchTables::new(
            pool.len(),
            input.width(),
            reference.width(),
        )?);
        Ok(Self {
            input: Arc::new(input),
            refer: Arc::new(reference),
            pool,
            store,
            scratch,
        })
    }

    /// Runs the stereo variant; afterwards the match store holds the
    /// disparity mapping of every scheduled scanline.
    pub fn stereo(&mut self, cfg: StereoConfig) -> DpMatchResult<()> {
        if cfg.skip < 1 {
            return Err(DpMatchError::InvalidSkip { skip: cfg.skip });
        }
        if cfg.max_disparity < 0 {
            return Err(DpMatchError::InvalidInput("max_disparity must be >= 0"));
        }
        if cfg.row_range < 0 {
            return Err(DpMatchError::InvalidInput("row_range must be >= 0"));
        }

        let _span = dp_trace!(span "stereo", skip = cfg.skip);
        self.store.reset();

        let edges = Arc::new(EdgeMap::sobel_arc(&self.pool, &self.input, cfg.threshold));
        let cost = Arc::new(StereoCost::new(
            Arc::clone(&self.input),
            Arc::clone(&self.refer),
            edges,
            cfg.weight,
            cfg.row_range,
        ));
        let band = Band {
            left: cfg.max_disparity,
            right: 0,
        };
        self.run(cost, band, cfg.skip)
    }

    /// Runs the fusion variant, warping the reference geometry onto the
    /// input's.
    pub fn fusion(&mut self, cfg: FusionConfig) -> DpMatchResult<()> {
        if cfg.skip < 1 {
            return Err(DpMatchError::InvalidSkip { skip: cfg.skip });
        }
        if cfg.sigma_c <= 0.0 || cfg.sigma_g <= 0.0 {
            return Err(DpMatchError::InvalidInput("sigmas must be > 0"));
        }
        if cfg.band.left < 0 || cfg.band.right < 0 {
            return Err(DpMatchError::InvalidInput(
                "band half-widths must be >= 0",
            ));
        }

        let _span = dp_trace!(span "fusion", skip = cfg.skip);
        self.store.reset();

        let cost = Arc::new(FusionCost::new(
            Arc::clone(&self.input),
            Arc::clone(&self.refer),
            Arc::clone(&self.store),
            cfg.sigma_c,
            cfg.sigma_g,
        ));
        self.run(cost, cfg.band, cfg.skip)
    }

    fn run<C: crate::cost::CostFunction + 'static>(
        &self,
        cost: Arc<C>,
        band: Band,
        skip: i32,
    ) -> DpMatchResult<()> {
        let dims = Dims {
            width: self.store.width() as i32,
            ref_width: self.refer.width() as i32,
            scanlines: self.store.len() as i32,
        };
        Scheduler::new(
            &self.pool,
            Arc::clone(&self.store),
            Arc::clone(&self.scratch),
            cost,
            band,
            dims,
        )
        .run(skip)
    }

    /// Copies out the pattern of scanline `c`: entry `x` is the reference
    /// x-coordinate matched to input `x`, or [`UNMATCHED`].
    pub fn match_pattern(&self, c: usize) -> DpMatchResult<Vec<i32>> {
        if c >= self.store.len() {
            return Err(DpMatchError::IndexOutOfBounds {
                index: c,
                len: self.store.len(),
                context: "scanline",
            });
        }
        Ok(self.store.snapshot(c))
    }

    /// Renders `|match - x|` scaled by `255 / max_disparity` as a grayscale
    /// image; unmatched pixels come out pure red.
    pub fn disparity_image(&self, max_disparity: i32) -> DpMatchResult<RgbImage> {
        if max_disparity < 1 {
            return Err(DpMatchError::InvalidInput("max_disparity must be >= 1"));
        }
        let width = self.input.width();
        let height = self.input.height();
        let mut out = Vec::with_capacity(width * height * 3);
        for c in 0..height {
            let pattern = self.store.snapshot(c);
            for (x, &m) in pattern.iter().enumerate() {
                if m == UNMATCHED {
                    out.extend_from_slice(&[255, 0, 0]);
                } else {
                    let scaled =
                        (f64::from((m - x as i32).abs()) * 255.0 / f64::from(max_disparity))
                            .min(255.0) as u8;
                    out.extend_from_slice(&[scaled, scaled, scaled]);
                }
            }
        }
        RgbImage::new(out, width, height)
    }

    /// Renders the reference warped onto the input geometry: output pixel
    /// `(x, c)` is the reference pixel `(match[x], c)`. Unmatched pixels
    /// fall back to the input pixel.
    pub fn fused_image(&self) -> DpMatchResult<RgbImage> {
        let width = self.input.width();
        let height = self.input.height();
        let ref_width = self.refer.width();
        let mut out = Vec::with_capacity(width * height * 3);
        for c in 0..height {
            let pattern = self.store.snapshot(c);
            for (x, &m) in pattern.iter().enumerate() {
                let px: Rgb = if m != UNMATCHED && (m as usize) < ref_width {
                    self.refer.pixel(m as usize, c)
                } else {
                    self.input.pixel(x, c)
                };
                out.extend_from_slice(&[px.r, px.g, px.b]);
            }
        }
        RgbImage::new(out, width, height)
    }

    /// The input raster.
    pub fn input(&self) -> &RgbImage {
        &self.input
    }

    /// The reference raster.
    pub fn reference(&self) -> &RgbImage {
        &self.refer
    }

    /// Worker count of the owned pool.
    pub fn threads(&self) -> usize {
        self.pool.len()
    }
}
