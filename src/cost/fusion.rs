//! Fusion cost: gradient disagreement plus a glue term toward solved
//! neighbor scanlines.

use std::sync::Arc;

use crate::cost::CostFunction;
use crate::image::RgbImage;
use crate::store::MatchStore;

/// Per-cell cost for warping a sparse depth image onto a dense one.
///
/// Two bounded terms are combined: `f`, the disagreement between the local
/// horizontal red-channel gradients of the two images, and `g`, a glue term
/// that pulls the path toward the correspondence already computed for the
/// neighbor scanline `column - skip`, weighted by the reference's vertical
/// self-similarity at that column. Each term passes through
/// `1 - exp(-t^2 / (2 sigma^2))`, so both summands lie in `[0, 1)`.
pub(crate) struct FusionCost {
    input: Arc<RgbImage>,
    refer: Arc<RgbImage>,
    store: Arc<MatchStore>,
    sigma_c: f64,
    sigma_g: f64,
    /// X * Y, the glue distance normalizer.
    table_len: f64,
    width: i32,
}

pub(crate) struct FusionCtx {
    /// Pattern of scanline `column - skip`, present only when both
    /// neighbors at distance `skip` were completed by an earlier pass.
    prev: Option<Vec<i32>>,
}

impl FusionCost {
    pub(crate) fn new(
        input: Arc<RgbImage>,
        refer: Arc<RgbImage>,
        store: Arc<MatchStore>,
        sigma_c: f64,
        sigma_g: f64,
    ) -> Self {
        let width = input.width() as i32;
        let table_len = (input.width() * refer.width()) as f64;
        Self {
            input,
            refer,
            store,
            sigma_c,
            sigma_g,
            table_len,
            width,
        }
    }

    /// Red-channel step toward the previous pixel, falling back to the next
    /// pixel at the left border.
    #[inline]
    fn red_step(img: &RgbImage, x: i32, column: i32) -> f64 {
        let here = f64::from(img.pixel(x as usize, column as usize).r);
        let there = if x >= 1 {
            f64::from(img.pixel(x as usize - 1, column as usize).r)
        } else if (x as usize) + 1 < img.width() {
            f64::from(img.pixel(x as usize + 1, column as usize).r)
        } else {
            here
        };
        (here - there) / 255.0
    }
}

impl CostFunction for FusionCost {
    type Ctx = FusionCtx;

    fn prepare(&self, column: i32, skip: i32) -> FusionCtx {
        let scanlines = self.store.len() as i32;
        let prev = (column - skip >= 0
            && column + skip < scanlines
            && self.store.is_solved((column - skip) as usize)
            && self.store.is_solved((column + skip) as usize))
        .then(|| self.store.snapshot((column - skip) as usize));
        FusionCtx { prev }
    }

    fn base_cost(&self, ctx: &FusionCtx, x: i32, y: i32, column: i32, skip: i32) -> f64 {
        let ca = Self::red_step(&self.input, x, column);
        let cb = Self::red_step(&self.refer, y, column);
        let f = (ca - cb).abs();

        let mut g = 0.0;
        if let Some(prev) = &ctx.prev {
            if (y as usize) < prev.len() {
                let dist = f64::from(prev[y as usize] - y) / self.table_len;
                let above = f64::from(self.refer.pixel(y as usize, (column - skip) as usize).r);
                let here = f64::from(self.refer.pixel(y as usize, column as usize).r);
                let sim = 1.0 - (above - here).abs() / 255.0;
                g = (dist * sim).abs();
            }
        }

        let sig_c = 2.0 * self.sigma_c * self.sigma_c;
        let sig_g = 2.0 * self.sigma_g * self.sigma_g;
        (1.0 - (-f * f / sig_c).exp()) + (1.0 - (-g * g / sig_g).exp())
    }

    /// `(x - y) / width` is integer division: the bias is zero anywhere
    /// inside the band and only bites at a full table-width of separation.
    fn vertical_bias(&self, x: i32, y: i32, cost: f64) -> f64 {
        let bias = f64::from((x - y) / self.width);
        cost + bias * bias
    }

    fn horizontal_bias(&self, x: i32, y: i32, cost: f64) -> f64 {
        let bias = f64::from((x - y) / self.width);
        cost + bias * bias
    }
}
