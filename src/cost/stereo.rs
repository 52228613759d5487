//! Stereo cost: RGB dissimilarity aggregated along edge runs.

use std::sync::Arc;

use crate::cost::CostFunction;
use crate::edges::EdgeMap;
use crate::image::RgbImage;

/// Per-cell cost for left/right disparity matching.
///
/// The base cost is the RGB L2 distance between the input pixel at
/// `(x, column)` and the reference pixel at `(y, column)`, averaged over a
/// vertical run of the input's edge pixels in column `x`.
pub(crate) struct StereoCost {
    input: Arc<RgbImage>,
    refer: Arc<RgbImage>,
    edges: Arc<EdgeMap>,
    weight: f64,
    row_range: i32,
}

impl StereoCost {
    pub(crate) fn new(
        input: Arc<RgbImage>,
        refer: Arc<RgbImage>,
        edges: Arc<EdgeMap>,
        weight: f64,
        row_range: i32,
    ) -> Self {
        Self {
            input,
            refer,
            edges,
            weight,
            row_range,
        }
    }

    /// Normalized RGB distance between input `(x, column)` and reference
    /// `(y, column)`.
    #[inline]
    fn norm(&self, x: i32, y: i32, column: i32) -> f64 {
        let a = self.input.pixel(x as usize, column as usize);
        let b = self.refer.pixel(y as usize, column as usize);
        let dr = f64::from(a.r) - f64::from(b.r);
        let dg = f64::from(a.g) - f64::from(b.g);
        let db = f64::from(a.b) - f64::from(b.b);
        (dr * dr + dg * dg + db * db).sqrt() / 255.0
    }
}

impl CostFunction for StereoCost {
    type Ctx = ();

    fn prepare(&self, _column: i32, _skip: i32) -> Self::Ctx {}

    fn base_cost(&self, _ctx: &(), x: i32, y: i32, column: i32, _skip: i32) -> f64 {
        let scanlines = self.input.height() as i32;
        let mut count = 1u32;
        let mut d = self.norm(x, y, column);

        // Walk down, then up, while the input column stays on an edge.
        let mut i = 1;
        while column + i < scanlines
            && self.edges.is_edge(x as usize, (column + i) as usize)
            && i < self.row_range
        {
            d += self.norm(x, y, column + i);
            count += 1;
            i += 1;
        }
        let mut i = 1;
        while column - i >= 0
            && self.edges.is_edge(x as usize, (column - i) as usize)
            && i < self.row_range
        {
            d += self.norm(x, y, column - i);
            count += 1;
            i += 1;
        }

        d / f64::from(count)
    }

    /// Diagonal steps keep the disparity constant, so they are charged the
    /// weighted square of the local dissimilarity.
    fn diagonal_bias(&self, _x: i32, _y: i32, cost: f64) -> f64 {
        self.weight * cost * cost
    }
}

#[cfg(test)]
mod tests {
    use super::StereoCost;
    use crate::cost::CostFunction;
    use crate::edges::EdgeMap;
    use crate::image::{Rgb, RgbImage};
    use crate::pool::WorkerPool;
    use std::sync::Arc;

    fn gray_column(values: &[u8]) -> Arc<RgbImage> {
        Arc::new(RgbImage::from_fn(1, values.len(), |_, y| Rgb::gray(values[y])).unwrap())
    }

    #[test]
    fn base_cost_is_normalized_rgb_distance() {
        let input = gray_column(&[255, 0, 0]);
        let refer = gray_column(&[0, 0, 0]);
        let pool = WorkerPool::new(1).unwrap();
        let edges = Arc::new(EdgeMap::sobel(&pool, &input, 255));
        let cost = StereoCost::new(input, refer, edges, 1.0, 1);

        let c = cost.base_cost(&(), 0, 0, 0, 1);
        let expected = (3.0f64 * 255.0 * 255.0).sqrt() / 255.0;
        assert!((c - expected).abs() < 1e-12);
        // Identical pixels cost nothing.
        assert_eq!(cost.base_cost(&(), 0, 0, 1, 1), 0.0);
    }

    #[test]
    fn diagonal_bias_squares_and_weights() {
        let input = gray_column(&[0, 0]);
        let refer = gray_column(&[0, 0]);
        let pool = WorkerPool::new(1).unwrap();
        let edges = Arc::new(EdgeMap::sobel(&pool, &input, 255));
        let cost = StereoCost::new(input, refer, edges, 2.0, 1);
        assert_eq!(cost.diagonal_bias(0, 0, 0.5), 2.0 * 0.25);
        assert_eq!(cost.vertical_bias(0, 0, 0.5), 0.5);
        assert_eq!(cost.horizontal_bias(0, 0, 0.5), 0.5);
    }
}
