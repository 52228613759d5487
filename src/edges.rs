//! Sobel edge map for the stereo cost's vertical aggregation window.
//!
//! Each pixel stores the clamped gradient magnitude and a binary edge flag.
//! The flag gates how far the stereo cost walks up and down an image column
//! when aggregating dissimilarity. Rows are processed in slabs through the
//! worker pool and the map is immutable afterwards.

use std::sync::{Arc, Mutex, PoisonError};

use crate::image::RgbImage;
use crate::pool::WorkerPool;
use crate::trace::dp_trace;

/// Per-pixel Sobel magnitude and edge flag.
#[derive(Clone)]
pub struct EdgeMap {
    width: usize,
    height: usize,
    mag: Vec<u8>,
    flags: Vec<bool>,
}

impl EdgeMap {
    fn zeroed(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            mag: vec![0; width * height],
            flags: vec![false; width * height],
        }
    }

    /// Computes the edge map of `image`, dispatching row slabs to `pool`.
    ///
    /// A pixel is flagged as an edge when its stored magnitude exceeds
    /// `threshold`. The one-pixel border keeps magnitude 0 and is never
    /// flagged.
    pub fn sobel(pool: &WorkerPool, image: &RgbImage, threshold: u8) -> Self {
        Self::sobel_arc(pool, &Arc::new(image.clone()), threshold)
    }

    pub(crate) fn sobel_arc(pool: &WorkerPool, image: &Arc<RgbImage>, threshold: u8) -> Self {
        let _span = dp_trace!(span "sobel", threshold = threshold);
        let width = image.width();
        let height = image.height();
        let shared = Arc::new(Mutex::new(Self::zeroed(width, height)));

        let slabs = pool.len();
        for i in 0..slabs {
            let start = i * height / slabs;
            let end = (i + 1) * height / slabs;
            let image = Arc::clone(image);
            let shared = Arc::clone(&shared);
            pool.submit(move |_| {
                sobel_slab(&image, threshold, start, end, &shared);
            });
        }
        pool.join();

        let map = match Arc::try_unwrap(shared) {
            Ok(mutex) => mutex.into_inner().unwrap_or_else(PoisonError::into_inner),
            Err(shared) => shared
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        };
        dp_trace!(info "sobel_done", width = width, height = height);
        map
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Clamped Sobel magnitude at `(x, y)`.
    #[inline]
    pub fn magnitude(&self, x: usize, y: usize) -> u8 {
        self.mag[y * self.width + x]
    }

    /// True when the magnitude at `(x, y)` exceeds the threshold.
    #[inline]
    pub fn is_edge(&self, x: usize, y: usize) -> bool {
        self.flags[y * self.width + x]
    }
}

/// Runs the 3x3 Sobel kernel over rows `[start, end)` clamped to the
/// interior, then blits the finished rows into the shared map.
fn sobel_slab(
    image: &RgbImage,
    threshold: u8,
    start: usize,
    end: usize,
    shared: &Mutex<EdgeMap>,
) {
    let width = image.width();
    let height = image.height();
    if width < 3 || height < 3 {
        return;
    }
    let start = start.max(1);
    let end = end.min(height - 1);
    if start >= end {
        return;
    }

    let mut mag = vec![0u8; (end - start) * width];
    let mut flags = vec![false; (end - start) * width];

    for y in start..end {
        let row = (y - start) * width;
        for x in 1..width - 1 {
            let rt = image.pixel(x + 1, y - 1);
            let lt = image.pixel(x - 1, y - 1);
            let rb = image.pixel(x + 1, y + 1);
            let lb = image.pixel(x - 1, y + 1);
            let rm = image.pixel(x + 1, y);
            let lm = image.pixel(x - 1, y);
            let ct = image.pixel(x, y - 1);
            let cb = image.pixel(x, y + 1);

            let grad = |a: u8, b: u8, c: u8, d: u8, e: u8, f: u8| -> i32 {
                (i32::from(a) - i32::from(b))
                    + (i32::from(c) - i32::from(d))
                    + 2 * (i32::from(e) - i32::from(f))
            };

            let pxr = grad(rt.r, lt.r, rb.r, lb.r, rm.r, lm.r);
            let pxg = grad(rt.g, lt.g, rb.g, lb.g, rm.g, lm.g);
            let pxb = grad(rt.b, lt.b, rb.b, lb.b, rm.b, lm.b);

            let pyr = grad(lb.r, lt.r, rb.r, rt.r, cb.r, ct.r);
            let pyg = grad(lb.g, lt.g, rb.g, rt.g, cb.g, ct.g);
            let pyb = grad(lb.b, lt.b, rb.b, rt.b, cb.b, ct.b);

            let k = (pxr * pxr + pyr * pyr + pxg * pxg + pyg * pyg + pxb * pxb + pyb * pyb) / 9;
            let m = f64::from(k).sqrt().min(255.0) as u8;
            mag[row + x] = m;
            flags[row + x] = m > threshold;
        }
    }

    let mut map = shared.lock().unwrap_or_else(PoisonError::into_inner);
    let base = start * width;
    let len = (end - start) * width;
    map.mag[base..base + len].copy_from_slice(&mag);
    map.flags[base..base + len].copy_from_slice(&flags);
}
