//! Hierarchical scanline scheduling.
//!
//! A coarse pass solves every `skip`-th scanline over the full table, then
//! each refinement level fills the scanlines halfway between already-solved
//! neighbors: entries on which both neighbors agree (to within a small
//! disparity tolerance) are copied, disagreeing stretches are re-solved
//! over a narrowed table segment. A pool `join` separates the levels, so a
//! pass only ever reads patterns the previous passes finished writing.

use std::sync::{Arc, Mutex, PoisonError};

use crate::cost::CostFunction;
use crate::dp::solve::{solve_scanline, Rect};
use crate::dp::{Band, ScratchTables};
use crate::pool::WorkerPool;
use crate::store::MatchStore;
use crate::trace::dp_trace;
use crate::util::{DpMatchError, DpMatchResult};

/// Neighbor disparities within this tolerance allow interpolation by copy.
const COPY_TOLERANCE: i32 = 5;

/// DP table extents: `width` columns (input width), `ref_width` rows
/// (reference width), over `scanlines` image rows.
#[derive(Clone, Copy)]
pub(crate) struct Dims {
    pub(crate) width: i32,
    pub(crate) ref_width: i32,
    pub(crate) scanlines: i32,
}

/// First task error of a run; later errors are dropped.
struct FirstError(Mutex<Option<DpMatchError>>);

impl FirstError {
    fn new() -> Self {
        Self(Mutex::new(None))
    }

    fn record(&self, err: DpMatchError) {
        let mut slot = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        slot.get_or_insert(err);
    }

    fn take(&self) -> DpMatchResult<()> {
        match self.0.lock().unwrap_or_else(PoisonError::into_inner).take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

pub(crate) struct Scheduler<'a, C> {
    pool: &'a WorkerPool,
    store: Arc<MatchStore>,
    scratch: Arc<ScratchTables>,
    cost: Arc<C>,
    band: Band,
    dims: Dims,
    failure: Arc<FirstError>,
}

impl<'a, C: CostFunction + 'static> Scheduler<'a, C> {
    pub(crate) fn new(
        pool: &'a WorkerPool,
        store: Arc<MatchStore>,
        scratch: Arc<ScratchTables>,
        cost: Arc<C>,
        band: Band,
        dims: Dims,
    ) -> Self {
        Self {
            pool,
            store,
            scratch,
            cost,
            band,
            dims,
            failure: Arc::new(FirstError::new()),
        }
    }

    /// Solves every scanline reachable from the skip hierarchy and blocks
    /// until the last pass has completed.
    pub(crate) fn run(self, skip: i32) -> DpMatchResult<()> {
        let mut rows = Vec::new();
        let mut c = 0;
        while c < self.dims.scanlines {
            rows.push(c as usize);
            self.submit_full(c, skip);
            c += skip;
        }
        dp_trace!(info "coarse_pass", skip = skip, rows = rows.len());

        self.refine(skip / 2, rows);

        self.pool.join();
        self.failure.take()
    }

    /// Refinement level at stride `half`, recursing down to stride 1. The
    /// leading join is the barrier that publishes the previous level's rows.
    fn refine(&self, half: i32, prev_rows: Vec<usize>) {
        if half == 0 {
            return;
        }
        self.pool.join();
        self.store.mark_solved(&prev_rows);

        let mut rows = Vec::new();
        let mut c = half;
        while c < self.dims.scanlines {
            rows.push(c as usize);
            self.submit_refine(c, half);
            c += 2 * half;
        }
        dp_trace!(info "refine_pass", half = half, rows = rows.len());

        self.refine(half / 2, rows);
    }

    /// Full-rectangle solve of one scanline.
    fn submit_full(&self, column: i32, skip: i32) {
        let store = Arc::clone(&self.store);
        let scratch = Arc::clone(&self.scratch);
        let cost = Arc::clone(&self.cost);
        let failure = Arc::clone(&self.failure);
        let band = self.band;
        let dims = self.dims;
        self.pool.submit(move |worker| {
            let ctx = cost.prepare(column, skip);
            let mut table = scratch.lock(worker);
            let result = store.with_row(column as usize, |pattern| {
                solve_scanline(
                    &*cost,
                    &ctx,
                    &mut *table,
                    band,
                    Rect {
                        sx: 0,
                        sy: 0,
                        ex: dims.width - 1,
                        ey: dims.ref_width - 1,
                    },
                    column,
                    skip,
                    pattern,
                )
            });
            if let Err(err) = result {
                failure.record(err);
            }
        });
    }

    /// Interpolate-or-resolve fill of one scanline from its two nearest
    /// solved neighbors at distance `half`.
    fn submit_refine(&self, column: i32, half: i32) {
        let store = Arc::clone(&self.store);
        let scratch = Arc::clone(&self.scratch);
        let cost = Arc::clone(&self.cost);
        let failure = Arc::clone(&self.failure);
        let band = self.band;
        let dims = self.dims;
        self.pool.submit(move |worker| {
            let prev = store.snapshot((column - half).max(0) as usize);
            let next = store.snapshot((column + half).min(dims.scanlines - 1) as usize);
            let ctx = cost.prepare(column, half);
            let mut table = scratch.lock(worker);

            let result = store.with_row(column as usize, |pattern| -> DpMatchResult<()> {
                let mut x = 0;
                while x < dims.width {
                    let xi = x as usize;
                    let d_prev = (prev[xi] - x).abs();
                    let d_next = (next[xi] - x).abs();
                    if (d_prev - d_next).abs() < COPY_TOLERANCE {
                        pattern[xi] = prev[xi];
                        x += 1;
                    } else {
                        // Ambiguous stretch: re-solve up to the next column
                        // where the neighbors agree again.
                        let sx = (x - 1).max(0);
                        let ex = (x + 1..dims.width)
                            .find(|&j| prev[j as usize] == next[j as usize])
                            .unwrap_or(dims.width - 1);
                        solve_scanline(
                            &*cost,
                            &ctx,
                            &mut *table,
                            band,
                            Rect {
                                sx,
                                sy: 0,
                                ex,
                                ey: dims.ref_width - 1,
                            },
                            column,
                            half,
                            pattern,
                        )?;
                        x = ex + 1;
                    }
                }
                Ok(())
            });
            if let Err(err) = result {
                failure.record(err);
            }
        });
    }
}
