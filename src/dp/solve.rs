//! Per-scanline banded shortest-path solve.
//!
//! Solves the minimum-cost monotonic path from `(sx, sy)` to `(ex, ey)`
//! through the band `-left <= y - x <= right` and writes the resulting
//! x-indexed mapping into the scanline's pattern. Only vertical,
//! horizontal and diagonal transitions are admitted, which is what makes
//! the mapping monotonic in both coordinates.

use crate::cost::CostFunction;
use crate::dp::{Band, DpTable, PathDir};
use crate::trace::dp_trace;
use crate::util::{DpMatchError, DpMatchResult};

/// Rectangle of the DP table to solve, inclusive on both ends.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Rect {
    pub(crate) sx: i32,
    pub(crate) sy: i32,
    pub(crate) ex: i32,
    pub(crate) ey: i32,
}

pub(crate) fn solve_scanline<C: CostFunction>(
    cost: &C,
    ctx: &C::Ctx,
    table: &mut DpTable,
    band: Band,
    rect: Rect,
    column: i32,
    skip: i32,
    pattern: &mut [i32],
) -> DpMatchResult<()> {
    let Band { left, right } = band;
    let Rect { sx, sy, ex, ey } = rect;

    // Pull the requested endpoints into the admissible band.
    let sy = sy.clamp(sx - left, sx + right);
    let ey = ey.clamp(ex - left, ex + right);

    let rows = table.height() as i32;
    if sy < 0 || ey < 0 || sy >= rows || ey >= rows {
        return Err(DpMatchError::IndexOutOfBounds {
            index: ey.max(sy).max(0) as usize,
            len: rows as usize,
            context: "dp table row",
        });
    }

    // Cost initialization. Every in-band cell gets its three edge costs and
    // a cleared accumulator; a one-cell guard border per row also clears the
    // accumulator so relaxation never reads a stale value from a previous
    // scanline on this reused table.
    for y in sy..=ey {
        let lo = sx.max(y - right);
        let hi = ex.min(y + left);
        for x in sx.max(lo - 1)..=ex.min(hi + 1) {
            let cell = table.cell_mut(x, y);
            cell.acc = f64::INFINITY;
            cell.dir = PathDir::None;
            if x >= lo && x <= hi {
                let base = cost.base_cost(ctx, x, y, column, skip);
                cell.vertical = cost.vertical_bias(x, y, base);
                cell.horizontal = cost.horizontal_bias(x, y, base);
                cell.diagonal = cost.diagonal_bias(x, y, base);
            } else {
                cell.vertical = f64::INFINITY;
                cell.horizontal = f64::INFINITY;
                cell.diagonal = f64::INFINITY;
            }
        }
    }

    // Source cell.
    table.cell_mut(sx, sy).acc = 0.0;

    // Bottom-edge seed along y = sy.
    for x in sx + 1..=left.min(ex) {
        let prev = table.cell(x - 1, sy).acc;
        let cell = table.cell_mut(x, sy);
        cell.acc = cell.horizontal + prev;
        cell.dir = PathDir::Horizontal;
    }

    // Left-edge seed along x = sx.
    for y in sy + 1..=right.min(ey) {
        let prev = table.cell(sx, y - 1).acc;
        let cell = table.cell_mut(sx, y);
        cell.acc = cell.vertical + prev;
        cell.dir = PathDir::Vertical;
    }

    // Interior relaxation in row-major order.
    for y in sy + 1..=ey {
        let lo = (sx + 1).max(y - right);
        let hi = ex.min(y + left);
        for x in lo..=hi {
            let v_cand = table.cell(x, y).vertical + table.cell(x, y - 1).acc;
            let h_cand = table.cell(x, y).horizontal + table.cell(x - 1, y).acc;
            let d_cand = table.cell(x, y).diagonal + table.cell(x - 1, y - 1).acc;

            let best = v_cand.min(h_cand).min(d_cand);
            // Bit-exact comparison: the candidates are compared untouched,
            // so equality identifies which one was selected.
            let dir = if best == d_cand {
                PathDir::Diagonal
            } else if best == v_cand {
                PathDir::Vertical
            } else if best == h_cand {
                PathDir::Horizontal
            } else {
                return Err(DpMatchError::NonFiniteCost { x, y, column });
            };

            let cell = table.cell_mut(x, y);
            cell.acc = best;
            cell.dir = dir;
        }
    }

    // Backtrace from the far anchor, recording every visited cell.
    let mut x = ex;
    let mut y = ey;
    loop {
        pattern[x as usize] = y;
        if x <= sx && y <= sy {
            break;
        }
        match table.cell(x, y).dir {
            PathDir::Vertical => y -= 1,
            PathDir::Horizontal => x -= 1,
            PathDir::Diagonal => {
                x -= 1;
                y -= 1;
            }
            PathDir::None => {
                // Clamped band edges can leave a cell unrelaxed; step toward
                // the anchor along whichever axis still has distance.
                dp_trace!(warn "backtrace_fallback", x = x, y = y, column = column);
                let (px, py) = (x, y);
                if x <= sx && y > sy {
                    y -= 1;
                }
                if y <= sy && x > sx {
                    x -= 1;
                }
                if x == px && y == py {
                    return Err(DpMatchError::UnsetDirection { x, y, column });
                }
            }
        }
    }

    Ok(())
}
