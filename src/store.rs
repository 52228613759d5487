//! Shared per-scanline match storage.
//!
//! Every scanline is written by exactly one task per pass, so rows sit
//! behind individual locks that are never contended for writing. The
//! `solved` flags record which rows were completed by an *earlier* pass;
//! they are flipped only at the join barrier between passes, and the fusion
//! glue term consults them before reading a neighbor pattern.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

/// Sentinel pattern entry: no correspondence computed yet.
pub const UNMATCHED: i32 = -1;

pub(crate) struct MatchStore {
    rows: Vec<Mutex<Vec<i32>>>,
    solved: Vec<AtomicBool>,
    width: usize,
}

impl MatchStore {
    pub(crate) fn new(scanlines: usize, width: usize) -> Self {
        let rows = (0..scanlines)
            .map(|_| Mutex::new(vec![UNMATCHED; width]))
            .collect();
        let solved = (0..scanlines).map(|_| AtomicBool::new(false)).collect();
        Self {
            rows,
            solved,
            width,
        }
    }

    /// Pattern length (the input image width).
    pub(crate) fn width(&self) -> usize {
        self.width
    }

    /// Scanline count.
    pub(crate) fn len(&self) -> usize {
        self.rows.len()
    }

    /// Clears every pattern and solved flag before a run.
    pub(crate) fn reset(&self) {
        for row in &self.rows {
            let mut row = row.lock().unwrap_or_else(PoisonError::into_inner);
            row.fill(UNMATCHED);
        }
        for flag in &self.solved {
            flag.store(false, Ordering::Release);
        }
    }

    /// Copies out the pattern of scanline `c`.
    pub(crate) fn snapshot(&self, c: usize) -> Vec<i32> {
        self.rows[c]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Runs `f` with exclusive access to the pattern of scanline `c`.
    pub(crate) fn with_row<R>(&self, c: usize, f: impl FnOnce(&mut [i32]) -> R) -> R {
        let mut row = self.rows[c].lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut row)
    }

    /// True when scanline `c` was completed by a previous pass.
    pub(crate) fn is_solved(&self, c: usize) -> bool {
        self.solved[c].load(Ordering::Acquire)
    }

    /// Marks the rows written by the pass that just joined.
    pub(crate) fn mark_solved(&self, rows: &[usize]) {
        for &c in rows {
            self.solved[c].store(true, Ordering::Release);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{MatchStore, UNMATCHED};

    #[test]
    fn rows_start_unmatched_and_unsolved() {
        let store = MatchStore::new(3, 4);
        assert_eq!(store.len(), 3);
        assert_eq!(store.width(), 4);
        assert_eq!(store.snapshot(1), vec![UNMATCHED; 4]);
        assert!(!store.is_solved(1));
    }

    #[test]
    fn reset_clears_writes_and_flags() {
        let store = MatchStore::new(2, 2);
        store.with_row(0, |row| row.fill(7));
        store.mark_solved(&[0]);
        assert!(store.is_solved(0));

        store.reset();
        assert_eq!(store.snapshot(0), vec![UNMATCHED; 2]);
        assert!(!store.is_solved(0));
    }
}
