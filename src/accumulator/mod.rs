//! Accumulator implementations for the sparse multiply
//!
//! Each row of the candidate matrix is built by scattering wedge counts into
//! an accumulator and draining it as sorted (column, value) pairs. Small
//! rows use the sort-based accumulator, large rows the dense one; see
//! [`crate::matrix::categorization`].

pub mod dense;
pub mod sort;

pub use dense::DenseAccumulator;
pub use sort::SortAccumulator;

use num_traits::Num;
use std::ops::AddAssign;

/// Trait for accumulators that handle intermediate products of one row
///
/// Accumulators are reused across rows by the same worker thread, so
/// draining leaves them empty and ready for the next row.
pub trait Accumulator<T>
where
    T: Copy + Num + AddAssign,
{
    /// Reset the accumulator to prepare for a new row
    fn reset(&mut self);

    /// Accumulate a single entry (column and value)
    fn accumulate(&mut self, col: usize, val: T);

    /// Append the accumulated entries, sorted by column and with duplicate
    /// columns merged, to `cols`/`vals`, then reset
    fn drain_into(&mut self, cols: &mut Vec<usize>, vals: &mut Vec<T>);
}

/// Per-worker pair of accumulators; the dense one is allocated on first use
pub struct RowAccumulators<T> {
    n_cols: usize,
    sort: SortAccumulator<T>,
    dense: Option<DenseAccumulator<T>>,
}

impl<T> RowAccumulators<T>
where
    T: Copy + Num + AddAssign,
{
    pub fn new(n_cols: usize, initial_capacity: usize) -> Self {
        Self {
            n_cols,
            sort: SortAccumulator::new(initial_capacity),
            dense: None,
        }
    }

    pub fn sort(&mut self) -> &mut SortAccumulator<T> {
        &mut self.sort
    }

    pub fn dense(&mut self) -> &mut DenseAccumulator<T> {
        let n_cols = self.n_cols;
        self.dense.get_or_insert_with(|| DenseAccumulator::new(n_cols))
    }
}
