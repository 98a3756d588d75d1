//! Dense accumulator implementation for the sparse multiply

use num_traits::Num;
use std::ops::AddAssign;

use crate::accumulator::Accumulator;

/// Dense accumulator for a single row of the candidate product
///
/// Scatters values into an array indexed by column. Used for rows whose
/// intermediate product is large enough that sorting would dominate.
pub struct DenseAccumulator<T> {
    /// The dense accumulation array
    values: Vec<T>,

    /// Flags to track which positions in the dense array are non-zero
    occupied: Vec<bool>,

    /// Column indices touched since the last reset
    col_indices: Vec<usize>,
}

impl<T> DenseAccumulator<T>
where
    T: Copy + Num + AddAssign,
{
    /// Create a new dense accumulator with specified column capacity
    ///
    /// # Arguments
    ///
    /// * `n_cols` - The number of columns in the output matrix (C)
    pub fn new(n_cols: usize) -> Self {
        Self {
            values: vec![T::zero(); n_cols],
            occupied: vec![false; n_cols],
            col_indices: Vec::new(),
        }
    }
}

impl<T> Accumulator<T> for DenseAccumulator<T>
where
    T: Copy + Num + AddAssign,
{
    /// Reset the accumulator for reuse without reallocating memory
    fn reset(&mut self) {
        // Clear the occupied flags
        for &col in &self.col_indices {
            self.occupied[col] = false;
        }

        // Clear the non-zero indices list
        self.col_indices.clear();
    }

    fn accumulate(&mut self, col: usize, val: T) {
        if !self.occupied[col] {
            // First time seeing this column, mark it and add to indices
            self.occupied[col] = true;
            self.col_indices.push(col);
            self.values[col] = val;
        } else {
            // Column already exists, just add the value
            self.values[col] += val;
        }
    }

    fn drain_into(&mut self, cols: &mut Vec<usize>, vals: &mut Vec<T>) {
        self.col_indices.sort_unstable();

        for &col in &self.col_indices {
            let val = self.values[col];
            if !val.is_zero() {
                cols.push(col);
                vals.push(val);
            }
        }

        self.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dense_accumulator_merges_and_sorts() {
        let mut acc = DenseAccumulator::<u32>::new(6);
        acc.accumulate(4, 1);
        acc.accumulate(1, 1);
        acc.accumulate(4, 2);

        let (mut cols, mut vals) = (Vec::new(), Vec::new());
        acc.drain_into(&mut cols, &mut vals);

        assert_eq!(cols, vec![1, 4]);
        assert_eq!(vals, vec![1, 3]);
    }

    #[test]
    fn test_dense_accumulator_reuse() {
        let mut acc = DenseAccumulator::<u32>::new(4);
        let (mut cols, mut vals) = (Vec::new(), Vec::new());

        acc.accumulate(2, 5);
        acc.drain_into(&mut cols, &mut vals);

        // A drained accumulator must not leak the previous row
        acc.accumulate(3, 1);
        acc.drain_into(&mut cols, &mut vals);

        assert_eq!(cols, vec![2, 3]);
        assert_eq!(vals, vec![5, 1]);
    }
}
