//! Sort-based accumulator implementation for the sparse multiply
//!
//! Collects intermediate products in an unsorted list, then sorts and merges
//! duplicate columns. Cheaper than the dense accumulator when a row has few
//! intermediate products.

use num_traits::Num;
use std::ops::AddAssign;

use crate::accumulator::Accumulator;

/// Sort-based accumulator for a single row of the candidate product
pub struct SortAccumulator<T> {
    /// Unsorted (column, value) intermediate products
    entries: Vec<(usize, T)>,
}

impl<T> SortAccumulator<T>
where
    T: Copy + Num + AddAssign,
{
    /// Create a new sort-based accumulator
    ///
    /// # Arguments
    ///
    /// * `initial_capacity` - Initial capacity for the temporary storage
    pub fn new(initial_capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(initial_capacity),
        }
    }
}

impl<T> Accumulator<T> for SortAccumulator<T>
where
    T: Copy + Num + AddAssign,
{
    fn reset(&mut self) {
        self.entries.clear();
    }

    fn accumulate(&mut self, col: usize, val: T) {
        self.entries.push((col, val));
    }

    fn drain_into(&mut self, cols: &mut Vec<usize>, vals: &mut Vec<T>) {
        if self.entries.is_empty() {
            return;
        }

        self.entries.sort_unstable_by_key(|&(col, _)| col);

        let (mut current_col, mut current_val) = self.entries[0];
        for &(col, val) in &self.entries[1..] {
            if col == current_col {
                // Same column, accumulate the value
                current_val += val;
            } else {
                if !current_val.is_zero() {
                    cols.push(current_col);
                    vals.push(current_val);
                }
                current_col = col;
                current_val = val;
            }
        }

        // Add the last column/value
        if !current_val.is_zero() {
            cols.push(current_col);
            vals.push(current_val);
        }

        self.reset();
    }
}
