//! Two-phase count: per-row partial triangle counts, then a global reduction

use std::sync::atomic::{AtomicU64, Ordering};

use rayon::prelude::*;

use crate::matrix::CsrView;
use crate::utils::{between, intersection_size};

/// Phase 1: writes the number of triangles rooted at row `i` to `partials[i]`
///
/// A triangle i < j < k is rooted at i. For every entry (i, k) of `c` that is
/// an edge of `a`, the middle vertices j are found by intersecting the
/// neighbors of i and k strictly between i and k. The values stored in `c`
/// are not consulted, so this is an independent check of the multiply.
///
/// Each slot of `partials` is written by exactly one block.
pub fn find_triangles<T: Sync>(
    a: CsrView<'_, T>,
    c: CsrView<'_, u32>,
    partials: &mut [u64],
    block_size: usize,
) {
    assert_eq!(partials.len(), a.n_rows(), "one partial slot per row");
    assert_eq!(a.n_rows(), c.n_rows(), "A and C must have the same number of rows");

    let block_size = block_size.max(1);

    partials
        .par_chunks_mut(block_size)
        .enumerate()
        .for_each(|(block, slots)| {
            let first_row = block * block_size;
            for (offset, slot) in slots.iter_mut().enumerate() {
                *slot = row_triangles(a, c, first_row + offset);
            }
        });
}

fn row_triangles<T>(a: CsrView<'_, T>, c: CsrView<'_, u32>, i: usize) -> u64 {
    let neighbors_i = a.row(i);

    c.row(i)
        .iter()
        .filter(|&&k| a.contains(i, k))
        .map(|&k| intersection_size(between(neighbors_i, i, k), between(a.row(k), i, k)))
        .sum()
}

/// Phase 2: reduces the per-row partials into `total`
///
/// Each block sums its slice locally and adds the result atomically.
/// `contributing` counts the rows with a nonzero partial.
pub fn find_triangles_sum(
    partials: &[u64],
    total: &AtomicU64,
    contributing: &AtomicU64,
    block_size: usize,
) {
    partials.par_chunks(block_size.max(1)).for_each(|slots| {
        let (sum, nonzero) = slots
            .iter()
            .filter(|&&partial| partial > 0)
            .fold((0u64, 0u64), |(sum, nonzero), &partial| (sum + partial, nonzero + 1));

        if nonzero > 0 {
            total.fetch_add(sum, Ordering::Relaxed);
            contributing.fetch_add(nonzero, Ordering::Relaxed);
        }
    });
}
