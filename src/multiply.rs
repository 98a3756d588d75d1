//! # Sparse Multiply Stage
//!
//! Builds the candidate matrix `C` from the adjacency matrix `A`. With `U`
//! the strict upper triangle of `A`,
//!
//! ```text
//! C(i, k) = (U · U)(i, k) = |{ j : i < j < k, A(i, j) ≠ 0, A(j, k) ≠ 0 }|
//! ```
//!
//! is the number of wedges `i - j - k` that become triangles when `(i, k)`
//! is also an edge. Only upper-triangle nonzeros of `A` are expanded, so the
//! work is proportional to edges × degree rather than N³. Under
//! [`MultiplyStrategy::Masked`] the product is additionally evaluated only at
//! coordinates where `A` is nonzero.
//!
//! Rows are independent and processed in parallel with Rayon; the row results
//! are assembled into CSR with an exclusive scan.

use rayon::prelude::*;
use tracing::debug;

use crate::accumulator::{Accumulator, RowAccumulators};
use crate::matrix::categorization::{categorize_row, intermediate_product_size};
use crate::matrix::config::{MultiplyStrategy, RowCategory};
use crate::matrix::{CandidateMatrix, CsrView};
use crate::utils::{between, exclusive_scan};

/// Computes the candidate matrix for `a`
///
/// `a` must be a valid adjacency matrix (sorted rows, symmetric, no
/// self-loops). Entries with a zero wedge count are not stored, so an
/// adjacency matrix without edges yields an empty `C`.
///
/// # Examples
///
/// ```
/// use tricount::{AdjacencyMatrix, MultiplyStrategy, mul_sparse};
///
/// let a = AdjacencyMatrix::from_edges(3, &[(0, 1), (1, 2), (0, 2)]).unwrap();
/// let c = mul_sparse(a.view(), MultiplyStrategy::Masked, 256);
///
/// // One wedge 0 - 1 - 2, closed by edge (0, 2)
/// assert_eq!(c.nnz(), 1);
/// assert_eq!(c.row(0), &[2]);
/// assert_eq!(c.values(), &[1]);
/// ```
pub fn mul_sparse<T: Sync>(
    a: CsrView<'_, T>,
    strategy: MultiplyStrategy,
    dense_accum_threshold: usize,
) -> CandidateMatrix {
    let n_rows = a.n_rows();
    let n_cols = a.n_cols();

    let row_results: Vec<(Vec<usize>, Vec<u32>)> = (0..n_rows)
        .into_par_iter()
        .map_init(
            || RowAccumulators::new(n_cols, dense_accum_threshold.min(1024)),
            |accumulators, i| {
                let product_size = intermediate_product_size(a, i);
                match categorize_row(product_size, dense_accum_threshold) {
                    RowCategory::Sort => multiply_row(i, a, strategy, accumulators.sort()),
                    RowCategory::DenseAccumulation => {
                        multiply_row(i, a, strategy, accumulators.dense())
                    }
                }
            },
        )
        .collect();

    // Assemble the final CSR matrix
    let row_lengths: Vec<usize> = row_results.iter().map(|(cols, _)| cols.len()).collect();
    let row_ptr = exclusive_scan(&row_lengths);
    let nnz = row_ptr[n_rows];

    let mut col_idx = Vec::with_capacity(nnz);
    let mut values = Vec::with_capacity(nnz);
    for (cols, vals) in row_results {
        col_idx.extend(cols);
        values.extend(vals);
    }

    debug!(?strategy, n_rows, nnz, "sparse multiply assembled candidate matrix");
    CandidateMatrix::from_parts_unchecked(n_rows, n_cols, row_ptr, col_idx, values)
}

/// Computes row `i` of the candidate matrix with the given accumulator
fn multiply_row<T, A>(
    i: usize,
    a: CsrView<'_, T>,
    strategy: MultiplyStrategy,
    accumulator: &mut A,
) -> (Vec<usize>, Vec<u32>)
where
    A: Accumulator<u32>,
{
    let upper_i = between(a.row(i), i, usize::MAX);

    for &j in upper_i {
        for &k in between(a.row(j), j, usize::MAX) {
            let keep = match strategy {
                MultiplyStrategy::Masked => upper_i.binary_search(&k).is_ok(),
                MultiplyStrategy::Candidates => true,
            };
            if keep {
                accumulator.accumulate(k, 1);
            }
        }
    }

    let mut cols = Vec::new();
    let mut vals = Vec::new();
    accumulator.drain_into(&mut cols, &mut vals);
    (cols, vals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::AdjacencyMatrix;

    fn k4() -> AdjacencyMatrix {
        AdjacencyMatrix::from_edges(4, &[(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]).unwrap()
    }

    #[test]
    fn test_masked_k4() {
        let c = mul_sparse(k4().view(), MultiplyStrategy::Masked, 256);

        // C(i,k) counts the j strictly between i and k
        assert_eq!(c.row(0), &[2, 3]);
        assert_eq!(c.row_iter(0).map(|(_, &v)| v).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(c.row(1), &[3]);
        assert_eq!(c.row_iter(1).map(|(_, &v)| v).collect::<Vec<_>>(), vec![1]);
        assert_eq!(c.degree(2), 0);
        assert_eq!(c.values().iter().map(|&v| u64::from(v)).sum::<u64>(), 4);
    }

    #[test]
    fn test_candidates_keep_open_wedges() {
        // Path 0-1-2: one open wedge
        let a = AdjacencyMatrix::from_edges(3, &[(0, 1), (1, 2)]).unwrap();

        let masked = mul_sparse(a.view(), MultiplyStrategy::Masked, 256);
        assert_eq!(masked.nnz(), 0);

        let candidates = mul_sparse(a.view(), MultiplyStrategy::Candidates, 256);
        assert_eq!(candidates.row(0), &[2]);
        assert_eq!(candidates.values(), &[1]);
    }

    #[test]
    fn test_dense_and_sort_paths_agree() {
        let a = k4();
        for strategy in [MultiplyStrategy::Masked, MultiplyStrategy::Candidates] {
            let all_sort = mul_sparse(a.view(), strategy, usize::MAX);
            let all_dense = mul_sparse(a.view(), strategy, 0);
            assert_eq!(all_sort, all_dense);
        }
    }

    #[test]
    fn test_empty_graph() {
        let a = AdjacencyMatrix::zeros(5, 5);
        let c = mul_sparse(a.view(), MultiplyStrategy::Masked, 256);

        assert_eq!(c.n_rows(), 5);
        assert_eq!(c.nnz(), 0);
    }
}
