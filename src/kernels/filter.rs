//! Filter kernel: checks every candidate wedge against the adjacency matrix

use std::sync::atomic::{AtomicU64, Ordering};

use rayon::prelude::*;

use crate::kernels::grid_dim;
use crate::matrix::CsrView;

/// Counter values read back after the filter launch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    /// Wedges whose closing edge exists in A, i.e. triangles
    pub accepted: u64,
    /// Wedges examined
    pub examined: u64,
}

impl FilterStats {
    /// Fraction of examined wedges that close into triangles
    ///
    /// 1.0 when nothing was examined.
    pub fn accept_rate(&self) -> f64 {
        if self.examined == 0 {
            1.0
        } else {
            self.accepted as f64 / self.examined as f64
        }
    }
}

/// For each entry (i, k) of `c`, tests whether (i, k) is an edge of `a`
///
/// Entry values are wedge counts: all of them go to `examined`, and to
/// `accepted` when the binary search finds k among the neighbors of i.
/// Each entry belongs to exactly one block, so nothing is counted twice.
pub fn filter<T: Sync>(
    a: CsrView<'_, T>,
    c: CsrView<'_, u32>,
    accepted: &AtomicU64,
    examined: &AtomicU64,
    block_size: usize,
) {
    assert_eq!(a.n_rows(), c.n_rows(), "A and C must have the same number of rows");

    let n_rows = c.n_rows();
    let block_size = block_size.max(1);

    (0..grid_dim(n_rows, block_size))
        .into_par_iter()
        .for_each(|block| {
            let rows = block * block_size..((block + 1) * block_size).min(n_rows);
            let mut block_accepted = 0u64;
            let mut block_examined = 0u64;

            for i in rows {
                for (&k, &wedges) in c.row(i).iter().zip(c.row_values(i)) {
                    let wedges = u64::from(wedges);
                    block_examined += wedges;
                    if a.contains(i, k) {
                        block_accepted += wedges;
                    }
                }
            }

            if block_examined > 0 {
                examined.fetch_add(block_examined, Ordering::Relaxed);
            }
            if block_accepted > 0 {
                accepted.fetch_add(block_accepted, Ordering::Relaxed);
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::config::MultiplyStrategy;
    use crate::matrix::AdjacencyMatrix;
    use crate::multiply::mul_sparse;

    fn run_filter(a: &AdjacencyMatrix, strategy: MultiplyStrategy, block_size: usize) -> FilterStats {
        let c = mul_sparse(a.view(), strategy, 256);
        let accepted = AtomicU64::new(0);
        let examined = AtomicU64::new(0);

        filter(a.view(), c.view(), &accepted, &examined, block_size);

        FilterStats {
            accepted: accepted.into_inner(),
            examined: examined.into_inner(),
        }
    }

    #[test]
    fn test_filter_rejects_open_wedges() {
        // Triangle 0-1-2 plus pendant path 2-3-4
        let a = AdjacencyMatrix::from_edges(5, &[(0, 1), (1, 2), (0, 2), (2, 3), (3, 4)]).unwrap();

        let stats = run_filter(&a, MultiplyStrategy::Candidates, 2);
        assert_eq!(stats.accepted, 1);
        // Wedges i<j<k: 0-1-2, 1-2-3, 0-2-3, 2-3-4
        assert_eq!(stats.examined, 4);
        assert!((stats.accept_rate() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_filter_masked_accepts_everything() {
        let a = AdjacencyMatrix::from_edges(5, &[(0, 1), (1, 2), (0, 2), (2, 3), (3, 4)]).unwrap();

        let stats = run_filter(&a, MultiplyStrategy::Masked, 1);
        assert_eq!(stats, FilterStats { accepted: 1, examined: 1 });
    }

    #[test]
    fn test_filter_empty() {
        let a = AdjacencyMatrix::zeros(3, 3);

        let stats = run_filter(&a, MultiplyStrategy::Candidates, 0);
        assert_eq!(stats, FilterStats::default());
        assert_eq!(stats.accept_rate(), 1.0);
    }
}
