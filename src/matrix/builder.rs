//! Construction of adjacency matrices from edge lists and dense arrays

use ndarray::Array2;
use num_traits::Num;
use rayon::prelude::*;
use tracing::debug;

use crate::error::MalformedInput;
use crate::matrix::SparseMatrixCSR;
use crate::utils::exclusive_scan;

impl<T> SparseMatrixCSR<T>
where
    T: Copy + Num + Send + Sync,
{
    /// Builds the adjacency matrix of an undirected graph on `n` vertices
    ///
    /// Each pair may appear in either orientation and any number of times;
    /// the result stores both orientations once, rows sorted ascending.
    /// Self-loops are dropped.
    ///
    /// # Errors
    ///
    /// * [`MalformedInput::ZeroDimension`] if `n == 0`
    /// * [`MalformedInput::EmptyEdgeList`] if `edges` is empty; build a
    ///   zero-edge graph with [`SparseMatrixCSR::zeros`] instead
    /// * [`MalformedInput::VertexOutOfRange`] if an endpoint is `>= n`
    pub fn from_edges(n: usize, edges: &[(usize, usize)]) -> Result<Self, MalformedInput> {
        if n == 0 {
            return Err(MalformedInput::ZeroDimension);
        }
        if edges.is_empty() {
            return Err(MalformedInput::EmptyEdgeList);
        }
        if let Some(&(u, v)) = edges.iter().find(|&&(u, v)| u >= n || v >= n) {
            return Err(MalformedInput::VertexOutOfRange { u, v, n });
        }

        let mut entries: Vec<(usize, usize)> = Vec::with_capacity(edges.len() * 2);
        let mut self_loops = 0usize;
        for &(u, v) in edges {
            if u == v {
                self_loops += 1;
                continue;
            }
            entries.push((u, v));
            entries.push((v, u));
        }
        if self_loops > 0 {
            debug!(self_loops, "dropped self-loops from edge list");
        }

        entries.par_sort_unstable();
        entries.dedup();

        let adjacency = Self::from_sorted_entries(n, &entries);
        debug!(
            n,
            input_edges = edges.len(),
            nnz = adjacency.nnz(),
            "built CSR adjacency"
        );
        Ok(adjacency)
    }

    /// Builds an adjacency matrix from a dense square array
    ///
    /// Every nonzero off-diagonal entry is an edge; the pattern is symmetrized,
    /// so a triangular input describes the same graph as the full one.
    pub fn from_dense<V>(dense: &Array2<V>) -> Result<Self, MalformedInput>
    where
        V: Num,
    {
        let (n_rows, n_cols) = dense.dim();
        if n_rows != n_cols {
            return Err(MalformedInput::NotSquare { n_rows, n_cols });
        }

        let mut entries: Vec<(usize, usize)> = dense
            .indexed_iter()
            .filter(|&((i, j), value)| i != j && !value.is_zero())
            .flat_map(|((i, j), _)| [(i, j), (j, i)])
            .collect();
        entries.par_sort_unstable();
        entries.dedup();

        Ok(Self::from_sorted_entries(n_rows, &entries))
    }

    /// `entries` must be sorted, deduplicated and within `0..n`
    fn from_sorted_entries(n: usize, entries: &[(usize, usize)]) -> Self {
        let mut degrees = vec![0usize; n];
        for &(row, _) in entries {
            degrees[row] += 1;
        }

        let row_ptr = exclusive_scan(&degrees);
        let col_idx: Vec<usize> = entries.iter().map(|&(_, col)| col).collect();
        let values = vec![T::one(); col_idx.len()];

        Self::from_parts_unchecked(n, n, row_ptr, col_idx, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::AdjacencyMatrix;
    use ndarray::array;

    #[test]
    fn test_from_edges_symmetrizes_and_sorts() {
        let a = AdjacencyMatrix::from_edges(4, &[(2, 0), (0, 1), (1, 2), (3, 1)]).unwrap();

        assert_eq!(a.row_ptr(), &[0, 2, 5, 7, 8]);
        assert_eq!(a.row(0), &[1, 2]);
        assert_eq!(a.row(1), &[0, 2, 3]);
        assert_eq!(a.row(2), &[0, 1]);
        assert_eq!(a.row(3), &[1]);
        assert!(a.values().iter().all(|&v| v == 1.0));
        assert!(a.validate_adjacency().is_ok());
    }

    #[test]
    fn test_from_edges_deduplicates_and_drops_self_loops() {
        let a = AdjacencyMatrix::from_edges(3, &[(0, 1), (1, 0), (0, 1), (2, 2)]).unwrap();

        assert_eq!(a.nnz(), 2);
        assert_eq!(a.row(2), &[] as &[usize]);
        assert!(a.validate_adjacency().is_ok());
    }

    #[test]
    fn test_from_edges_rejects_degenerate_input() {
        assert_eq!(
            AdjacencyMatrix::from_edges(0, &[]).unwrap_err(),
            MalformedInput::ZeroDimension
        );
        assert_eq!(
            AdjacencyMatrix::from_edges(3, &[]).unwrap_err(),
            MalformedInput::EmptyEdgeList
        );
        assert_eq!(
            AdjacencyMatrix::from_edges(3, &[(0, 1), (1, 3)]).unwrap_err(),
            MalformedInput::VertexOutOfRange { u: 1, v: 3, n: 3 }
        );
    }

    #[test]
    fn test_from_dense() {
        // Upper triangle only; the builder mirrors it
        let dense = array![
            [0, 1, 1, 0],
            [0, 0, 1, 0],
            [0, 0, 0, 0],
            [0, 0, 0, 7],
        ];
        let a = AdjacencyMatrix::from_dense(&dense).unwrap();

        assert_eq!(a.row(0), &[1, 2]);
        assert_eq!(a.row(1), &[0, 2]);
        assert_eq!(a.row(2), &[0, 1]);
        assert_eq!(a.degree(3), 0);
        assert!(a.validate_adjacency().is_ok());
    }

    #[test]
    fn test_from_dense_rejects_rectangular() {
        let dense = Array2::<u8>::zeros((2, 3));
        assert_eq!(
            AdjacencyMatrix::from_dense(&dense).unwrap_err(),
            MalformedInput::NotSquare { n_rows: 2, n_cols: 3 }
        );
    }
}
