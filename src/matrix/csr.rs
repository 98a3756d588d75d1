//! Compressed Sparse Row (CSR) matrix format implementation

use std::fmt;
use num_traits::Num;

use crate::error::MalformedInput;

/// A sparse matrix in Compressed Sparse Row (CSR) format
///
/// The CSR format stores a sparse matrix using three arrays:
/// - row_ptr: Array of size n_rows + 1 containing indices into col_idx and values arrays
/// - col_idx: Array of size nnz containing column indices of non-zero elements
/// - values: Array of size nnz containing the non-zero values
///
/// Fields are private so that every instance satisfies the structural
/// invariants checked by [`SparseMatrixCSR::new`]. Adjacency matrices
/// additionally satisfy [`SparseMatrixCSR::validate_adjacency`].
#[derive(Clone, PartialEq)]
pub struct SparseMatrixCSR<T> {
    n_rows: usize,
    n_cols: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<T>,
}

/// Unweighted graph adjacency; the stored value is always one
pub type AdjacencyMatrix = SparseMatrixCSR<f32>;

/// Candidate matrix produced by the sparse multiply; values count wedges
pub type CandidateMatrix = SparseMatrixCSR<u32>;

impl<T> SparseMatrixCSR<T>
where
    T: Copy + Num,
{
    /// Creates a new CSR matrix with the given dimensions and data
    ///
    /// # Arguments
    ///
    /// * `n_rows` - Number of rows
    /// * `n_cols` - Number of columns
    /// * `row_ptr` - Row pointers
    /// * `col_idx` - Column indices
    /// * `values` - Non-zero values
    ///
    /// # Errors
    ///
    /// Returns [`MalformedInput`] if the arrays are inconsistent:
    /// - row_ptr.len() must be n_rows + 1 and start at 0
    /// - row_ptr must be non-decreasing
    /// - row_ptr[n_rows] must equal col_idx.len()
    /// - col_idx.len() must equal values.len()
    /// - every column index must be below n_cols
    pub fn new(
        n_rows: usize,
        n_cols: usize,
        row_ptr: Vec<usize>,
        col_idx: Vec<usize>,
        values: Vec<T>,
    ) -> Result<Self, MalformedInput> {
        if row_ptr.len() != n_rows + 1 {
            return Err(MalformedInput::RowPtrLength {
                expected: n_rows + 1,
                actual: row_ptr.len(),
            });
        }
        if row_ptr[0] != 0 {
            return Err(MalformedInput::RowPtrStart(row_ptr[0]));
        }
        if let Some(row) = row_ptr.windows(2).position(|w| w[1] < w[0]) {
            return Err(MalformedInput::NonMonotonic { row });
        }
        if row_ptr[n_rows] != col_idx.len() {
            return Err(MalformedInput::NnzMismatch {
                row_ptr_end: row_ptr[n_rows],
                nnz: col_idx.len(),
            });
        }
        if values.len() != col_idx.len() {
            return Err(MalformedInput::ValueLength {
                col_idx: col_idx.len(),
                values: values.len(),
            });
        }

        // Check that column indices are within bounds
        for row in 0..n_rows {
            for &col in &col_idx[row_ptr[row]..row_ptr[row + 1]] {
                if col >= n_cols {
                    return Err(MalformedInput::ColumnOutOfRange { row, col, n_cols });
                }
            }
        }

        Ok(Self {
            n_rows,
            n_cols,
            row_ptr,
            col_idx,
            values,
        })
    }

    /// Creates an empty matrix with the given dimensions
    pub fn zeros(n_rows: usize, n_cols: usize) -> Self {
        Self {
            n_rows,
            n_cols,
            row_ptr: vec![0; n_rows + 1],
            col_idx: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Assembles a matrix from arrays the caller has already built consistently
    pub(crate) fn from_parts_unchecked(
        n_rows: usize,
        n_cols: usize,
        row_ptr: Vec<usize>,
        col_idx: Vec<usize>,
        values: Vec<T>,
    ) -> Self {
        debug_assert_eq!(row_ptr.len(), n_rows + 1);
        debug_assert_eq!(row_ptr[n_rows], col_idx.len());
        debug_assert_eq!(col_idx.len(), values.len());

        Self {
            n_rows,
            n_cols,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// Returns an iterator over the non-zero elements in row i
    ///
    /// Each item is a tuple (col_idx, value) representing a non-zero element
    pub fn row_iter(&self, i: usize) -> impl Iterator<Item = (usize, &T)> {
        let range = self.row_range(i);

        self.col_idx[range.clone()]
            .iter()
            .zip(&self.values[range])
            .map(|(&col, val)| (col, val))
    }

    /// Checks the invariants an undirected, unweighted adjacency matrix needs
    ///
    /// Rows must be sorted strictly ascending, the diagonal must be empty and
    /// every entry (i, j) must have a mirror (j, i).
    pub fn validate_adjacency(&self) -> Result<(), MalformedInput> {
        if self.n_rows != self.n_cols {
            return Err(MalformedInput::NotSquare {
                n_rows: self.n_rows,
                n_cols: self.n_cols,
            });
        }

        let view = self.view();
        for row in 0..self.n_rows {
            let neighbors = view.row(row);
            if neighbors.windows(2).any(|w| w[0] >= w[1]) {
                return Err(MalformedInput::UnsortedRow { row });
            }
            if neighbors.binary_search(&row).is_ok() {
                return Err(MalformedInput::SelfLoop(row));
            }
        }

        // Rows are sorted now, so the mirror lookups can binary search
        for row in 0..self.n_rows {
            if let Some(&col) = view.row(row).iter().find(|&&col| !view.contains(col, row)) {
                return Err(MalformedInput::Asymmetric { row, col });
            }
        }

        Ok(())
    }
}

impl<T> SparseMatrixCSR<T> {
    /// Number of rows in the matrix
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of columns in the matrix
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// Row pointers (size: n_rows + 1)
    pub fn row_ptr(&self) -> &[usize] {
        &self.row_ptr
    }

    /// Column indices (size: nnz)
    pub fn col_idx(&self) -> &[usize] {
        &self.col_idx
    }

    /// Non-zero values (size: nnz)
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Returns the number of non-zero elements in the matrix
    pub fn nnz(&self) -> usize {
        self.col_idx.len()
    }

    /// Column indices of row i; for an adjacency matrix, the sorted neighbor set
    ///
    /// # Panics
    ///
    /// Panics if `i >= n_rows`.
    pub fn row(&self, i: usize) -> &[usize] {
        &self.col_idx[self.row_range(i)]
    }

    /// Number of stored entries in row i
    pub fn degree(&self, i: usize) -> usize {
        let range = self.row_range(i);
        range.end - range.start
    }

    /// Whether entry (i, j) is stored; requires sorted rows
    pub fn contains(&self, i: usize, j: usize) -> bool {
        self.view().contains(i, j)
    }

    /// Upper-triangle coordinates (i, j) with i < j, in row order
    ///
    /// For an adjacency matrix this is the undirected edge set, each edge once.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.n_rows).flat_map(move |i| {
            self.row(i)
                .iter()
                .filter(move |&&j| j > i)
                .map(move |&j| (i, j))
        })
    }

    /// Borrowed view over the three CSR arrays
    pub fn view(&self) -> CsrView<'_, T> {
        CsrView {
            n_rows: self.n_rows,
            n_cols: self.n_cols,
            row_ptr: &self.row_ptr,
            col_idx: &self.col_idx,
            values: &self.values,
        }
    }

    fn row_range(&self, i: usize) -> std::ops::Range<usize> {
        assert!(i < self.n_rows, "Row index {} out of bounds (n_rows = {})", i, self.n_rows);
        self.row_ptr[i]..self.row_ptr[i + 1]
    }
}

/// Read-only view of CSR arrays, whether they live in a host matrix or a
/// device buffer
///
/// The kernels and the reference counter work on views so the same code
/// runs against both copies.
#[derive(Debug)]
pub struct CsrView<'a, T> {
    n_rows: usize,
    n_cols: usize,
    row_ptr: &'a [usize],
    col_idx: &'a [usize],
    values: &'a [T],
}

impl<T> Clone for CsrView<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for CsrView<'_, T> {}

impl<'a, T> CsrView<'a, T> {
    /// Wraps arrays that already satisfy the CSR structural invariants
    pub(crate) fn from_raw(
        n_rows: usize,
        n_cols: usize,
        row_ptr: &'a [usize],
        col_idx: &'a [usize],
        values: &'a [T],
    ) -> Self {
        debug_assert_eq!(row_ptr.len(), n_rows + 1);
        Self {
            n_rows,
            n_cols,
            row_ptr,
            col_idx,
            values,
        }
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    pub fn nnz(&self) -> usize {
        self.col_idx.len()
    }

    /// Column indices of row i
    pub fn row(&self, i: usize) -> &'a [usize] {
        &self.col_idx[self.row_ptr[i]..self.row_ptr[i + 1]]
    }

    /// Values of row i, parallel to [`CsrView::row`]
    pub fn row_values(&self, i: usize) -> &'a [T] {
        &self.values[self.row_ptr[i]..self.row_ptr[i + 1]]
    }

    pub fn degree(&self, i: usize) -> usize {
        self.row_ptr[i + 1] - self.row_ptr[i]
    }

    /// Binary search for column j in row i
    pub fn contains(&self, i: usize, j: usize) -> bool {
        self.row(i).binary_search(&j).is_ok()
    }
}

impl<T: fmt::Debug> fmt::Debug for SparseMatrixCSR<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "SparseMatrixCSR {{")?;
        writeln!(f, "  dimensions: {} × {}", self.n_rows, self.n_cols)?;
        writeln!(f, "  nnz: {}", self.nnz())?;

        // Print a sample of the matrix content
        let max_rows_to_print = 5.min(self.n_rows);

        if max_rows_to_print > 0 {
            writeln!(f, "  content sample:")?;

            for i in 0..max_rows_to_print {
                write!(f, "    row {}: ", i)?;
                let start = self.row_ptr[i];
                let end = self.row_ptr[i + 1];

                if start == end {
                    writeln!(f, "(empty)")?;
                } else {
                    let max_elements = 5.min(end - start);

                    for j in start..(start + max_elements) {
                        write!(f, "({}, {:?}) ", self.col_idx[j], self.values[j])?;
                    }

                    if end - start > max_elements {
                        write!(f, "... ({} more)", end - start - max_elements)?;
                    }

                    writeln!(f)?;
                }
            }

            if self.n_rows > max_rows_to_print {
                writeln!(f, "    ... ({} more rows)", self.n_rows - max_rows_to_print)?;
            }
        }

        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> AdjacencyMatrix {
        SparseMatrixCSR::new(
            3, 3,
            vec![0, 2, 4, 6],
            vec![1, 2, 0, 2, 0, 1],
            vec![1.0; 6],
        )
        .unwrap()
    }

    #[test]
    fn test_new_matrix() {
        let matrix = triangle();

        assert_eq!(matrix.n_rows(), 3);
        assert_eq!(matrix.n_cols(), 3);
        assert_eq!(matrix.nnz(), 6);
        assert!(matrix.validate_adjacency().is_ok());
    }

    #[test]
    fn test_row_access() {
        let matrix = triangle();

        assert_eq!(matrix.row(0), &[1, 2]);
        assert_eq!(matrix.row(2), &[0, 1]);
        assert_eq!(matrix.degree(1), 2);

        let row1: Vec<_> = matrix.row_iter(1).collect();
        assert_eq!(row1, vec![(0, &1.0), (2, &1.0)]);

        assert!(matrix.contains(1, 2));
        assert!(!matrix.contains(1, 1));
    }

    #[test]
    fn test_zeros_is_valid_adjacency() {
        let empty = SparseMatrixCSR::<f32>::zeros(4, 4);

        assert_eq!(empty.nnz(), 0);
        assert_eq!(empty.row(3), &[] as &[usize]);
        assert!(empty.validate_adjacency().is_ok());
        assert_eq!(empty.edges().count(), 0);
    }

    #[test]
    fn test_invalid_row_ptr() {
        let err = SparseMatrixCSR::new(
            3, 3,
            vec![0, 2, 3], // Missing last element
            vec![0, 1, 1, 0, 2],
            vec![1, 2, 3, 4, 5],
        )
        .unwrap_err();

        assert_eq!(err, MalformedInput::RowPtrLength { expected: 4, actual: 3 });
    }

    #[test]
    fn test_inconsistent_lengths() {
        let err = SparseMatrixCSR::new(
            3, 3,
            vec![0, 2, 3, 5],
            vec![0, 1, 1, 0, 2],
            vec![1, 2, 3, 4], // Missing last element
        )
        .unwrap_err();

        assert_eq!(err, MalformedInput::ValueLength { col_idx: 5, values: 4 });
    }

    #[test]
    fn test_non_monotonic_row_ptr() {
        let err = SparseMatrixCSR::new(3, 3, vec![0, 3, 2, 5], vec![0, 1, 2, 0, 1], vec![1; 5])
            .unwrap_err();

        assert_eq!(err, MalformedInput::NonMonotonic { row: 1 });
    }

    #[test]
    fn test_column_out_of_range() {
        let err = SparseMatrixCSR::new(2, 2, vec![0, 1, 2], vec![1, 2], vec![1; 2]).unwrap_err();

        assert_eq!(err, MalformedInput::ColumnOutOfRange { row: 1, col: 2, n_cols: 2 });
    }

    #[test]
    fn test_adjacency_violations() {
        let self_loop = SparseMatrixCSR::new(2, 2, vec![0, 2, 3], vec![0, 1, 0], vec![1; 3]).unwrap();
        assert_eq!(self_loop.validate_adjacency(), Err(MalformedInput::SelfLoop(0)));

        let single_edge = SparseMatrixCSR::new(3, 3, vec![0, 1, 2, 2], vec![1, 0], vec![1; 2]).unwrap();
        assert!(single_edge.validate_adjacency().is_ok());

        let missing_mirror = SparseMatrixCSR::new(3, 3, vec![0, 2, 3, 3], vec![1, 2, 0], vec![1; 3]).unwrap();
        assert_eq!(
            missing_mirror.validate_adjacency(),
            Err(MalformedInput::Asymmetric { row: 0, col: 2 })
        );

        let unsorted = SparseMatrixCSR::new(3, 3, vec![0, 2, 3, 4], vec![2, 1, 0, 0], vec![1; 4]).unwrap();
        assert_eq!(unsorted.validate_adjacency(), Err(MalformedInput::UnsortedRow { row: 0 }));

        let rectangular = SparseMatrixCSR::<u8>::zeros(2, 3);
        assert_eq!(
            rectangular.validate_adjacency(),
            Err(MalformedInput::NotSquare { n_rows: 2, n_cols: 3 })
        );
    }

    #[test]
    fn test_edges_upper_triangle() {
        let edges: Vec<_> = triangle().edges().collect();
        assert_eq!(edges, vec![(0, 1), (0, 2), (1, 2)]);
    }
}
