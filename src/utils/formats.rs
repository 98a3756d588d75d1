//! Utilities for converting between our matrix format and sprs

use crate::error::MalformedInput;
use crate::matrix::SparseMatrixCSR;
use sprs::CsMat;
use num_traits::Num;

/// Converts our CSR matrix format to sprs CsMat format
pub fn to_sprs_csr<T>(matrix: &SparseMatrixCSR<T>) -> CsMat<T>
where
    T: Copy + Num + Default,
{
    CsMat::new(
        (matrix.n_rows(), matrix.n_cols()),
        matrix.row_ptr().to_vec(),
        matrix.col_idx().to_vec(),
        matrix.values().to_vec(),
    )
}

/// Converts sprs CsMat to our SparseMatrixCSR format
///
/// CSC input is converted to CSR first.
pub fn from_sprs_csr<T>(matrix: CsMat<T>) -> Result<SparseMatrixCSR<T>, MalformedInput>
where
    T: Copy + Num + Default,
{
    // Ensure matrix is in CSR format
    let matrix = if matrix.is_csr() {
        matrix
    } else {
        matrix.to_csr()
    };

    let shape = matrix.shape();
    let (indptr, indices, data) = matrix.into_raw_storage();

    SparseMatrixCSR::new(shape.0, shape.1, indptr, indices, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::AdjacencyMatrix;

    #[test]
    fn test_csr_roundtrip() {
        let original = AdjacencyMatrix::from_edges(4, &[(0, 1), (1, 2), (2, 0), (2, 3)]).unwrap();

        // Convert to sprs and back
        let sprs_mat = to_sprs_csr(&original);
        assert_eq!(sprs_mat.nnz(), original.nnz());

        let roundtrip = from_sprs_csr(sprs_mat).unwrap();
        assert_eq!(roundtrip, original);
    }

    #[test]
    fn test_from_sprs_csc_input() {
        let original = AdjacencyMatrix::from_edges(3, &[(0, 1), (1, 2)]).unwrap();

        // Symmetric, so the CSC view converts back to the same CSR pattern
        let csc = to_sprs_csr(&original).to_csc();
        let roundtrip = from_sprs_csr(csc).unwrap();

        assert_eq!(roundtrip.row_ptr(), original.row_ptr());
        assert_eq!(roundtrip.col_idx(), original.col_idx());
    }
}
