//! Sequential reference triangle counter
//!
//! This is the correctness oracle for the parallel pipeline. Every triangle
//! {i, j, k} is counted once, under the ordering i < j < k.

use crate::matrix::{CandidateMatrix, SparseMatrixCSR};
use crate::utils::{between, intersection_size};

/// Counts the triangles of an adjacency matrix on a single thread
///
/// With `candidates == None` the count comes from `a` alone: for each vertex
/// `i` and each neighbor `j > i`, the neighbors of both that lie above `j` are
/// counted. When a candidate matrix from [`crate::multiply::mul_sparse`] is
/// available, its wedge counts are summed at the coordinates that are edges of
/// `a`, which avoids redoing the intersections.
///
/// `a` must satisfy [`SparseMatrixCSR::validate_adjacency`].
///
/// # Panics
///
/// Panics if `candidates` does not have the same number of rows as `a`.
pub fn count_triangles_cpu<T>(a: &SparseMatrixCSR<T>, candidates: Option<&CandidateMatrix>) -> u64 {
    match candidates {
        Some(c) => count_from_candidates(a, c),
        None => count_from_adjacency(a),
    }
}

fn count_from_adjacency<T>(a: &SparseMatrixCSR<T>) -> u64 {
    let mut total = 0;

    for i in 0..a.n_rows() {
        let neighbors_i = a.row(i);
        for &j in neighbors_i.iter().filter(|&&j| j > i) {
            total += intersection_size(
                between(neighbors_i, j, usize::MAX),
                between(a.row(j), j, usize::MAX),
            );
        }
    }

    total
}

fn count_from_candidates<T>(a: &SparseMatrixCSR<T>, c: &CandidateMatrix) -> u64 {
    assert_eq!(
        a.n_rows(), c.n_rows(),
        "Candidate matrix must have the dimension of the adjacency matrix"
    );

    let mut total = 0;

    for i in 0..c.n_rows() {
        for (k, &wedges) in c.row_iter(i) {
            if a.contains(i, k) {
                total += u64::from(wedges);
            }
        }
    }

    total
}
