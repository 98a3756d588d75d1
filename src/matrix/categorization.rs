//! # Row Categorization for the Sparse Multiply
//!
//! Each row of the candidate product is assigned an accumulation method
//! from the size of its intermediate product, the number of wedges
//! `i - j - k` with `i < j < k` that start at the row:
//!
//! 1. **Sort**: the intermediate product is at most `dense_accum_threshold`;
//!    entries are collected unsorted, then sorted and merged.
//! 2. **DenseAccumulation**: larger products scatter into a dense array of
//!    length `n_cols`, one per worker thread.

use crate::matrix::config::RowCategory;
use crate::matrix::CsrView;

/// Number of wedges `i - j - k` with `i < j < k` rooted at row `i`
pub fn intermediate_product_size<T>(a: CsrView<'_, T>, i: usize) -> usize {
    a.row(i)
        .iter()
        .filter(|&&j| j > i)
        .map(|&j| a.row(j).iter().filter(|&&k| k > j).count())
        .sum()
}

/// Categorizes every row of `a` for the sparse multiply
pub fn categorize_rows<T>(a: CsrView<'_, T>, dense_accum_threshold: usize) -> Vec<RowCategory> {
    (0..a.n_rows())
        .map(|i| categorize_row(intermediate_product_size(a, i), dense_accum_threshold))
        .collect()
}

pub(crate) fn categorize_row(product_size: usize, dense_accum_threshold: usize) -> RowCategory {
    if product_size <= dense_accum_threshold {
        RowCategory::Sort
    } else {
        RowCategory::DenseAccumulation
    }
}

/// Summary statistics about row categorization
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorizationSummary {
    pub total_rows: usize,
    pub sort_count: usize,
    pub dense_count: usize,
    /// Sum of the intermediate product sizes, i.e. the number of wedges
    pub total_wedges: usize,
}

/// Categorizes the rows and tallies the result
pub fn analyze_categorization<T>(a: CsrView<'_, T>, dense_accum_threshold: usize) -> CategorizationSummary {
    let mut summary = CategorizationSummary {
        total_rows: a.n_rows(),
        ..Default::default()
    };

    for i in 0..a.n_rows() {
        let size = intermediate_product_size(a, i);
        summary.total_wedges += size;
        match categorize_row(size, dense_accum_threshold) {
            RowCategory::Sort => summary.sort_count += 1,
            RowCategory::DenseAccumulation => summary.dense_count += 1,
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::AdjacencyMatrix;

    #[test]
    fn test_intermediate_product_size() {
        // Star around 0 plus path 1-2-3
        let a = AdjacencyMatrix::from_edges(5, &[(0, 1), (0, 2), (0, 3), (0, 4), (1, 2), (2, 3)]).unwrap();
        let view = a.view();

        // Row 0: j=1 -> {2}, j=2 -> {3}, j=3 -> {}, j=4 -> {}
        assert_eq!(intermediate_product_size(view, 0), 2);
        // Row 1: j=2 -> {3}
        assert_eq!(intermediate_product_size(view, 1), 1);
        assert_eq!(intermediate_product_size(view, 4), 0);
    }

    #[test]
    fn test_categorize_rows() {
        let a = AdjacencyMatrix::from_edges(5, &[(0, 1), (0, 2), (0, 3), (0, 4), (1, 2), (2, 3)]).unwrap();

        let categories = categorize_rows(a.view(), 1);
        assert_eq!(categories[0], RowCategory::DenseAccumulation);
        assert_eq!(categories[1], RowCategory::Sort);

        let summary = analyze_categorization(a.view(), 1);
        assert_eq!(summary.total_rows, 5);
        assert_eq!(summary.dense_count, 1);
        assert_eq!(summary.sort_count, 4);
        assert_eq!(summary.total_wedges, 3);
    }
}
