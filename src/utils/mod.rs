//! Utility functions and helpers

pub mod formats;

pub use formats::{from_sprs_csr, to_sprs_csr};

/// Computes an exclusive prefix sum (scan) for a vector
pub fn exclusive_scan(input: &[usize]) -> Vec<usize> {
    let mut result = Vec::with_capacity(input.len() + 1);
    let mut sum = 0;

    result.push(0); // First element is always 0

    for &val in input {
        sum += val;
        result.push(sum);
    }

    result
}

/// Sub-slice of a sorted slice holding the elements strictly between `lo` and `hi`
pub fn between(sorted: &[usize], lo: usize, hi: usize) -> &[usize] {
    let start = sorted.partition_point(|&x| x <= lo);
    let end = sorted.partition_point(|&x| x < hi);
    &sorted[start..end.max(start)]
}

/// Size of the intersection of two strictly ascending slices (two-pointer merge)
pub fn intersection_size(x: &[usize], y: &[usize]) -> u64 {
    let (mut i, mut j) = (0, 0);
    let mut count = 0;

    while i < x.len() && j < y.len() {
        match x[i].cmp(&y[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                count += 1;
                i += 1;
                j += 1;
            }
        }
    }

    count
}
