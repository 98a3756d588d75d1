//! Data-parallel kernels of the device pipeline
//!
//! Kernels split the rows into blocks of `block_size`; a block is one unit of
//! parallel work. Blocks run in any order. The only memory written by more
//! than one block are the atomic counters, updated once per block with
//! relaxed ordering and read after the launch has returned.

pub mod count;
pub mod filter;

pub use count::{find_triangles, find_triangles_sum};
pub use filter::{filter, FilterStats};

/// Number of blocks needed to cover `n` rows
pub(crate) fn grid_dim(n: usize, block_size: usize) -> usize {
    (n + block_size - 1) / block_size
}
