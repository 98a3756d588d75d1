//! # tricount: triangle counting on CSR adjacency matrices
//!
//! Counts the triangles of an undirected graph stored as a sparse adjacency
//! matrix in Compressed Sparse Row format. Two counting paths share the same
//! input:
//!
//! - a sequential **CPU reference** ([`count_triangles_cpu`]), the
//!   correctness oracle, and
//! - a **device pipeline** ([`TrianglePipeline`]) that runs data-parallel
//!   kernels on a dedicated worker pool with accounted, aligned buffers.
//!
//! ## Algorithm Components
//!
//! 1. **Sparse multiply**: the candidate matrix `C = U·U` (strict upper
//!    triangle of `A`), masked to the nonzeros of `A` by default. `C(i, k)`
//!    counts the wedges `i - j - k` with `i < j < k`.
//!
//! 2. **Filter**: every candidate entry is checked against `A` by binary
//!    search; two atomic counters tally accepted and examined wedges.
//!
//! 3. **Count / reduce**: per-row partial counts by sorted-set intersection,
//!    then a block-wise atomic reduction into the total.
//!
//! Each triangle is counted exactly once, under the ordering `i < j < k`.
//!
//! ## Usage
//!
//! ```
//! use tricount::{AdjacencyMatrix, PipelineConfig, TrianglePipeline, count_triangles_cpu};
//!
//! let a = AdjacencyMatrix::from_edges(4, &[(0, 1), (1, 2), (2, 0), (2, 3)]).unwrap();
//!
//! let pipeline = TrianglePipeline::new(PipelineConfig::default()).unwrap();
//! let report = pipeline.run(&a).unwrap();
//!
//! assert_eq!(report.triangles, 1);
//! assert_eq!(report.triangles, count_triangles_cpu(&a, None));
//! ```

pub mod accumulator;
pub mod device;
pub mod error;
pub mod io;
pub mod kernels;
pub mod matrix;
pub mod multiply;
pub mod pipeline;
pub mod utils;

// Re-export primary components
pub use device::{Device, DeviceBuffer, DeviceCounter, DeviceCsr};
pub use error::{DeviceFault, DeviceStatus, MalformedInput, Result, TriangleError};
pub use kernels::{filter, find_triangles, find_triangles_sum, FilterStats};
pub use matrix::{count_triangles_cpu, AdjacencyMatrix, CandidateMatrix, CsrView, SparseMatrixCSR};
pub use matrix::{analyze_categorization, categorize_rows, CategorizationSummary};
pub use matrix::config::{MultiplyStrategy, PipelineConfig, RowCategory, SystemParameters};
pub use multiply::mul_sparse;
pub use pipeline::{count_triangles, PipelineReport, StageTimings, TrianglePipeline};
pub use utils::{from_sprs_csr, to_sprs_csr};

/// Version information for the tricount library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
