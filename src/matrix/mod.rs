// Matrix data structures and operations

pub mod builder;
pub mod categorization;
pub mod config;
pub mod csr;
pub mod reference;

pub use categorization::{analyze_categorization, categorize_rows, CategorizationSummary};
pub use config::{MultiplyStrategy, PipelineConfig, RowCategory, SystemParameters};
pub use csr::{AdjacencyMatrix, CandidateMatrix, CsrView, SparseMatrixCSR};
pub use reference::count_triangles_cpu;
