//! Configuration and system parameters for the counting pipeline

/// System parameters for performance tuning
#[derive(Debug, Clone)]
pub struct SystemParameters {
    /// Size of cache line in bytes; device buffers are aligned to it
    pub cache_line_size: usize,
    /// Number of device worker threads
    pub n_threads: usize,
}

impl Default for SystemParameters {
    fn default() -> Self {
        Self {
            cache_line_size: 64,        // Common cache line size
            n_threads: num_cpus::get(), // Use all available cores
        }
    }
}

/// Which coordinates of the two-hop product the sparse multiply keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MultiplyStrategy {
    /// Only coordinates that are already edges of A (masked product)
    #[default]
    Masked,
    /// Every two-hop coordinate; the filter then rejects open wedges
    Candidates,
}

/// Per-row accumulation method of the sparse multiply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowCategory {
    /// Small intermediate products, use sort-based approach
    Sort,
    /// Large intermediate products, use dense accumulation
    DenseAccumulation,
}

/// Configuration for the triangle counting pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// System parameters for performance tuning
    pub system_params: SystemParameters,

    /// Rows per block in the filter, count and reduce kernels
    pub block_size: usize,

    /// Intermediate product size above which a row uses dense accumulation
    pub dense_accum_threshold: usize,

    /// Coordinates kept by the sparse multiply
    pub strategy: MultiplyStrategy,

    /// Cap on live device memory in bytes; `None` means unlimited
    pub memory_limit: Option<usize>,

    /// Check the adjacency invariants before acquiring device memory
    pub validate_input: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            system_params: SystemParameters::default(),
            block_size: 256,
            dense_accum_threshold: 256,
            strategy: MultiplyStrategy::default(),
            memory_limit: None,
            validate_input: true,
        }
    }
}

impl PipelineConfig {
    /// Default configuration with a fixed number of device threads
    pub fn with_threads(n_threads: usize) -> Self {
        Self {
            system_params: SystemParameters {
                n_threads,
                ..SystemParameters::default()
            },
            ..Self::default()
        }
    }
}
