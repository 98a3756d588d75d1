//! # Pipeline Driver
//!
//! Runs the device pipeline on one adjacency matrix:
//!
//! 1. validate `A` (before any device memory is acquired)
//! 2. upload `A`
//! 3. sparse multiply → candidate matrix `C`, uploaded to the device
//! 4. filter kernel → accepted / examined wedge counters
//! 5. `find_triangles` → per-row partial counts
//! 6. `find_triangles_sum` → total and contributing-row counters
//!
//! Every launch blocks until its kernel has finished, so each stage sees the
//! complete output of the previous one. All device buffers are scoped to
//! [`TrianglePipeline::run`] and dropped on every return path.
//!
//! Every path counts a triangle once, as i < j < k. No division by 3 is
//! applied anywhere; the filter answer, the reduced total and the CPU
//! reference are compared directly.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::device::Device;
use crate::error::{Result, TriangleError};
use crate::kernels::{filter, find_triangles, find_triangles_sum, FilterStats};
use crate::matrix::config::PipelineConfig;
use crate::matrix::{count_triangles_cpu, SparseMatrixCSR};
use crate::multiply::mul_sparse;

/// Wall-clock time spent in each stage
#[derive(Debug, Clone, Default)]
pub struct StageTimings {
    pub upload: Duration,
    pub multiply: Duration,
    pub filter: Duration,
    pub count: Duration,
    pub reduce: Duration,
}

impl StageTimings {
    pub fn total(&self) -> Duration {
        self.upload + self.multiply + self.filter + self.count + self.reduce
    }
}

/// Outcome of one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// Number of triangles
    pub triangles: u64,
    /// Filter counters
    pub filter: FilterStats,
    /// Rows with at least one triangle rooted at them
    pub contributing_rows: u64,
    /// Stored entries of the candidate matrix
    pub candidate_nnz: usize,
    pub timings: StageTimings,
}

/// Device pipeline bound to one [`Device`]
#[derive(Debug)]
pub struct TrianglePipeline {
    config: PipelineConfig,
    device: Device,
}

impl TrianglePipeline {
    /// Creates the pipeline and its device
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let device = Device::new(&config)?;
        Ok(Self { config, device })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Counts the triangles of `a` on the device
    ///
    /// # Errors
    ///
    /// * [`TriangleError::MalformedInput`] when `a` is not a valid adjacency
    ///   matrix (only checked if `validate_input` is set)
    /// * [`TriangleError::Device`] on any device fault
    /// * [`TriangleError::ConsistencyMismatch`] when the filter and the
    ///   reduction disagree
    pub fn run<T>(&self, a: &SparseMatrixCSR<T>) -> Result<PipelineReport>
    where
        T: Copy + num_traits::Num + Sync,
    {
        if self.config.validate_input {
            a.validate_adjacency()?;
        }

        let device = &self.device;
        let block_size = self.config.block_size;
        let mut timings = StageTimings::default();

        let start = Instant::now();
        let d_a = device.upload_csr(a)?;
        timings.upload = start.elapsed();

        let start = Instant::now();
        let a_view = d_a.view();
        let strategy = self.config.strategy;
        let threshold = self.config.dense_accum_threshold;
        let c = device.launch("mul_sparse", || mul_sparse(a_view, strategy, threshold))?;
        let d_c = device.upload_csr(&c)?;
        drop(c);
        timings.multiply = start.elapsed();

        let c_view = d_c.view();

        let start = Instant::now();
        let accepted = device.alloc_counter()?;
        let examined = device.alloc_counter()?;
        device.launch("filter", || {
            filter(a_view, c_view, accepted.atomic(), examined.atomic(), block_size)
        })?;
        let filter_stats = FilterStats {
            accepted: accepted.get(),
            examined: examined.get(),
        };
        timings.filter = start.elapsed();

        let start = Instant::now();
        let mut partials = device.alloc_zeroed::<u64>(a.n_rows())?;
        device.launch("find_triangles", || {
            find_triangles(a_view, c_view, &mut partials, block_size)
        })?;
        timings.count = start.elapsed();

        let start = Instant::now();
        let total = device.alloc_counter()?;
        let contributing = device.alloc_counter()?;
        device.launch("find_triangles_sum", || {
            find_triangles_sum(&partials, total.atomic(), contributing.atomic(), block_size)
        })?;
        timings.reduce = start.elapsed();

        let triangles = total.get();
        if filter_stats.accepted != triangles {
            warn!(
                filter = filter_stats.accepted,
                reduce = triangles,
                "filter and reduction disagree"
            );
            return Err(TriangleError::ConsistencyMismatch {
                expected_source: "filter",
                expected: filter_stats.accepted,
                actual_source: "reduction",
                actual: triangles,
            });
        }

        debug!(
            triangles,
            candidate_nnz = d_c.nnz(),
            accept_rate = filter_stats.accept_rate(),
            contributing_rows = contributing.get(),
            live_device_bytes = device.live_bytes(),
            "pipeline finished"
        );

        Ok(PipelineReport {
            triangles,
            filter: filter_stats,
            contributing_rows: contributing.get(),
            candidate_nnz: d_c.nnz(),
            timings,
        })
    }

    /// Runs the pipeline and cross-checks it against the CPU reference
    pub fn run_validated<T>(&self, a: &SparseMatrixCSR<T>) -> Result<PipelineReport>
    where
        T: Copy + num_traits::Num + Sync,
    {
        let report = self.run(a)?;

        let start = Instant::now();
        let reference = count_triangles_cpu(a, None);
        info!(
            reference,
            elapsed = ?start.elapsed(),
            "CPU reference finished"
        );

        if reference != report.triangles {
            return Err(TriangleError::ConsistencyMismatch {
                expected_source: "CPU reference",
                expected: reference,
                actual_source: "device pipeline",
                actual: report.triangles,
            });
        }

        Ok(report)
    }
}

/// Counts triangles with the default configuration
///
/// # Examples
///
/// ```
/// use tricount::{count_triangles, AdjacencyMatrix};
///
/// // K4 has C(4, 3) = 4 triangles
/// let k4 = AdjacencyMatrix::from_edges(
///     4,
///     &[(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)],
/// ).unwrap();
/// assert_eq!(count_triangles(&k4).unwrap(), 4);
/// ```
pub fn count_triangles<T>(a: &SparseMatrixCSR<T>) -> Result<u64>
where
    T: Copy + num_traits::Num + Sync,
{
    let pipeline = TrianglePipeline::new(PipelineConfig::default())?;
    Ok(pipeline.run(a)?.triangles)
}
