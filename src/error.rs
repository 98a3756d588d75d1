//! Error types for triangle counting
//!
//! Three failure classes exist: malformed input (caught before any device
//! buffer is acquired), device faults (fatal for the run, never retried) and
//! consistency mismatches between two counting paths.

use std::fmt;
use std::panic::Location;
use thiserror::Error;

/// Violations of the CSR or adjacency invariants, and degenerate builder input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedInput {
    #[error("row_ptr has length {actual}, expected n_rows + 1 = {expected}")]
    RowPtrLength { expected: usize, actual: usize },

    #[error("row_ptr must start at 0, found {0}")]
    RowPtrStart(usize),

    #[error("row_ptr decreases at row {row}")]
    NonMonotonic { row: usize },

    #[error("row_ptr[n_rows] = {row_ptr_end} but {nnz} column indices are stored")]
    NnzMismatch { row_ptr_end: usize, nnz: usize },

    #[error("{values} values stored for {col_idx} column indices")]
    ValueLength { col_idx: usize, values: usize },

    #[error("column index {col} in row {row} out of bounds (n_cols = {n_cols})")]
    ColumnOutOfRange { row: usize, col: usize, n_cols: usize },

    #[error("edge ({u}, {v}) references a vertex outside 0..{n}")]
    VertexOutOfRange { u: usize, v: usize, n: usize },

    #[error("adjacency matrix must be square, got {n_rows} × {n_cols}")]
    NotSquare { n_rows: usize, n_cols: usize },

    #[error("column indices of row {row} are not strictly ascending")]
    UnsortedRow { row: usize },

    #[error("self-loop on vertex {0}")]
    SelfLoop(usize),

    #[error("entry ({row}, {col}) has no symmetric counterpart")]
    Asymmetric { row: usize, col: usize },

    #[error("graph dimension must be positive")]
    ZeroDimension,

    #[error("edge list is empty")]
    EmptyEdgeList,
}

/// Status codes reported by the device layer
///
/// Codes follow the numbering of the CUDA runtime so logs from both worlds
/// read the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceStatus {
    InvalidValue,
    MemoryAllocation,
    InitializationError,
    LaunchFailure,
}

impl DeviceStatus {
    /// Numeric status code
    pub fn code(self) -> u32 {
        match self {
            DeviceStatus::InvalidValue => 1,
            DeviceStatus::MemoryAllocation => 2,
            DeviceStatus::InitializationError => 3,
            DeviceStatus::LaunchFailure => 719,
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeviceStatus::InvalidValue => "invalid value",
            DeviceStatus::MemoryAllocation => "memory allocation",
            DeviceStatus::InitializationError => "initialization error",
            DeviceStatus::LaunchFailure => "launch failure",
        };
        f.write_str(name)
    }
}

/// A failed device call: where it happened, its status and why
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("device fault at {site}, code: {code} ({status}), reason: {reason}", code = .status.code())]
pub struct DeviceFault {
    /// `file:line` of the failing device call
    pub site: String,
    pub status: DeviceStatus,
    pub reason: String,
}

impl DeviceFault {
    /// Builds a fault attributed to the caller's location
    #[track_caller]
    pub fn new(status: DeviceStatus, reason: impl Into<String>) -> Self {
        Self::at(Location::caller(), status, reason)
    }

    pub(crate) fn at(
        location: &Location<'_>,
        status: DeviceStatus,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            site: format!("{}:{}", location.file(), location.line()),
            status,
            reason: reason.into(),
        }
    }
}

/// Top-level error for the library
#[derive(Debug, Error)]
pub enum TriangleError {
    #[error("malformed input: {0}")]
    MalformedInput(#[from] MalformedInput),

    #[error(transparent)]
    Device(#[from] DeviceFault),

    #[error("count mismatch: {expected_source} reports {expected}, {actual_source} reports {actual}")]
    ConsistencyMismatch {
        expected_source: &'static str,
        expected: u64,
        actual_source: &'static str,
        actual: u64,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error on line {line}: {reason}")]
    Parse { line: usize, reason: String },
}

pub type Result<T> = std::result::Result<T, TriangleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_fault_reports_site_and_code() {
        let fault = DeviceFault::new(DeviceStatus::MemoryAllocation, "limit exceeded");
        assert!(fault.site.starts_with(file!()));

        let message = fault.to_string();
        assert!(message.contains("code: 2"));
        assert!(message.contains("memory allocation"));
        assert!(message.contains("limit exceeded"));
    }

    #[test]
    fn malformed_input_converts() {
        let err: TriangleError = MalformedInput::SelfLoop(3).into();
        assert!(matches!(err, TriangleError::MalformedInput(MalformedInput::SelfLoop(3))));
    }
}
