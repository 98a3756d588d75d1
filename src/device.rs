//! # Device
//!
//! The counting kernels run on a dedicated Rayon pool that plays the role of
//! the GPU. Buffers handed to kernels are allocated through [`Device`], which
//! aligns them to the cache line, enforces an optional memory limit and
//! tracks every live allocation. Buffers release themselves on drop, so all
//! device memory of a pipeline run is returned on success and on error.
//!
//! Every device-facing operation returns `Result<_, DeviceFault>`; the fault
//! records the call site, a status code and a reason.

use std::mem::size_of;
use std::ops::{Deref, DerefMut};
use std::panic::{self, AssertUnwindSafe, Location};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;

use aligned_vec::{AVec, RuntimeAlign};
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, trace};

use crate::error::{DeviceFault, DeviceStatus};
use crate::matrix::config::PipelineConfig;
use crate::matrix::{CsrView, SparseMatrixCSR};

/// Worker pool plus memory accounting
pub struct Device {
    pool: ThreadPool,
    alignment: usize,
    memory_limit: Option<usize>,
    live_bytes: AtomicUsize,
    live_buffers: AtomicUsize,
}

impl Device {
    /// Creates a device with `config.system_params.n_threads` workers
    #[track_caller]
    pub fn new(config: &PipelineConfig) -> Result<Self, DeviceFault> {
        let location = Location::caller();
        let params = &config.system_params;

        if params.n_threads == 0 {
            return Err(DeviceFault::at(
                location,
                DeviceStatus::InvalidValue,
                "device needs at least one worker thread",
            ));
        }
        if !params.cache_line_size.is_power_of_two() {
            return Err(DeviceFault::at(
                location,
                DeviceStatus::InvalidValue,
                format!("alignment {} is not a power of two", params.cache_line_size),
            ));
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(params.n_threads)
            .thread_name(|i| format!("tricount-device-{}", i))
            .build()
            .map_err(|e| DeviceFault::at(location, DeviceStatus::InitializationError, e.to_string()))?;

        debug!(
            threads = params.n_threads,
            memory_limit = ?config.memory_limit,
            "device initialized"
        );

        Ok(Self {
            pool,
            alignment: params.cache_line_size,
            memory_limit: config.memory_limit,
            live_bytes: AtomicUsize::new(0),
            live_buffers: AtomicUsize::new(0),
        })
    }

    /// Number of worker threads
    pub fn n_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Bytes currently held by live buffers and counters
    pub fn live_bytes(&self) -> usize {
        self.live_bytes.load(Ordering::Relaxed)
    }

    /// Number of live buffers and counters
    pub fn live_buffers(&self) -> usize {
        self.live_buffers.load(Ordering::Relaxed)
    }

    /// Allocates a buffer of `len` default-initialized elements
    #[track_caller]
    pub fn alloc_zeroed<T: Copy + Default>(&self, len: usize) -> Result<DeviceBuffer<'_, T>, DeviceFault> {
        let bytes = self.reserve::<T>(len, Location::caller())?;
        let data = AVec::<T, RuntimeAlign>::from_iter(self.alignment, std::iter::repeat(T::default()).take(len));
        Ok(DeviceBuffer { device: self, data, bytes })
    }

    /// Copies a host slice into a new device buffer
    #[track_caller]
    pub fn upload<T: Copy>(&self, host: &[T]) -> Result<DeviceBuffer<'_, T>, DeviceFault> {
        let bytes = self.reserve::<T>(host.len(), Location::caller())?;
        let data = AVec::<T, RuntimeAlign>::from_iter(self.alignment, host.iter().copied());
        Ok(DeviceBuffer { device: self, data, bytes })
    }

    /// Copies a CSR matrix into device buffers
    #[track_caller]
    pub fn upload_csr<T: Copy>(&self, matrix: &SparseMatrixCSR<T>) -> Result<DeviceCsr<'_, T>, DeviceFault> {
        Ok(DeviceCsr {
            n_rows: matrix.n_rows(),
            n_cols: matrix.n_cols(),
            row_ptr: self.upload(matrix.row_ptr())?,
            col_idx: self.upload(matrix.col_idx())?,
            values: self.upload(matrix.values())?,
        })
    }

    /// Allocates a zeroed atomic counter
    #[track_caller]
    pub fn alloc_counter(&self) -> Result<DeviceCounter<'_>, DeviceFault> {
        let bytes = self.reserve::<AtomicU64>(1, Location::caller())?;
        Ok(DeviceCounter {
            device: self,
            value: AtomicU64::new(0),
            bytes,
        })
    }

    /// Runs `kernel` on the device pool and waits for it to finish
    ///
    /// Returning from `launch` is the barrier between pipeline stages: every
    /// write the kernel made, atomic or not, is visible to the caller. A
    /// panicking kernel is reported as [`DeviceStatus::LaunchFailure`].
    #[track_caller]
    pub fn launch<R, F>(&self, name: &str, kernel: F) -> Result<R, DeviceFault>
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        let location = Location::caller();
        let start = Instant::now();

        let result = self
            .pool
            .install(|| panic::catch_unwind(AssertUnwindSafe(kernel)));

        match result {
            Ok(value) => {
                debug!(kernel = name, elapsed = ?start.elapsed(), "kernel completed");
                Ok(value)
            }
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "kernel panicked".to_string());
                Err(DeviceFault::at(
                    location,
                    DeviceStatus::LaunchFailure,
                    format!("kernel `{}` failed: {}", name, message),
                ))
            }
        }
    }

    fn reserve<T>(&self, len: usize, location: &Location<'_>) -> Result<usize, DeviceFault> {
        let bytes = len.checked_mul(size_of::<T>()).ok_or_else(|| {
            DeviceFault::at(
                location,
                DeviceStatus::MemoryAllocation,
                format!("allocation of {} elements overflows", len),
            )
        })?;

        let previous = self.live_bytes.fetch_add(bytes, Ordering::Relaxed);
        if let Some(limit) = self.memory_limit {
            if previous.saturating_add(bytes) > limit {
                self.live_bytes.fetch_sub(bytes, Ordering::Relaxed);
                return Err(DeviceFault::at(
                    location,
                    DeviceStatus::MemoryAllocation,
                    format!(
                        "requested {} bytes with {} of {} bytes in use",
                        bytes, previous, limit
                    ),
                ));
            }
        }

        self.live_buffers.fetch_add(1, Ordering::Relaxed);
        trace!(bytes, "device allocation");
        Ok(bytes)
    }

    fn release(&self, bytes: usize) {
        self.live_bytes.fetch_sub(bytes, Ordering::Relaxed);
        self.live_buffers.fetch_sub(1, Ordering::Relaxed);
        trace!(bytes, "device release");
    }
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("threads", &self.n_threads())
            .field("alignment", &self.alignment)
            .field("memory_limit", &self.memory_limit)
            .field("live_bytes", &self.live_bytes())
            .field("live_buffers", &self.live_buffers())
            .finish()
    }
}

/// Cache-line aligned buffer owned by a [`Device`]
pub struct DeviceBuffer<'d, T> {
    device: &'d Device,
    data: AVec<T, RuntimeAlign>,
    bytes: usize,
}

impl<T> Deref for DeviceBuffer<'_, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.data
    }
}

impl<T> DerefMut for DeviceBuffer<'_, T> {
    fn deref_mut(&mut self) -> &mut [T] {
        &mut self.data
    }
}

impl<T> std::fmt::Debug for DeviceBuffer<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceBuffer")
            .field("len", &self.data.len())
            .field("bytes", &self.bytes)
            .finish()
    }
}

impl<T> Drop for DeviceBuffer<'_, T> {
    fn drop(&mut self) {
        self.device.release(self.bytes);
    }
}

/// Atomic counter owned by a [`Device`]
///
/// Kernels add with relaxed ordering; the value is read after the launch
/// that wrote it has returned.
pub struct DeviceCounter<'d> {
    device: &'d Device,
    value: AtomicU64,
    bytes: usize,
}

impl DeviceCounter<'_> {
    pub fn atomic(&self) -> &AtomicU64 {
        &self.value
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for DeviceCounter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceCounter").field("value", &self.get()).finish()
    }
}

impl Drop for DeviceCounter<'_> {
    fn drop(&mut self) {
        self.device.release(self.bytes);
    }
}

/// Device copy of a CSR matrix
pub struct DeviceCsr<'d, T> {
    n_rows: usize,
    n_cols: usize,
    row_ptr: DeviceBuffer<'d, usize>,
    col_idx: DeviceBuffer<'d, usize>,
    values: DeviceBuffer<'d, T>,
}

impl<T> std::fmt::Debug for DeviceCsr<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceCsr")
            .field("n_rows", &self.n_rows)
            .field("n_cols", &self.n_cols)
            .field("nnz", &self.nnz())
            .finish()
    }
}

impl<T> DeviceCsr<'_, T> {
    pub fn view(&self) -> CsrView<'_, T> {
        CsrView::from_raw(self.n_rows, self.n_cols, &self.row_ptr, &self.col_idx, &self.values)
    }

    pub fn nnz(&self) -> usize {
        self.col_idx.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::AdjacencyMatrix;

    fn device(memory_limit: Option<usize>) -> Device {
        let config = PipelineConfig {
            memory_limit,
            ..PipelineConfig::with_threads(2)
        };
        Device::new(&config).unwrap()
    }

    #[test]
    fn test_buffers_are_aligned_and_released() {
        let device = device(None);
        {
            let buffer = device.upload(&[1u64, 2, 3]).unwrap();
            assert_eq!(&*buffer, &[1, 2, 3]);
            assert_eq!(buffer.as_ptr() as usize % 64, 0);

            let zeroed = device.alloc_zeroed::<u32>(10).unwrap();
            assert!(zeroed.iter().all(|&x| x == 0));

            assert_eq!(device.live_buffers(), 2);
            assert_eq!(device.live_bytes(), 3 * 8 + 10 * 4);
        }
        assert_eq!(device.live_buffers(), 0);
        assert_eq!(device.live_bytes(), 0);
    }

    #[test]
    fn test_memory_limit() {
        let device = device(Some(64));
        let first = device.alloc_zeroed::<u64>(6).unwrap();

        let fault = device.alloc_zeroed::<u64>(4).unwrap_err();
        assert_eq!(fault.status, DeviceStatus::MemoryAllocation);
        assert!(fault.site.contains("device.rs"));

        drop(first);
        assert_eq!(device.live_bytes(), 0);
        assert!(device.alloc_zeroed::<u64>(8).is_ok());
    }

    #[test]
    fn test_handles_are_debug() {
        let device = device(Some(16));
        let buffer = device.alloc_zeroed::<u32>(2).unwrap();
        let counter = device.alloc_counter().unwrap();

        assert_eq!(format!("{:?}", buffer), "DeviceBuffer { len: 2, bytes: 8 }");
        assert_eq!(format!("{:?}", counter), "DeviceCounter { value: 0 }");

        let err = device.upload_csr(&AdjacencyMatrix::zeros(4, 4)).unwrap_err();
        assert_eq!(err.status, DeviceStatus::MemoryAllocation);
    }

    #[test]
    fn test_upload_csr_view() {
        let device = device(None);
        let a = AdjacencyMatrix::from_edges(3, &[(0, 1), (1, 2)]).unwrap();

        let d_a = device.upload_csr(&a).unwrap();
        assert_eq!(d_a.nnz(), 4);
        assert_eq!(d_a.view().row(1), a.row(1));
        assert_eq!(device.live_buffers(), 3);
    }

    #[test]
    fn test_launch_runs_on_pool() {
        let device = device(None);
        let threads = device.launch("threads", rayon::current_num_threads).unwrap();
        assert_eq!(threads, 2);
    }

    #[test]
    fn test_panicking_kernel_is_launch_failure() {
        let device = device(None);
        let fault = device
            .launch("broken", || -> u32 { panic!("index out of range") })
            .unwrap_err();

        assert_eq!(fault.status, DeviceStatus::LaunchFailure);
        assert!(fault.reason.contains("broken"));
        assert!(fault.reason.contains("index out of range"));
    }

    #[test]
    fn test_zero_threads_rejected() {
        let fault = Device::new(&PipelineConfig::with_threads(0)).unwrap_err();
        assert_eq!(fault.status, DeviceStatus::InvalidValue);
    }
}
