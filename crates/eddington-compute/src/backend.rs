//! Compute backend trait and device abstraction.
//!
//! The [`ComputeBackend`] trait abstracts over execution environments so that
//! the physics code in `eddington-core` remains device-agnostic. The only
//! hot-path operation the two-stream solver needs is a parallel fill of one
//! output row per atmospheric column.

use std::error::Error as StdError;

use ndarray::Array2;
use thiserror::Error;

/// Error returned by a single task of a parallel fill.
pub type TaskError = Box<dyn StdError + Send + Sync>;

/// Errors originating from compute backends.
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Backend not available: {0}")]
    Unavailable(String),

    #[error("Could not build a pool of {threads} threads: {reason}")]
    ThreadPool { threads: usize, reason: String },

    #[error("Task {index} failed: {source}")]
    TaskFailed {
        index: usize,
        #[source]
        source: TaskError,
    },
}

/// Describes the capabilities of a compute backend.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub name: String,
    pub compute_units: Option<usize>,
}

/// Abstraction over compute backends.
///
/// Physics code in `eddington-core` operates against this trait.
pub trait ComputeBackend<T>: Send + Sync {
    /// Return information about the device.
    fn device_info(&self) -> DeviceInfo;

    /// Fill a `(tasks, width)` array, one row per task.
    ///
    /// Each task receives its index and exclusive access to its row, and
    /// tasks may run in any order or concurrently. If any task fails the
    /// whole fill fails with [`ComputeError::TaskFailed`] for the lowest
    /// failing index, and no partial result is returned.
    ///
    /// # Arguments
    /// * `tasks` - Number of independent tasks (rows).
    /// * `width` - Length of each task's output row.
    /// * `fill_fn` - Computes row `index` in place.
    fn parallel_row_fill(
        &self,
        tasks: usize,
        width: usize,
        fill_fn: &(dyn Fn(usize, &mut [T]) -> Result<(), TaskError> + Send + Sync),
    ) -> Result<Array2<T>, ComputeError>;
}
