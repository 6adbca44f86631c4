//! CPU compute backend using Rayon for shared-memory parallelism.

use ndarray::Array2;
use rayon::prelude::*;

use crate::backend::{ComputeBackend, ComputeError, DeviceInfo, TaskError};

/// CPU backend that parallelises work across threads via Rayon.
pub struct CpuBackend {
    num_threads: usize,
    /// Dedicated pool; `None` runs on Rayon's global pool (or serially for
    /// a single thread).
    pool: Option<rayon::ThreadPool>,
}

impl CpuBackend {
    /// Create a new CPU backend using all available threads.
    pub fn new() -> Self {
        Self {
            num_threads: rayon::current_num_threads(),
            pool: None,
        }
    }

    /// Create a CPU backend with a specified thread count.
    ///
    /// `0` uses all available threads and `1` runs every task serially on
    /// the calling thread.
    pub fn with_threads(num_threads: usize) -> Result<Self, ComputeError> {
        match num_threads {
            0 => Ok(Self::new()),
            1 => Ok(Self {
                num_threads: 1,
                pool: None,
            }),
            n => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| ComputeError::ThreadPool {
                        threads: n,
                        reason: e.to_string(),
                    })?;
                Ok(Self {
                    num_threads: n,
                    pool: Some(pool),
                })
            }
        }
    }

    pub fn num_threads(&self) -> usize {
        self.num_threads
    }
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ComputeBackend<T> for CpuBackend
where
    T: Clone + Default + Send + Sync,
{
    fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            name: format!("CPU ({} threads)", self.num_threads),
            compute_units: Some(self.num_threads),
        }
    }

    fn parallel_row_fill(
        &self,
        tasks: usize,
        width: usize,
        fill_fn: &(dyn Fn(usize, &mut [T]) -> Result<(), TaskError> + Send + Sync),
    ) -> Result<Array2<T>, ComputeError> {
        if width == 0 {
            return Ok(Array2::default((tasks, 0)));
        }
        let mut data = vec![T::default(); tasks * width];

        let results: Vec<Result<(), TaskError>> = if self.num_threads == 1 {
            data.chunks_mut(width)
                .enumerate()
                .map(|(index, row)| fill_fn(index, row))
                .collect()
        } else {
            let run = |data: &mut Vec<T>| -> Vec<Result<(), TaskError>> {
                data.par_chunks_mut(width)
                    .enumerate()
                    .map(|(index, row)| fill_fn(index, row))
                    .collect()
            };
            match &self.pool {
                Some(pool) => pool.install(|| run(&mut data)),
                None => run(&mut data),
            }
        };

        if let Some((index, source)) = results
            .into_iter()
            .enumerate()
            .find_map(|(index, result)| result.err().map(|source| (index, source)))
        {
            log::debug!("CPU backend: task {} of {} failed", index, tasks);
            return Err(ComputeError::TaskFailed { index, source });
        }

        Array2::from_shape_vec((tasks, width), data)
            .map_err(|e| ComputeError::Unavailable(e.to_string()))
    }
}
