//! # Eddington Compute
//!
//! Compute backend abstraction for the Eddington framework. This crate
//! provides a [`ComputeBackend`](backend::ComputeBackend) trait that isolates
//! the radiative transfer code from how independent atmospheric columns are
//! scheduled.
//!
//! ## Available backends
//!
//! | Backend | Feature flag | Status |
//! |---------|-------------|--------|
//! | CPU (Rayon) | `cpu` (default) | Implemented |

pub mod backend;

#[cfg(feature = "cpu")]
pub mod cpu;

pub use backend::{ComputeBackend, ComputeError, DeviceInfo, TaskError};

#[cfg(feature = "cpu")]
pub use cpu::CpuBackend;
