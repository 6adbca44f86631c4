//! # Eddington Core
//!
//! The numerical backbone of the Eddington framework. This crate computes
//! the solar radiation field (direct and diffuse irradiance and actinic flux
//! at every layer boundary) of a batch of plane-parallel atmospheric columns,
//! as needed for photolysis-rate calculations.
//!
//! ## Architecture
//!
//! All solvers implement the [`solver::RadiativeTransferSolver`] trait. The
//! implementation is the delta-Eddington two-stream approximation
//! ([`solver::delta_eddington::DeltaEddingtonSolver`]), which runs a
//! five-stage pipeline per column and distributes columns over an
//! `eddington-compute` backend.
//!
//! ## Modules
//!
//! - [`types`]: optical properties, solver parameters and the radiation field.
//! - [`solver`]: solver trait, errors and the delta-Eddington implementation.
//! - [`fields`]: reconstruction of fluxes from the solved layer constants.

pub mod fields;
pub mod solver;
pub mod types;

pub use solver::delta_eddington::DeltaEddingtonSolver;
pub use solver::{RadiativeTransferSolver, SolverError};
pub use types::{FluxComponents, OpticalProperties, RadiationField, Real, SolverParams};

/// Tolerance for comparing computed values in tests, scaled to the precision.
#[cfg(test)]
pub(crate) const TEST_TOL: Real = 1.0e4 * Real::EPSILON;
