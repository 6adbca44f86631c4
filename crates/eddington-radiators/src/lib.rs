//! # Eddington Radiators
//!
//! Optical properties of the atmosphere for the Eddington framework. Every
//! source of extinction implements the [`Radiator`](radiator::Radiator)
//! trait, which yields a [`RadiatorState`](state::RadiatorState) (optical
//! depth, single-scattering albedo and asymmetry parameter per layer and
//! column) at a given wavelength. States from several radiators are combined
//! with [`RadiatorState::accumulate`](state::RadiatorState::accumulate)
//! before being handed to the solver.
//!
//! ## Available radiators
//!
//! | Radiator | Module | Physics |
//! |----------|--------|---------|
//! | Rayleigh scattering by air | [`rayleigh`] | Nicolet (1984) cross-section |
//! | Gas absorption (e.g. O₃) | [`absorber`] | Tabulated cross-section |
//! | Aerosol | [`aerosol`] | Ångström power law |
//!
//! ## Interpolation
//!
//! Tabulated cross-sections are interpolated in log space with natural cubic
//! splines ([`spline::CubicSpline`]).

pub mod absorber;
pub mod aerosol;
pub mod radiator;
pub mod rayleigh;
pub mod spline;
pub mod state;

pub use radiator::{Radiator, RadiatorError};
pub use state::RadiatorState;

/// Tolerance for comparing computed values in tests, scaled to the precision.
#[cfg(test)]
pub(crate) const TEST_TOL: eddington_grid::Real = 1.0e4 * eddington_grid::Real::EPSILON;
