//! Floating-point precision shared by the whole workspace.
//!
//! Every array, coefficient and tolerance in Eddington is expressed in
//! [`Real`]. The default is 64-bit; enabling the `single-precision` feature
//! on any crate of the workspace switches all of them to 32-bit.

#[cfg(not(feature = "single-precision"))]
pub type Real = f64;

#[cfg(feature = "single-precision")]
pub type Real = f32;

/// Mathematical constants in the selected precision.
#[cfg(not(feature = "single-precision"))]
pub use std::f64::consts;

/// Mathematical constants in the selected precision.
#[cfg(feature = "single-precision")]
pub use std::f32::consts;

/// Tolerance for comparing computed values in tests, scaled to [`Real`].
#[cfg(test)]
pub(crate) const TEST_TOL: Real = 1.0e4 * Real::EPSILON;
