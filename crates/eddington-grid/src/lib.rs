//! # Eddington Grid
//!
//! Discretisation of the atmosphere for the Eddington framework. This crate
//! provides:
//!
//! - **Precision** ([`precision`]): The single floating-point type [`Real`]
//!   used by every crate in the workspace, chosen once by cargo feature.
//! - **Grids** ([`grid`]): Vertical (altitude) and wavelength grids stored
//!   as strictly increasing edges, optionally one set of edges per column.
//! - **Profiles** ([`profile`]): Number-density profiles defined at grid
//!   edges, with layer column densities for radiator calculations.

pub mod grid;
pub mod precision;
pub mod profile;

pub use grid::{Grid, GridError};
pub use precision::{consts, Real};
pub use profile::Profile;
