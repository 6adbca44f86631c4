//! Radiative transfer solver abstraction and implementations.
//!
//! The [`RadiativeTransferSolver`] trait defines the interface that all
//! radiative transfer methods must implement. The delta-Eddington two-stream
//! approximation is the first implementation.

pub mod delta_eddington;

use eddington_grid::Grid;
use eddington_radiators::RadiatorState;
use thiserror::Error;

use crate::types::{RadiationField, Real, SolverParams};

/// Errors that can occur during a radiative transfer solve.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("Dimension mismatch for {what}: expected {expected}, found {found}")]
    DimensionMismatch {
        what: String,
        expected: usize,
        found: usize,
    },

    #[error("Missing parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Numerical instability in {quantity}{}: value {value:e}", layer_suffix(.layer))]
    NumericalInstability {
        quantity: &'static str,
        layer: Option<usize>,
        value: Real,
    },

    #[error("Invalid parameter {name} = {value}")]
    InvalidParameter { name: &'static str, value: Real },

    #[error("Column {column}: {source}")]
    Column {
        column: usize,
        #[source]
        source: Box<SolverError>,
    },

    #[error("Compute backend error: {0}")]
    ComputeError(String),
}

fn layer_suffix(layer: &Option<usize>) -> String {
    layer.map(|l| format!(" at layer {l}")).unwrap_or_default()
}

impl SolverError {
    pub(crate) fn instability(quantity: &'static str, layer: usize, value: Real) -> Self {
        SolverError::NumericalInstability {
            quantity,
            layer: Some(layer),
            value,
        }
    }

    /// The error with any [`SolverError::Column`] wrappers removed.
    pub fn root(&self) -> &SolverError {
        match self {
            SolverError::Column { source, .. } => source.root(),
            other => other,
        }
    }
}

/// The core trait that all radiative transfer methods must implement.
///
/// This abstraction allows the CLI to operate against any solver without
/// knowledge of the underlying numerical method.
pub trait RadiativeTransferSolver {
    /// Compute the radiation field for a batch of columns at one wavelength.
    ///
    /// # Arguments
    /// * `solar_zenith_angles` - One solar zenith angle per column (radians).
    /// * `vertical` - Vertical grid, one grid column per atmospheric column,
    ///   edges ordered bottom to top.
    /// * `wavelength` - Grid holding exactly one wavelength band.
    /// * `state` - Accumulated radiator state on `vertical`.
    /// * `params` - Surface reflectivity and solar flux.
    fn solve(
        &self,
        solar_zenith_angles: &[Real],
        vertical: &Grid,
        wavelength: &Grid,
        state: &RadiatorState,
        params: &SolverParams,
    ) -> Result<RadiationField, SolverError>;

    /// Human-readable name of the solver method.
    fn method_name(&self) -> &str;
}
