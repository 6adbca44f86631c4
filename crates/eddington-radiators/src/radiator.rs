//! Radiator trait.
//!
//! All sources of extinction implement [`Radiator`], which returns the
//! optical properties of every layer of every column at one wavelength.

use eddington_grid::{Grid, GridError, Real};
use thiserror::Error;

use crate::state::RadiatorState;

/// Errors from radiators and radiator states.
#[derive(Debug, Error)]
pub enum RadiatorError {
    #[error("Radiator '{radiator}': wavelength {wavelength_nm} nm is outside the data range [{min}, {max}] nm")]
    OutOfRange {
        radiator: String,
        wavelength_nm: Real,
        min: Real,
        max: Real,
    },

    #[error("{what} has shape {found:?}, expected {expected:?}")]
    ShapeMismatch {
        what: String,
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("{quantity} = {value} at layer {layer}, column {column} is outside its physical range")]
    InvalidProperty {
        quantity: &'static str,
        layer: usize,
        column: usize,
        value: Real,
    },

    #[error("Invalid radiator parameter {name} = {value}")]
    InvalidParameter { name: &'static str, value: Real },

    #[error("Data error: {0}")]
    DataError(String),

    #[error("No radiator states to accumulate")]
    NoRadiators,

    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Provides the optical properties of one constituent of the atmosphere.
///
/// Implementations include molecular (Rayleigh) scattering, tabulated gas
/// absorption and parameterised aerosols.
pub trait Radiator: Send + Sync {
    /// Human-readable name of this radiator.
    fn name(&self) -> &str;

    /// Wavelength range over which the radiator is defined (nm), if limited.
    fn wavelength_range(&self) -> Option<(Real, Real)> {
        None
    }

    /// Optical properties on `vertical` at `wavelength_nm`.
    ///
    /// The returned state has shape $(n_{\text{layers}}, n_{\text{columns}})$
    /// of the vertical grid, layers ordered bottom to top.
    fn optical_properties(
        &self,
        vertical: &Grid,
        wavelength_nm: Real,
    ) -> Result<RadiatorState, RadiatorError>;

    /// Check that `wavelength_nm` lies within [`Self::wavelength_range`].
    fn check_wavelength(&self, wavelength_nm: Real) -> Result<(), RadiatorError> {
        if let Some((min, max)) = self.wavelength_range() {
            if !(min..=max).contains(&wavelength_nm) {
                return Err(RadiatorError::OutOfRange {
                    radiator: self.name().to_string(),
                    wavelength_nm,
                    min,
                    max,
                });
            }
        }
        Ok(())
    }
}
