//! Core types shared across the Eddington framework.
//!
//! This module defines the data structures that cross the solver boundary:
//! per-column optical properties, named solver parameters, and the
//! reconstructed radiation field.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::solver::SolverError;

pub use eddington_grid::Real;

/// Optical properties of one column at one wavelength, layers ordered from
/// the top of the atmosphere (index 0) to the surface.
#[derive(Debug, Clone, PartialEq)]
pub struct OpticalProperties {
    /// Layer optical depth $\tau$.
    pub optical_depth: Vec<Real>,
    /// Single-scattering albedo $\omega$.
    pub single_scattering_albedo: Vec<Real>,
    /// Asymmetry parameter $g$.
    pub asymmetry_parameter: Vec<Real>,
}

impl OpticalProperties {
    /// Create a column, checking that all three arrays have one length.
    pub fn new(
        optical_depth: Vec<Real>,
        single_scattering_albedo: Vec<Real>,
        asymmetry_parameter: Vec<Real>,
    ) -> Result<Self, SolverError> {
        let layers = optical_depth.len();
        for (what, found) in [
            ("single scattering albedo", single_scattering_albedo.len()),
            ("asymmetry parameter", asymmetry_parameter.len()),
        ] {
            if found != layers {
                return Err(SolverError::DimensionMismatch {
                    what: what.to_string(),
                    expected: layers,
                    found,
                });
            }
        }
        Ok(Self {
            optical_depth,
            single_scattering_albedo,
            asymmetry_parameter,
        })
    }

    /// The same properties in `layers` layers.
    pub fn uniform(layers: usize, tau: Real, omega: Real, g: Real) -> Self {
        Self {
            optical_depth: vec![tau; layers],
            single_scattering_albedo: vec![omega; layers],
            asymmetry_parameter: vec![g; layers],
        }
    }

    pub fn number_of_layers(&self) -> usize {
        self.optical_depth.len()
    }
}

/// Named configuration values consumed by the solver.
///
/// Both values are optional so that a partially filled configuration can be
/// carried around; the solver raises [`SolverError::MissingParameter`] the
/// first time it needs a value that is absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolverParams {
    /// Lambertian surface reflectivity $R_{\text{sfc}} \in [0, 1]$.
    pub surface_reflectivity: Option<Real>,
    /// Top-of-atmosphere solar flux $F_0$ through a surface normal to the
    /// beam.
    pub solar_flux: Option<Real>,
}

impl SolverParams {
    pub fn new(surface_reflectivity: Real, solar_flux: Real) -> Self {
        Self {
            surface_reflectivity: Some(surface_reflectivity),
            solar_flux: Some(solar_flux),
        }
    }

    /// Surface reflectivity, validated to lie in $[0, 1]$.
    pub fn surface_reflectivity(&self) -> Result<Real, SolverError> {
        let value = self
            .surface_reflectivity
            .ok_or(SolverError::MissingParameter("surface_reflectivity"))?;
        if !(0.0..=1.0).contains(&value) {
            return Err(SolverError::InvalidParameter {
                name: "surface_reflectivity",
                value,
            });
        }
        Ok(value)
    }

    /// Solar flux, validated to be finite and non-negative.
    pub fn solar_flux(&self) -> Result<Real, SolverError> {
        let value = self
            .solar_flux
            .ok_or(SolverError::MissingParameter("solar_flux"))?;
        if !value.is_finite() || value < 0.0 {
            return Err(SolverError::InvalidParameter {
                name: "solar_flux",
                value,
            });
        }
        Ok(value)
    }
}

/// Direct, upwelling and downwelling components of one radiative quantity,
/// each shaped $(n_{\text{levels}}, n_{\text{columns}})$ with level 0 at the
/// top of the atmosphere.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FluxComponents {
    pub direct: Array2<Real>,
    pub upwelling: Array2<Real>,
    pub downwelling: Array2<Real>,
}

/// The radiation field at every layer boundary of every column, at one
/// wavelength.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadiationField {
    /// Spectral irradiance (flux through a horizontal surface).
    pub spectral_irradiance: FluxComponents,
    /// Actinic flux (flux incident on a sphere).
    pub actinic_flux: FluxComponents,
}

impl RadiationField {
    /// Number of layer boundaries (layers + 1).
    pub fn number_of_levels(&self) -> usize {
        self.spectral_irradiance.direct.nrows()
    }

    pub fn number_of_columns(&self) -> usize {
        self.spectral_irradiance.direct.ncols()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_parameters_are_named() {
        let params = SolverParams::default();
        assert!(matches!(
            params.surface_reflectivity(),
            Err(SolverError::MissingParameter("surface_reflectivity"))
        ));
        assert!(matches!(
            params.solar_flux(),
            Err(SolverError::MissingParameter("solar_flux"))
        ));
    }

    #[test]
    fn test_reflectivity_outside_unit_interval_is_invalid() {
        let params = SolverParams::new(1.5, 1.0);
        assert!(matches!(
            params.surface_reflectivity(),
            Err(SolverError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_params_deserialise_with_missing_fields() {
        let params: SolverParams = serde_json::from_str(r#"{"solar_flux": 2.0}"#).unwrap();
        assert_eq!(params.solar_flux().unwrap(), 2.0);
        assert!(params.surface_reflectivity.is_none());
    }

    #[test]
    fn test_optical_properties_length_mismatch() {
        let err = OpticalProperties::new(vec![0.1, 0.2], vec![0.5], vec![0.0, 0.0]).unwrap_err();
        assert!(matches!(
            err,
            SolverError::DimensionMismatch {
                expected: 2,
                found: 1,
                ..
            }
        ));
    }
}
