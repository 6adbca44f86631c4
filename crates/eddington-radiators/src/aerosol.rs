//! Parameterised aerosol extinction.
//!
//! The column aerosol optical depth follows the Ångström power law
//!
//! $$
//! \tau(\lambda) = \tau_{\text{ref}} \left(\frac{\lambda}{\lambda_{\text{ref}}}\right)^{-\alpha}
//! $$
//!
//! and is distributed over the layers of each column in proportion to an
//! exponentially decaying number density with scale height $H$:
//!
//! $$
//! w_i = \frac{e^{-z_i/H} - e^{-z_{i+1}/H}}{e^{-z_0/H} - e^{-z_N/H}}
//! $$
//!
//! The single-scattering albedo and asymmetry parameter are the same in every
//! layer.

use eddington_grid::{Grid, Real};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::radiator::{Radiator, RadiatorError};
use crate::state::RadiatorState;

/// Parameters of a homogeneous aerosol population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AerosolParameters {
    /// Column optical depth at the reference wavelength.
    pub optical_depth: Real,
    /// Reference wavelength (nm).
    #[serde(default = "default_reference_wavelength")]
    pub reference_wavelength_nm: Real,
    /// Ångström exponent $\alpha$.
    #[serde(default = "default_angstrom_exponent")]
    pub angstrom_exponent: Real,
    pub single_scattering_albedo: Real,
    pub asymmetry_parameter: Real,
    /// Scale height of the number density (km).
    #[serde(default = "default_scale_height")]
    pub scale_height_km: Real,
}

fn default_reference_wavelength() -> Real {
    550.0
}

fn default_angstrom_exponent() -> Real {
    1.3
}

fn default_scale_height() -> Real {
    2.0
}

/// An aerosol layer described by [`AerosolParameters`].
#[derive(Debug, Clone)]
pub struct AerosolRadiator {
    params: AerosolParameters,
}

impl AerosolRadiator {
    /// Create an aerosol radiator, validating its parameters.
    pub fn new(params: AerosolParameters) -> Result<Self, RadiatorError> {
        let checks: [(&'static str, Real, bool); 6] = [
            ("optical_depth", params.optical_depth, params.optical_depth >= 0.0),
            (
                "reference_wavelength_nm",
                params.reference_wavelength_nm,
                params.reference_wavelength_nm > 0.0,
            ),
            (
                "angstrom_exponent",
                params.angstrom_exponent,
                params.angstrom_exponent.is_finite(),
            ),
            (
                "single_scattering_albedo",
                params.single_scattering_albedo,
                (0.0..=1.0).contains(&params.single_scattering_albedo),
            ),
            (
                "asymmetry_parameter",
                params.asymmetry_parameter,
                (-1.0..=1.0).contains(&params.asymmetry_parameter),
            ),
            ("scale_height_km", params.scale_height_km, params.scale_height_km > 0.0),
        ];
        for (name, value, ok) in checks {
            if !ok || !value.is_finite() {
                return Err(RadiatorError::InvalidParameter { name, value });
            }
        }
        Ok(Self { params })
    }

    /// Column optical depth at `wavelength_nm`.
    pub fn column_optical_depth(&self, wavelength_nm: Real) -> Real {
        let p = &self.params;
        p.optical_depth * (wavelength_nm / p.reference_wavelength_nm).powf(-p.angstrom_exponent)
    }

    /// Fraction of the column optical depth in each layer of each column.
    fn layer_weights(&self, vertical: &Grid) -> Array2<Real> {
        let h = self.params.scale_height_km;
        let edges = vertical.edges();
        let layers = vertical.number_of_sections();
        let mut weights = Array2::<Real>::zeros((layers, vertical.number_of_columns()));

        for (column, mut out) in weights.columns_mut().into_iter().enumerate() {
            // Heights relative to the lowest edge keep the exponentials in range.
            let base = edges[[0, column]];
            let decay = |i: usize| (-(edges[[i, column]] - base) / h).exp();
            let total = decay(0) - decay(layers);
            if total <= 0.0 {
                continue;
            }
            for layer in 0..layers {
                out[layer] = (decay(layer) - decay(layer + 1)) / total;
            }
        }
        weights
    }
}

impl Radiator for AerosolRadiator {
    fn name(&self) -> &str {
        "aerosol"
    }

    fn optical_properties(
        &self,
        vertical: &Grid,
        wavelength_nm: Real,
    ) -> Result<RadiatorState, RadiatorError> {
        if !(wavelength_nm > 0.0) {
            return Err(RadiatorError::InvalidParameter {
                name: "wavelength_nm",
                value: wavelength_nm,
            });
        }
        let tau = self.column_optical_depth(wavelength_nm);
        let weights = self.layer_weights(vertical);
        let shape = weights.dim();

        RadiatorState::new(
            weights.mapv(|w| w * tau),
            Array2::from_elem(shape, self.params.single_scattering_albedo),
            Array2::from_elem(shape, self.params.asymmetry_parameter),
        )
    }
}
