//! Rayleigh scattering by air molecules.
//!
//! The scattering cross-section follows the fit of Nicolet (1984),
//! *Planet. Space Sci.* **32**, 1467:
//!
//! $$
//! \sigma(\lambda) = \frac{4.02 \times 10^{-28}}{\lambda^{4 + x}}\ \text{cm}^2,
//! \qquad
//! x = \begin{cases}
//!   0.389\lambda + 0.09426/\lambda - 0.3228 & \lambda < 0.55\ \mu\text{m} \\
//!   0.04 & \lambda \geq 0.55\ \mu\text{m}
//! \end{cases}
//! $$
//!
//! with $\lambda$ in micrometres. Rayleigh scattering is conservative
//! ($\omega = 1$) and symmetric ($g = 0$).

use eddington_grid::{Grid, Profile, Real};
use ndarray::Array2;

use crate::radiator::{Radiator, RadiatorError};
use crate::state::RadiatorState;

/// Molecular scattering by the air column described by a density profile.
pub struct RayleighRadiator {
    air: Profile,
}

impl RayleighRadiator {
    /// Create a Rayleigh radiator from an air number-density profile
    /// (molecule cm⁻³ at the vertical grid edges).
    pub fn new(air: Profile) -> Self {
        Self { air }
    }

    /// Nicolet (1984) Rayleigh cross-section (cm²) at `wavelength_nm`.
    pub fn cross_section(wavelength_nm: Real) -> Real {
        let wavelength_um = wavelength_nm * 1.0e-3;
        let x = if wavelength_um < 0.55 {
            0.389 * wavelength_um + 0.09426 / wavelength_um - 0.3228
        } else {
            0.04
        };
        4.02e-28 / wavelength_um.powf(4.0 + x)
    }
}

impl Radiator for RayleighRadiator {
    fn name(&self) -> &str {
        "Rayleigh"
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
        let densities = self.air.layer_densities();
        let expected = (vertical.number_of_sections(), vertical.number_of_columns());
        if densities.dim() != expected {
            return Err(RadiatorError::ShapeMismatch {
                what: format!("profile '{}'", self.air.name),
                expected,
                found: densities.dim(),
            });
        }

        let sigma = Self::cross_section(wavelength_nm);
        RadiatorState::new(
            densities.mapv(|n| sigma * n),
            Array2::ones(expected),
            Array2::zeros(expected),
        )
    }
}
