//! Gas absorption from a tabulated cross-section.
//!
//! The layer optical depth of an absorbing gas is
//!
//! $$
//! \tau_i(\lambda) = \sigma(\lambda)\, N_i
//! $$
//!
//! where $N_i$ is the layer column density (molecule cm⁻²) from a
//! [`Profile`] and $\sigma$ (cm² molecule⁻¹) is interpolated from a table.
//! Absorbers do not scatter: $\omega = 0$, $g = 0$.

use eddington_grid::{Grid, Profile, Real};
use ndarray::Array2;

use crate::radiator::{Radiator, RadiatorError};
use crate::spline::CubicSpline;
use crate::state::RadiatorState;

/// Representative room-temperature O₃ absorption cross-sections in the
/// Hartley and Huggins bands: (wavelength nm, σ cm²).
const OZONE_CROSS_SECTIONS: [(Real, Real); 16] = [
    (200.0, 3.2e-19),
    (210.0, 5.2e-19),
    (220.0, 1.8e-18),
    (230.0, 5.0e-18),
    (240.0, 9.1e-18),
    (250.0, 1.07e-17),
    (255.0, 1.14e-17),
    (260.0, 1.09e-17),
    (270.0, 8.0e-18),
    (280.0, 3.9e-18),
    (290.0, 1.5e-18),
    (300.0, 3.9e-19),
    (310.0, 1.1e-19),
    (320.0, 3.2e-20),
    (330.0, 1.0e-20),
    (350.0, 6.0e-22),
];

/// An absorbing gas with a tabulated cross-section.
pub struct AbsorberRadiator {
    name: String,
    gas: Profile,
    /// Natural spline through $\ln \sigma(\lambda)$.
    log_cross_section: CubicSpline,
}

impl AbsorberRadiator {
    /// Create an absorber from a gas density profile and a cross-section
    /// table.
    ///
    /// # Arguments
    /// * `name` - Radiator name, e.g. `"O3"`.
    /// * `gas` - Number density profile of the gas (molecule cm⁻³).
    /// * `wavelengths_nm` - Strictly increasing table wavelengths.
    /// * `cross_sections` - Cross-sections (cm²), all strictly positive.
    pub fn new(
        name: impl Into<String>,
        gas: Profile,
        wavelengths_nm: Vec<Real>,
        cross_sections: &[Real],
    ) -> Result<Self, RadiatorError> {
        if let Some(&bad) = cross_sections.iter().find(|&&s| !(s > 0.0)) {
            return Err(RadiatorError::InvalidParameter {
                name: "cross_section",
                value: bad,
            });
        }
        let name = name.into();
        let log_sigma = cross_sections.iter().map(|s| s.ln()).collect();
        let log_cross_section = CubicSpline::new(wavelengths_nm, log_sigma)?;
        let (min, max) = log_cross_section.range();
        log::debug!(
            "{}: {} cross-section points over [{}, {}] nm",
            name,
            cross_sections.len(),
            min,
            max
        );
        Ok(Self {
            name,
            gas,
            log_cross_section,
        })
    }

    /// Ozone absorption in the Hartley and Huggins bands (200-350 nm).
    pub fn ozone(gas: Profile) -> Result<Self, RadiatorError> {
        let (wavelengths, sigmas): (Vec<Real>, Vec<Real>) =
            OZONE_CROSS_SECTIONS.iter().copied().unzip();
        Self::new("O3", gas, wavelengths, &sigmas)
    }

    /// Interpolated cross-section (cm²) at `wavelength_nm`.
    pub fn cross_section(&self, wavelength_nm: Real) -> Result<Real, RadiatorError> {
        self.check_wavelength(wavelength_nm)?;
        Ok(self.log_cross_section.evaluate(wavelength_nm).exp())
    }
}

impl Radiator for AbsorberRadiator {
    fn name(&self) -> &str {
        &self.name
    }

    fn wavelength_range(&self) -> Option<(Real, Real)> {
        Some(self.log_cross_section.range())
    }

    fn optical_properties(
        &self,
        vertical: &Grid,
        wavelength_nm: Real,
    ) -> Result<RadiatorState, RadiatorError> {
        let sigma = self.cross_section(wavelength_nm)?;
        let densities = self.gas.layer_densities();
        let expected = (vertical.number_of_sections(), vertical.number_of_columns());
        if densities.dim() != expected {
            return Err(RadiatorError::ShapeMismatch {
                what: format!("profile '{}'", self.gas.name),
                expected,
                found: densities.dim(),
            });
        }

        RadiatorState::new(
            densities.mapv(|n| sigma * n),
            Array2::zeros(expected),
            Array2::zeros(expected),
        )
    }
}
