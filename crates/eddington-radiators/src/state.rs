//! The radiator state container.
//!
//! A [`RadiatorState`] holds the three optical properties the two-stream
//! solver needs, each shaped $(n_{\text{layers}}, n_{\text{columns}})$ with
//! layers ordered bottom to top like the vertical grid.
//!
//! Several constituents are combined into one state with
//! [`RadiatorState::accumulate`]:
//!
//! $$
//! \tau = \sum_i \tau_i, \qquad
//! \omega = \frac{\sum_i \omega_i \tau_i}{\tau}, \qquad
//! g = \frac{\sum_i g_i \omega_i \tau_i}{\sum_i \omega_i \tau_i}
//! $$

use eddington_grid::Real;
use ndarray::{Array2, Zip};

use crate::radiator::RadiatorError;

/// Slack allowed on the physical ranges to absorb round-off.
const RANGE_TOLERANCE: Real = 64.0 * Real::EPSILON;

/// Optical properties of every layer of every column at one wavelength.
#[derive(Debug, Clone, PartialEq)]
pub struct RadiatorState {
    /// Layer optical depth $\tau \geq 0$.
    pub optical_depth: Array2<Real>,
    /// Single-scattering albedo $\omega \in [0, 1]$.
    pub single_scattering_albedo: Array2<Real>,
    /// Asymmetry parameter $g \in [-1, 1]$.
    pub asymmetry_parameter: Array2<Real>,
}

impl RadiatorState {
    /// A transparent state (all properties zero).
    pub fn zeros(layers: usize, columns: usize) -> Self {
        Self {
            optical_depth: Array2::zeros((layers, columns)),
            single_scattering_albedo: Array2::zeros((layers, columns)),
            asymmetry_parameter: Array2::zeros((layers, columns)),
        }
    }

    /// Create a state, checking that the three arrays share one shape.
    pub fn new(
        optical_depth: Array2<Real>,
        single_scattering_albedo: Array2<Real>,
        asymmetry_parameter: Array2<Real>,
    ) -> Result<Self, RadiatorError> {
        let expected = optical_depth.dim();
        for (what, array) in [
            ("single scattering albedo", &single_scattering_albedo),
            ("asymmetry parameter", &asymmetry_parameter),
        ] {
            if array.dim() != expected {
                return Err(RadiatorError::ShapeMismatch {
                    what: what.to_string(),
                    expected,
                    found: array.dim(),
                });
            }
        }
        Ok(Self {
            optical_depth,
            single_scattering_albedo,
            asymmetry_parameter,
        })
    }

    /// A state with the same properties in every layer and column.
    pub fn uniform(
        layers: usize,
        columns: usize,
        optical_depth: Real,
        single_scattering_albedo: Real,
        asymmetry_parameter: Real,
    ) -> Self {
        Self {
            optical_depth: Array2::from_elem((layers, columns), optical_depth),
            single_scattering_albedo: Array2::from_elem((layers, columns), single_scattering_albedo),
            asymmetry_parameter: Array2::from_elem((layers, columns), asymmetry_parameter),
        }
    }

    /// Check shapes and physical ranges of every element.
    pub fn validate(&self) -> Result<(), RadiatorError> {
        let expected = self.optical_depth.dim();
        for (what, array) in [
            ("single scattering albedo", &self.single_scattering_albedo),
            ("asymmetry parameter", &self.asymmetry_parameter),
        ] {
            if array.dim() != expected {
                return Err(RadiatorError::ShapeMismatch {
                    what: what.to_string(),
                    expected,
                    found: array.dim(),
                });
            }
        }

        let checks: [(&'static str, &Array2<Real>, Real, Real); 3] = [
            ("optical depth", &self.optical_depth, 0.0, Real::INFINITY),
            ("single scattering albedo", &self.single_scattering_albedo, 0.0, 1.0),
            ("asymmetry parameter", &self.asymmetry_parameter, -1.0, 1.0),
        ];
        for (quantity, array, min, max) in checks {
            for ((layer, column), &value) in array.indexed_iter() {
                if !value.is_finite()
                    || value < min - RANGE_TOLERANCE
                    || value > max + RANGE_TOLERANCE
                {
                    return Err(RadiatorError::InvalidProperty {
                        quantity,
                        layer,
                        column,
                        value,
                    });
                }
            }
        }
        Ok(())
    }

    /// Combine the states of several radiators into one.
    ///
    /// Optical depths add; the albedo is the extinction-weighted mean and the
    /// asymmetry parameter the scattering-weighted mean. Layers with no
    /// extinction (or no scattering) get a zero albedo (or asymmetry).
    pub fn accumulate(states: &[RadiatorState]) -> Result<RadiatorState, RadiatorError> {
        let first = states.first().ok_or(RadiatorError::NoRadiators)?;
        let shape = first.optical_depth.dim();

        let mut optical_depth = Array2::<Real>::zeros(shape);
        let mut scattering_depth = Array2::<Real>::zeros(shape);
        let mut weighted_asymmetry = Array2::<Real>::zeros(shape);

        for (i, state) in states.iter().enumerate() {
            state.validate()?;
            if state.optical_depth.dim() != shape {
                return Err(RadiatorError::ShapeMismatch {
                    what: format!("radiator state {i}"),
                    expected: shape,
                    found: state.optical_depth.dim(),
                });
            }
            Zip::from(&mut optical_depth)
                .and(&mut scattering_depth)
                .and(&mut weighted_asymmetry)
                .and(&state.optical_depth)
                .and(&state.single_scattering_albedo)
                .and(&state.asymmetry_parameter)
                .for_each(|tau, scat, asym, &tau_i, &omega_i, &g_i| {
                    *tau += tau_i;
                    *scat += omega_i * tau_i;
                    *asym += g_i * omega_i * tau_i;
                });
        }

        let mut single_scattering_albedo = Array2::<Real>::zeros(shape);
        let mut asymmetry_parameter = Array2::<Real>::zeros(shape);
        Zip::from(&mut single_scattering_albedo)
            .and(&mut asymmetry_parameter)
            .and(&optical_depth)
            .and(&scattering_depth)
            .and(&weighted_asymmetry)
            .for_each(|omega, g, &tau, &scat, &asym| {
                *omega = if tau > 0.0 { (scat / tau).min(1.0) } else { 0.0 };
                *g = if scat > 0.0 { (asym / scat).clamp(-1.0, 1.0) } else { 0.0 };
            });

        Ok(RadiatorState {
            optical_depth,
            single_scattering_albedo,
            asymmetry_parameter,
        })
    }
}
