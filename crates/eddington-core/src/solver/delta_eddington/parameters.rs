//! Delta scaling and the delta-Eddington coefficients.
//!
//! The strong forward peak of the phase function is removed with the delta
//! approximation of Joseph, Wiscombe & Weinman (1976), using $f = g^2$:
//!
//! $$
//! \omega' = \frac{(1 - f)\,\omega}{1 - \omega f}, \qquad
//! g' = \frac{g}{1 + g}, \qquad
//! \tau' = (1 - \omega f)\,\tau
//! $$
//!
//! and the two-stream coefficients follow Toon et al. (1989), Table 1:
//!
//! $$
//! \gamma_1 = \frac{7 - \omega'(4 + 3g')}{4}, \quad
//! \gamma_2 = -\frac{1 - \omega'(4 - 3g')}{4}, \quad
//! \gamma_3 = \frac{2 - 3g'\mu_0}{4}, \quad
//! \gamma_4 = 1 - \gamma_3
//! $$
//!
//! $$
//! \lambda = \sqrt{\gamma_1^2 - \gamma_2^2}, \qquad
//! \Gamma = \frac{\gamma_2}{\gamma_1 + \lambda}
//! $$

use super::{ALBEDO_MARGIN, PROPERTY_TOLERANCE};
use crate::solver::SolverError;
use crate::types::{OpticalProperties, Real};

/// Delta-scaled properties and two-stream coefficients of one column.
///
/// Every vector has one entry per layer, top of the atmosphere first.
#[derive(Debug, Clone, PartialEq)]
pub struct DeltaEddingtonParameters {
    /// Cosine of the solar zenith angle.
    pub mu0: Real,
    /// Scaled optical depth $\tau'$.
    pub optical_depth: Vec<Real>,
    /// Scaled single-scattering albedo $\omega'$, capped below 1.
    pub single_scattering_albedo: Vec<Real>,
    /// Scaled asymmetry parameter $g'$.
    pub asymmetry_parameter: Vec<Real>,
    pub gamma1: Vec<Real>,
    pub gamma2: Vec<Real>,
    pub gamma3: Vec<Real>,
    pub gamma4: Vec<Real>,
    /// Eigenvalue $\lambda$.
    pub lambda: Vec<Real>,
    /// Coupling ratio $\Gamma$.
    pub coupling: Vec<Real>,
}

impl DeltaEddingtonParameters {
    /// Derive the scaled properties and coefficients for one column.
    ///
    /// # Arguments
    /// * `properties` - Unscaled layer properties, top first. Not modified.
    /// * `mu0` - Cosine of the solar zenith angle, strictly positive.
    ///
    /// # Errors
    /// [`SolverError::NumericalInstability`] if an input or scaled property
    /// is outside its physical range or a coefficient is not finite.
    pub fn derive(properties: &OpticalProperties, mu0: Real) -> Result<Self, SolverError> {
        if !(mu0 > 0.0) || mu0 > 1.0 + PROPERTY_TOLERANCE {
            return Err(SolverError::NumericalInstability {
                quantity: "mu0",
                layer: None,
                value: mu0,
            });
        }

        let layers = properties.number_of_layers();
        let mut params = Self::with_capacity(mu0, layers);

        for layer in 0..layers {
            let tau = properties.optical_depth[layer];
            let omega = properties.single_scattering_albedo[layer];
            let g = properties.asymmetry_parameter[layer];
            check_range("optical depth", layer, tau, 0.0, Real::INFINITY)?;
            check_range("single scattering albedo", layer, omega, 0.0, 1.0)?;
            check_range("asymmetry parameter", layer, g, -1.0, 1.0)?;

            // All three updates use the unscaled values.
            let f = g * g;
            let remaining = 1.0 - omega * f;
            let (tau_s, omega_s) = if remaining > 0.0 {
                (remaining * tau, omega * (1.0 - f) / remaining)
            } else {
                // Pure forward scattering: the whole layer moves into the
                // direct beam.
                (0.0, 0.0)
            };
            let g_s = g / (1.0 + g);
            check_range("scaled optical depth", layer, tau_s, 0.0, Real::INFINITY)?;
            check_range("scaled single scattering albedo", layer, omega_s, 0.0, 1.0)?;
            check_range("scaled asymmetry parameter", layer, g_s, -1.0, 1.0)?;

            let omega_s = omega_s.min(1.0 - ALBEDO_MARGIN);

            let gamma1 = (7.0 - omega_s * (4.0 + 3.0 * g_s)) / 4.0;
            let gamma2 = -(1.0 - omega_s * (4.0 - 3.0 * g_s)) / 4.0;
            let gamma3 = (2.0 - 3.0 * g_s * mu0) / 4.0;
            let gamma4 = 1.0 - gamma3;
            // gamma1^2 - gamma2^2 factored to avoid cancellation near omega' = 1.
            let lambda = ((gamma1 - gamma2) * (gamma1 + gamma2)).sqrt();
            let coupling = gamma2 / (gamma1 + lambda);
            if !lambda.is_finite() {
                return Err(SolverError::instability("lambda", layer, lambda));
            }
            if !coupling.is_finite() {
                return Err(SolverError::instability("Gamma", layer, coupling));
            }

            params.optical_depth.push(tau_s);
            params.single_scattering_albedo.push(omega_s);
            params.asymmetry_parameter.push(g_s);
            params.gamma1.push(gamma1);
            params.gamma2.push(gamma2);
            params.gamma3.push(gamma3);
            params.gamma4.push(gamma4);
            params.lambda.push(lambda);
            params.coupling.push(coupling);
        }

        Ok(params)
    }

    fn with_capacity(mu0: Real, layers: usize) -> Self {
        Self {
            mu0,
            optical_depth: Vec::with_capacity(layers),
            single_scattering_albedo: Vec::with_capacity(layers),
            asymmetry_parameter: Vec::with_capacity(layers),
            gamma1: Vec::with_capacity(layers),
            gamma2: Vec::with_capacity(layers),
            gamma3: Vec::with_capacity(layers),
            gamma4: Vec::with_capacity(layers),
            lambda: Vec::with_capacity(layers),
            coupling: Vec::with_capacity(layers),
        }
    }

    pub fn number_of_layers(&self) -> usize {
        self.optical_depth.len()
    }
}

/// Reject non-finite values and values outside `[min, max]` by more than
/// round-off. Values are never clamped.
fn check_range(
    quantity: &'static str,
    layer: usize,
    value: Real,
    min: Real,
    max: Real,
) -> Result<(), SolverError> {
    if value.is_finite() && value >= min - PROPERTY_TOLERANCE && value <= max + PROPERTY_TOLERANCE
    {
        Ok(())
    } else {
        Err(SolverError::instability(quantity, layer, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TEST_TOL;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_delta_scaling_uses_unscaled_values() {
        let properties = OpticalProperties::uniform(1, 0.5, 0.9, 0.8);
        let params = DeltaEddingtonParameters::derive(&properties, 1.0).unwrap();

        // f = 0.64, 1 - omega f = 0.424
        assert_relative_eq!(params.optical_depth[0], 0.5 * 0.424, max_relative = TEST_TOL);
        assert_relative_eq!(
            params.single_scattering_albedo[0],
            0.9 * 0.36 / 0.424,
            max_relative = TEST_TOL
        );
        assert_relative_eq!(params.asymmetry_parameter[0], 0.8 / 1.8, max_relative = TEST_TOL);
    }

    #[test]
    fn test_coefficients_for_isotropic_absorber() {
        // omega = 0: gamma1 = 7/4, gamma2 = -1/4, lambda^2 = 3
        let properties = OpticalProperties::uniform(2, 1.0, 0.0, 0.0);
        let params = DeltaEddingtonParameters::derive(&properties, 0.5).unwrap();
        assert_relative_eq!(params.gamma1[1], 1.75);
        assert_relative_eq!(params.gamma2[1], -0.25);
        assert_relative_eq!(params.gamma3[1], 0.5);
        assert_relative_eq!(params.gamma4[1], 0.5);
        assert_relative_eq!(params.lambda[1], (3.0 as Real).sqrt(), max_relative = TEST_TOL);
        assert_relative_eq!(
            params.coupling[1],
            -0.25 / (1.75 + (3.0 as Real).sqrt()),
            max_relative = TEST_TOL
        );
    }

    #[test]
    fn test_lambda_and_coupling_are_distinct() {
        let properties = OpticalProperties::uniform(3, 0.3, 0.7, 0.2);
        let params = DeltaEddingtonParameters::derive(&properties, 0.8).unwrap();
        assert_ne!(params.lambda, params.coupling);
        assert!(params.lambda.iter().all(|&l| l > 0.0));
    }

    #[test]
    fn test_conservative_albedo_is_capped_below_one() {
        let properties = OpticalProperties::uniform(1, 1.0, 1.0, 0.0);
        let params = DeltaEddingtonParameters::derive(&properties, 1.0).unwrap();
        assert!(params.single_scattering_albedo[0] < 1.0);
        assert!(params.lambda[0] > 0.0);
    }

    #[test]
    fn test_input_is_not_modified() {
        let properties = OpticalProperties::uniform(2, 0.5, 0.9, 0.8);
        let copy = properties.clone();
        let _ = DeltaEddingtonParameters::derive(&properties, 0.7).unwrap();
        assert_eq!(properties, copy);
    }

    #[test]
    fn test_out_of_range_inputs_are_flagged() {
        let cases = [
            OpticalProperties::uniform(1, -0.1, 0.5, 0.0),
            OpticalProperties::uniform(1, 0.1, 1.2, 0.0),
            OpticalProperties::uniform(1, 0.1, 0.5, 1.5),
            OpticalProperties::uniform(1, Real::NAN, 0.5, 0.0),
            // g = -1 makes g' undefined.
            OpticalProperties::uniform(1, 0.1, 0.5, -1.0),
        ];
        for properties in cases {
            match DeltaEddingtonParameters::derive(&properties, 1.0) {
                Err(SolverError::NumericalInstability { layer, .. }) => {
                    assert_eq!(layer, Some(0))
                }
                other => panic!("expected instability for {properties:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_strong_backscatter_is_flagged_after_scaling() {
        // g = -0.7 is valid but g' = g / (1 + g) = -2.33.
        let properties = OpticalProperties::new(vec![0.2, 0.2], vec![0.5, 0.5], vec![0.3, -0.7]).unwrap();
        match DeltaEddingtonParameters::derive(&properties, 0.8) {
            Err(SolverError::NumericalInstability { quantity, layer, value }) => {
                assert_eq!(quantity, "scaled asymmetry parameter");
                assert_eq!(layer, Some(1));
                assert_relative_eq!(value, -0.7 / 0.3, max_relative = TEST_TOL);
            }
            other => panic!("expected instability, got {other:?}"),
        }
    }

    #[test]
    fn test_non_positive_mu0_is_rejected() {
        let properties = OpticalProperties::uniform(1, 0.1, 0.5, 0.0);
        assert!(DeltaEddingtonParameters::derive(&properties, 0.0).is_err());
    }

    proptest! {
        #[test]
        fn prop_scaled_properties_stay_in_range(
            tau in 0.0f64..50.0,
            omega in 0.0f64..=1.0,
            g in -0.5f64..=1.0,
            mu0 in 0.01f64..=1.0,
        ) {
            let properties = OpticalProperties::uniform(1, tau as Real, omega as Real, g as Real);
            let params = DeltaEddingtonParameters::derive(&properties, mu0 as Real).unwrap();
            prop_assert!(params.optical_depth[0] >= 0.0);
            prop_assert!(params.optical_depth[0] <= tau as Real + PROPERTY_TOLERANCE);
            prop_assert!((0.0..1.0).contains(&params.single_scattering_albedo[0]));
            prop_assert!((-1.0..=1.0).contains(&params.asymmetry_parameter[0]));
            prop_assert!(params.lambda[0] >= 0.0 && params.lambda[0].is_finite());
            prop_assert!(params.coupling[0].abs() < 1.0);
        }

        #[test]
        fn prop_invalid_albedo_is_flagged_not_clamped(
            omega in 1.001f64..10.0,
            g in -0.9f64..0.9,
        ) {
            let properties = OpticalProperties::uniform(1, 1.0, omega as Real, g as Real);
            let result = DeltaEddingtonParameters::derive(&properties, 1.0);
            let is_instability = matches!(result, Err(SolverError::NumericalInstability { .. }));
            prop_assert!(is_instability);
        }
    }
}
