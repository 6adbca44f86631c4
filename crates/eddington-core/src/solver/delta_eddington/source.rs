//! Particular-solution source terms of the direct solar beam.
//!
//! For a layer whose top lies at cumulative scaled optical depth
//! $\tau_{\text{top}}$, the direct beam drives the diffuse streams with
//! (Toon et al. 1989, eqs. 23-24, with $\pi F_s = F_0$):
//!
//! $$
//! C^{+}(\tau) = \omega' F_0 e^{-\tau/\mu_0}
//!   \frac{(\gamma_1 - 1/\mu_0)\gamma_3 + \gamma_4\gamma_2}{\lambda^2 - 1/\mu_0^2},
//! \qquad
//! C^{-}(\tau) = \omega' F_0 e^{-\tau/\mu_0}
//!   \frac{(\gamma_1 + 1/\mu_0)\gamma_4 + \gamma_2\gamma_3}{\lambda^2 - 1/\mu_0^2}
//! $$
//!
//! for the upwelling ($C^+$) and downwelling ($C^-$) streams, evaluated at
//! the top and at the bottom of every layer.

use super::RESONANCE_TOLERANCE;
use super::parameters::DeltaEddingtonParameters;
use crate::solver::SolverError;
use crate::types::Real;

/// Source terms of one column, one entry per layer (top first).
#[derive(Debug, Clone, PartialEq)]
pub struct SourceTerms {
    /// $C^+$ at the top of each layer.
    pub upwelling_top: Vec<Real>,
    /// $C^+$ at the bottom of each layer.
    pub upwelling_bottom: Vec<Real>,
    /// $C^-$ at the top of each layer.
    pub downwelling_top: Vec<Real>,
    /// $C^-$ at the bottom of each layer.
    pub downwelling_bottom: Vec<Real>,
    /// Cumulative scaled optical depth at each layer boundary (layers + 1
    /// entries, 0 at the top of the atmosphere).
    pub cumulative_optical_depth: Vec<Real>,
    /// Reflected direct beam at the surface,
    /// $S_{\text{sfc}} = R_{\text{sfc}} \mu_0 F_0 e^{-\tau_{\text{total}}/\mu_0}$.
    pub surface_source: Real,
}

impl SourceTerms {
    /// Compute the source terms of one column.
    ///
    /// # Arguments
    /// * `params` - Derived delta-Eddington parameters of the column.
    /// * `solar_flux` - Top-of-atmosphere solar flux $F_0$.
    /// * `surface_reflectivity` - Lambertian reflectivity $R_{\text{sfc}}$.
    ///
    /// # Errors
    /// [`SolverError::NumericalInstability`] if $\lambda$ is resonant with
    /// $1/\mu_0$ in a layer with a non-zero source.
    pub fn compute(
        params: &DeltaEddingtonParameters,
        solar_flux: Real,
        surface_reflectivity: Real,
    ) -> Result<Self, SolverError> {
        let layers = params.number_of_layers();
        let mu0 = params.mu0;
        let inv_mu0 = 1.0 / mu0;

        let mut cumulative_optical_depth = Vec::with_capacity(layers + 1);
        cumulative_optical_depth.push(0.0);
        let mut terms = Self {
            upwelling_top: Vec::with_capacity(layers),
            upwelling_bottom: Vec::with_capacity(layers),
            downwelling_top: Vec::with_capacity(layers),
            downwelling_bottom: Vec::with_capacity(layers),
            cumulative_optical_depth: Vec::new(),
            surface_source: 0.0,
        };

        let mut tau_top: Real = 0.0;
        for layer in 0..layers {
            let tau_bottom = tau_top + params.optical_depth[layer];
            let omega = params.single_scattering_albedo[layer];
            let top_amplitude = omega * solar_flux * (-tau_top * inv_mu0).exp();
            let bottom_amplitude = omega * solar_flux * (-tau_bottom * inv_mu0).exp();

            let (up_factor, down_factor) = if top_amplitude == 0.0 {
                // No source: skip the division entirely.
                (0.0, 0.0)
            } else {
                let (gamma1, gamma2, gamma3, gamma4) = (
                    params.gamma1[layer],
                    params.gamma2[layer],
                    params.gamma3[layer],
                    params.gamma4[layer],
                );
                let lambda = params.lambda[layer];
                let denom = lambda * lambda - inv_mu0 * inv_mu0;
                if denom.abs() <= RESONANCE_TOLERANCE * inv_mu0 * inv_mu0 {
                    return Err(SolverError::instability("source denominator", layer, denom));
                }
                (
                    ((gamma1 - inv_mu0) * gamma3 + gamma4 * gamma2) / denom,
                    ((gamma1 + inv_mu0) * gamma4 + gamma2 * gamma3) / denom,
                )
            };

            terms.upwelling_top.push(top_amplitude * up_factor);
            terms.upwelling_bottom.push(bottom_amplitude * up_factor);
            terms.downwelling_top.push(top_amplitude * down_factor);
            terms.downwelling_bottom.push(bottom_amplitude * down_factor);
            cumulative_optical_depth.push(tau_bottom);
            tau_top = tau_bottom;
        }

        terms.surface_source =
            surface_reflectivity * mu0 * solar_flux * (-tau_top * inv_mu0).exp();
        terms.cumulative_optical_depth = cumulative_optical_depth;
        Ok(terms)
    }

    /// Total scaled optical depth of the column.
    pub fn total_optical_depth(&self) -> Real {
        self.cumulative_optical_depth.last().copied().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TEST_TOL;
    use crate::types::OpticalProperties;
    use approx::assert_relative_eq;

    fn derive(tau: Real, omega: Real, g: Real, layers: usize, mu0: Real) -> DeltaEddingtonParameters {
        let properties = OpticalProperties::uniform(layers, tau, omega, g);
        DeltaEddingtonParameters::derive(&properties, mu0).unwrap()
    }

    #[test]
    fn test_pure_absorber_has_no_source() {
        let params = derive(0.4, 0.0, 0.0, 3, 0.6);
        let terms = SourceTerms::compute(&params, 1.0, 0.2).unwrap();
        assert!(terms.upwelling_top.iter().all(|&c| c == 0.0));
        assert!(terms.downwelling_bottom.iter().all(|&c| c == 0.0));
        assert_relative_eq!(terms.total_optical_depth(), 1.2, max_relative = TEST_TOL);
        assert_relative_eq!(
            terms.surface_source,
            0.2 * 0.6 * (-1.2 / 0.6 as Real).exp(),
            max_relative = TEST_TOL
        );
    }

    #[test]
    fn test_bottom_terms_decay_with_beam() {
        let params = derive(0.3, 0.8, 0.5, 2, 0.5);
        let terms = SourceTerms::compute(&params, 2.0, 0.0).unwrap();
        let attenuation = (-params.optical_depth[0] / 0.5).exp();
        assert_relative_eq!(
            terms.upwelling_bottom[0],
            terms.upwelling_top[0] * attenuation,
            max_relative = TEST_TOL
        );
        // The bottom of one layer is the top of the next.
        assert_relative_eq!(
            terms.downwelling_bottom[0],
            terms.downwelling_top[1],
            max_relative = TEST_TOL
        );
        assert_eq!(terms.surface_source, 0.0);
    }

    #[test]
    fn test_cumulative_depth_is_prefix_sum() {
        let properties = OpticalProperties::new(
            vec![0.1, 0.2, 0.3],
            vec![0.5, 0.5, 0.5],
            vec![0.0, 0.0, 0.0],
        )
        .unwrap();
        let params = DeltaEddingtonParameters::derive(&properties, 1.0).unwrap();
        let terms = SourceTerms::compute(&params, 1.0, 0.0).unwrap();
        let expected: [Real; 4] = [0.0, 0.1, 0.3, 0.6];
        for (found, want) in terms.cumulative_optical_depth.iter().zip(expected) {
            assert_relative_eq!(*found, want, max_relative = TEST_TOL);
        }
    }

    #[test]
    fn test_resonance_is_reported() {
        // omega' = 0.5, g' = 0: lambda^2 = 1.5, resonant at mu0 = sqrt(2/3).
        let params = derive(0.2, 0.5, 0.0, 1, (2.0 as Real / 3.0).sqrt());
        match SourceTerms::compute(&params, 1.0, 0.0) {
            Err(SolverError::NumericalInstability { layer, .. }) => assert_eq!(layer, Some(0)),
            other => panic!("expected resonance, got {other:?}"),
        }
    }
}
