//! Radiation field reconstruction from the solved layer constants.
//!
//! Once the weights $Y_1$, $Y_2$ of every layer are known, the diffuse
//! fluxes at the top and bottom of layer $k$ are
//!
//! $$
//! F^{\uparrow}_{\text{top}} = Y_1 e_3 - Y_2 e_4 + C^+_{\text{top}}, \qquad
//! F^{\downarrow}_{\text{top}} = Y_1 e_1 - Y_2 e_2 + C^-_{\text{top}}
//! $$
//!
//! $$
//! F^{\uparrow}_{\text{bot}} = Y_1 e_1 + Y_2 e_2 + C^+_{\text{bot}}, \qquad
//! F^{\downarrow}_{\text{bot}} = Y_1 e_3 + Y_2 e_4 + C^-_{\text{bot}}
//! $$
//!
//! The direct beam follows Beer's law. Diffuse actinic flux is the diffuse
//! irradiance divided by the mean cosine $\bar\mu = 1/2$ of the Eddington
//! closure.

use ndarray::Array2;

use crate::solver::delta_eddington::assembly::EigenCoefficients;
use crate::solver::delta_eddington::source::SourceTerms;
use crate::solver::delta_eddington::MU_BAR;
use crate::solver::SolverError;
use crate::types::{FluxComponents, RadiationField, Real};

/// Number of values stored per level in a packed column row.
pub const COMPONENTS: usize = 6;

/// The radiation field of one column, one entry per level (top first).
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnField {
    pub direct_irradiance: Vec<Real>,
    pub upwelling_irradiance: Vec<Real>,
    pub downwelling_irradiance: Vec<Real>,
    pub direct_actinic_flux: Vec<Real>,
    pub upwelling_actinic_flux: Vec<Real>,
    pub downwelling_actinic_flux: Vec<Real>,
}

impl ColumnField {
    /// The field of a column with no illumination.
    pub fn zeros(levels: usize) -> Self {
        Self {
            direct_irradiance: vec![0.0; levels],
            upwelling_irradiance: vec![0.0; levels],
            downwelling_irradiance: vec![0.0; levels],
            direct_actinic_flux: vec![0.0; levels],
            upwelling_actinic_flux: vec![0.0; levels],
            downwelling_actinic_flux: vec![0.0; levels],
        }
    }

    /// Reconstruct the field of one column.
    ///
    /// # Arguments
    /// * `coefficients` - Eigen-coefficients of every layer.
    /// * `sources` - Source terms and cumulative optical depth.
    /// * `solution` - Solved unknowns $(Y_{1,0}, Y_{2,0}, Y_{1,1}, \dots)$.
    /// * `mu0` - Cosine of the solar zenith angle.
    /// * `solar_flux` - Top-of-atmosphere solar flux $F_0$.
    ///
    /// # Errors
    /// [`SolverError::NumericalInstability`] if any value is not finite.
    pub fn reconstruct(
        coefficients: &EigenCoefficients,
        sources: &SourceTerms,
        solution: &[Real],
        mu0: Real,
        solar_flux: Real,
    ) -> Result<Self, SolverError> {
        let layers = coefficients.e1.len();
        if solution.len() != 2 * layers {
            return Err(SolverError::DimensionMismatch {
                what: "solution vector".to_string(),
                expected: 2 * layers,
                found: solution.len(),
            });
        }
        let levels = layers + 1;
        let mut field = Self::zeros(levels);

        // Beer's law on the scaled optical depth.
        for (level, &tau) in sources.cumulative_optical_depth.iter().enumerate().take(levels) {
            let transmission = (-tau / mu0).exp();
            field.direct_irradiance[level] = mu0 * solar_flux * transmission;
            field.direct_actinic_flux[level] = solar_flux * transmission;
        }

        let EigenCoefficients { e1, e2, e3, e4 } = coefficients;
        if layers > 0 {
            // Level 0 is the top of the first layer.
            let (y1, y2) = (solution[0], solution[1]);
            field.upwelling_irradiance[0] = y1 * e3[0] - y2 * e4[0] + sources.upwelling_top[0];
            field.downwelling_irradiance[0] =
                y1 * e1[0] - y2 * e2[0] + sources.downwelling_top[0];
        } else {
            // Bare surface: only the reflected beam goes up.
            field.upwelling_irradiance[0] = sources.surface_source;
        }
        // Level k + 1 is the bottom of layer k.
        for k in 0..layers {
            let (y1, y2) = (solution[2 * k], solution[2 * k + 1]);
            field.upwelling_irradiance[k + 1] =
                y1 * e1[k] + y2 * e2[k] + sources.upwelling_bottom[k];
            field.downwelling_irradiance[k + 1] =
                y1 * e3[k] + y2 * e4[k] + sources.downwelling_bottom[k];
        }

        for level in 0..levels {
            field.upwelling_actinic_flux[level] = field.upwelling_irradiance[level] / MU_BAR;
            field.downwelling_actinic_flux[level] = field.downwelling_irradiance[level] / MU_BAR;
        }

        field.check_finite()?;
        Ok(field)
    }

    pub fn number_of_levels(&self) -> usize {
        self.direct_irradiance.len()
    }

    fn components(&self) -> [(&'static str, &Vec<Real>); COMPONENTS] {
        [
            ("direct irradiance", &self.direct_irradiance),
            ("upwelling irradiance", &self.upwelling_irradiance),
            ("downwelling irradiance", &self.downwelling_irradiance),
            ("direct actinic flux", &self.direct_actinic_flux),
            ("upwelling actinic flux", &self.upwelling_actinic_flux),
            ("downwelling actinic flux", &self.downwelling_actinic_flux),
        ]
    }

    fn check_finite(&self) -> Result<(), SolverError> {
        for (quantity, values) in self.components() {
            if let Some((level, &value)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
                return Err(SolverError::NumericalInstability {
                    quantity,
                    layer: Some(level),
                    value,
                });
            }
        }
        Ok(())
    }

    /// Write the field into a packed row of `COMPONENTS * levels` values,
    /// one block of `levels` values per component.
    pub fn pack_into(&self, row: &mut [Real]) {
        let levels = self.number_of_levels();
        for (block, (_, values)) in self.components().into_iter().enumerate() {
            row[block * levels..(block + 1) * levels].copy_from_slice(values);
        }
    }
}

/// Unpack column rows written by [`ColumnField::pack_into`] into a
/// [`RadiationField`] shaped (levels, columns).
pub fn unpack_columns(packed: &Array2<Real>, levels: usize) -> RadiationField {
    let columns = packed.nrows();
    let block = |component: usize| {
        Array2::from_shape_fn((levels, columns), |(level, column)| {
            packed[[column, component * levels + level]]
        })
    };
    RadiationField {
        spectral_irradiance: FluxComponents {
            direct: block(0),
            upwelling: block(1),
            downwelling: block(2),
        },
        actinic_flux: FluxComponents {
            direct: block(3),
            upwelling: block(4),
            downwelling: block(5),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TEST_TOL;
    use crate::solver::delta_eddington::assembly::assemble;
    use crate::solver::delta_eddington::parameters::DeltaEddingtonParameters;
    use crate::solver::delta_eddington::tridiagonal::thomas_solve;
    use crate::types::OpticalProperties;
    use approx::assert_relative_eq;

    fn column(properties: &OpticalProperties, mu0: Real, reflectivity: Real) -> ColumnField {
        let params = DeltaEddingtonParameters::derive(properties, mu0).unwrap();
        let sources = SourceTerms::compute(&params, 1.0, reflectivity).unwrap();
        let coefficients = EigenCoefficients::compute(&params);
        let system = assemble(&coefficients, &sources, reflectivity);
        let x = thomas_solve(&system.lower, &system.main, &system.upper, &system.rhs).unwrap();
        ColumnField::reconstruct(&coefficients, &sources, &x, mu0, 1.0).unwrap()
    }

    #[test]
    fn test_boundary_conditions_hold() {
        let properties = OpticalProperties::uniform(4, 0.4, 0.8, 0.5);
        let field = column(&properties, 0.6, 0.3);

        // No diffuse flux enters at the top.
        assert!(field.downwelling_irradiance[0].abs() < TEST_TOL);
        // Lambertian surface reflects diffuse and direct flux.
        let surface = field.number_of_levels() - 1;
        assert_relative_eq!(
            field.upwelling_irradiance[surface],
            0.3 * (field.downwelling_irradiance[surface] + field.direct_irradiance[surface]),
            max_relative = TEST_TOL
        );
    }

    #[test]
    fn test_actinic_flux_is_twice_diffuse_irradiance() {
        let properties = OpticalProperties::uniform(2, 0.5, 0.6, 0.3);
        let field = column(&properties, 0.9, 0.1);
        for level in 0..field.number_of_levels() {
            assert_relative_eq!(
                field.upwelling_actinic_flux[level],
                2.0 * field.upwelling_irradiance[level]
            );
            assert_relative_eq!(
                field.direct_actinic_flux[level] * 0.9,
                field.direct_irradiance[level],
                max_relative = TEST_TOL
            );
        }
    }

    #[test]
    fn test_pack_and_unpack_preserve_layout() {
        let properties = OpticalProperties::uniform(3, 0.2, 0.5, 0.0);
        let field = column(&properties, 1.0, 0.0);
        let levels = field.number_of_levels();

        let mut packed = Array2::<Real>::zeros((2, COMPONENTS * levels));
        for mut row in packed.rows_mut() {
            field.pack_into(row.as_slice_mut().unwrap());
        }
        let unpacked = unpack_columns(&packed, levels);
        assert_eq!(unpacked.number_of_levels(), levels);
        assert_eq!(unpacked.number_of_columns(), 2);
        assert_eq!(unpacked.spectral_irradiance.downwelling[[2, 1]], field.downwelling_irradiance[2]);
        assert_eq!(unpacked.actinic_flux.direct[[3, 0]], field.direct_actinic_flux[3]);
    }

    #[test]
    fn test_bare_surface_reflects_the_beam() {
        let field = column(&OpticalProperties::uniform(0, 0.0, 0.0, 0.0), 1.0, 0.5);
        assert_eq!(field.number_of_levels(), 1);
        assert_relative_eq!(field.direct_irradiance[0], 1.0);
        assert_eq!(field.downwelling_irradiance[0], 0.0);
        assert_relative_eq!(
            field.upwelling_irradiance[0],
            0.5 * field.direct_irradiance[0],
            max_relative = TEST_TOL
        );
        assert_relative_eq!(field.upwelling_actinic_flux[0], 1.0, max_relative = TEST_TOL);
    }

    #[test]
    fn test_solution_length_is_checked() {
        let properties = OpticalProperties::uniform(2, 0.2, 0.5, 0.0);
        let params = DeltaEddingtonParameters::derive(&properties, 1.0).unwrap();
        let sources = SourceTerms::compute(&params, 1.0, 0.0).unwrap();
        let coefficients = EigenCoefficients::compute(&params);
        let err = ColumnField::reconstruct(&coefficients, &sources, &[0.0; 3], 1.0, 1.0).unwrap_err();
        assert!(matches!(err, SolverError::DimensionMismatch { expected: 4, found: 3, .. }));
    }
}
