//! Delta-Eddington two-stream solver.
//!
//! This module implements the delta-Eddington approximation of Joseph,
//! Wiscombe & Weinman (1976) in the two-stream framework of Toon et al.
//! (1989). Each column of a batch is solved independently in five stages:
//!
//! 1. [`parameters`]: delta scaling and the two-stream coefficients.
//! 2. [`source`]: direct-beam source terms of every layer.
//! 3. [`assembly`]: the $2N \times 2N$ tridiagonal layer-coupling system.
//! 4. [`tridiagonal`]: Thomas-algorithm solve of that system.
//! 5. [`crate::fields`]: reconstruction of irradiance and actinic flux at
//!    every layer boundary.
//!
//! Columns are distributed over a [`ComputeBackend`]; any failing column
//! fails the whole batch.

pub mod assembly;
pub mod parameters;
pub mod source;
pub mod tridiagonal;

use std::sync::Arc;

use eddington_compute::{ComputeBackend, ComputeError, CpuBackend, TaskError};
use eddington_grid::Grid;
use eddington_radiators::RadiatorState;

use super::{RadiativeTransferSolver, SolverError};
use crate::fields::{unpack_columns, ColumnField, COMPONENTS};
use crate::types::{OpticalProperties, RadiationField, Real, SolverParams};
use assembly::{assemble, EigenCoefficients};
use parameters::DeltaEddingtonParameters;
use source::SourceTerms;
use tridiagonal::thomas_solve;

/// Hemispheric mean cosine of the Eddington closure.
pub const MU_BAR: Real = 0.5;

/// Cosine of the solar zenith angle at or below which the sun is treated as
/// set and the column receives no radiation.
pub const MU0_HORIZON: Real = 1.0e-6;

/// Scaled albedos are capped at `1 - ALBEDO_MARGIN` so that $\lambda > 0$.
#[cfg(not(feature = "single-precision"))]
pub const ALBEDO_MARGIN: Real = 1.0e-7;
#[cfg(feature = "single-precision")]
pub const ALBEDO_MARGIN: Real = 1.0e-4;

/// Relative size of $|\lambda^2 - 1/\mu_0^2|$ below which the particular
/// solution is resonant.
#[cfg(not(feature = "single-precision"))]
pub const RESONANCE_TOLERANCE: Real = 1.0e-8;
#[cfg(feature = "single-precision")]
pub const RESONANCE_TOLERANCE: Real = 1.0e-4;

/// Round-off allowed on the physical range of optical properties.
pub const PROPERTY_TOLERANCE: Real = 64.0 * Real::EPSILON;

/// The delta-Eddington solver, holding the backend that schedules columns.
pub struct DeltaEddingtonSolver {
    backend: Arc<dyn ComputeBackend<Real>>,
}

impl Default for DeltaEddingtonSolver {
    fn default() -> Self {
        Self {
            backend: Arc::new(CpuBackend::new()),
        }
    }
}

impl DeltaEddingtonSolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a solver that runs columns on `backend`.
    pub fn with_backend(backend: Arc<dyn ComputeBackend<Real>>) -> Self {
        Self { backend }
    }

    /// Solve a batch of columns given directly as top-first optical
    /// properties.
    ///
    /// # Arguments
    /// * `solar_zenith_angles` - One angle per column (radians).
    /// * `columns` - Optical properties of each column, all with the same
    ///   number of layers.
    /// * `params` - Surface reflectivity and solar flux.
    pub fn solve_columns(
        &self,
        solar_zenith_angles: &[Real],
        columns: &[OpticalProperties],
        params: &SolverParams,
    ) -> Result<RadiationField, SolverError> {
        if columns.len() != solar_zenith_angles.len() {
            return Err(SolverError::DimensionMismatch {
                what: "optical property columns".to_string(),
                expected: solar_zenith_angles.len(),
                found: columns.len(),
            });
        }
        let layers = columns.first().map_or(0, OpticalProperties::number_of_layers);
        for column in columns {
            check_column_lengths(column, layers)?;
        }

        let surface_reflectivity = params.surface_reflectivity()?;
        let solar_flux = params.solar_flux()?;
        let levels = layers + 1;

        log::debug!(
            "Delta-Eddington solve: {} columns x {} layers on {}",
            columns.len(),
            layers,
            self.backend.device_info().name
        );

        let fill = |index: usize, row: &mut [Real]| -> Result<(), TaskError> {
            let field = solve_column(
                &columns[index],
                solar_zenith_angles[index],
                solar_flux,
                surface_reflectivity,
            )?;
            field.pack_into(row);
            Ok(())
        };

        let packed = self
            .backend
            .parallel_row_fill(columns.len(), COMPONENTS * levels, &fill)
            .map_err(into_solver_error)?;

        Ok(unpack_columns(&packed, levels))
    }
}

impl RadiativeTransferSolver for DeltaEddingtonSolver {
    fn solve(
        &self,
        solar_zenith_angles: &[Real],
        vertical: &Grid,
        wavelength: &Grid,
        state: &RadiatorState,
        params: &SolverParams,
    ) -> Result<RadiationField, SolverError> {
        if wavelength.number_of_sections() != 1 {
            return Err(SolverError::DimensionMismatch {
                what: "wavelength bands per solve".to_string(),
                expected: 1,
                found: wavelength.number_of_sections(),
            });
        }
        if wavelength.number_of_columns() != 1 {
            return Err(SolverError::DimensionMismatch {
                what: "wavelength grid columns".to_string(),
                expected: 1,
                found: wavelength.number_of_columns(),
            });
        }

        let columns = solar_zenith_angles.len();
        let layers = vertical.number_of_sections();
        if vertical.number_of_columns() != columns {
            return Err(SolverError::DimensionMismatch {
                what: "vertical grid columns".to_string(),
                expected: columns,
                found: vertical.number_of_columns(),
            });
        }
        for (what, array) in [
            ("optical depth", &state.optical_depth),
            ("single scattering albedo", &state.single_scattering_albedo),
            ("asymmetry parameter", &state.asymmetry_parameter),
        ] {
            let (found_layers, found_columns) = array.dim();
            if found_layers != layers {
                return Err(SolverError::DimensionMismatch {
                    what: format!("{what} layers"),
                    expected: layers,
                    found: found_layers,
                });
            }
            if found_columns != columns {
                return Err(SolverError::DimensionMismatch {
                    what: format!("{what} columns"),
                    expected: columns,
                    found: found_columns,
                });
            }
        }

        log::trace!(
            "Solving band [{}, {}] {}",
            wavelength.edges()[[0, 0]],
            wavelength.edges()[[1, 0]],
            wavelength.units
        );

        let properties: Vec<OpticalProperties> =
            (0..columns).map(|c| column_properties(state, c)).collect();
        self.solve_columns(solar_zenith_angles, &properties, params)
    }

    fn method_name(&self) -> &str {
        "Delta-Eddington two-stream"
    }
}

/// Run the five stages for one column.
///
/// A sun at or below the horizon gives an all-zero field without any
/// division by $\mu_0$.
///
/// # Arguments
/// * `properties` - Layer optical properties, top first.
/// * `solar_zenith_angle` - Solar zenith angle (radians).
/// * `solar_flux` - Top-of-atmosphere solar flux $F_0$.
/// * `surface_reflectivity` - Lambertian reflectivity $R_{\text{sfc}}$.
pub fn solve_column(
    properties: &OpticalProperties,
    solar_zenith_angle: Real,
    solar_flux: Real,
    surface_reflectivity: Real,
) -> Result<ColumnField, SolverError> {
    let layers = properties.number_of_layers();
    check_column_lengths(properties, layers)?;

    let mu0 = solar_zenith_angle.cos();
    if mu0 <= MU0_HORIZON {
        log::trace!(
            "Solar zenith angle {} is at or below the horizon; column is dark",
            solar_zenith_angle
        );
        return Ok(ColumnField::zeros(layers + 1));
    }

    let params = DeltaEddingtonParameters::derive(properties, mu0)?;
    let sources = SourceTerms::compute(&params, solar_flux, surface_reflectivity)?;
    let coefficients = EigenCoefficients::compute(&params);
    let system = assemble(&coefficients, &sources, surface_reflectivity);
    let solution = thomas_solve(&system.lower, &system.main, &system.upper, &system.rhs)?;
    ColumnField::reconstruct(&coefficients, &sources, &solution, mu0, solar_flux)
}

fn check_column_lengths(properties: &OpticalProperties, layers: usize) -> Result<(), SolverError> {
    for (what, found) in [
        ("optical depth", properties.optical_depth.len()),
        ("single scattering albedo", properties.single_scattering_albedo.len()),
        ("asymmetry parameter", properties.asymmetry_parameter.len()),
    ] {
        if found != layers {
            return Err(SolverError::DimensionMismatch {
                what: what.to_string(),
                expected: layers,
                found,
            });
        }
    }
    Ok(())
}

/// Copy one column of a bottom-to-top radiator state into top-first order.
fn column_properties(state: &RadiatorState, column: usize) -> OpticalProperties {
    let top_first = |array: &ndarray::Array2<Real>| -> Vec<Real> {
        array.column(column).iter().rev().copied().collect()
    };
    OpticalProperties {
        optical_depth: top_first(&state.optical_depth),
        single_scattering_albedo: top_first(&state.single_scattering_albedo),
        asymmetry_parameter: top_first(&state.asymmetry_parameter),
    }
}

fn into_solver_error(error: ComputeError) -> SolverError {
    match error {
        ComputeError::TaskFailed { index, source } => match source.downcast::<SolverError>() {
            Ok(source) => {
                log::warn!("Column {} rejected: {}", index, source);
                SolverError::Column {
                    column: index,
                    source,
                }
            }
            Err(other) => SolverError::ComputeError(format!("column {index}: {other}")),
        },
        other => SolverError::ComputeError(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TEST_TOL;
    use crate::solver::delta_eddington::tridiagonal::max_residual;
    use approx::assert_relative_eq;

    const SUN_OVERHEAD: Real = 0.0;

    fn serial() -> DeltaEddingtonSolver {
        DeltaEddingtonSolver::with_backend(Arc::new(CpuBackend::with_threads(1).unwrap()))
    }

    #[test]
    fn test_non_scattering_column_has_no_upwelling() {
        let properties = OpticalProperties::uniform(5, 0.3, 0.0, 0.4);
        let field = solve_column(&properties, 0.5, 1.0, 0.0).unwrap();
        assert!(field.upwelling_irradiance.iter().all(|&f| f == 0.0));
        assert!(field.upwelling_actinic_flux.iter().all(|&f| f == 0.0));
    }

    #[test]
    fn test_transparent_column_transmits_beam() {
        let properties = OpticalProperties::uniform(3, 0.0, 0.5, 0.0);
        let sza: Real = 0.6;
        let field = solve_column(&properties, sza, 1.0, 0.0).unwrap();
        assert_relative_eq!(field.direct_irradiance[3], sza.cos(), max_relative = TEST_TOL);
        assert_relative_eq!(field.direct_actinic_flux[3], 1.0, max_relative = TEST_TOL);
    }

    #[test]
    fn test_empty_column_obeys_lambertian_surface() {
        let properties = OpticalProperties::uniform(0, 0.0, 0.0, 0.0);
        let field = solve_column(&properties, SUN_OVERHEAD, 1.0, 0.5).unwrap();
        assert_eq!(field.number_of_levels(), 1);
        assert_relative_eq!(field.upwelling_irradiance[0], 0.5 * field.direct_irradiance[0]);
    }

    #[test]
    fn test_single_layer_fields_are_positive() {
        let properties = OpticalProperties::uniform(1, 0.5, 0.9, 0.8);
        let field = solve_column(&properties, SUN_OVERHEAD, 1.0, 0.1).unwrap();

        let surface = 1;
        for value in [
            field.direct_irradiance[surface],
            field.upwelling_irradiance[surface],
            field.downwelling_irradiance[surface],
            field.direct_actinic_flux[surface],
            field.upwelling_actinic_flux[surface],
            field.downwelling_actinic_flux[surface],
        ] {
            assert!(value.is_finite() && value > 0.0, "surface value {value}");
        }
        assert!(field.downwelling_irradiance[0] <= 1.0);
    }

    #[test]
    fn test_conservative_column_conserves_energy() {
        let properties = OpticalProperties::uniform(6, 0.4, 1.0, 0.3);
        let sza: Real = 0.8;
        let mu0 = sza.cos();
        let field = solve_column(&properties, sza, 1.0, 0.0).unwrap();

        let surface = 6;
        let outgoing = field.upwelling_irradiance[0]
            + field.downwelling_irradiance[surface]
            + field.direct_irradiance[surface];
        // The albedo cap absorbs a fraction of order ALBEDO_MARGIN.
        assert_relative_eq!(outgoing, mu0, max_relative = 1e-4 + 10.0 * ALBEDO_MARGIN);
    }

    #[test]
    fn test_absorbed_flux_is_non_negative() {
        let properties = OpticalProperties::uniform(4, 0.5, 0.7, 0.6);
        let sza: Real = 0.3;
        let field = solve_column(&properties, sza, 1.0, 0.2).unwrap();
        let surface = 4;
        let net_top = sza.cos() - field.upwelling_irradiance[0];
        let net_surface = field.downwelling_irradiance[surface] + field.direct_irradiance[surface]
            - field.upwelling_irradiance[surface];
        assert!(net_top - net_surface >= 0.0);
    }

    #[test]
    fn test_sun_below_horizon_gives_dark_column() {
        let properties = OpticalProperties::uniform(3, 0.5, 0.9, 0.8);
        for sza in [consts_half_pi(), consts_half_pi() + 0.3, 3.0] {
            let field = solve_column(&properties, sza, 1.0, 0.3).unwrap();
            assert!(field.direct_irradiance.iter().all(|&f| f == 0.0));
            assert!(field.downwelling_actinic_flux.iter().all(|&f| f == 0.0));
        }
    }

    #[test]
    fn test_grazing_sun_stays_finite() {
        let properties = OpticalProperties::uniform(3, 0.5, 0.9, 0.8);
        // lambda < 1 <= 1 / mu0 here, so no angle is resonant.
        for step in 0..2000 {
            let mu0 = MU0_HORIZON * (1.0 + step as Real) + 1.0e-4 * step as Real;
            let field = solve_column(&properties, mu0.acos(), 1.0, 0.3).unwrap();
            for values in [
                &field.direct_irradiance,
                &field.upwelling_irradiance,
                &field.downwelling_irradiance,
                &field.upwelling_actinic_flux,
            ] {
                assert!(values.iter().all(|f| f.is_finite()), "mu0 = {mu0}");
            }
        }
    }

    #[test]
    fn test_assembled_system_is_solved_to_round_off() {
        let properties = OpticalProperties::new(
            vec![0.05, 0.2, 1.5, 0.7],
            vec![0.99, 0.5, 0.95, 0.2],
            vec![0.1, 0.7, 0.85, 0.0],
        )
        .unwrap();
        let params = DeltaEddingtonParameters::derive(&properties, 0.45).unwrap();
        let sources = SourceTerms::compute(&params, 1.0, 0.25).unwrap();
        let system = assemble(&EigenCoefficients::compute(&params), &sources, 0.25);
        let x = thomas_solve(&system.lower, &system.main, &system.upper, &system.rhs).unwrap();
        assert!(max_residual(&system.lower, &system.main, &system.upper, &system.rhs, &x) < TEST_TOL);
    }

    #[test]
    fn test_identical_columns_match_serial_and_parallel() {
        let columns = vec![OpticalProperties::uniform(8, 0.25, 0.85, 0.65); 10];
        let angles = vec![0.7; 10];
        let params = SolverParams::new(0.15, 1.0);

        let serial_field = serial().solve_columns(&angles, &columns, &params).unwrap();
        let parallel = DeltaEddingtonSolver::with_backend(Arc::new(CpuBackend::with_threads(4).unwrap()));
        let parallel_field = parallel.solve_columns(&angles, &columns, &params).unwrap();

        assert_eq!(serial_field, parallel_field);
        let up = &serial_field.spectral_irradiance.upwelling;
        for column in 1..10 {
            assert_eq!(up.column(column), up.column(0));
        }
    }

    #[test]
    fn test_repeated_solves_are_identical() {
        let columns = vec![
            OpticalProperties::uniform(4, 0.3, 0.9, 0.7),
            OpticalProperties::uniform(4, 0.1, 0.2, 0.1),
        ];
        let angles = [0.2, 1.1];
        let params = SolverParams::new(0.3, 1.5);
        let solver = DeltaEddingtonSolver::new();
        let first = solver.solve_columns(&angles, &columns, &params).unwrap();
        let second = solver.solve_columns(&angles, &columns, &params).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_failing_column_is_named() {
        let columns = vec![
            OpticalProperties::uniform(2, 0.3, 0.9, 0.7),
            OpticalProperties::uniform(2, 0.3, 1.5, 0.7),
        ];
        let err = serial()
            .solve_columns(&[0.1, 0.1], &columns, &SolverParams::new(0.1, 1.0))
            .unwrap_err();
        match &err {
            SolverError::Column { column, .. } => assert_eq!(*column, 1),
            other => panic!("unexpected error: {other}"),
        }
        assert!(matches!(err.root(), SolverError::NumericalInstability { .. }));
    }

    #[test]
    fn test_missing_flux_is_reported_before_solving() {
        let columns = vec![OpticalProperties::uniform(2, 0.3, 0.9, 0.7)];
        let params = SolverParams {
            surface_reflectivity: Some(0.1),
            solar_flux: None,
        };
        let err = serial().solve_columns(&[0.1], &columns, &params).unwrap_err();
        assert!(matches!(err, SolverError::MissingParameter("solar_flux")));
    }

    fn consts_half_pi() -> Real {
        eddington_grid::consts::FRAC_PI_2
    }
}
