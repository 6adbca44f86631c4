//! Simulation runner: ties together grids, radiators, and solver.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;

use eddington_compute::CpuBackend;
use eddington_core::solver::RadiativeTransferSolver;
use eddington_core::{DeltaEddingtonSolver, RadiationField, Real, SolverParams};
use eddington_grid::{Grid, Profile};
use eddington_radiators::absorber::AbsorberRadiator;
use eddington_radiators::aerosol::AerosolRadiator;
use eddington_radiators::rayleigh::RayleighRadiator;
use eddington_radiators::{Radiator, RadiatorState};

use crate::config::{JobConfig, WavelengthSpec};

/// Grids and radiators built from a job configuration.
pub struct Setup {
    /// Altitude grid (km), one identical set of edges per column.
    pub vertical: Grid,
    /// Wavelength band edges (nm).
    pub wavelengths: Grid,
    pub radiators: Vec<Box<dyn Radiator>>,
}

/// Radiation field of every column for one wavelength band.
#[derive(Debug, Serialize)]
pub struct BandResult {
    pub band: usize,
    /// Band midpoint (nm).
    pub wavelength_nm: Real,
    pub field: RadiationField,
}

/// Build the grids and radiators described by `job`.
pub fn prepare(job: &JobConfig) -> Result<Setup> {
    let columns = job.columns.solar_zenith_angles.len();
    let altitude = Grid::from_edges("altitude", "km", &job.atmosphere.altitude_edges_km)
        .context("Invalid atmosphere.altitude_edges_km")?;
    let vertical = altitude.broadcast_columns(columns)?;

    let wavelengths = match &job.wavelengths {
        WavelengthSpec::Edges { edges_nm } => Grid::from_edges("wavelength", "nm", edges_nm),
        WavelengthSpec::Range { range, bands } => {
            Grid::uniform("wavelength", "nm", range[0], range[1], *bands)
        }
    }
    .context("Invalid wavelength grid")?;

    let mut radiators: Vec<Box<dyn Radiator>> = Vec::new();
    let air = Profile::from_edge_values(
        "air",
        "molecule cm-3",
        &vertical,
        &job.atmosphere.air_density,
    )?;
    radiators.push(Box::new(RayleighRadiator::new(air)));

    if let Some(ozone_density) = &job.atmosphere.ozone_density {
        let ozone = Profile::from_edge_values("O3", "molecule cm-3", &vertical, ozone_density)?;
        radiators.push(Box::new(AbsorberRadiator::ozone(ozone)?));
    }

    for (i, params) in job.aerosol.iter().enumerate() {
        let aerosol = AerosolRadiator::new(params.clone())
            .with_context(|| format!("Invalid aerosol entry {}", i + 1))?;
        radiators.push(Box::new(aerosol));
    }

    log::debug!(
        "Prepared {} layers x {} columns, {} bands, {} radiators",
        vertical.number_of_sections(),
        columns,
        wavelengths.number_of_sections(),
        radiators.len()
    );

    Ok(Setup {
        vertical,
        wavelengths,
        radiators,
    })
}

/// Combined optical properties of all radiators at `wavelength_nm`.
///
/// Radiators whose data do not cover the wavelength are left out.
pub fn combined_state(setup: &Setup, wavelength_nm: Real) -> Result<RadiatorState> {
    let mut states = Vec::with_capacity(setup.radiators.len());
    for radiator in &setup.radiators {
        if radiator.check_wavelength(wavelength_nm).is_err() {
            log::debug!(
                "Skipping radiator '{}' at {} nm (outside its data range)",
                radiator.name(),
                wavelength_nm
            );
            continue;
        }
        let state = radiator
            .optical_properties(&setup.vertical, wavelength_nm)
            .with_context(|| format!("Radiator '{}' failed", radiator.name()))?;
        states.push(state);
    }
    Ok(RadiatorState::accumulate(&states)?)
}

/// Run a full simulation from a parsed job configuration.
pub fn run_simulation(job: &JobConfig) -> Result<Vec<BandResult>> {
    let setup = prepare(job)?;

    let backend = CpuBackend::with_threads(job.compute.threads)?;
    println!("Backend: CPU ({} threads)", backend.num_threads());
    let solver = DeltaEddingtonSolver::with_backend(Arc::new(backend));

    let bands = setup.wavelengths.number_of_sections();
    let midpoints = setup.wavelengths.midpoints();
    println!(
        "Solving {} bands for {} columns with the {} method",
        bands,
        job.columns.solar_zenith_angles.len(),
        solver.method_name()
    );

    let mut results = Vec::with_capacity(bands);
    for band in 0..bands {
        let wavelength_nm = midpoints[[band, 0]];
        let state = combined_state(&setup, wavelength_nm)?;
        let params = SolverParams {
            surface_reflectivity: job.surface.reflectivity,
            solar_flux: job.solar.flux_for_band(band),
        };
        let field = solver
            .solve(
                &job.columns.solar_zenith_angles,
                &setup.vertical,
                &setup.wavelengths.section(band)?,
                &state,
                &params,
            )
            .with_context(|| format!("Solve failed for band {} ({} nm)", band, wavelength_nm))?;

        println!("  [{}/{}] λ = {:.2} nm", band + 1, bands, wavelength_nm);
        results.push(BandResult {
            band,
            wavelength_nm,
            field,
        });
    }

    Ok(results)
}

/// Write the radiation field to CSV, one row per band, column and level.
///
/// Level 0 is the top of the atmosphere.
pub fn write_radiation_csv(results: &[BandResult], path: &Path, job: &JobConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Cannot create '{}'", path.display()))?;

    writeln!(file, "# Eddington delta-Eddington solver: radiation field")?;
    writeln!(file, "# Version: {}", env!("CARGO_PKG_VERSION"))?;
    match job.surface.reflectivity {
        Some(reflectivity) => writeln!(file, "# surface_reflectivity: {}", reflectivity)?,
        None => writeln!(file, "# surface_reflectivity: unset")?,
    }
    writeln!(file, "# solar_zenith_angles_rad: {:?}", job.columns.solar_zenith_angles)?;
    writeln!(file, "#")?;
    writeln!(
        file,
        "band,wavelength_nm,column,level,altitude_km,\
         direct_irradiance,upwelling_irradiance,downwelling_irradiance,\
         direct_actinic_flux,upwelling_actinic_flux,downwelling_actinic_flux"
    )?;

    let edges = &job.atmosphere.altitude_edges_km;
    for result in results {
        let irradiance = &result.field.spectral_irradiance;
        let actinic = &result.field.actinic_flux;
        for column in 0..result.field.number_of_columns() {
            for level in 0..result.field.number_of_levels() {
                let altitude = edges[edges.len() - 1 - level];
                writeln!(
                    file,
                    "{},{:.4},{},{},{:.4},{:.6e},{:.6e},{:.6e},{:.6e},{:.6e},{:.6e}",
                    result.band,
                    result.wavelength_nm,
                    column,
                    level,
                    altitude,
                    irradiance.direct[[level, column]],
                    irradiance.upwelling[[level, column]],
                    irradiance.downwelling[[level, column]],
                    actinic.direct[[level, column]],
                    actinic.upwelling[[level, column]],
                    actinic.downwelling[[level, column]],
                )?;
            }
        }
    }

    println!("Radiation field written to: {}", path.display());
    Ok(())
}

/// Write the radiation field to JSON.
pub fn write_radiation_json(results: &[BandResult], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(results)?;
    std::fs::write(path, json).with_context(|| format!("Cannot write '{}'", path.display()))?;
    println!("Radiation field (JSON) written to: {}", path.display());
    Ok(())
}
