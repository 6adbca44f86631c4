//! TOML configuration deserialisation for radiative transfer jobs.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use eddington_core::types::Real;
use eddington_radiators::aerosol::AerosolParameters;

/// Top-level job configuration.
#[derive(Debug, Deserialize)]
pub struct JobConfig {
    pub atmosphere: AtmosphereConfig,
    pub columns: ColumnsConfig,
    pub wavelengths: WavelengthSpec,
    #[serde(default)]
    pub surface: SurfaceConfig,
    #[serde(default)]
    pub solar: SolarConfig,
    #[serde(default)]
    pub aerosol: Vec<AerosolParameters>,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub compute: ComputeConfig,
}

/// Vertical structure of the atmosphere, shared by every column.
#[derive(Debug, Deserialize)]
pub struct AtmosphereConfig {
    /// Altitude edges (km), bottom to top.
    pub altitude_edges_km: Vec<Real>,
    /// Air number density (molecule cm⁻³) at each edge.
    pub air_density: Vec<Real>,
    /// Ozone number density (molecule cm⁻³) at each edge.
    #[serde(default)]
    pub ozone_density: Option<Vec<Real>>,
}

/// Atmospheric columns of the batch.
#[derive(Debug, Deserialize)]
pub struct ColumnsConfig {
    /// One solar zenith angle per column (radians).
    pub solar_zenith_angles: Vec<Real>,
}

/// Wavelength bands: either explicit edges or a uniform range.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum WavelengthSpec {
    Edges { edges_nm: Vec<Real> },
    Range { range: [Real; 2], bands: usize },
}

/// Surface properties.
#[derive(Debug, Default, Deserialize)]
pub struct SurfaceConfig {
    /// Lambertian reflectivity in [0, 1].
    #[serde(default)]
    pub reflectivity: Option<Real>,
}

/// Top-of-atmosphere solar flux.
#[derive(Debug, Default, Deserialize)]
pub struct SolarConfig {
    /// One value per band, or a single value used for every band.
    #[serde(default)]
    pub flux: Vec<Real>,
}

impl SolarConfig {
    /// Flux for band `index`, if configured.
    pub fn flux_for_band(&self, index: usize) -> Option<Real> {
        match self.flux.as_slice() {
            [single] => Some(*single),
            values => values.get(index).copied(),
        }
    }
}

/// Output configuration.
#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    /// Output directory (default: "./output").
    #[serde(default = "default_output_dir")]
    pub directory: String,
    /// Whether to save the radiation field as CSV (default: true).
    #[serde(default = "default_true")]
    pub save_csv: bool,
    /// Whether to also save the radiation field as JSON (default: false).
    #[serde(default)]
    pub save_json: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            save_csv: true,
            save_json: false,
        }
    }
}

fn default_output_dir() -> String {
    "./output".into()
}
fn default_true() -> bool {
    true
}

/// Compute configuration.
#[derive(Debug, Default, Deserialize)]
pub struct ComputeConfig {
    /// Worker threads; 0 uses every available core.
    #[serde(default)]
    pub threads: usize,
}

impl JobConfig {
    /// Check the consistency of the configuration without building anything.
    pub fn validate(&self) -> Result<()> {
        let edges = self.atmosphere.altitude_edges_km.len();
        if self.atmosphere.air_density.len() != edges {
            anyhow::bail!(
                "atmosphere.air_density has {} values but there are {} altitude edges",
                self.atmosphere.air_density.len(),
                edges
            );
        }
        if let Some(ozone) = &self.atmosphere.ozone_density {
            if ozone.len() != edges {
                anyhow::bail!(
                    "atmosphere.ozone_density has {} values but there are {} altitude edges",
                    ozone.len(),
                    edges
                );
            }
        }
        if self.columns.solar_zenith_angles.is_empty() {
            anyhow::bail!("columns.solar_zenith_angles must list at least one column");
        }
        if let WavelengthSpec::Range { range, bands } = &self.wavelengths {
            if *bands == 0 || !(range[1] > range[0]) {
                anyhow::bail!(
                    "wavelengths.range must be increasing with at least one band, got {:?} with {} bands",
                    range,
                    bands
                );
            }
        }
        let bands = self.number_of_bands();
        let fluxes = self.solar.flux.len();
        if fluxes > 1 && fluxes != bands {
            anyhow::bail!(
                "solar.flux has {} values but there are {} wavelength bands",
                fluxes,
                bands
            );
        }
        Ok(())
    }

    /// Number of wavelength bands described by the configuration.
    pub fn number_of_bands(&self) -> usize {
        match &self.wavelengths {
            WavelengthSpec::Edges { edges_nm } => edges_nm.len().saturating_sub(1),
            WavelengthSpec::Range { bands, .. } => *bands,
        }
    }
}

/// Load and parse a TOML job configuration file.
pub fn load_config(path: &Path) -> Result<JobConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read configuration '{}'", path.display()))?;
    parse_config(&content).with_context(|| format!("Invalid configuration '{}'", path.display()))
}

/// Parse and validate a TOML job configuration.
pub fn parse_config(content: &str) -> Result<JobConfig> {
    let config: JobConfig = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}
