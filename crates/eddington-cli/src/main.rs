//! Eddington command-line interface.
//!
//! Run radiative transfer jobs from TOML configuration files:
//! ```sh
//! eddington run job.toml
//! eddington validate job.toml
//! eddington radiators
//! ```

mod config;
mod runner;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "eddington")]
#[command(about = "Eddington: delta-Eddington two-stream radiative transfer")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a radiative transfer job from a TOML configuration file.
    Run {
        /// Path to the job configuration file.
        config: PathBuf,
        /// Output directory (overrides config file setting).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file and build its grids without solving.
    Validate {
        /// Path to the job configuration file.
        config: PathBuf,
    },
    /// Display information about available radiators.
    Radiators,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, output } => {
            println!("Eddington Radiative Transfer");
            println!("===========================");
            let job = config::load_config(&config)?;
            println!("Configuration: {}", config.display());

            let results = runner::run_simulation(&job)?;

            let out_dir = output.unwrap_or_else(|| PathBuf::from(&job.output.directory));

            if job.output.save_csv {
                runner::write_radiation_csv(&results, &out_dir.join("radiation_field.csv"), &job)?;
            }
            if job.output.save_json {
                runner::write_radiation_json(&results, &out_dir.join("radiation_field.json"))?;
            }

            println!("Simulation complete.");
            Ok(())
        }
        Commands::Validate { config } => {
            let job = config::load_config(&config)?;
            let setup = runner::prepare(&job)?;
            println!("Configuration is valid: {}", config.display());
            println!(
                "  {} layers, {} columns, {} bands, {} radiators",
                setup.vertical.number_of_sections(),
                setup.vertical.number_of_columns(),
                setup.wavelengths.number_of_sections(),
                setup.radiators.len()
            );
            Ok(())
        }
        Commands::Radiators => {
            println!("Available radiators:");
            println!();
            println!("  Rayleigh   Molecular scattering by air, Nicolet (1984) cross-section");
            println!("             [atmosphere] air_density");
            println!("  O3         Ozone absorption, tabulated 200-350 nm");
            println!("             [atmosphere] ozone_density");
            println!("  aerosol    Angstrom power-law extinction, exponential vertical profile");
            println!("             [[aerosol]] optical_depth, single_scattering_albedo, ...");
            Ok(())
        }
    }
}
