//! Candela command-line interface.
//!
//! Run orientation-averaged DDA cross-section computations from TOML job
//! files:
//! ```sh
//! candela run job.toml
//! candela validate job.toml
//! ```

mod config;
mod runner;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "candela")]
#[command(about = "Candela: discrete-dipole approximation engine")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation from a TOML configuration file.
    Run {
        /// Path to the job configuration file.
        config: PathBuf,
        /// Output directory (overrides config file setting).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file without running the simulation.
    Validate {
        /// Path to the job configuration file.
        config: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, output } => {
            let mut job = config::load_config(&config)?;
            if let Some(dir) = output {
                job.output.directory = dir.display().to_string();
            }
            log::info!("configuration: {}", config.display());

            let result = runner::run_simulation(&job)?;
            log::info!(
                "{} orientations complete, <Cext> = {:.6e} nm^2",
                result.per_orientation.len(),
                result.average.cext
            );
            Ok(())
        }
        Commands::Validate { config } => {
            let _job = config::load_config(&config)?;
            println!("Configuration is valid: {}", config.display());
            Ok(())
        }
    }
}
