//! Sidecar Spec Provisioner CLI
//!
//! A command-line tool for previewing the sidecar container pieces derived
//! from a workload spec: the resource allocation and the startup/readiness
//! probes an assembler would install.

mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Sidecar Spec Provisioner CLI
#[derive(Parser)]
#[command(name = "ssp")]
#[command(author, version, about = "CLI for the Sidecar Spec Provisioner", long_about = None)]
pub struct Cli {
    /// Path to a flat key/value config file (JSON object of strings); falls
    /// back to SSP_-prefixed environment variables
    #[arg(long, env = "SSP_CONFIG")]
    pub config: Option<String>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Derive the sidecar's resource requirements from a workload spec
    Resources {
        /// Path to the workload spec JSON file
        #[arg(long, short)]
        spec: String,
    },

    /// Derive the sidecar's startup and readiness probes from a workload spec
    Probes {
        /// Path to the workload spec JSON file
        #[arg(long, short)]
        spec: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::registry()
            .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
            .with(fmt::layer())
            .init();
    }

    let sidecar_config = config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Resources { spec } => {
            commands::resources::run(&spec, &sidecar_config, cli.format)
        }
        Commands::Probes { spec } => commands::probes::run(&spec, &sidecar_config, cli.format),
    }
}
