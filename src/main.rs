mod cli;

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use precip::prelude::*;

use crate::cli::{Cli, Commands};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(LoggingConfig {
        filter: cli.log_filter(),
        ..Default::default()
    });

    let result = match cli.scene() {
        Commands::Weather { config } => run_weather(config.as_deref()),
        Commands::Voronoi { config } => run_voronoi(config.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_weather(config_path: Option<&Path>) -> Result<(), SimulationError> {
    let config = match config_path {
        Some(path) => WeatherConfig::load(path)?,
        None => WeatherConfig::default(),
    };
    WeatherSimulation::from_config(config).run()
}

fn run_voronoi(config_path: Option<&Path>) -> Result<(), SimulationError> {
    let config = match config_path {
        Some(path) => VoronoiConfig::load(path)?,
        None => VoronoiConfig::default(),
    };
    VoronoiSimulation::from_config(config).run()
}
