//! Command line for the `precip` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "precip")]
#[command(about = "Precipitation particle field and Voronoi cone scenes", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Scene to open (weather when omitted)
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Verbosity level (can be repeated for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Fly through falling rain or snow
    Weather {
        /// JSON configuration file
        config: Option<PathBuf>,
    },

    /// Click to place Voronoi sites drawn as cones
    Voronoi {
        /// JSON configuration file
        config: Option<PathBuf>,
    },
}

impl Cli {
    /// Scene to run, defaulting to weather without a config file.
    pub fn scene(&self) -> Commands {
        match &self.command {
            Some(Commands::Weather { config }) => Commands::Weather {
                config: config.clone(),
            },
            Some(Commands::Voronoi { config }) => Commands::Voronoi {
                config: config.clone(),
            },
            None => Commands::Weather { config: None },
        }
    }

    /// Logger filter implied by `-v`/`-q`, or `None` to defer to `RUST_LOG`.
    pub fn log_filter(&self) -> Option<String> {
        if self.quiet {
            return Some("error".to_string());
        }
        let level = match self.verbose {
            0 => return None,
            1 => "debug",
            _ => "trace",
        };
        Some(format!("precip={},warn", level))
    }
}
