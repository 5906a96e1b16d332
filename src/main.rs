//! # camels-archive CLI
//!
//! A command-line tool for extracting NOMAD CAMELS measurement files into
//! archive documents.
//!
//! ## Usage
//!
//! ```bash
//! # Check whether a file is a supported CAMELS measurement
//! camels-archive classify run_001.nxs
//!
//! # Extract and write run_001.nxs.archive.json next to the input
//! camels-archive extract run_001.nxs
//!
//! # Print the document instead of persisting it
//! camels-archive extract run_001.nxs --print
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

/// camels-archive - CAMELS Measurement File Extractor
#[derive(Parser)]
#[command(name = "camels-archive")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a CAMELS measurement file into an archive document
    Extract {
        /// Input measurement file path (.h5, .hdf5, or .nxs)
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output directory for the archive document (defaults to the
        /// input's directory)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Upload identifier recorded in the archive metadata
        #[arg(short, long)]
        upload_id: Option<String>,

        /// TOML configuration file (identity service settings)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print the document to stdout instead of persisting it
        #[arg(long)]
        print: bool,
    },

    /// Classify a candidate file without extracting it
    Classify {
        /// Candidate file path
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    match cli.command {
        Commands::Extract {
            input,
            output_dir,
            upload_id,
            config,
            print,
        } => cli::extract::run(input, output_dir, upload_id, config, print),
        Commands::Classify { file } => cli::classify::run(file),
    }
}
