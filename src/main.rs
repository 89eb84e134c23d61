use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use fbsweep::logging::{self, Verbosity};

mod commands;

#[derive(Parser)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about = "Query-expansion parameter sweeps against a remote evaluation service", long_about = None)]
struct Cli {
    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every batch, then re-evaluate everything into the report
    Run {
        /// Config file (default: ./fbsweep.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Re-evaluate existing output files into the report without running the scorer
    Report {
        /// Config file (default: ./fbsweep.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Submit a single ranking file and print its metrics
    Submit {
        /// Ranking file to upload
        file: PathBuf,

        /// Config file (default: ./fbsweep.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output results as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Write a default fbsweep.toml
    Init {
        /// Where to write the config
        #[arg(default_value = fbsweep::config::CONFIG_FILE)]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(Verbosity::from_flags(cli.verbose, cli.quiet));

    match cli.command {
        Commands::Run { config } => {
            commands::run::execute(config.as_deref())?;
        }
        Commands::Report { config } => {
            commands::report::execute(config.as_deref())?;
        }
        Commands::Submit { file, config, json } => {
            commands::submit::execute(&file, config.as_deref(), json)?;
        }
        Commands::Init { path, force } => {
            commands::init::execute(&path, force)?;
        }
    }

    Ok(())
}
