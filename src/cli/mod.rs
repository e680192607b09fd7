//! CLI parser and command dispatch.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Settings;

#[derive(Parser)]
#[command(name = "rover")]
#[command(about = "Search-and-rescue rover telemetry dashboard")]
#[command(version)]
pub struct Cli {
    /// Data directory (overrides config file)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Config file path (default: roverwatch.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory and database
    Init,

    /// Start the dashboard server
    Serve {
        /// Address to bind to: PORT, HOST, or HOST:PORT (default: 127.0.0.1:5002)
        #[arg(default_value = "127.0.0.1:5002")]
        bind: String,
    },

    /// Start the minimal detection upload app
    Detector {
        /// Address to bind to: PORT, HOST, or HOST:PORT (default: 127.0.0.1:5001)
        #[arg(default_value = "127.0.0.1:5001")]
        bind: String,
    },

    /// Show database status and the latest reading
    Status,

    /// Insert synthetic telemetry readings for testing
    Simulate {
        /// Number of readings to generate
        #[arg(short = 'n', long, default_value = "1")]
        count: usize,
    },
}

/// Parse arguments and run the selected command.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref(), cli.data_dir.as_deref());

    match cli.command {
        Commands::Init => commands::cmd_init(&settings),
        Commands::Serve { bind } => commands::cmd_serve(&settings, &bind).await,
        Commands::Detector { bind } => commands::cmd_detector(&settings, &bind).await,
        Commands::Status => commands::cmd_status(&settings),
        Commands::Simulate { count } => commands::cmd_simulate(&settings, count),
    }
}
