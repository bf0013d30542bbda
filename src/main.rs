//! entrowatch - flag and quarantine high-entropy files
//!
//! # Usage
//!
//! ```bash
//! # Scan a tree once, moving suspicious files away
//! entrowatch scan --path /srv/share --threshold 7.2 --quarantine
//!
//! # Watch a directory until interrupted
//! entrowatch watch --dir /home/user/Documents
//!
//! # Dump the event log as a JSON array
//! entrowatch logs
//! ```

use clap::{Parser, Subcommand};
use entrowatch::eventlog::reader;
use entrowatch::{session, Config};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "entrowatch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "/etc/entrowatch/config.yaml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a folder or drive once and classify files by entropy
    Scan {
        /// Folder to scan
        #[arg(short, long)]
        path: PathBuf,

        /// Entropy threshold (default 7.0)
        #[arg(short, long)]
        threshold: Option<f64>,

        /// Quarantine suspicious files
        #[arg(short, long)]
        quarantine: bool,
    },

    /// Watch a directory for changes until interrupted
    Watch {
        /// Directory to watch
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Entropy threshold (default 7.5)
        #[arg(short, long)]
        threshold: Option<f64>,

        /// Quarantine suspicious files
        #[arg(short, long)]
        quarantine: bool,
    },

    /// Print the event log as a JSON array
    Logs,

    /// Show configuration
    Config,
}

fn setup_logging(verbose: bool) {
    let filter = if verbose { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let mut config = Config::load(&cli.config).unwrap_or_else(|e| {
        if cli.config.exists() {
            error!("Failed to load config: {}", e);
            std::process::exit(1);
        }
        info!("Using default configuration");
        Config::default()
    });

    match cli.command {
        Commands::Scan {
            path,
            threshold,
            quarantine,
        } => {
            if let Some(t) = threshold {
                config.detection.scan_threshold = t;
            }
            config.quarantine.enabled |= quarantine;
            session::run_scan(&config, &path)?;
        }

        Commands::Watch {
            dir,
            threshold,
            quarantine,
        } => {
            if let Some(d) = dir {
                config.watch.dir = d;
            }
            if let Some(t) = threshold {
                config.detection.watch_threshold = t;
            }
            config.quarantine.enabled |= quarantine;
            session::run_watch(&config).await?;
        }

        Commands::Logs => {
            let entries = reader::read_all(&config.log.file)?;
            println!("{}", reader::to_json(&entries)?);
        }

        Commands::Config => {
            println!("{}", serde_yaml::to_string(&config)?);
        }
    }

    Ok(())
}
