//! finsync CLI
//!
//! Runs the sync engine against JSON snapshots of a device and a remote
//! ledger.
//!
//! # Commands
//!
//! - `sync` - Run one sync between a local and a remote snapshot
//! - `version` - Show version information

mod commands;

use clap::{Parser, Subcommand};
use commands::sync::SyncOptions;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// finsync command-line sync runner.
#[derive(Parser)]
#[command(name = "finsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one sync between a local and a remote snapshot
    Sync {
        /// Path to the local snapshot (JSON)
        #[arg(short, long)]
        local: PathBuf,

        /// Path to the remote ledger snapshot (JSON, created if missing)
        #[arg(short, long)]
        remote: PathBuf,

        /// Signed-in user id
        #[arg(short, long)]
        user: String,

        /// Per-call timeout in milliseconds
        #[arg(short, long)]
        timeout_ms: Option<u64>,

        /// Dry run - sync in memory without writing the snapshots back
        #[arg(short, long)]
        dry_run: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Sync {
            local,
            remote,
            user,
            timeout_ms,
            dry_run,
            format,
        } => {
            let options = SyncOptions {
                local,
                remote,
                user,
                timeout: timeout_ms.map(Duration::from_millis),
                dry_run,
            };
            commands::sync::run(&options, &format)?;
        }
        Commands::Version => {
            println!("finsync CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("finsync engine v{}", finsync_engine::VERSION);
        }
    }

    Ok(())
}
