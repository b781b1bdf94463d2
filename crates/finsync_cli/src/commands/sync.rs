//! Sync command implementation.
//!
//! Loads a device snapshot and a remote ledger snapshot from JSON files, runs
//! one sync between them and writes both back.

use finsync_engine::{
    LedgerSnapshot, LocalStores, MemoryEntityStore, MemoryRemoteLedger, MemorySession,
    SyncConfig, SyncOrchestrator, SyncReport, SyncState,
};
use finsync_model::{Budget, Category, EntityKind, Goal, LedgerEntry};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Errors reported by the sync command.
#[derive(Error, Debug)]
pub enum SyncCommandError {
    /// A snapshot file could not be read or written.
    #[error("cannot access {path:?}: {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// A snapshot file is not valid JSON for its format.
    #[error("invalid snapshot {path:?}: {source}")]
    Json {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },

    /// The async runtime could not be started.
    #[error("cannot start runtime: {0}")]
    Runtime(std::io::Error),

    /// The run ended with a run-level failure.
    #[error("sync failed: {0}")]
    Failed(String),
}

/// One device's local records.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalSnapshot {
    /// Ledger entries.
    #[serde(default)]
    pub transactions: Vec<LedgerEntry>,
    /// Budgets.
    #[serde(default)]
    pub budgets: Vec<Budget>,
    /// Savings goals.
    #[serde(default)]
    pub goals: Vec<Goal>,
    /// Categories.
    #[serde(default)]
    pub categories: Vec<Category>,
}

/// Per-type counts of a finished run.
#[derive(Debug, Serialize)]
pub struct KindSummary {
    /// Remote collection name.
    pub kind: EntityKind,
    /// Records pushed.
    pub pushed: u64,
    /// Records pulled.
    pub pulled: u64,
    /// Records whose push failed.
    pub push_failures: u64,
    /// Remote documents skipped.
    pub skipped: u64,
    /// Error that stopped this type early.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Everything the command prints.
#[derive(Debug, Serialize)]
pub struct SyncOutput {
    /// Final published state.
    pub state: SyncState,
    /// Per-type counts, in run order.
    pub results: Vec<KindSummary>,
}

impl From<&SyncReport> for SyncOutput {
    fn from(report: &SyncReport) -> Self {
        Self {
            state: report.state.clone(),
            results: report
                .results
                .iter()
                .map(|r| KindSummary {
                    kind: r.kind,
                    pushed: r.pushed,
                    pulled: r.pulled,
                    push_failures: r.push_failures,
                    skipped: r.skipped,
                    error: r.error.as_ref().map(ToString::to_string),
                })
                .collect(),
        }
    }
}

/// Options for one invocation.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Local snapshot path.
    pub local: PathBuf,
    /// Remote snapshot path. A missing file is an empty ledger.
    pub remote: PathBuf,
    /// Signed-in user.
    pub user: String,
    /// Per-call timeout.
    pub timeout: Option<Duration>,
    /// Leave both files untouched.
    pub dry_run: bool,
}

/// Runs the sync command.
pub fn run(options: &SyncOptions, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let output = execute(options)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&output)?),
        _ => print_text_output(&output),
    }

    match output.state.error {
        Some(message) => Err(SyncCommandError::Failed(message).into()),
        None => Ok(()),
    }
}

/// Loads both snapshots, runs one sync and writes the snapshots back.
pub fn execute(options: &SyncOptions) -> Result<SyncOutput, SyncCommandError> {
    let local: LocalSnapshot = read_json(&options.local)?;
    let remote: LedgerSnapshot = if options.remote.exists() {
        read_json(&options.remote)?
    } else {
        debug!(path = ?options.remote, "remote snapshot missing, starting empty");
        LedgerSnapshot::new()
    };

    let entries = Arc::new(MemoryEntityStore::with_records(local.transactions));
    let budgets = Arc::new(MemoryEntityStore::with_records(local.budgets));
    let goals = Arc::new(MemoryEntityStore::with_records(local.goals));
    let categories = Arc::new(MemoryEntityStore::with_records(local.categories));
    let ledger = Arc::new(MemoryRemoteLedger::from_snapshot(remote));

    let mut config = SyncConfig::new(options.remote.display().to_string());
    if let Some(timeout) = options.timeout {
        config = config.with_timeout(timeout);
    }
    let stores = LocalStores {
        ledger_entries: entries.clone(),
        budgets: budgets.clone(),
        goals: goals.clone(),
        categories: categories.clone(),
    };
    let orchestrator = SyncOrchestrator::new(
        config,
        Arc::new(MemorySession::signed_in(options.user.clone())),
        ledger.clone(),
        stores,
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(SyncCommandError::Runtime)?;
    let report = runtime
        .block_on(orchestrator.sync_now())
        .ok_or_else(|| SyncCommandError::Failed("sync already in progress".into()))?;

    info!(
        user = %options.user,
        items = report.items_synced,
        success = report.is_success(),
        "sync finished"
    );

    if options.dry_run {
        info!("dry run, snapshots not written");
    } else {
        let local = LocalSnapshot {
            transactions: entries.snapshot(),
            budgets: budgets.snapshot(),
            goals: goals.snapshot(),
            categories: categories.snapshot(),
        };
        write_json(&options.local, &local)?;
        write_json(&options.remote, &ledger.snapshot())?;
    }

    Ok(SyncOutput::from(&report))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, SyncCommandError> {
    let text = fs::read_to_string(path).map_err(|source| SyncCommandError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| SyncCommandError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), SyncCommandError> {
    let text = serde_json::to_string_pretty(value).map_err(|source| SyncCommandError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, text).map_err(|source| SyncCommandError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn print_text_output(output: &SyncOutput) {
    match &output.state.error {
        None => println!("✓ Sync completed: {} items synced", output.state.items_synced),
        Some(message) => println!("✗ Sync failed: {}", message),
    }
    if let Some(at) = output.state.last_sync_time {
        println!("  Last sync time: {}", at);
    }

    for summary in &output.results {
        println!(
            "  {:<12} pushed {:>4}  pulled {:>4}  failed {:>4}  skipped {:>4}",
            summary.kind.collection(),
            summary.pushed,
            summary.pulled,
            summary.push_failures,
            summary.skipped
        );
        if let Some(error) = &summary.error {
            println!("    ✗ {}", error);
        }
    }
}
