//! # finsync engine
//!
//! Bidirectional synchronization between a local entity store and a remote
//! ledger, for the four finsync collections.
//!
//! This crate provides:
//! - Local store and remote ledger traits, with in-memory implementations
//! - An HTTP remote ledger speaking CBOR, plus a loopback client for tests
//! - The generic two-phase [`Reconciler`]
//! - The [`SyncOrchestrator`] with its single-flight guard
//! - A replayable [`SyncState`] stream
//!
//! ## Architecture
//!
//! Each run reconciles ledger entries, budgets, goals and categories, in
//! that order. Per entity type it follows a **push-then-pull** model:
//! 1. Push dirty local records (`is_synced == false`) and mark them synced
//! 2. Fetch the remote collection
//! 3. Apply last-write-wins against a fresh read of the local store
//!
//! ## Key Invariants
//!
//! - At most one run is active; a trigger during a run is dropped
//! - A local record is overwritten only by a strictly newer remote record
//! - A failure for one record or one entity type never fails the run
//! - Default categories are never inserted or overwritten by pull
//! - Deletions are not propagated in either direction

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod http;
mod orchestrator;
mod reconciler;
mod remote;
mod session;
mod store;
mod stream;

pub use config::{RetryConfig, SyncConfig};
pub use error::{SyncError, SyncResult};
pub use http::{HttpClient, HttpRemoteLedger, LoopbackClient, LoopbackServer};
pub use orchestrator::{Clock, LocalStores, SyncOrchestrator, SyncReport, SystemClock};
pub use reconciler::{ReconcileResult, ReconcileStep, Reconciler};
pub use remote::{LedgerSnapshot, MemoryRemoteLedger, RemoteLedger};
pub use session::{MemorySession, SessionProvider};
pub use store::{EntityStore, MemoryEntityStore};
pub use stream::{SyncState, SyncStatePublisher, SyncStateReceiver};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
