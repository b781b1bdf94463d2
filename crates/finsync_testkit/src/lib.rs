//! # finsync testkit
//!
//! Test utilities for finsync.
//!
//! This crate provides:
//! - Entity builders and default-category fixtures
//! - A [`SyncHarness`] wiring in-memory stores, a remote ledger and an
//!   orchestrator together
//! - An [`InstrumentedRemote`] that counts calls, injects failures and can
//!   hold calls at a gate
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use finsync_testkit::prelude::*;
//!
//! #[tokio::test]
//! async fn pushes_new_entry() {
//!     let harness = SyncHarness::new();
//!     harness.entries.put(entry("t1", 100, false));
//!     let report = harness.orchestrator.sync_now().await.unwrap();
//!     assert_eq!(report.items_synced, 1);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod faults;
pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::faults::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use faults::*;
pub use fixtures::*;
pub use generators::*;
