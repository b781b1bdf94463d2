//! # finsync model
//!
//! Syncable finance entities and their remote wire representation.
//!
//! This crate provides:
//! - The four syncable entity types (`LedgerEntry`, `Budget`, `Goal`, `Category`)
//! - `WireRecord`, the field map stored by the remote ledger
//! - `EntityAdapter`, the stateless mapping between the two
//! - Last-write-wins pull decisions
//! - CBOR request/response messages for the HTTP remote ledger
//!
//! This is a pure model crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod adapter;
mod budget;
mod category;
mod conflict;
mod entity;
mod error;
mod goal;
mod ledger_entry;
mod messages;
mod wire;

pub use adapter::{EntityAdapter, PushScope};
pub use budget::{Budget, BudgetAdapter, BudgetPeriod};
pub use category::{Category, CategoryAdapter};
pub use conflict::{decide_pull, last_write_wins, ConflictResolution, PullDecision};
pub use entity::{new_entity_id, now_millis, EntityKind, SyncableEntity, Timestamp};
pub use error::{ModelError, ModelResult};
pub use goal::{Goal, GoalAdapter};
pub use ledger_entry::{EntryType, LedgerEntry, LedgerEntryAdapter, PaymentMethod};
pub use messages::{FetchRequest, FetchResponse, UpsertRequest, UpsertResponse};
pub use wire::{WireRecord, WireValue};
