//! Entity adapters: stateless mapping between entities and wire records.

use crate::entity::{EntityKind, SyncableEntity, Timestamp};
use crate::error::ModelResult;
use crate::wire::WireRecord;

/// Which local records the push phase sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushScope {
    /// Only records with `is_synced == false`.
    Unsynced,
    /// Every local record, every run.
    All,
}

/// Maps one entity type to and from its remote wire form.
///
/// Adapters hold no state. Besides the mapping they carry the few policy
/// knobs in which entity types differ during reconciliation; the defaults
/// describe ordinary user-owned records.
pub trait EntityAdapter: Send + Sync + 'static {
    /// The in-memory entity type.
    type Entity: SyncableEntity;

    /// Encodes an entity for the remote ledger. `is_synced` is not included.
    fn to_wire(&self, entity: &Self::Entity) -> WireRecord;

    /// Decodes a remote document. The result is always marked synced.
    fn from_wire(&self, record: &WireRecord) -> ModelResult<Self::Entity>;

    /// The collection handled by this adapter.
    fn kind(&self) -> EntityKind {
        <Self::Entity as SyncableEntity>::KIND
    }

    /// Identity key of an entity.
    fn id_of<'a>(&self, entity: &'a Self::Entity) -> &'a str {
        entity.id()
    }

    /// Conflict-resolution timestamp of an entity.
    fn updated_at_of(&self, entity: &Self::Entity) -> Timestamp {
        entity.updated_at()
    }

    /// Which local records the push phase sends.
    fn push_scope(&self) -> PushScope {
        PushScope::Unsynced
    }

    /// Whether a remote record unknown locally may be inserted.
    fn admits_remote_insert(&self, _remote: &Self::Entity) -> bool {
        true
    }

    /// Whether a local record must never be overwritten by the pull phase.
    fn protects_local(&self, _local: &Self::Entity) -> bool {
        false
    }
}
