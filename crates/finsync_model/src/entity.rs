//! Entity kinds and the syncable-entity capability.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Wall-clock milliseconds since the Unix epoch.
pub type Timestamp = i64;

/// Returns the current wall-clock time in milliseconds.
pub fn now_millis() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as Timestamp)
        .unwrap_or_default()
}

/// Generates a fresh entity id.
pub fn new_entity_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// The four synchronized collections.
///
/// Declaration order is the orchestrator's run order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    /// Income and expense entries.
    #[serde(rename = "transactions")]
    LedgerEntry,
    /// Spending limits per category.
    #[serde(rename = "budgets")]
    Budget,
    /// Savings goals.
    #[serde(rename = "goals")]
    Goal,
    /// Entry categories.
    #[serde(rename = "categories")]
    Category,
}

impl EntityKind {
    /// All kinds, in run order.
    pub const ALL: [EntityKind; 4] = [
        EntityKind::LedgerEntry,
        EntityKind::Budget,
        EntityKind::Goal,
        EntityKind::Category,
    ];

    /// Name of the remote collection holding this kind.
    pub fn collection(&self) -> &'static str {
        match self {
            EntityKind::LedgerEntry => "transactions",
            EntityKind::Budget => "budgets",
            EntityKind::Goal => "goals",
            EntityKind::Category => "categories",
        }
    }

    /// Looks a kind up by remote collection name.
    pub fn from_collection(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.collection() == name)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection())
    }
}

/// An entity the reconciler can synchronize.
///
/// `is_synced` is local-only state: it is never written to the wire, and
/// anything decoded from the wire is synced by construction.
pub trait SyncableEntity: Clone + fmt::Debug + Send + Sync + 'static {
    /// The collection this entity belongs to.
    const KIND: EntityKind;

    /// Stable id shared by local and remote copies.
    fn id(&self) -> &str;

    /// Last mutation time; the only conflict-resolution signal.
    fn updated_at(&self) -> Timestamp;

    /// Sets the last mutation time.
    fn set_updated_at(&mut self, at: Timestamp);

    /// Whether the local copy has been acknowledged by the remote.
    fn is_synced(&self) -> bool;

    /// Sets the acknowledged flag.
    fn set_synced(&mut self, synced: bool);

    /// Returns this entity with `is_synced = true`, other fields unchanged.
    #[must_use]
    fn into_synced(mut self) -> Self {
        self.set_synced(true);
        self
    }

    /// Records a local mutation: bumps `updated_at` and marks the entity dirty.
    fn touch(&mut self, at: Timestamp) {
        self.set_updated_at(at);
        self.set_synced(false);
    }
}
