//! Remote ledger abstraction.

use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use finsync_model::{EntityKind, FetchRequest, FetchResponse, UpsertRequest, WireRecord};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// The remote multi-device store.
///
/// Documents live in per-user, per-kind collections addressed by entity id.
/// This trait abstracts the network layer, allowing for different
/// implementations (HTTP, in-memory for testing, etc.).
#[async_trait]
pub trait RemoteLedger: Send + Sync {
    /// Upsert-merges a document.
    ///
    /// Fields absent from `record` are left untouched on the remote side.
    async fn upsert(
        &self,
        user_id: &str,
        kind: EntityKind,
        id: &str,
        record: WireRecord,
    ) -> SyncResult<()>;

    /// Fetches every document of a user's collection.
    async fn fetch_all(&self, user_id: &str, kind: EntityKind) -> SyncResult<Vec<WireRecord>>;

    /// Checks if the remote is reachable.
    fn is_connected(&self) -> bool {
        true
    }
}

#[async_trait]
impl<R: RemoteLedger + ?Sized> RemoteLedger for Arc<R> {
    async fn upsert(
        &self,
        user_id: &str,
        kind: EntityKind,
        id: &str,
        record: WireRecord,
    ) -> SyncResult<()> {
        (**self).upsert(user_id, kind, id, record).await
    }

    async fn fetch_all(&self, user_id: &str, kind: EntityKind) -> SyncResult<Vec<WireRecord>> {
        (**self).fetch_all(user_id, kind).await
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }
}

type CollectionKey = (String, EntityKind);

/// Every document of a ledger, keyed by user, kind and entity id.
pub type LedgerSnapshot = BTreeMap<String, BTreeMap<EntityKind, BTreeMap<String, WireRecord>>>;

/// An in-memory remote ledger.
///
/// Used by tests and the CLI, and as the backing store of the loopback HTTP
/// server.
#[derive(Default)]
pub struct MemoryRemoteLedger {
    collections: RwLock<HashMap<CollectionKey, BTreeMap<String, WireRecord>>>,
    disconnected: AtomicBool,
}

impl MemoryRemoteLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges a document into a collection.
    pub fn put_document(&self, user_id: &str, kind: EntityKind, id: &str, record: WireRecord) {
        let mut collections = self.collections.write();
        let docs = collections
            .entry((user_id.to_string(), kind))
            .or_default();
        docs.entry(id.to_string()).or_default().merge(&record);
    }

    /// Returns one document.
    pub fn document(&self, user_id: &str, kind: EntityKind, id: &str) -> Option<WireRecord> {
        self.collections
            .read()
            .get(&(user_id.to_string(), kind))
            .and_then(|docs| docs.get(id).cloned())
    }

    /// Returns every document of a collection, in id order.
    pub fn documents(&self, user_id: &str, kind: EntityKind) -> Vec<WireRecord> {
        self.collections
            .read()
            .get(&(user_id.to_string(), kind))
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns the number of documents in a collection.
    pub fn document_count(&self, user_id: &str, kind: EntityKind) -> usize {
        self.collections
            .read()
            .get(&(user_id.to_string(), kind))
            .map_or(0, BTreeMap::len)
    }

    /// Creates a ledger holding the documents of `snapshot`.
    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Self {
        let ledger = Self::new();
        {
            let mut collections = ledger.collections.write();
            for (user_id, kinds) in snapshot {
                for (kind, docs) in kinds {
                    collections.insert((user_id.clone(), kind), docs);
                }
            }
        }
        ledger
    }

    /// Copies out every non-empty collection.
    pub fn snapshot(&self) -> LedgerSnapshot {
        let mut snapshot = LedgerSnapshot::new();
        for ((user_id, kind), docs) in self.collections.read().iter() {
            if docs.is_empty() {
                continue;
            }
            snapshot
                .entry(user_id.clone())
                .or_default()
                .insert(*kind, docs.clone());
        }
        snapshot
    }

    /// Sets the connected state.
    pub fn set_connected(&self, connected: bool) {
        self.disconnected.store(!connected, Ordering::SeqCst);
    }

    /// Applies an upsert request.
    pub fn apply_upsert(&self, request: &UpsertRequest) {
        self.put_document(&request.user_id, request.kind, &request.id, request.record.clone());
    }

    /// Serves a fetch request.
    pub fn apply_fetch(&self, request: &FetchRequest) -> FetchResponse {
        FetchResponse::new(self.documents(&request.user_id, request.kind))
    }
}

#[async_trait]
impl RemoteLedger for MemoryRemoteLedger {
    async fn upsert(
        &self,
        user_id: &str,
        kind: EntityKind,
        id: &str,
        record: WireRecord,
    ) -> SyncResult<()> {
        if !self.is_connected() {
            return Err(SyncError::NotConnected);
        }
        self.put_document(user_id, kind, id, record);
        Ok(())
    }

    async fn fetch_all(&self, user_id: &str, kind: EntityKind) -> SyncResult<Vec<WireRecord>> {
        if !self.is_connected() {
            return Err(SyncError::NotConnected);
        }
        Ok(self.documents(user_id, kind))
    }

    fn is_connected(&self) -> bool {
        !self.disconnected.load(Ordering::SeqCst)
    }
}
