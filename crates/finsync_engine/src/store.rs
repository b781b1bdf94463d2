//! Local entity store abstraction.

use crate::error::SyncResult;
use async_trait::async_trait;
use finsync_model::SyncableEntity;
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// The local durable store for one entity type.
///
/// Implementations must upsert by id: at most one record per id exists at any
/// time. No cross-type transactions are required. The store owns no sync
/// logic; the reconciler is the only caller of [`EntityStore::mark_synced`].
#[async_trait]
pub trait EntityStore<E: SyncableEntity>: Send + Sync {
    /// Returns every local record.
    async fn get_all(&self) -> SyncResult<Vec<E>>;

    /// Returns records with `is_synced == false`.
    async fn get_unsynced(&self) -> SyncResult<Vec<E>>;

    /// Inserts or replaces the record with the entity's id.
    async fn upsert(&self, entity: E) -> SyncResult<()>;

    /// Sets `is_synced = true` on the record with this id. Unknown ids are ignored.
    async fn mark_synced(&self, id: &str) -> SyncResult<()>;

    /// Removes the record with this id. Unknown ids are ignored.
    async fn delete(&self, id: &str) -> SyncResult<()>;
}

/// An in-memory entity store.
///
/// Records are kept in id order, so `get_all` is deterministic.
pub struct MemoryEntityStore<E: SyncableEntity> {
    records: RwLock<BTreeMap<String, E>>,
}

impl<E: SyncableEntity> MemoryEntityStore<E> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
        }
    }

    /// Creates a store holding the given records.
    pub fn with_records(records: impl IntoIterator<Item = E>) -> Self {
        let store = Self::new();
        {
            let mut map = store.records.write();
            for record in records {
                map.insert(record.id().to_string(), record);
            }
        }
        store
    }

    /// Writes a record directly, the way a UI-triggered local write would.
    pub fn put(&self, entity: E) {
        self.records.write().insert(entity.id().to_string(), entity);
    }

    /// Returns the record with this id.
    pub fn get(&self, id: &str) -> Option<E> {
        self.records.read().get(id).cloned()
    }

    /// Returns all records in id order.
    pub fn snapshot(&self) -> Vec<E> {
        self.records.read().values().cloned().collect()
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Returns true if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Returns the number of records awaiting push.
    pub fn unsynced_count(&self) -> usize {
        self.records.read().values().filter(|e| !e.is_synced()).count()
    }
}

impl<E: SyncableEntity> Default for MemoryEntityStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E: SyncableEntity> EntityStore<E> for MemoryEntityStore<E> {
    async fn get_all(&self) -> SyncResult<Vec<E>> {
        Ok(self.snapshot())
    }

    async fn get_unsynced(&self) -> SyncResult<Vec<E>> {
        Ok(self
            .records
            .read()
            .values()
            .filter(|e| !e.is_synced())
            .cloned()
            .collect())
    }

    async fn upsert(&self, entity: E) -> SyncResult<()> {
        self.put(entity);
        Ok(())
    }

    async fn mark_synced(&self, id: &str) -> SyncResult<()> {
        if let Some(record) = self.records.write().get_mut(id) {
            record.set_synced(true);
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> SyncResult<()> {
        self.records.write().remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use finsync_model::{Goal, SyncableEntity};

    fn goal(id: &str, synced: bool) -> Goal {
        let mut g = Goal::new(id, 1_000, 0);
        g.id = id.into();
        g.is_synced = synced;
        g
    }

    #[tokio::test]
    async fn upsert_replaces_by_id() {
        let store = MemoryEntityStore::new();
        store.upsert(goal("g1", false)).await.unwrap();

        let mut updated = goal("g1", false);
        updated.name = "renamed".into();
        store.upsert(updated).await.unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("g1").unwrap().name, "renamed");
    }

    #[tokio::test]
    async fn unsynced_filter() {
        let store = MemoryEntityStore::with_records([
            goal("g1", false),
            goal("g2", true),
            goal("g3", false),
        ]);

        let ids: Vec<String> = store
            .get_unsynced()
            .await
            .unwrap()
            .into_iter()
            .map(|g| g.id)
            .collect();
        assert_eq!(ids, vec!["g1".to_string(), "g3".to_string()]);
        assert_eq!(store.unsynced_count(), 2);
    }

    #[tokio::test]
    async fn mark_synced_preserves_fields() {
        let store = MemoryEntityStore::with_records([goal("g1", false)]);
        let before = store.get("g1").unwrap();

        store.mark_synced("g1").await.unwrap();
        store.mark_synced("missing").await.unwrap();

        let after = store.get("g1").unwrap();
        assert!(after.is_synced());
        assert_eq!(after, before.into_synced());
    }

    #[tokio::test]
    async fn delete_is_local_only() {
        let store = MemoryEntityStore::with_records([goal("g1", true), goal("g2", true)]);
        store.delete("g1").await.unwrap();
        store.delete("g1").await.unwrap();
        assert!(store.get("g1").is_none());
        assert_eq!(store.len(), 1);
    }
}
