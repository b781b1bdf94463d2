//! Fault injection and call counting for remote ledgers.

use async_trait::async_trait;
use finsync_engine::{RemoteLedger, SyncError, SyncResult};
use finsync_model::{EntityKind, WireRecord};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};

/// Calls observed by an [`InstrumentedRemote`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallCounts {
    /// Upsert calls per kind.
    pub upserts: HashMap<EntityKind, u64>,
    /// Fetch calls per kind.
    pub fetches: HashMap<EntityKind, u64>,
}

impl CallCounts {
    /// Total number of calls.
    pub fn total(&self) -> u64 {
        self.upserts.values().sum::<u64>() + self.fetches.values().sum::<u64>()
    }

    /// Upsert calls for one kind.
    pub fn upserts_of(&self, kind: EntityKind) -> u64 {
        self.upserts.get(&kind).copied().unwrap_or(0)
    }

    /// Fetch calls for one kind.
    pub fn fetches_of(&self, kind: EntityKind) -> u64 {
        self.fetches.get(&kind).copied().unwrap_or(0)
    }
}

/// Wraps a remote ledger to count calls and inject failures.
///
/// Every call is counted before any failure is injected. While the gate is
/// closed, calls wait until it opens.
pub struct InstrumentedRemote<R: RemoteLedger> {
    inner: R,
    counts: Mutex<CallCounts>,
    failing_fetches: Mutex<HashSet<EntityKind>>,
    failing_upserts: Mutex<HashSet<String>>,
    disconnected: AtomicBool,
    gate: Arc<RwLock<()>>,
    closed_gate: Mutex<Option<OwnedRwLockWriteGuard<()>>>,
}

impl<R: RemoteLedger> InstrumentedRemote<R> {
    /// Wraps `inner`.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            counts: Mutex::new(CallCounts::default()),
            failing_fetches: Mutex::new(HashSet::new()),
            failing_upserts: Mutex::new(HashSet::new()),
            disconnected: AtomicBool::new(false),
            gate: Arc::new(RwLock::new(())),
            closed_gate: Mutex::new(None),
        }
    }

    /// Returns the wrapped ledger.
    pub fn inner(&self) -> &R {
        &self.inner
    }

    /// Returns a snapshot of the call counts.
    pub fn counts(&self) -> CallCounts {
        self.counts.lock().clone()
    }

    /// Resets the call counts.
    pub fn reset_counts(&self) {
        *self.counts.lock() = CallCounts::default();
    }

    /// Makes every fetch of `kind` fail with a server error.
    pub fn fail_fetches_of(&self, kind: EntityKind) {
        self.failing_fetches.lock().insert(kind);
    }

    /// Makes every upsert of record `id` fail with a rejection.
    pub fn fail_upserts_of(&self, id: impl Into<String>) {
        self.failing_upserts.lock().insert(id.into());
    }

    /// Removes all injected failures.
    pub fn heal(&self) {
        self.failing_fetches.lock().clear();
        self.failing_upserts.lock().clear();
        self.disconnected.store(false, Ordering::SeqCst);
    }

    /// Reports the ledger as unreachable.
    pub fn disconnect(&self) {
        self.disconnected.store(true, Ordering::SeqCst);
    }

    /// Holds every subsequent call until [`InstrumentedRemote::open_gate`].
    ///
    /// Returns false if calls are in flight and the gate could not close.
    pub fn close_gate(&self) -> bool {
        let mut closed = self.closed_gate.lock();
        if closed.is_some() {
            return true;
        }
        match Arc::clone(&self.gate).try_write_owned() {
            Ok(guard) => {
                *closed = Some(guard);
                true
            }
            Err(_) => false,
        }
    }

    /// Releases held calls.
    pub fn open_gate(&self) {
        self.closed_gate.lock().take();
    }

    async fn pass_gate(&self) {
        drop(self.gate.read().await);
    }
}

#[async_trait]
impl<R: RemoteLedger> RemoteLedger for InstrumentedRemote<R> {
    async fn upsert(
        &self,
        user_id: &str,
        kind: EntityKind,
        id: &str,
        record: WireRecord,
    ) -> SyncResult<()> {
        *self.counts.lock().upserts.entry(kind).or_default() += 1;
        self.pass_gate().await;

        if self.failing_upserts.lock().contains(id) {
            return Err(SyncError::Rejected {
                kind,
                id: id.to_string(),
                reason: "injected failure".into(),
            });
        }
        self.inner.upsert(user_id, kind, id, record).await
    }

    async fn fetch_all(&self, user_id: &str, kind: EntityKind) -> SyncResult<Vec<WireRecord>> {
        *self.counts.lock().fetches.entry(kind).or_default() += 1;
        self.pass_gate().await;

        if self.failing_fetches.lock().contains(&kind) {
            return Err(SyncError::Server(format!("injected {kind} fetch failure")));
        }
        self.inner.fetch_all(user_id, kind).await
    }

    fn is_connected(&self) -> bool {
        !self.disconnected.load(Ordering::SeqCst) && self.inner.is_connected()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use finsync_engine::MemoryRemoteLedger;
    use std::time::Duration;

    #[tokio::test]
    async fn counts_calls_per_kind() {
        let remote = InstrumentedRemote::new(MemoryRemoteLedger::new());
        remote
            .upsert("u", EntityKind::Goal, "g1", WireRecord::new().with("id", "g1"))
            .await
            .unwrap();
        remote.fetch_all("u", EntityKind::Goal).await.unwrap();
        remote.fetch_all("u", EntityKind::Budget).await.unwrap();

        let counts = remote.counts();
        assert_eq!(counts.upserts_of(EntityKind::Goal), 1);
        assert_eq!(counts.fetches_of(EntityKind::Goal), 1);
        assert_eq!(counts.fetches_of(EntityKind::Budget), 1);
        assert_eq!(counts.total(), 3);
    }

    #[tokio::test]
    async fn injected_failures() {
        let remote = InstrumentedRemote::new(MemoryRemoteLedger::new());
        remote.fail_fetches_of(EntityKind::Budget);
        remote.fail_upserts_of("g1");

        assert!(remote.fetch_all("u", EntityKind::Budget).await.is_err());
        assert!(remote.fetch_all("u", EntityKind::Goal).await.is_ok());
        assert!(remote
            .upsert("u", EntityKind::Goal, "g1", WireRecord::new())
            .await
            .is_err());

        remote.heal();
        assert!(remote.fetch_all("u", EntityKind::Budget).await.is_ok());
    }

    #[tokio::test]
    async fn gate_holds_calls() {
        let remote = Arc::new(InstrumentedRemote::new(MemoryRemoteLedger::new()));
        assert!(remote.close_gate());

        let held = tokio::time::timeout(
            Duration::from_millis(20),
            remote.fetch_all("u", EntityKind::Goal),
        )
        .await;
        assert!(held.is_err());

        remote.open_gate();
        assert!(remote.fetch_all("u", EntityKind::Goal).await.is_ok());
    }

    #[test]
    fn disconnect() {
        let remote = InstrumentedRemote::new(MemoryRemoteLedger::new());
        remote.disconnect();
        assert!(!remote.is_connected());
        remote.heal();
        assert!(remote.is_connected());
    }
}
