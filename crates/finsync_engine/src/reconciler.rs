//! Two-phase reconciliation of one entity type.
//!
//! Phase 1 pushes dirty local records to the remote ledger. Phase 2 fetches
//! the remote collection and applies last-write-wins against a fresh read of
//! the local store. Failures below the entity-type level are absorbed and
//! counted; the caller only sees them through [`ReconcileResult`].

use crate::config::{RetryConfig, SyncConfig};
use crate::error::{SyncError, SyncResult};
use crate::remote::RemoteLedger;
use crate::store::EntityStore;
use async_trait::async_trait;
use finsync_model::{decide_pull, EntityAdapter, EntityKind, PullDecision, PushScope, SyncableEntity};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Outcome of reconciling one entity type.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileResult {
    /// Entity type reconciled.
    pub kind: EntityKind,
    /// Dirty local records acknowledged by the remote.
    pub pushed: u64,
    /// Remote records written locally.
    pub pulled: u64,
    /// Records whose push failed; they stay dirty.
    pub push_failures: u64,
    /// Remote documents that could not be decoded or written locally.
    pub skipped: u64,
    /// Error that cut the reconciliation short, if any.
    pub error: Option<SyncError>,
}

impl ReconcileResult {
    /// Creates an empty result.
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            pushed: 0,
            pulled: 0,
            push_failures: 0,
            skipped: 0,
            error: None,
        }
    }

    /// Number of changed records. Advisory: a record pushed and then pulled
    /// back in the same run counts twice.
    pub fn count(&self) -> u64 {
        self.pushed + self.pulled
    }

    /// Returns true if every phase ran to completion.
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// One entity type's reconciliation, erased over the adapter type.
#[async_trait]
pub trait ReconcileStep: Send + Sync {
    /// Entity type handled by this step.
    fn kind(&self) -> EntityKind;

    /// Runs push then pull for `user_id`.
    async fn reconcile(&self, user_id: &str) -> ReconcileResult;
}

/// Push-then-pull synchronization for the entity type of `A`.
pub struct Reconciler<A: EntityAdapter> {
    adapter: A,
    store: Arc<dyn EntityStore<A::Entity>>,
    remote: Arc<dyn RemoteLedger>,
    config: SyncConfig,
}

impl<A: EntityAdapter> Reconciler<A> {
    /// Creates a reconciler.
    pub fn new(
        adapter: A,
        store: Arc<dyn EntityStore<A::Entity>>,
        remote: Arc<dyn RemoteLedger>,
        config: SyncConfig,
    ) -> Self {
        Self {
            adapter,
            store,
            remote,
            config,
        }
    }

    /// Returns the adapter.
    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    async fn push(&self, user_id: &str, result: &mut ReconcileResult) -> SyncResult<()> {
        let kind = self.adapter.kind();
        let candidates = match self.adapter.push_scope() {
            PushScope::Unsynced => self.store.get_unsynced().await?,
            PushScope::All => self.store.get_all().await?,
        };
        // The cap bounds dirty records only.
        let (mut dirty, clean): (Vec<_>, Vec<_>) =
            candidates.into_iter().partition(|e| !e.is_synced());
        let cap = self.config.push_batch_size;
        if cap > 0 && dirty.len() > cap {
            debug!(kind = %kind, deferred = dirty.len() - cap, "push batch capped");
            dirty.truncate(cap);
        }

        for entity in dirty.into_iter().chain(clean) {
            let id = self.adapter.id_of(&entity);
            let record = self.adapter.to_wire(&entity);
            let outcome = call_remote(&self.config, || {
                self.remote.upsert(user_id, kind, id, record.clone())
            })
            .await;

            if let Err(e) = outcome {
                result.push_failures += 1;
                warn!(kind = %kind, id = %id, error = %e, "push failed, record stays dirty");
                continue;
            }
            if entity.is_synced() {
                continue;
            }
            match self.store.mark_synced(id).await {
                Ok(()) => {
                    result.pushed += 1;
                    debug!(kind = %kind, id = %id, "pushed record");
                }
                Err(e) => {
                    result.push_failures += 1;
                    warn!(kind = %kind, id = %id, error = %e, "pushed but not marked synced");
                }
            }
        }
        Ok(())
    }

    async fn pull(&self, user_id: &str, result: &mut ReconcileResult) -> SyncResult<()> {
        let kind = self.adapter.kind();
        let documents = call_remote(&self.config, || self.remote.fetch_all(user_id, kind)).await?;

        let mut local: HashMap<String, A::Entity> = self
            .store
            .get_all()
            .await?
            .into_iter()
            .map(|e| (self.adapter.id_of(&e).to_string(), e))
            .collect();

        for document in &documents {
            let remote = match self.adapter.from_wire(document) {
                Ok(entity) => entity.into_synced(),
                Err(e) => {
                    result.skipped += 1;
                    warn!(kind = %kind, error = %e, "skipping undecodable remote document");
                    continue;
                }
            };
            let id = self.adapter.id_of(&remote).to_string();

            let decision = decide_pull(&self.adapter, local.get(&id), &remote);
            if !decision.writes_local() {
                if decision == PullDecision::Suppress {
                    debug!(kind = %kind, id = %id, "remote record not admitted locally");
                }
                continue;
            }

            match self.store.upsert(remote.clone()).await {
                Ok(()) => {
                    result.pulled += 1;
                    debug!(kind = %kind, id = %id, ?decision, "pulled record");
                    local.insert(id, remote);
                }
                Err(e) => {
                    result.skipped += 1;
                    warn!(kind = %kind, id = %id, error = %e, "local write failed");
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl<A: EntityAdapter> ReconcileStep for Reconciler<A> {
    fn kind(&self) -> EntityKind {
        self.adapter.kind()
    }

    async fn reconcile(&self, user_id: &str) -> ReconcileResult {
        let kind = self.adapter.kind();
        let mut result = ReconcileResult::new(kind);

        if let Err(e) = self.push(user_id, &mut result).await {
            warn!(kind = %kind, error = %e, "push phase aborted");
            result.error = Some(e);
            return result;
        }

        if let Err(e) = self.pull(user_id, &mut result).await {
            warn!(kind = %kind, error = %e, count = result.count(), "pull phase aborted");
            result.error = Some(e);
            return result;
        }

        info!(
            kind = %kind,
            pushed = result.pushed,
            pulled = result.pulled,
            push_failures = result.push_failures,
            skipped = result.skipped,
            "reconciled"
        );
        result
    }
}

/// Runs one remote call under the configured timeout, retrying retryable
/// errors per the retry configuration.
async fn call_remote<T, F, Fut>(config: &SyncConfig, mut call: F) -> SyncResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = SyncResult<T>>,
{
    let retry: &RetryConfig = &config.retry;
    let mut attempt = 0;
    loop {
        if attempt > 0 {
            tokio::time::sleep(retry.delay_for_attempt(attempt)).await;
        }

        let outcome = with_timeout(config.timeout, call()).await;
        match outcome {
            Err(e) if e.is_retryable() && attempt + 1 < retry.max_attempts => {
                debug!(attempt, error = %e, "retrying remote call");
                attempt += 1;
            }
            other => return other,
        }
    }
}

async fn with_timeout<T>(
    timeout: Duration,
    fut: impl Future<Output = SyncResult<T>>,
) -> SyncResult<T> {
    match tokio::time::timeout(timeout, fut).await {
        Ok(outcome) => outcome,
        Err(_) => Err(SyncError::Timeout),
    }
}
