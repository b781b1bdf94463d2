//! Sync orchestrator.
//!
//! Runs one [`Reconciler`] per entity type in a fixed order, guards against
//! overlapping runs and publishes the resulting [`SyncState`].

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::reconciler::{ReconcileResult, ReconcileStep, Reconciler};
use crate::remote::RemoteLedger;
use crate::session::SessionProvider;
use crate::store::EntityStore;
use crate::stream::{SyncState, SyncStatePublisher, SyncStateReceiver};
use finsync_model::{
    now_millis, Budget, BudgetAdapter, Category, CategoryAdapter, EntityKind, Goal, GoalAdapter,
    LedgerEntry, LedgerEntryAdapter, Timestamp,
};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Source of completion timestamps.
pub trait Clock: Send + Sync {
    /// Current wall-clock time in milliseconds.
    fn now(&self) -> Timestamp;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        now_millis()
    }
}

/// The four local stores, one per entity type.
#[derive(Clone)]
pub struct LocalStores {
    /// Ledger entries.
    pub ledger_entries: Arc<dyn EntityStore<LedgerEntry>>,
    /// Budgets.
    pub budgets: Arc<dyn EntityStore<Budget>>,
    /// Savings goals.
    pub goals: Arc<dyn EntityStore<Goal>>,
    /// Categories.
    pub categories: Arc<dyn EntityStore<Category>>,
}

/// Outcome of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
    /// Per-type results, in run order. Empty if the run failed before any
    /// reconciliation.
    pub results: Vec<ReconcileResult>,
    /// Sum of the per-type counts.
    pub items_synced: u64,
    /// Run-level failure, if any.
    pub error: Option<SyncError>,
    /// The state published at the end of the run.
    pub state: SyncState,
}

impl SyncReport {
    /// Returns the result for one entity type.
    pub fn result(&self, kind: EntityKind) -> Option<&ReconcileResult> {
        self.results.iter().find(|r| r.kind == kind)
    }

    /// Returns true if the run reached every entity type.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Drives sync runs and owns the state stream.
pub struct SyncOrchestrator {
    session: Arc<dyn SessionProvider>,
    remote: Arc<dyn RemoteLedger>,
    steps: Vec<Box<dyn ReconcileStep>>,
    publisher: SyncStatePublisher,
    clock: Arc<dyn Clock>,
    runtime: Option<Handle>,
}

impl SyncOrchestrator {
    /// Creates an orchestrator over the given collaborators.
    pub fn new(
        config: SyncConfig,
        session: Arc<dyn SessionProvider>,
        remote: Arc<dyn RemoteLedger>,
        stores: LocalStores,
    ) -> Self {
        let steps: Vec<Box<dyn ReconcileStep>> = vec![
            Box::new(Reconciler::new(
                LedgerEntryAdapter,
                stores.ledger_entries,
                Arc::clone(&remote),
                config.clone(),
            )),
            Box::new(Reconciler::new(
                BudgetAdapter,
                stores.budgets,
                Arc::clone(&remote),
                config.clone(),
            )),
            Box::new(Reconciler::new(
                GoalAdapter,
                stores.goals,
                Arc::clone(&remote),
                config.clone(),
            )),
            Box::new(Reconciler::new(
                CategoryAdapter,
                stores.categories,
                Arc::clone(&remote),
                config,
            )),
        ];
        debug_assert!(steps.iter().map(|s| s.kind()).eq(EntityKind::ALL));

        Self {
            session,
            remote,
            steps,
            publisher: SyncStatePublisher::new(),
            clock: Arc::new(SystemClock),
            runtime: None,
        }
    }

    /// Replaces the completion clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Runs background syncs on `handle` instead of the caller's runtime.
    pub fn with_runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// Subscribes to the state stream.
    pub fn subscribe(&self) -> SyncStateReceiver {
        self.publisher.subscribe()
    }

    /// Returns the current state.
    pub fn state(&self) -> SyncState {
        self.publisher.current()
    }

    /// Starts a run in the background.
    ///
    /// Returns `None` without starting anything if a run is already in
    /// progress. The syncing state is published before this returns.
    pub fn sync_all(self: &Arc<Self>) -> Option<JoinHandle<SyncReport>> {
        if !self.publisher.try_begin() {
            debug!("sync already in progress");
            return None;
        }
        // Owned by the task from here on, so a task that is never polled
        // still ends the run when it is dropped.
        let mut guard = RunGuard::new(self.publisher.clone());

        let Some(handle) = self.runtime.clone().or_else(|| Handle::try_current().ok()) else {
            let err = SyncError::NoRuntime;
            error!(error = %err, "sync failed");
            guard.finish(SyncState::failed(err.to_string()));
            return None;
        };

        let this = Arc::clone(self);
        Some(handle.spawn(async move { this.run(guard).await }))
    }

    /// Runs a sync on the current task and returns its report.
    ///
    /// Returns `None` if a run is already in progress.
    pub async fn sync_now(&self) -> Option<SyncReport> {
        if !self.publisher.try_begin() {
            debug!("sync already in progress");
            return None;
        }
        let guard = RunGuard::new(self.publisher.clone());
        Some(self.run(guard).await)
    }

    /// Resets the state stream to idle. Ignored while a run is in progress.
    pub fn clear_sync_state(&self) {
        if !self.publisher.reset_if_idle() {
            debug!("sync in progress, state not cleared");
        }
    }

    fn preflight(&self) -> SyncResult<String> {
        let user_id = self
            .session
            .current_user()
            .ok_or(SyncError::NotAuthenticated)?;
        if !self.remote.is_connected() {
            return Err(SyncError::NotConnected);
        }
        Ok(user_id)
    }

    /// Body of a run. The syncing state has already been published.
    async fn run(&self, mut guard: RunGuard) -> SyncReport {
        let user_id = match self.preflight() {
            Ok(user_id) => user_id,
            Err(err) => {
                error!(error = %err, "sync failed");
                let state = SyncState::failed(err.to_string());
                guard.finish(state.clone());
                return SyncReport {
                    results: Vec::new(),
                    items_synced: 0,
                    error: Some(err),
                    state,
                };
            }
        };

        info!(user_id = %user_id, "sync started");
        let mut results = Vec::with_capacity(self.steps.len());
        let mut total = 0u64;
        for step in &self.steps {
            let result = step.reconcile(&user_id).await;
            total += result.count();
            results.push(result);
        }

        let state = SyncState::completed(self.clock.now(), total);
        guard.finish(state.clone());
        info!(count = total, "sync completed");

        SyncReport {
            results,
            items_synced: total,
            error: None,
            state,
        }
    }
}

/// Publishes a failure if a run ends without publishing its final state,
/// e.g. when the run's future or its unpolled task is dropped.
struct RunGuard {
    publisher: SyncStatePublisher,
    finished: bool,
}

impl RunGuard {
    fn new(publisher: SyncStatePublisher) -> Self {
        Self {
            publisher,
            finished: false,
        }
    }

    fn finish(&mut self, state: SyncState) {
        self.publisher.publish(state);
        self.finished = true;
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if !self.finished {
            warn!("sync run abandoned");
            self.publisher
                .publish(SyncState::failed("sync run abandoned before completion"));
        }
    }
}
