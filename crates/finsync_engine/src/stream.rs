//! Observable sync state.
//!
//! A single current-value holder built on a `tokio::sync::watch` channel.
//! Subscribers see the latest state first, then each later state. Values
//! published faster than a subscriber polls are coalesced; there is no
//! history.

use finsync_model::Timestamp;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;

/// Snapshot of sync progress. Replaced wholesale on every transition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncState {
    /// Whether a run is in progress.
    pub is_syncing: bool,
    /// Completion time of the last successful run.
    pub last_sync_time: Option<Timestamp>,
    /// Message of the run-level failure that ended the last run.
    pub error: Option<String>,
    /// Records changed by the last run.
    pub items_synced: u64,
}

impl SyncState {
    /// The initial state: idle, never synced.
    pub fn idle() -> Self {
        Self::default()
    }

    /// A run is in progress.
    pub fn syncing() -> Self {
        Self {
            is_syncing: true,
            ..Self::default()
        }
    }

    /// A run finished at `at`, having changed `items_synced` records.
    pub fn completed(at: Timestamp, items_synced: u64) -> Self {
        Self {
            last_sync_time: Some(at),
            items_synced,
            ..Self::default()
        }
    }

    /// A run ended with a run-level failure.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }
}

/// Writing side of the state stream. Held by the orchestrator.
///
/// Clones publish to the same stream.
#[derive(Debug, Clone)]
pub struct SyncStatePublisher {
    tx: Arc<watch::Sender<SyncState>>,
}

impl SyncStatePublisher {
    /// Creates a publisher holding the idle state.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SyncState::idle());
        Self { tx: Arc::new(tx) }
    }

    /// Returns the current state.
    pub fn current(&self) -> SyncState {
        self.tx.borrow().clone()
    }

    /// Creates a new subscriber.
    pub fn subscribe(&self) -> SyncStateReceiver {
        SyncStateReceiver::new(self.tx.subscribe())
    }

    /// Publishes the syncing state unless a run is already in progress.
    ///
    /// The check and the transition happen under the channel's lock, so of
    /// two concurrent callers exactly one gets `true`.
    pub fn try_begin(&self) -> bool {
        self.tx.send_if_modified(|state| {
            if state.is_syncing {
                false
            } else {
                *state = SyncState::syncing();
                true
            }
        })
    }

    /// Replaces the current state.
    pub fn publish(&self, state: SyncState) {
        self.tx.send_replace(state);
    }

    /// Resets to the idle state. Returns false, leaving the state untouched,
    /// while a run is in progress.
    pub fn reset_if_idle(&self) -> bool {
        self.tx.send_if_modified(|state| {
            if state.is_syncing {
                false
            } else {
                *state = SyncState::idle();
                true
            }
        })
    }
}

impl Default for SyncStatePublisher {
    fn default() -> Self {
        Self::new()
    }
}

/// Reading side of the state stream.
#[derive(Debug, Clone)]
pub struct SyncStateReceiver {
    rx: watch::Receiver<SyncState>,
    replayed: bool,
}

impl SyncStateReceiver {
    fn new(rx: watch::Receiver<SyncState>) -> Self {
        Self {
            rx,
            replayed: false,
        }
    }

    /// Returns the latest state without waiting.
    pub fn latest(&self) -> SyncState {
        self.rx.borrow().clone()
    }

    /// Waits for the next state.
    ///
    /// The first call returns the current state immediately. Returns `None`
    /// once the publisher is gone and every published state has been seen.
    pub async fn next(&mut self) -> Option<SyncState> {
        if !self.replayed {
            self.replayed = true;
            return Some(self.rx.borrow_and_update().clone());
        }
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}
