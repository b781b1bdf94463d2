//! Test fixtures and sync helpers.
//!
//! Provides entity builders with fixed ids and timestamps, and a harness
//! wiring in-memory stores and a remote ledger into an orchestrator.

use crate::faults::InstrumentedRemote;
use finsync_engine::{
    Clock, LocalStores, MemoryEntityStore, MemoryRemoteLedger, MemorySession, SyncConfig,
    SyncOrchestrator,
};
use finsync_model::{
    Budget, BudgetPeriod, Category, EntityAdapter, EntityKind, EntryType, Goal, LedgerEntry,
    SyncableEntity, Timestamp,
};
use std::sync::Arc;

/// User id used by the harness.
pub const TEST_USER: &str = "user-1";

/// Completion time reported by the harness clock.
pub const TEST_NOW: Timestamp = 1_700_000_000_000;

/// Builds a ledger entry with a fixed id and timestamp.
pub fn entry(id: &str, updated_at: Timestamp, is_synced: bool) -> LedgerEntry {
    let mut e = LedgerEntry::new("Groceries", 4_250, EntryType::Expense, "cat_food", 0);
    e.id = id.to_string();
    e.created_at = updated_at;
    e.updated_at = updated_at;
    e.is_synced = is_synced;
    e
}

/// Builds a budget with a fixed id and timestamp.
pub fn budget(id: &str, updated_at: Timestamp, is_synced: bool) -> Budget {
    let mut b = Budget::new("cat_food", 40_000, BudgetPeriod::Monthly, 0, 0);
    b.id = id.to_string();
    b.created_at = updated_at;
    b.updated_at = updated_at;
    b.is_synced = is_synced;
    b
}

/// Builds a savings goal with a fixed id and timestamp.
pub fn goal(id: &str, updated_at: Timestamp, is_synced: bool) -> Goal {
    let mut g = Goal::new("Emergency fund", 500_000, 0);
    g.id = id.to_string();
    g.created_at = updated_at;
    g.updated_at = updated_at;
    g.is_synced = is_synced;
    g
}

/// Builds a user-owned category with a fixed id and timestamp.
pub fn custom_category(id: &str, updated_at: Timestamp, is_synced: bool) -> Category {
    let mut c = Category::custom("Pets", "🐶", 0xFF8D_6E63, EntryType::Expense, TEST_USER);
    c.id = id.to_string();
    c.updated_at = updated_at;
    c.is_synced = is_synced;
    c
}

/// A few of the system-seeded default categories, as freshly installed.
pub fn default_categories() -> Vec<Category> {
    vec![
        Category::seeded("cat_food", "Food & Dining", "🍔", 0xFFFF_6B6B, EntryType::Expense),
        Category::seeded("cat_transport", "Transport", "🚗", 0xFF4E_CDC4, EntryType::Expense),
        Category::seeded("cat_rent", "Rent", "🏠", 0xFFE7_4C3C, EntryType::Expense),
        Category::seeded("cat_other_expense", "Other", "📦", 0xFF95_A5A6, EntryType::Expense),
        Category::seeded("cat_salary", "Salary", "💰", 0xFF27_AE60, EntryType::Income),
        Category::seeded("cat_freelance", "Freelance", "💼", 0xFF8E_44AD, EntryType::Income),
    ]
}

/// A clock frozen at [`TEST_NOW`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedClock;

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        TEST_NOW
    }
}

/// The remote type used by [`SyncHarness`].
pub type HarnessRemote = InstrumentedRemote<Arc<MemoryRemoteLedger>>;

/// In-memory stores, an instrumented remote ledger and an orchestrator.
pub struct SyncHarness {
    /// Local ledger entries.
    pub entries: Arc<MemoryEntityStore<LedgerEntry>>,
    /// Local budgets.
    pub budgets: Arc<MemoryEntityStore<Budget>>,
    /// Local goals.
    pub goals: Arc<MemoryEntityStore<Goal>>,
    /// Local categories.
    pub categories: Arc<MemoryEntityStore<Category>>,
    /// The remote ledger's documents.
    pub ledger: Arc<MemoryRemoteLedger>,
    /// The remote as seen by the orchestrator.
    pub remote: Arc<HarnessRemote>,
    /// The session, signed in as [`TEST_USER`].
    pub session: Arc<MemorySession>,
    /// The orchestrator under test.
    pub orchestrator: Arc<SyncOrchestrator>,
}

impl SyncHarness {
    /// Creates a harness with the default configuration.
    pub fn new() -> Self {
        Self::with_config(SyncConfig::default())
    }

    /// Creates a harness with `config`.
    pub fn with_config(config: SyncConfig) -> Self {
        Self::sharing_ledger(Arc::new(MemoryRemoteLedger::new()), config)
    }

    /// Creates a harness whose remote is `ledger`, so several harnesses can
    /// act as devices of one user.
    pub fn sharing_ledger(ledger: Arc<MemoryRemoteLedger>, config: SyncConfig) -> Self {
        let entries = Arc::new(MemoryEntityStore::new());
        let budgets = Arc::new(MemoryEntityStore::new());
        let goals = Arc::new(MemoryEntityStore::new());
        let categories = Arc::new(MemoryEntityStore::new());
        let remote = Arc::new(InstrumentedRemote::new(Arc::clone(&ledger)));
        let session = Arc::new(MemorySession::signed_in(TEST_USER));

        let stores = LocalStores {
            ledger_entries: entries.clone(),
            budgets: budgets.clone(),
            goals: goals.clone(),
            categories: categories.clone(),
        };
        let orchestrator = SyncOrchestrator::new(config, session.clone(), remote.clone(), stores)
            .with_clock(Arc::new(FixedClock));

        Self {
            entries,
            budgets,
            goals,
            categories,
            ledger,
            remote,
            session,
            orchestrator: Arc::new(orchestrator),
        }
    }

    /// Writes `entity` straight into the remote ledger for [`TEST_USER`].
    pub fn seed_remote<A: EntityAdapter>(&self, adapter: &A, entity: &A::Entity) {
        self.ledger.put_document(
            TEST_USER,
            adapter.kind(),
            entity.id(),
            adapter.to_wire(entity),
        );
    }

    /// Reads and decodes a remote document for [`TEST_USER`].
    pub fn remote_entity<A: EntityAdapter>(&self, adapter: &A, id: &str) -> Option<A::Entity> {
        self.ledger
            .document(TEST_USER, adapter.kind(), id)
            .and_then(|doc| adapter.from_wire(&doc).ok())
    }

    /// Number of remote documents of `kind` for [`TEST_USER`].
    pub fn remote_count(&self, kind: EntityKind) -> usize {
        self.ledger.document_count(TEST_USER, kind)
    }

    /// Number of dirty records across all local stores.
    pub fn local_unsynced(&self) -> usize {
        self.entries.unsynced_count()
            + self.budgets.unsynced_count()
            + self.goals.unsynced_count()
            + self.categories.unsynced_count()
    }
}

impl Default for SyncHarness {
    fn default() -> Self {
        Self::new()
    }
}
