//! End-to-end sync through the CBOR HTTP remote ledger over a loopback client.

use finsync_engine::{
    HttpRemoteLedger, LocalStores, LoopbackClient, MemoryEntityStore, MemoryRemoteLedger,
    MemorySession, SyncConfig, SyncOrchestrator,
};
use finsync_model::{Budget, BudgetAdapter, Category, EntityAdapter, EntityKind, Goal};
use finsync_testkit::prelude::*;
use std::sync::Arc;

#[tokio::test]
async fn sync_over_http_loopback() {
    let server = Arc::new(MemoryRemoteLedger::new());
    let mut remote_budget = budget("b1", 300, true);
    remote_budget.limit_cents = 50;
    server.put_document(
        TEST_USER,
        EntityKind::Budget,
        "b1",
        BudgetAdapter.to_wire(&remote_budget),
    );

    let config = SyncConfig::new("http://ledger.local");
    let remote = Arc::new(HttpRemoteLedger::new(
        config.remote_url.clone(),
        LoopbackClient::new(Arc::clone(&server)),
    ));

    let entries = Arc::new(MemoryEntityStore::with_records([entry("t1", 100, false)]));
    let budgets = Arc::new(MemoryEntityStore::with_records([budget("b1", 200, true)]));
    let stores = LocalStores {
        ledger_entries: entries.clone(),
        budgets: budgets.clone(),
        goals: Arc::new(MemoryEntityStore::<Goal>::new()),
        categories: Arc::new(MemoryEntityStore::with_records(default_categories())),
    };
    let orchestrator = SyncOrchestrator::new(
        config,
        Arc::new(MemorySession::signed_in(TEST_USER)),
        remote.clone(),
        stores,
    );

    let report = orchestrator.sync_now().await.unwrap();

    assert!(report.is_success());
    assert!(entries.get("t1").unwrap().is_synced);
    assert_eq!(server.document_count(TEST_USER, EntityKind::LedgerEntry), 1);
    assert_eq!(budgets.get("b1").unwrap().limit_cents, 50);
    assert_eq!(
        server.document_count(TEST_USER, EntityKind::Category),
        default_categories().len()
    );
    assert_eq!(remote.last_error(), None);

    let again = orchestrator.sync_now().await.unwrap();
    assert_eq!(again.items_synced, 0);
}

#[tokio::test]
async fn closed_http_ledger_fails_the_run() {
    let server = Arc::new(MemoryRemoteLedger::new());
    let remote = Arc::new(HttpRemoteLedger::new(
        "http://ledger.local",
        LoopbackClient::new(Arc::clone(&server)),
    ));
    remote.close();

    let stores = LocalStores {
        ledger_entries: Arc::new(MemoryEntityStore::with_records([entry("t1", 100, false)])),
        budgets: Arc::new(MemoryEntityStore::<Budget>::new()),
        goals: Arc::new(MemoryEntityStore::<Goal>::new()),
        categories: Arc::new(MemoryEntityStore::<Category>::new()),
    };
    let orchestrator = SyncOrchestrator::new(
        SyncConfig::default(),
        Arc::new(MemorySession::signed_in(TEST_USER)),
        remote,
        stores,
    );

    let report = orchestrator.sync_now().await.unwrap();

    assert_eq!(report.error, Some(finsync_engine::SyncError::NotConnected));
    assert_eq!(server.document_count(TEST_USER, EntityKind::LedgerEntry), 0);
}
