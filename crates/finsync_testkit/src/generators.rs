//! Property-based test generators using proptest.
//!
//! Provides strategies for generating entities whose wire form survives the
//! adapters unchanged, and for local/remote conflict scenarios.

use finsync_model::{
    Budget, BudgetPeriod, Category, EntryType, Goal, LedgerEntry, PaymentMethod, SyncableEntity,
    Timestamp,
};
use proptest::prelude::*;

/// Strategy for short, readable entity ids.
pub fn id_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9]{0,7}").expect("Invalid regex")
}

/// Strategy for `updated_at` values. A small range makes ties likely.
pub fn timestamp_strategy() -> impl Strategy<Value = Timestamp> {
    0i64..50
}

/// Strategy for signed amounts in minor units.
pub fn cents_strategy() -> impl Strategy<Value = i64> {
    -10_000_000i64..10_000_000
}

fn entry_type_strategy() -> impl Strategy<Value = EntryType> {
    prop_oneof![Just(EntryType::Income), Just(EntryType::Expense)]
}

fn payment_method_strategy() -> impl Strategy<Value = PaymentMethod> {
    prop_oneof![
        Just(PaymentMethod::Cash),
        Just(PaymentMethod::DebitCard),
        Just(PaymentMethod::CreditCard),
        Just(PaymentMethod::BankTransfer),
        Just(PaymentMethod::DigitalWallet),
        Just(PaymentMethod::Other),
    ]
}

/// Strategy for ledger entries with the given id.
pub fn ledger_entry_strategy(id: String) -> impl Strategy<Value = LedgerEntry> {
    (
        cents_strategy(),
        entry_type_strategy(),
        "[a-z ]{0,12}",
        payment_method_strategy(),
        prop::collection::vec("[a-z]{1,6}", 0..3),
        prop::option::of(Just("MONTHLY".to_string())),
        timestamp_strategy(),
        any::<bool>(),
    )
        .prop_map(
            move |(amount, entry_type, title, method, tags, recurring, updated_at, synced)| {
                let mut e = LedgerEntry::new(title, amount, entry_type, "cat_food", 0);
                e.id = id.clone();
                e.payment_method = method;
                e.tags = tags;
                e.is_recurring = recurring.is_some();
                e.recurring_period = recurring;
                e.created_at = 0;
                e.updated_at = updated_at;
                e.is_synced = synced;
                e
            },
        )
}

/// Strategy for budgets with the given id.
pub fn budget_strategy(id: String) -> impl Strategy<Value = Budget> {
    (
        0i64..1_000_000,
        prop_oneof![Just(BudgetPeriod::Monthly), Just(BudgetPeriod::Weekly)],
        0u8..=100,
        any::<bool>(),
        timestamp_strategy(),
        any::<bool>(),
    )
        .prop_map(move |(limit, period, pct, active, updated_at, synced)| {
            let mut b = Budget::new("cat_food", limit, period, 0, 0);
            b.id = id.clone();
            b.alert_threshold_pct = pct;
            b.is_active = active;
            b.created_at = 0;
            b.updated_at = updated_at;
            b.is_synced = synced;
            b
        })
}

/// Strategy for goals with the given id.
pub fn goal_strategy(id: String) -> impl Strategy<Value = Goal> {
    (
        0i64..10_000_000,
        0i64..10_000_000,
        any::<u32>(),
        any::<bool>(),
        timestamp_strategy(),
        any::<bool>(),
    )
        .prop_map(move |(target, current, color, done, updated_at, synced)| {
            let mut g = Goal::new("Goal", target, 0);
            g.id = id.clone();
            g.current_cents = current;
            g.color = color;
            g.is_completed = done;
            g.created_at = 0;
            g.updated_at = updated_at;
            g.is_synced = synced;
            g
        })
}

/// Strategy for user-owned categories with the given id.
pub fn custom_category_strategy(id: String) -> impl Strategy<Value = Category> {
    (
        "[A-Z][a-z]{0,8}",
        any::<u32>(),
        entry_type_strategy(),
        timestamp_strategy(),
        any::<bool>(),
    )
        .prop_map(move |(name, color, entry_type, updated_at, synced)| {
            let mut c = Category::custom(name, "📦", color, entry_type, "user-1");
            c.id = id.clone();
            c.updated_at = updated_at;
            c.is_synced = synced;
            c
        })
}

/// One id's situation before a sync: a local copy, a remote copy, or both.
#[derive(Debug, Clone)]
pub struct Placement<E> {
    /// The local copy, if any.
    pub local: Option<E>,
    /// The remote copy, if any. Always synced.
    pub remote: Option<E>,
}

/// Strategy for a local/remote placement of one id, built from `make`.
pub fn placement_strategy<E, S, F>(id: String, make: F) -> impl Strategy<Value = Placement<E>>
where
    E: SyncableEntity,
    S: Strategy<Value = E>,
    F: Fn(String) -> S,
{
    let local = prop::option::of(make(id.clone()));
    let remote = prop::option::of(make(id).prop_map(|e| e.into_synced()));
    (local, remote)
        .prop_filter("at least one copy", |(l, r)| l.is_some() || r.is_some())
        .prop_map(|(local, remote)| Placement { local, remote })
}

/// Strategy for a set of ledger-entry placements with distinct ids.
pub fn ledger_placements_strategy() -> impl Strategy<Value = Vec<Placement<LedgerEntry>>> {
    prop::collection::btree_set(id_strategy(), 1..8).prop_flat_map(|ids| {
        ids.into_iter()
            .map(|id| placement_strategy(id, ledger_entry_strategy))
            .collect::<Vec<_>>()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use finsync_model::{BudgetAdapter, EntityAdapter, LedgerEntryAdapter};

    proptest! {
        #[test]
        fn generated_entries_survive_the_wire(e in ledger_entry_strategy("t1".into())) {
            let decoded = LedgerEntryAdapter.from_wire(&LedgerEntryAdapter.to_wire(&e)).unwrap();
            prop_assert_eq!(decoded, e.into_synced());
        }

        #[test]
        fn generated_budgets_survive_the_wire(b in budget_strategy("b1".into())) {
            let decoded = BudgetAdapter.from_wire(&BudgetAdapter.to_wire(&b)).unwrap();
            prop_assert_eq!(decoded, b.into_synced());
        }

        #[test]
        fn placements_have_distinct_ids(placements in ledger_placements_strategy()) {
            let mut ids: Vec<String> = placements
                .iter()
                .map(|p| p.local.as_ref().or(p.remote.as_ref()).unwrap().id.clone())
                .collect();
            let before = ids.len();
            ids.dedup();
            prop_assert_eq!(ids.len(), before);
            for p in &placements {
                prop_assert!(p.remote.as_ref().map_or(true, |r| r.is_synced()));
            }
        }
    }
}
