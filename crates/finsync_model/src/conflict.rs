//! Conflict resolution.
//!
//! Sync uses last-write-wins on `updated_at`. Ties keep the local copy, so a
//! record never flips back and forth between two stores holding equal
//! timestamps.

use crate::adapter::EntityAdapter;
use crate::entity::Timestamp;

/// Resolution for a local/remote pair with the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictResolution {
    /// Keep local version.
    KeepLocal,
    /// Accept remote version.
    AcceptRemote,
}

/// Resolves a conflict by timestamp. Remote wins only when strictly newer.
pub fn last_write_wins(local: Timestamp, remote: Timestamp) -> ConflictResolution {
    if remote > local {
        ConflictResolution::AcceptRemote
    } else {
        ConflictResolution::KeepLocal
    }
}

/// What the pull phase does with one remote record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullDecision {
    /// Unknown locally: insert it as synced.
    Insert,
    /// Remote is newer: overwrite the local copy.
    Overwrite,
    /// Local is newer, equal, or protected: leave it.
    Keep,
    /// Unknown locally but not admitted (e.g. a default category).
    Suppress,
}

impl PullDecision {
    /// Returns true if the decision writes to the local store.
    pub fn writes_local(&self) -> bool {
        matches!(self, PullDecision::Insert | PullDecision::Overwrite)
    }
}

/// Decides what to do with `remote` given the local copy, if any.
pub fn decide_pull<A: EntityAdapter>(
    adapter: &A,
    local: Option<&A::Entity>,
    remote: &A::Entity,
) -> PullDecision {
    match local {
        None if adapter.admits_remote_insert(remote) => PullDecision::Insert,
        None => PullDecision::Suppress,
        Some(local) if adapter.protects_local(local) => PullDecision::Keep,
        Some(local) => match last_write_wins(
            adapter.updated_at_of(local),
            adapter.updated_at_of(remote),
        ) {
            ConflictResolution::AcceptRemote => PullDecision::Overwrite,
            ConflictResolution::KeepLocal => PullDecision::Keep,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Budget, BudgetAdapter, BudgetPeriod, Category, CategoryAdapter, EntryType};
    use proptest::prelude::*;

    fn budget(id: &str, updated_at: Timestamp) -> Budget {
        let mut b = Budget::new("food", 100, BudgetPeriod::Monthly, 0, 1);
        b.id = id.into();
        b.updated_at = updated_at;
        b
    }

    #[test]
    fn lww_resolution() {
        assert_eq!(last_write_wins(100, 200), ConflictResolution::AcceptRemote);
        assert_eq!(last_write_wins(200, 100), ConflictResolution::KeepLocal);
        assert_eq!(last_write_wins(100, 100), ConflictResolution::KeepLocal);
    }

    #[test]
    fn pull_decisions() {
        let adapter = BudgetAdapter;
        let remote = budget("b1", 300);

        assert_eq!(decide_pull(&adapter, None, &remote), PullDecision::Insert);
        assert_eq!(
            decide_pull(&adapter, Some(&budget("b1", 200)), &remote),
            PullDecision::Overwrite
        );
        assert_eq!(
            decide_pull(&adapter, Some(&budget("b1", 300)), &remote),
            PullDecision::Keep
        );
        assert_eq!(
            decide_pull(&adapter, Some(&budget("b1", 400)), &remote),
            PullDecision::Keep
        );
    }

    #[test]
    fn default_categories_are_never_pulled() {
        let adapter = CategoryAdapter;
        let mut remote_default = Category::seeded("cat_food", "Food", "🍔", 0, EntryType::Expense);
        remote_default.updated_at = 1_000;

        assert_eq!(
            decide_pull(&adapter, None, &remote_default),
            PullDecision::Suppress
        );

        let local_default = Category::seeded("cat_food", "Food", "🍔", 0, EntryType::Expense);
        assert_eq!(
            decide_pull(&adapter, Some(&local_default), &remote_default),
            PullDecision::Keep
        );
    }

    proptest! {
        #[test]
        fn pull_never_moves_updated_at_backwards(local in any::<i64>(), remote in any::<i64>()) {
            let decision = decide_pull(&BudgetAdapter, Some(&budget("b", local)), &budget("b", remote));
            if decision == PullDecision::Overwrite {
                prop_assert!(remote > local);
            } else {
                prop_assert_eq!(decision, PullDecision::Keep);
            }
        }
    }
}
