//! Budgets: spending limits per category and period.

use crate::adapter::EntityAdapter;
use crate::entity::{new_entity_id, now_millis, EntityKind, SyncableEntity, Timestamp};
use crate::error::{ModelError, ModelResult};
use crate::wire::WireRecord;
use serde::{Deserialize, Serialize};

/// Default alert threshold, in percent of the limit.
pub const DEFAULT_ALERT_THRESHOLD_PCT: u8 = 80;

/// Budget period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    /// Calendar month.
    #[default]
    Monthly,
    /// Seven days.
    Weekly,
}

impl BudgetPeriod {
    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetPeriod::Monthly => "monthly",
            BudgetPeriod::Weekly => "weekly",
        }
    }

    /// Parses a wire name.
    pub fn parse(value: &str) -> ModelResult<Self> {
        match value {
            "monthly" => Ok(BudgetPeriod::Monthly),
            "weekly" => Ok(BudgetPeriod::Weekly),
            other => Err(ModelError::unknown("period", other)),
        }
    }
}

/// A spending limit for one category over one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    /// Entity id.
    pub id: String,
    /// Category reference (not enforced).
    pub category_id: String,
    /// Limit in minor units.
    pub limit_cents: i64,
    /// Budget period.
    pub period: BudgetPeriod,
    /// Period start (ms).
    pub start_date: Timestamp,
    /// Period end (ms).
    pub end_date: Timestamp,
    /// Alert when spending crosses this percentage of the limit.
    pub alert_threshold_pct: u8,
    /// Whether the budget is in effect.
    pub is_active: bool,
    /// Local-only acknowledged flag.
    #[serde(default)]
    pub is_synced: bool,
    /// Creation time (ms).
    pub created_at: Timestamp,
    /// Last mutation time (ms).
    pub updated_at: Timestamp,
}

impl Budget {
    /// Creates a new, unsynced, active budget with a fresh id.
    pub fn new(
        category_id: impl Into<String>,
        limit_cents: i64,
        period: BudgetPeriod,
        start_date: Timestamp,
        end_date: Timestamp,
    ) -> Self {
        let now = now_millis();
        Self {
            id: new_entity_id(),
            category_id: category_id.into(),
            limit_cents,
            period,
            start_date,
            end_date,
            alert_threshold_pct: DEFAULT_ALERT_THRESHOLD_PCT,
            is_active: true,
            is_synced: false,
            created_at: now,
            updated_at: now,
        }
    }
}

impl SyncableEntity for Budget {
    const KIND: EntityKind = EntityKind::Budget;

    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    fn set_updated_at(&mut self, at: Timestamp) {
        self.updated_at = at;
    }

    fn is_synced(&self) -> bool {
        self.is_synced
    }

    fn set_synced(&mut self, synced: bool) {
        self.is_synced = synced;
    }
}

/// Adapter for [`Budget`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BudgetAdapter;

impl EntityAdapter for BudgetAdapter {
    type Entity = Budget;

    fn to_wire(&self, b: &Budget) -> WireRecord {
        WireRecord::new()
            .with("id", b.id.as_str())
            .with("categoryId", b.category_id.as_str())
            .with("limitAmount", b.limit_cents)
            .with("period", b.period.as_str())
            .with("startDate", b.start_date)
            .with("endDate", b.end_date)
            .with("alertThreshold", b.alert_threshold_pct)
            .with("isActive", b.is_active)
            .with("createdAt", b.created_at)
            .with("updatedAt", b.updated_at)
    }

    fn from_wire(&self, r: &WireRecord) -> ModelResult<Budget> {
        let period = match r.text("period")? {
            Some(name) => BudgetPeriod::parse(name)?,
            None => BudgetPeriod::default(),
        };
        let alert_threshold_pct = match r.integer("alertThreshold")? {
            Some(pct) => u8::try_from(pct)
                .ok()
                .filter(|p| *p <= 100)
                .ok_or_else(|| ModelError::invalid("alertThreshold", "expected 0..=100"))?,
            None => DEFAULT_ALERT_THRESHOLD_PCT,
        };

        Ok(Budget {
            id: r.require_text("id")?.to_string(),
            category_id: r.text("categoryId")?.unwrap_or_default().to_string(),
            limit_cents: r.integer("limitAmount")?.unwrap_or(0),
            period,
            start_date: r.integer("startDate")?.unwrap_or(0),
            end_date: r.integer("endDate")?.unwrap_or(0),
            alert_threshold_pct,
            is_active: r.bool("isActive")?.unwrap_or(true),
            is_synced: true,
            created_at: r.integer("createdAt")?.unwrap_or(0),
            updated_at: r.integer("updatedAt")?.unwrap_or(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_mapping() {
        let mut budget = Budget::new("food", 50_000, BudgetPeriod::Weekly, 10, 20);
        budget.alert_threshold_pct = 90;

        let wire = BudgetAdapter.to_wire(&budget);
        assert_eq!(wire.text("period").unwrap(), Some("weekly"));
        assert_eq!(wire.integer("alertThreshold").unwrap(), Some(90));

        let decoded = BudgetAdapter.from_wire(&wire).unwrap();
        assert_eq!(decoded, budget.into_synced());
    }

    #[test]
    fn defaults_for_sparse_documents() {
        let wire = WireRecord::new().with("id", "b1").with("limitAmount", 50i64);
        let decoded = BudgetAdapter.from_wire(&wire).unwrap();

        assert_eq!(decoded.limit_cents, 50);
        assert_eq!(decoded.period, BudgetPeriod::Monthly);
        assert_eq!(decoded.alert_threshold_pct, DEFAULT_ALERT_THRESHOLD_PCT);
        assert!(decoded.is_active);
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let wire = WireRecord::new().with("id", "b1").with("alertThreshold", 250i64);
        assert!(matches!(
            BudgetAdapter.from_wire(&wire),
            Err(ModelError::InvalidField {
                field: "alertThreshold",
                ..
            })
        ));
    }
}
