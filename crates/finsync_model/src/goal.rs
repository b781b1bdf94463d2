//! Savings goals.

use crate::adapter::EntityAdapter;
use crate::entity::{new_entity_id, now_millis, EntityKind, SyncableEntity, Timestamp};
use crate::error::ModelResult;
use crate::wire::WireRecord;
use serde::{Deserialize, Serialize};

const DEFAULT_ICON: &str = "🎯";
const DEFAULT_COLOR: u32 = 0xFF4C_AF50;

/// A savings target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    /// Entity id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Target in minor units.
    pub target_cents: i64,
    /// Saved so far, in minor units.
    pub current_cents: i64,
    /// Deadline (ms).
    pub deadline: Timestamp,
    /// Emoji icon.
    pub icon: String,
    /// ARGB color.
    pub color: u32,
    /// Whether the goal was reached or closed.
    pub is_completed: bool,
    /// Local-only acknowledged flag.
    #[serde(default)]
    pub is_synced: bool,
    /// Creation time (ms).
    pub created_at: Timestamp,
    /// Last mutation time (ms).
    pub updated_at: Timestamp,
}

impl Goal {
    /// Creates a new, unsynced goal with a fresh id.
    pub fn new(name: impl Into<String>, target_cents: i64, deadline: Timestamp) -> Self {
        let now = now_millis();
        Self {
            id: new_entity_id(),
            name: name.into(),
            target_cents,
            current_cents: 0,
            deadline,
            icon: DEFAULT_ICON.to_string(),
            color: DEFAULT_COLOR,
            is_completed: false,
            is_synced: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Saved fraction of the target in percent, capped at 100.
    pub fn progress_pct(&self) -> u8 {
        if self.target_cents <= 0 {
            return 100;
        }
        let pct = self.current_cents.max(0).saturating_mul(100) / self.target_cents;
        pct.min(100) as u8
    }
}

impl SyncableEntity for Goal {
    const KIND: EntityKind = EntityKind::Goal;

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

/// Adapter for [`Goal`].
#[derive(Debug, Clone, Copy, Default)]
pub struct GoalAdapter;

impl EntityAdapter for GoalAdapter {
    type Entity = Goal;

    fn to_wire(&self, g: &Goal) -> WireRecord {
        WireRecord::new()
            .with("id", g.id.as_str())
            .with("name", g.name.as_str())
            .with("targetAmount", g.target_cents)
            .with("currentAmount", g.current_cents)
            .with("deadline", g.deadline)
            .with("icon", g.icon.as_str())
            .with("color", g.color)
            .with("isCompleted", g.is_completed)
            .with("createdAt", g.created_at)
            .with("updatedAt", g.updated_at)
    }

    fn from_wire(&self, r: &WireRecord) -> ModelResult<Goal> {
        Ok(Goal {
            id: r.require_text("id")?.to_string(),
            name: r.text("name")?.unwrap_or_default().to_string(),
            target_cents: r.integer("targetAmount")?.unwrap_or(0),
            current_cents: r.integer("currentAmount")?.unwrap_or(0),
            deadline: r.integer("deadline")?.unwrap_or(0),
            icon: r.text("icon")?.unwrap_or(DEFAULT_ICON).to_string(),
            color: r.u32("color")?.unwrap_or(DEFAULT_COLOR),
            is_completed: r.bool("isCompleted")?.unwrap_or(false),
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
        let mut goal = Goal::new("Holiday", 200_000, 1_800_000_000_000);
        goal.current_cents = 50_000;

        let decoded = GoalAdapter.from_wire(&GoalAdapter.to_wire(&goal)).unwrap();
        assert_eq!(decoded, goal.into_synced());
    }

    #[test]
    fn icon_and_color_defaults() {
        let decoded = GoalAdapter
            .from_wire(&WireRecord::new().with("id", "g1"))
            .unwrap();
        assert_eq!(decoded.icon, DEFAULT_ICON);
        assert_eq!(decoded.color, DEFAULT_COLOR);
    }

    #[test]
    fn progress() {
        let mut goal = Goal::new("Car", 1_000, 0);
        assert_eq!(goal.progress_pct(), 0);
        goal.current_cents = 250;
        assert_eq!(goal.progress_pct(), 25);
        goal.current_cents = 5_000;
        assert_eq!(goal.progress_pct(), 100);
        goal.target_cents = 0;
        assert_eq!(goal.progress_pct(), 100);
    }
}
