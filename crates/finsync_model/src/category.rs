//! Entry categories.
//!
//! Default categories are seeded locally on every device and are global (no
//! owning user). They are pushed like any other category but the pull phase
//! never inserts or overwrites them.

use crate::adapter::{EntityAdapter, PushScope};
use crate::entity::{new_entity_id, now_millis, EntityKind, SyncableEntity, Timestamp};
use crate::error::ModelResult;
use crate::ledger_entry::EntryType;
use crate::wire::WireRecord;
use serde::{Deserialize, Serialize};

const DEFAULT_ICON: &str = "📦";
const DEFAULT_COLOR: u32 = 0xFF95_A5A6;

/// A category entries and budgets refer to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Entity id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Emoji icon.
    pub icon: String,
    /// ARGB color.
    pub color: u32,
    /// Which entries this category applies to.
    pub entry_type: EntryType,
    /// System-seeded category.
    pub is_default: bool,
    /// Owning user; `None` for default categories.
    pub user_id: Option<String>,
    /// Local-only acknowledged flag.
    #[serde(default)]
    pub is_synced: bool,
    /// Last mutation time (ms).
    #[serde(default)]
    pub updated_at: Timestamp,
}

impl Category {
    /// Creates a new, unsynced custom category owned by `user_id`.
    pub fn custom(
        name: impl Into<String>,
        icon: impl Into<String>,
        color: u32,
        entry_type: EntryType,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            id: new_entity_id(),
            name: name.into(),
            icon: icon.into(),
            color,
            entry_type,
            is_default: false,
            user_id: Some(user_id.into()),
            is_synced: false,
            updated_at: now_millis(),
        }
    }

    /// Creates a system-seeded default category with a fixed id.
    pub fn seeded(
        id: impl Into<String>,
        name: impl Into<String>,
        icon: impl Into<String>,
        color: u32,
        entry_type: EntryType,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            icon: icon.into(),
            color,
            entry_type,
            is_default: true,
            user_id: None,
            is_synced: false,
            updated_at: 0,
        }
    }
}

impl SyncableEntity for Category {
    const KIND: EntityKind = EntityKind::Category;

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

/// Adapter for [`Category`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CategoryAdapter;

impl EntityAdapter for CategoryAdapter {
    type Entity = Category;

    fn to_wire(&self, c: &Category) -> WireRecord {
        WireRecord::new()
            .with("id", c.id.as_str())
            .with("name", c.name.as_str())
            .with("icon", c.icon.as_str())
            .with("color", c.color)
            .with("type", c.entry_type.as_str())
            .with("isDefault", c.is_default)
            .with("userId", c.user_id.clone())
            .with("updatedAt", c.updated_at)
    }

    fn from_wire(&self, r: &WireRecord) -> ModelResult<Category> {
        let entry_type = match r.text("type")? {
            Some(name) => EntryType::parse("type", name)?,
            None => EntryType::default(),
        };

        Ok(Category {
            id: r.require_text("id")?.to_string(),
            name: r.text("name")?.unwrap_or_default().to_string(),
            icon: r.text("icon")?.unwrap_or(DEFAULT_ICON).to_string(),
            color: r.u32("color")?.unwrap_or(DEFAULT_COLOR),
            entry_type,
            is_default: r.bool("isDefault")?.unwrap_or(false),
            user_id: r.text("userId")?.map(str::to_string),
            is_synced: true,
            updated_at: r.integer("updatedAt")?.unwrap_or(0),
        })
    }

    fn push_scope(&self) -> PushScope {
        PushScope::All
    }

    fn admits_remote_insert(&self, remote: &Category) -> bool {
        !remote.is_default
    }

    fn protects_local(&self, local: &Category) -> bool {
        local.is_default
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_mapping() {
        let category = Category::custom("Pets", "🐶", 0xFF00_00FF, EntryType::Expense, "u1");
        let wire = CategoryAdapter.to_wire(&category);
        assert_eq!(wire.text("userId").unwrap(), Some("u1"));

        let decoded = CategoryAdapter.from_wire(&wire).unwrap();
        assert_eq!(decoded, category.into_synced());
    }

    #[test]
    fn default_categories_have_no_owner() {
        let seeded = Category::seeded("cat_food", "Food", "🍔", 0xFFFF_0000, EntryType::Expense);
        let wire = CategoryAdapter.to_wire(&seeded);
        assert_eq!(wire.get("userId"), Some(&crate::WireValue::Null));

        let decoded = CategoryAdapter.from_wire(&wire).unwrap();
        assert!(decoded.is_default);
        assert_eq!(decoded.user_id, None);
    }

    #[test]
    fn pull_policies() {
        let adapter = CategoryAdapter;
        let seeded = Category::seeded("cat_food", "Food", "🍔", 0, EntryType::Expense);
        let custom = Category::custom("Pets", "🐶", 0, EntryType::Expense, "u1");

        assert_eq!(adapter.push_scope(), PushScope::All);
        assert!(!adapter.admits_remote_insert(&seeded));
        assert!(adapter.admits_remote_insert(&custom));
        assert!(adapter.protects_local(&seeded));
        assert!(!adapter.protects_local(&custom));
    }

    #[test]
    fn documents_without_timestamp_read_as_zero() {
        let wire = WireRecord::new().with("id", "c1").with("name", "Misc");
        let decoded = CategoryAdapter.from_wire(&wire).unwrap();
        assert_eq!(decoded.updated_at, 0);
        assert_eq!(decoded.icon, DEFAULT_ICON);
        assert_eq!(decoded.color, DEFAULT_COLOR);
    }
}
