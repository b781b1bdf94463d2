//! Ledger entries (income and expense transactions).

use crate::adapter::EntityAdapter;
use crate::entity::{new_entity_id, now_millis, EntityKind, SyncableEntity, Timestamp};
use crate::error::{ModelError, ModelResult};
use crate::wire::WireRecord;
use serde::{Deserialize, Serialize};

/// Direction of money flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryType {
    /// Money in.
    Income,
    /// Money out.
    #[default]
    Expense,
}

impl EntryType {
    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Income => "INCOME",
            EntryType::Expense => "EXPENSE",
        }
    }

    /// Parses a wire name.
    pub fn parse(field: &'static str, value: &str) -> ModelResult<Self> {
        match value {
            "INCOME" => Ok(EntryType::Income),
            "EXPENSE" => Ok(EntryType::Expense),
            other => Err(ModelError::unknown(field, other)),
        }
    }
}

/// How an entry was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Cash.
    #[default]
    Cash,
    /// Debit card.
    DebitCard,
    /// Credit card.
    CreditCard,
    /// Bank transfer.
    BankTransfer,
    /// Digital wallet.
    DigitalWallet,
    /// Anything else.
    Other,
}

impl PaymentMethod {
    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "CASH",
            PaymentMethod::DebitCard => "DEBIT_CARD",
            PaymentMethod::CreditCard => "CREDIT_CARD",
            PaymentMethod::BankTransfer => "BANK_TRANSFER",
            PaymentMethod::DigitalWallet => "DIGITAL_WALLET",
            PaymentMethod::Other => "OTHER",
        }
    }

    /// Parses a wire name.
    pub fn parse(value: &str) -> ModelResult<Self> {
        match value {
            "CASH" => Ok(PaymentMethod::Cash),
            "DEBIT_CARD" => Ok(PaymentMethod::DebitCard),
            "CREDIT_CARD" => Ok(PaymentMethod::CreditCard),
            "BANK_TRANSFER" => Ok(PaymentMethod::BankTransfer),
            "DIGITAL_WALLET" => Ok(PaymentMethod::DigitalWallet),
            "OTHER" => Ok(PaymentMethod::Other),
            other => Err(ModelError::unknown("paymentMethod", other)),
        }
    }
}

/// A single income or expense entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Entity id.
    pub id: String,
    /// Amount in minor units (cents).
    pub amount_cents: i64,
    /// Income or expense.
    pub entry_type: EntryType,
    /// Category reference (not enforced).
    pub category_id: String,
    /// Short title.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// When the entry happened (ms).
    pub date: Timestamp,
    /// Payment method.
    pub payment_method: PaymentMethod,
    /// User tags.
    pub tags: Vec<String>,
    /// Whether the entry repeats.
    pub is_recurring: bool,
    /// Repeat period, e.g. "monthly".
    pub recurring_period: Option<String>,
    /// Local-only acknowledged flag.
    #[serde(default)]
    pub is_synced: bool,
    /// Creation time (ms).
    pub created_at: Timestamp,
    /// Last mutation time (ms).
    pub updated_at: Timestamp,
}

impl LedgerEntry {
    /// Creates a new, unsynced entry with a fresh id.
    pub fn new(
        title: impl Into<String>,
        amount_cents: i64,
        entry_type: EntryType,
        category_id: impl Into<String>,
        date: Timestamp,
    ) -> Self {
        let now = now_millis();
        Self {
            id: new_entity_id(),
            amount_cents,
            entry_type,
            category_id: category_id.into(),
            title: title.into(),
            description: String::new(),
            date,
            payment_method: PaymentMethod::default(),
            tags: Vec::new(),
            is_recurring: false,
            recurring_period: None,
            is_synced: false,
            created_at: now,
            updated_at: now,
        }
    }
}

impl SyncableEntity for LedgerEntry {
    const KIND: EntityKind = EntityKind::LedgerEntry;

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

/// Adapter for [`LedgerEntry`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LedgerEntryAdapter;

impl EntityAdapter for LedgerEntryAdapter {
    type Entity = LedgerEntry;

    fn to_wire(&self, e: &LedgerEntry) -> WireRecord {
        WireRecord::new()
            .with("id", e.id.as_str())
            .with("amount", e.amount_cents)
            .with("type", e.entry_type.as_str())
            .with("categoryId", e.category_id.as_str())
            .with("title", e.title.as_str())
            .with("description", e.description.as_str())
            .with("date", e.date)
            .with("paymentMethod", e.payment_method.as_str())
            .with("tags", e.tags.clone())
            .with("isRecurring", e.is_recurring)
            .with("recurringPeriod", e.recurring_period.clone())
            .with("createdAt", e.created_at)
            .with("updatedAt", e.updated_at)
    }

    fn from_wire(&self, r: &WireRecord) -> ModelResult<LedgerEntry> {
        let entry_type = match r.text("type")? {
            Some(name) => EntryType::parse("type", name)?,
            None => EntryType::default(),
        };
        let payment_method = match r.text("paymentMethod")? {
            Some(name) => PaymentMethod::parse(name)?,
            None => PaymentMethod::default(),
        };

        Ok(LedgerEntry {
            id: r.require_text("id")?.to_string(),
            amount_cents: r.integer("amount")?.unwrap_or(0),
            entry_type,
            category_id: r.text("categoryId")?.unwrap_or_default().to_string(),
            title: r.text("title")?.unwrap_or_default().to_string(),
            description: r.text("description")?.unwrap_or_default().to_string(),
            date: r.integer("date")?.unwrap_or(0),
            payment_method,
            tags: r.text_list("tags")?.unwrap_or_default(),
            is_recurring: r.bool("isRecurring")?.unwrap_or(false),
            recurring_period: r.text("recurringPeriod")?.map(str::to_string),
            is_synced: true,
            created_at: r.integer("createdAt")?.unwrap_or(0),
            updated_at: r.integer("updatedAt")?.unwrap_or(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LedgerEntry {
        LedgerEntry {
            id: "t1".into(),
            amount_cents: 4_250,
            entry_type: EntryType::Expense,
            category_id: "food".into(),
            title: "Groceries".into(),
            description: "weekly shop".into(),
            date: 1_700_000_000_000,
            payment_method: PaymentMethod::DebitCard,
            tags: vec!["home".into()],
            is_recurring: true,
            recurring_period: Some("weekly".into()),
            is_synced: false,
            created_at: 90,
            updated_at: 100,
        }
    }

    #[test]
    fn wire_mapping_preserves_payload_and_marks_synced() {
        let adapter = LedgerEntryAdapter;
        let entry = sample();

        let wire = adapter.to_wire(&entry);
        assert!(wire.get("isSynced").is_none());
        assert_eq!(wire.text("paymentMethod").unwrap(), Some("DEBIT_CARD"));

        let decoded = adapter.from_wire(&wire).unwrap();
        assert_eq!(decoded, entry.clone().into_synced());
    }

    #[test]
    fn missing_optional_fields_take_defaults() {
        let wire = WireRecord::new().with("id", "t9");
        let decoded = LedgerEntryAdapter.from_wire(&wire).unwrap();

        assert_eq!(decoded.id, "t9");
        assert_eq!(decoded.entry_type, EntryType::Expense);
        assert_eq!(decoded.payment_method, PaymentMethod::Cash);
        assert_eq!(decoded.updated_at, 0);
        assert!(decoded.tags.is_empty());
        assert!(decoded.is_synced);
    }

    #[test]
    fn unknown_enum_value_rejects_document() {
        let wire = WireRecord::new().with("id", "t2").with("type", "REFUND");
        let err = LedgerEntryAdapter.from_wire(&wire).unwrap_err();
        assert_eq!(err, ModelError::unknown("type", "REFUND"));
    }

    #[test]
    fn missing_id_rejects_document() {
        let wire = WireRecord::new().with("title", "orphan");
        assert_eq!(
            LedgerEntryAdapter.from_wire(&wire).unwrap_err(),
            ModelError::MissingField("id")
        );
    }

    #[test]
    fn touch_marks_dirty() {
        let mut entry = sample().into_synced();
        entry.touch(500);
        assert_eq!(entry.updated_at, 500);
        assert!(!entry.is_synced);
    }

    #[test]
    fn new_entries_start_dirty() {
        let entry = LedgerEntry::new("Salary", 300_000, EntryType::Income, "salary", 1);
        assert!(!entry.is_synced);
        assert_eq!(entry.created_at, entry.updated_at);
        assert!(!entry.id.is_empty());
    }
}
