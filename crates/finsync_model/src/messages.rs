//! Remote ledger messages.
//!
//! Bodies of the HTTP remote ledger endpoints, encoded as CBOR.

use crate::entity::EntityKind;
use crate::error::{ModelError, ModelResult};
use crate::wire::WireRecord;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

fn to_cbor<T: Serialize>(value: &T) -> ModelResult<Vec<u8>> {
    let mut bytes = Vec::new();
    ciborium::ser::into_writer(value, &mut bytes).map_err(|e| ModelError::Codec(e.to_string()))?;
    Ok(bytes)
}

fn from_cbor<T: DeserializeOwned>(bytes: &[u8]) -> ModelResult<T> {
    ciborium::de::from_reader(bytes).map_err(|e| ModelError::Codec(e.to_string()))
}

/// Upsert-merge one document into a user's collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertRequest {
    /// Owning user.
    pub user_id: String,
    /// Target collection.
    pub kind: EntityKind,
    /// Document id.
    pub id: String,
    /// Fields to merge.
    pub record: WireRecord,
}

impl UpsertRequest {
    /// Creates a new upsert request.
    pub fn new(
        user_id: impl Into<String>,
        kind: EntityKind,
        id: impl Into<String>,
        record: WireRecord,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            kind,
            id: id.into(),
            record,
        }
    }

    /// Encodes to CBOR.
    pub fn encode(&self) -> ModelResult<Vec<u8>> {
        to_cbor(self)
    }

    /// Decodes from CBOR.
    pub fn decode(bytes: &[u8]) -> ModelResult<Self> {
        from_cbor(bytes)
    }
}

/// Result of an upsert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertResponse {
    /// Whether the document was written.
    pub success: bool,
    /// Rejection reason, if any.
    pub error: Option<String>,
}

impl UpsertResponse {
    /// Creates a successful response.
    pub fn success() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    /// Creates a rejection.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
        }
    }

    /// Encodes to CBOR.
    pub fn encode(&self) -> ModelResult<Vec<u8>> {
        to_cbor(self)
    }

    /// Decodes from CBOR.
    pub fn decode(bytes: &[u8]) -> ModelResult<Self> {
        from_cbor(bytes)
    }
}

/// Fetch a user's whole collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchRequest {
    /// Owning user.
    pub user_id: String,
    /// Collection to read.
    pub kind: EntityKind,
}

impl FetchRequest {
    /// Creates a new fetch request.
    pub fn new(user_id: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            user_id: user_id.into(),
            kind,
        }
    }

    /// Encodes to CBOR.
    pub fn encode(&self) -> ModelResult<Vec<u8>> {
        to_cbor(self)
    }

    /// Decodes from CBOR.
    pub fn decode(bytes: &[u8]) -> ModelResult<Self> {
        from_cbor(bytes)
    }
}

/// Documents of a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchResponse {
    /// Whether the fetch succeeded.
    pub success: bool,
    /// Error message if failed.
    pub error: Option<String>,
    /// The documents, in no particular order.
    pub records: Vec<WireRecord>,
}

impl FetchResponse {
    /// Creates a successful response.
    pub fn new(records: Vec<WireRecord>) -> Self {
        Self {
            success: true,
            error: None,
            records,
        }
    }

    /// Creates a failed response.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            records: Vec::new(),
        }
    }

    /// Encodes to CBOR.
    pub fn encode(&self) -> ModelResult<Vec<u8>> {
        to_cbor(self)
    }

    /// Decodes from CBOR.
    pub fn decode(bytes: &[u8]) -> ModelResult<Self> {
        from_cbor(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_request_survives_cbor() {
        let record = WireRecord::new()
            .with("id", "t1")
            .with("amount", -4_250i64)
            .with("tags", vec!["a", "b"])
            .with("recurringPeriod", Option::<String>::None);
        let request = UpsertRequest::new("u1", EntityKind::LedgerEntry, "t1", record);

        let decoded = UpsertRequest::decode(&request.encode().unwrap()).unwrap();
        assert_eq!(decoded, request);
    }

    #[test]
    fn fetch_response_survives_cbor() {
        let response = FetchResponse::new(vec![
            WireRecord::new().with("id", "g1").with("color", 0xFF4C_AF50u32),
            WireRecord::new().with("id", "g2").with("isCompleted", true),
        ]);
        let decoded = FetchResponse::decode(&response.encode().unwrap()).unwrap();
        assert_eq!(decoded, response);
    }

    #[test]
    fn garbage_is_a_codec_error() {
        let err = FetchResponse::decode(&[0xff, 0x00, 0x13]).unwrap_err();
        assert!(matches!(err, ModelError::Codec(_)));
    }

    #[test]
    fn rejection_carries_reason() {
        let response = UpsertResponse::rejected("document too large");
        let decoded = UpsertResponse::decode(&response.encode().unwrap()).unwrap();
        assert!(!decoded.success);
        assert_eq!(decoded.error.as_deref(), Some("document too large"));
    }
}
