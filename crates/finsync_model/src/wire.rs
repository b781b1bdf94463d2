//! Remote wire representation.
//!
//! The remote ledger stores each entity as a flat document of named fields.
//! Floats are intentionally absent: money travels in minor units.

use crate::error::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single field value in a wire record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireValue {
    /// Explicit null.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed integer (full i64 range).
    Integer(i64),
    /// UTF-8 text.
    Text(String),
    /// List of values.
    List(Vec<WireValue>),
}

impl WireValue {
    /// Returns the type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            WireValue::Null => "null",
            WireValue::Bool(_) => "bool",
            WireValue::Integer(_) => "integer",
            WireValue::Text(_) => "text",
            WireValue::List(_) => "list",
        }
    }

    /// Returns true for `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, WireValue::Null)
    }
}

impl From<bool> for WireValue {
    fn from(value: bool) -> Self {
        WireValue::Bool(value)
    }
}

impl From<i64> for WireValue {
    fn from(value: i64) -> Self {
        WireValue::Integer(value)
    }
}

impl From<u32> for WireValue {
    fn from(value: u32) -> Self {
        WireValue::Integer(i64::from(value))
    }
}

impl From<u8> for WireValue {
    fn from(value: u8) -> Self {
        WireValue::Integer(i64::from(value))
    }
}

impl From<&str> for WireValue {
    fn from(value: &str) -> Self {
        WireValue::Text(value.to_string())
    }
}

impl From<String> for WireValue {
    fn from(value: String) -> Self {
        WireValue::Text(value)
    }
}

impl<T: Into<WireValue>> From<Option<T>> for WireValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(WireValue::Null, Into::into)
    }
}

impl<T: Into<WireValue>> From<Vec<T>> for WireValue {
    fn from(values: Vec<T>) -> Self {
        WireValue::List(values.into_iter().map(Into::into).collect())
    }
}

/// A remote document: a map of field name to value.
///
/// Fields are kept sorted so encodings are stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WireRecord {
    fields: BTreeMap<String, WireValue>,
}

impl WireRecord {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field, returning the record (builder style).
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<WireValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Sets a field.
    pub fn set(&mut self, name: &str, value: impl Into<WireValue>) {
        self.fields.insert(name.to_string(), value.into());
    }

    /// Removes a field, returning its previous value.
    pub fn remove(&mut self, name: &str) -> Option<WireValue> {
        self.fields.remove(name)
    }

    /// Returns the raw value of a field.
    pub fn get(&self, name: &str) -> Option<&WireValue> {
        self.fields.get(name)
    }

    /// Returns the number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &WireValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Merges `other` into this record.
    ///
    /// Fields present in `other` overwrite; fields absent from `other` are
    /// left untouched. This is the remote ledger's upsert semantics.
    pub fn merge(&mut self, other: &WireRecord) {
        for (name, value) in &other.fields {
            self.fields.insert(name.clone(), value.clone());
        }
    }

    /// Reads a text field. Absent and null both read as `None`.
    pub fn text(&self, name: &'static str) -> ModelResult<Option<&str>> {
        match self.fields.get(name) {
            None | Some(WireValue::Null) => Ok(None),
            Some(WireValue::Text(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(mismatch(name, "text", other)),
        }
    }

    /// Reads an integer field.
    pub fn integer(&self, name: &'static str) -> ModelResult<Option<i64>> {
        match self.fields.get(name) {
            None | Some(WireValue::Null) => Ok(None),
            Some(WireValue::Integer(i)) => Ok(Some(*i)),
            Some(other) => Err(mismatch(name, "integer", other)),
        }
    }

    /// Reads a boolean field.
    pub fn bool(&self, name: &'static str) -> ModelResult<Option<bool>> {
        match self.fields.get(name) {
            None | Some(WireValue::Null) => Ok(None),
            Some(WireValue::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(mismatch(name, "bool", other)),
        }
    }

    /// Reads a list of text values.
    pub fn text_list(&self, name: &'static str) -> ModelResult<Option<Vec<String>>> {
        match self.fields.get(name) {
            None | Some(WireValue::Null) => Ok(None),
            Some(WireValue::List(items)) => items
                .iter()
                .map(|item| match item {
                    WireValue::Text(s) => Ok(s.clone()),
                    other => Err(mismatch(name, "list of text", other)),
                })
                .collect::<ModelResult<Vec<_>>>()
                .map(Some),
            Some(other) => Err(mismatch(name, "list", other)),
        }
    }

    /// Reads a text field that must be present and non-empty.
    pub fn require_text(&self, name: &'static str) -> ModelResult<&str> {
        match self.text(name)? {
            Some(s) if !s.is_empty() => Ok(s),
            _ => Err(ModelError::MissingField(name)),
        }
    }

    /// Reads an integer field that must fit in a `u32`.
    pub fn u32(&self, name: &'static str) -> ModelResult<Option<u32>> {
        self.integer(name)?
            .map(|i| u32::try_from(i).map_err(|_| ModelError::invalid(name, "out of u32 range")))
            .transpose()
    }
}

fn mismatch(name: &'static str, expected: &str, found: &WireValue) -> ModelError {
    ModelError::invalid(
        name,
        format!("expected {}, found {}", expected, found.type_name()),
    )
}
