//! Error types for the model crate.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while mapping entities to and from the wire.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// A required field is absent from a wire record.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// A field is present but holds a value of the wrong shape.
    #[error("invalid field {field}: {reason}")]
    InvalidField {
        /// Field name.
        field: &'static str,
        /// What was wrong with it.
        reason: String,
    },

    /// An enum field holds a name this version does not know.
    #[error("unknown {field} value {value:?}")]
    UnknownVariant {
        /// Field name.
        field: &'static str,
        /// The offending value.
        value: String,
    },

    /// CBOR encoding or decoding failed.
    #[error("codec error: {0}")]
    Codec(String),
}

impl ModelError {
    /// Creates an invalid field error.
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }

    /// Creates an unknown variant error.
    pub fn unknown(field: &'static str, value: impl Into<String>) -> Self {
        Self::UnknownVariant {
            field,
            value: value.into(),
        }
    }
}
