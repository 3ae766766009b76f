//! # Error Types
//!
//! Errors raised while decoding system messages from the wire.

use thiserror::Error;

/// Errors from the system message codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Payload is not valid JSON.
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    /// Payload is JSON but not an array.
    #[error("System message is not an array")]
    NotAnArray,

    /// Wire version not supported.
    #[error("Unsupported version: {0}")]
    UnsupportedVersion(u64),

    /// Message type this codec does not decode.
    #[error("Unsupported system message type: {0}")]
    UnsupportedType(u64),

    /// Array shorter than the layout requires.
    #[error("Missing field {name} at index {index}")]
    MissingField { index: usize, name: &'static str },

    /// Field present with the wrong JSON type.
    #[error("Invalid field {name}: expected {expected}")]
    InvalidField {
        name: &'static str,
        expected: &'static str,
    },

    #[error("Unknown query type: {0}")]
    UnknownQueryType(String),
}

impl CodecError {
    /// Short label for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::InvalidJson(_) | Self::NotAnArray => "malformed",
            Self::UnsupportedVersion(_) => "unsupported_version",
            Self::UnsupportedType(_) => "unsupported_type",
            Self::MissingField { .. } | Self::InvalidField { .. } | Self::UnknownQueryType(_) => {
                "invalid_field"
            }
        }
    }
}
