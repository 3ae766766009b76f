//! # Bus Events
//!
//! What travels on the system stream: the serialized message content plus
//! the transport metadata that identifies the sender. Decoding happens on
//! the subscriber side (see [`crate::subscriber`]).

use serde::{Deserialize, Serialize};
use shared_types::{MessageMetadata, SystemMessage, SystemMessageKind, SystemMessageValue};

/// A message as published on the system stream, before decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSystemMessage {
    /// Serialized system message (JSON array, see `shared_types::codec`).
    pub content: String,
    pub metadata: MessageMetadata,
}

impl RawSystemMessage {
    pub fn new(content: impl Into<String>, metadata: MessageMetadata) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }

    /// Serializes `value.message` and wraps it with its metadata.
    pub fn encode(value: &SystemMessageValue) -> Self {
        Self {
            content: value.message.serialize(),
            metadata: value.metadata.clone(),
        }
    }
}

/// Filter for subscribing to specific system message kinds.
#[derive(Debug, Clone, Default)]
pub struct SystemMessageFilter {
    /// Kinds to receive. Empty means all kinds.
    pub kinds: Vec<SystemMessageKind>,
}

impl SystemMessageFilter {
    /// Create a filter that accepts all messages.
    #[must_use]
    pub fn all() -> Self {
        Self { kinds: Vec::new() }
    }

    /// Create a filter for specific kinds.
    #[must_use]
    pub fn kinds(kinds: Vec<SystemMessageKind>) -> Self {
        Self { kinds }
    }

    /// The three query kinds network validation consumes.
    #[must_use]
    pub fn query_messages() -> Self {
        Self::kinds(vec![
            SystemMessageKind::QueryRequest,
            SystemMessageKind::QueryResponse,
            SystemMessageKind::QueryPropagate,
        ])
    }

    /// Check if a decoded message matches this filter.
    #[must_use]
    pub fn matches(&self, message: &SystemMessage) -> bool {
        self.kinds.is_empty() || self.kinds.contains(&message.kind())
    }
}
