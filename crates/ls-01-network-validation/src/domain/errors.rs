//! # Domain Errors
//!
//! Error types for network response validation.

use shared_types::SerializedMessageId;
use thiserror::Error;

/// Prefix carried by errors that already name the phase they failed in.
const PHASE_PREFIX: &str = "Error while";

/// Network validation error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Nothing conclusive happened before the deadline.
    #[error("Network verification timed out")]
    Timeout,

    /// Two nodes report different hashes for the same message.
    #[error("Storage nodes disagree on the content of message {message_id}")]
    NodesDisagree {
        /// First message found with conflicting hashes
        message_id: SerializedMessageId,
    },

    /// A message in the HTTP payload that no node claims to store.
    #[error("Message {message_id} is not attested by any storage node")]
    MissingAttestation {
        /// First unattested message
        message_id: SerializedMessageId,
    },

    /// An input stream finished before delivering something required.
    #[error("{0} ended before delivering a value")]
    StreamEnded(&'static str),

    /// The system message stream ended.
    #[error("System message stream closed")]
    BusClosed,

    /// A collaborator (node registry, HTTP stream) failed.
    #[error("{0}")]
    Network(String),

    /// An error annotated with the phase it happened in.
    #[error("Error while {action}: {reason}")]
    Upstream {
        /// Phase, e.g. "getting participating nodes from response"
        action: String,
        /// Display form of the underlying error
        reason: String,
    },
}

impl ValidationError {
    /// Annotates the error with the phase it happened in.
    ///
    /// Errors that already carry a phase, and timeouts, are returned as is.
    pub fn during(self, action: impl Into<String>) -> Self {
        match self {
            Self::Upstream { .. } | Self::Timeout => self,
            other => {
                let reason = other.to_string();
                if reason.starts_with(PHASE_PREFIX) {
                    return other;
                }
                Self::Upstream {
                    action: action.into(),
                    reason,
                }
            }
        }
    }

    /// Short label for metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::NodesDisagree { .. } => "nodes_disagree",
            Self::MissingAttestation { .. } => "missing_attestation",
            Self::StreamEnded(_) | Self::BusClosed => "stream_ended",
            Self::Network(_) | Self::Upstream { .. } => "error",
        }
    }
}
