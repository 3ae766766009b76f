//! # Core Domain Entities
//!
//! Identity and content types shared by every crate in the workspace.
//!
//! ## Clusters
//!
//! - **Identity**: `NodeAddress`, `RequestId`
//! - **Streams**: `StreamPartId`, `MessageId`, `SerializedMessageId`
//! - **Content**: `MessageHash`, `LogStoreMessage`
//!
//! Addresses and request ids are lowercased on construction. Chain addresses
//! arrive in mixed (checksummed) case from different sources, and every
//! comparison in the validation subsystem relies on this normalisation.

use serde::{Deserialize, Serialize};
use serde_json::json;
use sha3::{Digest, Keccak256};
use std::fmt;

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// Address of a storage node (or any publisher) on the network.
///
/// Always stored as lowercase hex, so two addresses that differ only in
/// checksum casing compare equal.
///
/// ```rust
/// use shared_types::NodeAddress;
///
/// let a = NodeAddress::new("0xAbCdEf0000000000000000000000000000000001");
/// let b = NodeAddress::new("0xabcdef0000000000000000000000000000000001");
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct NodeAddress(String);

impl NodeAddress {
    /// Creates a normalised address.
    pub fn new(address: impl AsRef<str>) -> Self {
        Self(address.as_ref().trim().to_lowercase())
    }

    /// Lowercase string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for NodeAddress {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for NodeAddress {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<NodeAddress> for String {
    fn from(value: NodeAddress) -> Self {
        value.0
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Correlation id generated per query.
///
/// Shared by the query request broadcast, every response and propagate
/// message for that query, and the HTTP response metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct RequestId(String);

impl RequestId {
    /// Creates a normalised request id.
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(id.as_ref().trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RequestId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<RequestId> for String {
    fn from(value: RequestId) -> Self {
        value.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// CLUSTER B: STREAMS
// =============================================================================

/// A single partition of a named stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamPartId {
    pub stream_id: String,
    pub partition: u32,
}

impl StreamPartId {
    pub fn new(stream_id: impl Into<String>, partition: u32) -> Self {
        Self {
            stream_id: stream_id.into(),
            partition,
        }
    }
}

impl fmt::Display for StreamPartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.stream_id, self.partition)
    }
}

/// Serialized form of a [`MessageId`].
///
/// This is the key used in response hash-maps, propagate payloads and the
/// storage matrix; two nodes holding the same stored message produce the
/// same serialized id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SerializedMessageId(String);

impl SerializedMessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SerializedMessageId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for SerializedMessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of a stored stream message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId {
    pub stream_id: String,
    pub partition: u32,
    /// Publisher timestamp in milliseconds.
    pub timestamp: u64,
    pub sequence_number: u64,
    pub publisher_id: NodeAddress,
    pub msg_chain_id: String,
}

impl MessageId {
    /// Serializes as the JSON array
    /// `[streamId, partition, timestamp, sequenceNumber, publisherId, msgChainId]`.
    pub fn serialize(&self) -> SerializedMessageId {
        let array = json!([
            self.stream_id,
            self.partition,
            self.timestamp,
            self.sequence_number,
            self.publisher_id.as_str(),
            self.msg_chain_id,
        ]);
        SerializedMessageId(array.to_string())
    }

    pub fn stream_part_id(&self) -> StreamPartId {
        StreamPartId::new(self.stream_id.clone(), self.partition)
    }
}

// =============================================================================
// CLUSTER C: CONTENT
// =============================================================================

/// Content hash a storage node reports for a stored message (lowercase hex).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct MessageHash(String);

impl MessageHash {
    pub fn new(hash: impl AsRef<str>) -> Self {
        Self(hash.as_ref().trim().to_lowercase())
    }

    /// Keccak-256 of `content`, hex encoded with a `0x` prefix.
    pub fn of_content(content: &[u8]) -> Self {
        let digest = Keccak256::digest(content);
        Self(format!("0x{}", hex::encode(digest)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for MessageHash {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for MessageHash {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<MessageHash> for String {
    fn from(value: MessageHash) -> Self {
        value.0
    }
}

impl fmt::Display for MessageHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stream message as delivered in an HTTP query response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogStoreMessage {
    pub id: MessageId,
    pub content: serde_json::Value,
}

impl LogStoreMessage {
    pub fn new(id: MessageId, content: serde_json::Value) -> Self {
        Self { id, content }
    }

    /// Shortcut for `self.id.serialize()`.
    pub fn serialized_id(&self) -> SerializedMessageId {
        self.id.serialize()
    }

    /// Hash of the JSON-encoded content.
    pub fn content_hash(&self) -> MessageHash {
        MessageHash::of_content(self.content.to_string().as_bytes())
    }
}
