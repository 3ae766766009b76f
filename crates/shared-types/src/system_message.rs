//! # System Messages
//!
//! Messages storage nodes broadcast on the system stream while serving a
//! query. A consumer validating a query response only cares about three of
//! them:
//!
//! ```text
//! QueryRequest    query node   -> all nodes    "answer request R"
//! QueryResponse   every node   -> all nodes    "for R I hold {id -> hash}"
//! QueryPropagate  secondary    -> query node   "for R you are missing {id -> hash}"
//! ```
//!
//! The wire format lives in [`crate::codec`].

use crate::entities::{MessageHash, NodeAddress, RequestId, SerializedMessageId, StreamPartId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Kind of query a consumer issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    Last,
    From,
    Range,
}

impl QueryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Last => "last",
            Self::From => "from",
            Self::Range => "range",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "last" => Some(Self::Last),
            "from" => Some(Self::From),
            "range" => Some(Self::Range),
            _ => None,
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A point in a stream: timestamp plus optional sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRef {
    pub timestamp: u64,
    pub sequence_number: Option<u64>,
}

impl QueryRef {
    pub fn new(timestamp: u64, sequence_number: Option<u64>) -> Self {
        Self {
            timestamp,
            sequence_number,
        }
    }
}

/// Parameters of a query, one variant per [`QueryType`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryOptions {
    /// The latest `last` messages.
    Last { last: u64 },
    /// Everything starting at `from`.
    From {
        from: QueryRef,
        publisher_id: Option<NodeAddress>,
    },
    /// Everything between `from` and `to`.
    Range {
        from: QueryRef,
        to: QueryRef,
        msg_chain_id: Option<String>,
        publisher_id: Option<NodeAddress>,
    },
}

impl QueryOptions {
    pub fn query_type(&self) -> QueryType {
        match self {
            Self::Last { .. } => QueryType::Last,
            Self::From { .. } => QueryType::From,
            Self::Range { .. } => QueryType::Range,
        }
    }
}

/// Broadcast by the query node when it starts serving a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub seq_num: u64,
    pub request_id: RequestId,
    pub consumer_id: NodeAddress,
    pub stream_id: String,
    pub partition: u32,
    pub query_options: QueryOptions,
}

impl QueryRequest {
    pub fn query_type(&self) -> QueryType {
        self.query_options.query_type()
    }

    pub fn stream_part_id(&self) -> StreamPartId {
        StreamPartId::new(self.stream_id.clone(), self.partition)
    }
}

/// A node's answer: every message it holds for the request, with hashes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub seq_num: u64,
    pub request_id: RequestId,
    /// The query node this response answers.
    pub request_publisher_id: NodeAddress,
    pub is_final: bool,
    pub hash_map: BTreeMap<SerializedMessageId, MessageHash>,
}

/// Messages a secondary node forwards to the query node to fill its gaps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryPropagate {
    pub seq_num: u64,
    pub request_id: RequestId,
    /// The query node the payload is addressed to.
    pub request_publisher_id: NodeAddress,
    pub payload: Vec<(SerializedMessageId, MessageHash)>,
}

/// Discriminant of [`SystemMessage`], matching the wire type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SystemMessageKind {
    QueryRequest,
    QueryResponse,
    QueryPropagate,
}

impl SystemMessageKind {
    pub fn wire_code(&self) -> u64 {
        match self {
            Self::QueryRequest => 1,
            Self::QueryResponse => 2,
            Self::QueryPropagate => 3,
        }
    }

    pub fn from_wire_code(code: u64) -> Option<Self> {
        match code {
            1 => Some(Self::QueryRequest),
            2 => Some(Self::QueryResponse),
            3 => Some(Self::QueryPropagate),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::QueryRequest => "query_request",
            Self::QueryResponse => "query_response",
            Self::QueryPropagate => "query_propagate",
        }
    }
}

/// A decoded system message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SystemMessage {
    QueryRequest(QueryRequest),
    QueryResponse(QueryResponse),
    QueryPropagate(QueryPropagate),
}

impl SystemMessage {
    pub fn kind(&self) -> SystemMessageKind {
        match self {
            Self::QueryRequest(_) => SystemMessageKind::QueryRequest,
            Self::QueryResponse(_) => SystemMessageKind::QueryResponse,
            Self::QueryPropagate(_) => SystemMessageKind::QueryPropagate,
        }
    }

    pub fn request_id(&self) -> &RequestId {
        match self {
            Self::QueryRequest(m) => &m.request_id,
            Self::QueryResponse(m) => &m.request_id,
            Self::QueryPropagate(m) => &m.request_id,
        }
    }
}

/// Transport-level metadata attached to every message on the system stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageMetadata {
    /// The node that published the message. Authoritative sender identity.
    pub publisher_id: NodeAddress,
    pub timestamp: u64,
    pub sequence_number: u64,
}

impl MessageMetadata {
    pub fn new(publisher_id: NodeAddress, timestamp: u64) -> Self {
        Self {
            publisher_id,
            timestamp,
            sequence_number: 0,
        }
    }
}

/// A decoded message together with its transport metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemMessageValue<T = SystemMessage> {
    pub message: T,
    pub metadata: MessageMetadata,
}

impl<T> SystemMessageValue<T> {
    pub fn new(message: T, metadata: MessageMetadata) -> Self {
        Self { message, metadata }
    }

    /// Sender of the message according to the transport.
    pub fn sender(&self) -> &NodeAddress {
        &self.metadata.publisher_id
    }
}
