//! # Domain Entities
//!
//! The query being validated, the node sets it is validated against, and the
//! reconciled views built from storage-node responses.

use serde::{Deserialize, Serialize};
use shared_types::{
    MessageHash, NodeAddress, QueryType, RequestId, SerializedMessageId, StreamPartId,
};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// QUERY INPUT
// =============================================================================

/// Parameters of the HTTP query, one variant per [`QueryType`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpQuery {
    Last {
        count: u64,
    },
    From {
        from_timestamp: u64,
        from_sequence_number: Option<u64>,
        publisher_id: Option<NodeAddress>,
    },
    Range {
        from_timestamp: u64,
        from_sequence_number: Option<u64>,
        to_timestamp: u64,
        to_sequence_number: Option<u64>,
        publisher_id: Option<NodeAddress>,
        msg_chain_id: Option<String>,
    },
}

impl HttpQuery {
    pub fn query_type(&self) -> QueryType {
        match self {
            Self::Last { .. } => QueryType::Last,
            Self::From { .. } => QueryType::From,
            Self::Range { .. } => QueryType::Range,
        }
    }
}

/// The query actually sent over HTTP.
///
/// Query requests seen on the system stream are compared against it to rule
/// out request ids that cannot belong to this query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryInput {
    pub stream_part_id: StreamPartId,
    pub query: HttpQuery,
}

impl QueryInput {
    pub fn new(stream_part_id: StreamPartId, query: HttpQuery) -> Self {
        Self {
            stream_part_id,
            query,
        }
    }

    pub fn query_type(&self) -> QueryType {
        self.query.query_type()
    }
}

// =============================================================================
// EXPECTED NODES
// =============================================================================

/// The set of storage nodes that must all answer before collection is done.
///
/// Starts as an on-chain estimate (may overcount) and is later replaced by the
/// list the query node reports in the HTTP response metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpectedNodes {
    Estimate(BTreeSet<NodeAddress>),
    Authoritative(BTreeSet<NodeAddress>),
}

impl ExpectedNodes {
    pub fn estimate<I: IntoIterator<Item = NodeAddress>>(nodes: I) -> Self {
        Self::Estimate(nodes.into_iter().collect())
    }

    pub fn authoritative<I: IntoIterator<Item = NodeAddress>>(nodes: I) -> Self {
        Self::Authoritative(nodes.into_iter().collect())
    }

    pub fn nodes(&self) -> &BTreeSet<NodeAddress> {
        match self {
            Self::Estimate(nodes) | Self::Authoritative(nodes) => nodes,
        }
    }

    pub fn is_authoritative(&self) -> bool {
        matches!(self, Self::Authoritative(_))
    }

    /// Folds a newly learned set into the current one.
    ///
    /// The latest value wins, except that an estimate never replaces an
    /// authoritative set. Returns whether `current` changed.
    pub fn refine(current: &mut Option<ExpectedNodes>, next: ExpectedNodes) -> bool {
        match current {
            Some(existing) if existing.is_authoritative() && !next.is_authoritative() => false,
            Some(existing) if *existing == next => false,
            _ => {
                *current = Some(next);
                true
            }
        }
    }
}

// =============================================================================
// STORAGE MATRIX & PROPAGATION
// =============================================================================

/// One node's claim to hold a message with a given content hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeAttestation {
    pub node_address: NodeAddress,
    pub message_hash: MessageHash,
}

/// Message id to the set of nodes (and hashes) that claim to store it.
pub type StorageMatrix = BTreeMap<SerializedMessageId, BTreeSet<NodeAttestation>>;

/// Secondary node to the message ids it is expected to propagate to the
/// primary node.
pub type PropagatedMessagesByNode = BTreeMap<NodeAddress, BTreeSet<SerializedMessageId>>;

/// Nodes that still owe propagations, with the ids not yet seen.
pub type MissingPropagates = Vec<(NodeAddress, BTreeSet<SerializedMessageId>)>;

/// Where a session stands in collecting system messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionState {
    /// Some expected node has not responded yet (or the node set is unknown).
    AwaitingResponses,
    /// Everyone responded, but the query request or the primary node's own
    /// response has not been matched yet.
    AwaitingPrimary,
    /// Secondary nodes still owe propagations to the primary node.
    AwaitingPropagates,
    Complete,
}

impl CollectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AwaitingResponses => "awaiting_responses",
            Self::AwaitingPrimary => "awaiting_primary",
            Self::AwaitingPropagates => "awaiting_propagates",
            Self::Complete => "complete",
        }
    }
}

// =============================================================================
// OUTCOME
// =============================================================================

/// Returned when the HTTP response is confirmed by the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub request_id: RequestId,
    /// The node that served the HTTP response.
    pub query_node: NodeAddress,
    /// Every node whose response went into the storage matrix.
    pub responding_nodes: BTreeSet<NodeAddress>,
    /// Messages in the HTTP payload, all attested and agreed on.
    pub verified_messages: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nodes(addresses: &[&str]) -> Vec<NodeAddress> {
        addresses.iter().map(|a| NodeAddress::new(*a)).collect()
    }

    #[test]
    fn test_refine_starts_with_first_value() {
        let mut current = None;
        assert!(ExpectedNodes::refine(&mut current, ExpectedNodes::estimate(nodes(&["0xa"]))));
        assert_eq!(current.map(|n| n.nodes().len()), Some(1));
    }

    #[test]
    fn test_authoritative_replaces_estimate() {
        let mut current = Some(ExpectedNodes::estimate(nodes(&["0xa", "0xb", "0xc"])));
        assert!(ExpectedNodes::refine(
            &mut current,
            ExpectedNodes::authoritative(nodes(&["0xa", "0xb"]))
        ));
        let current = current.expect("set");
        assert!(current.is_authoritative());
        assert_eq!(current.nodes().len(), 2);
    }

    #[test]
    fn test_estimate_never_replaces_authoritative() {
        let mut current = Some(ExpectedNodes::authoritative(nodes(&["0xa"])));
        assert!(!ExpectedNodes::refine(
            &mut current,
            ExpectedNodes::estimate(nodes(&["0xa", "0xb"]))
        ));
        assert_eq!(current.expect("set").nodes().len(), 1);
    }

    #[test]
    fn test_refine_with_same_value_is_no_change() {
        let mut current = Some(ExpectedNodes::estimate(nodes(&["0xa"])));
        assert!(!ExpectedNodes::refine(&mut current, ExpectedNodes::estimate(nodes(&["0xA"]))));
    }

    #[test]
    fn test_query_type() {
        let input = QueryInput::new(StreamPartId::new("s", 0), HttpQuery::Last { count: 3 });
        assert_eq!(input.query_type(), QueryType::Last);
    }
}
