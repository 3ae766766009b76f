//! # Admission
//!
//! Decides which system messages belong to the query being validated.
//!
//! A message is admitted when:
//!
//! 1. its request id is not known to be impossible, and
//! 2. the HTTP request id is unknown yet, or equals it, and
//! 3. it concerns the query node: a request must be *sent* by the query node,
//!    a response or propagate must be *addressed* to it.
//!
//! Query requests that cannot describe our query mark their request id as
//! impossible for the rest of the session.

use crate::domain::entities::{HttpQuery, QueryInput};
use shared_types::{
    NodeAddress, QueryOptions, QueryRequest, RequestId, SystemMessage, SystemMessageValue,
};
use std::collections::HashSet;

/// Request ids proven unrelated to the current query. Only grows.
#[derive(Debug, Default, Clone)]
pub struct ImpossibleRequestIds {
    ids: HashSet<RequestId>,
}

impl ImpossibleRequestIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the id was not already present.
    pub fn insert(&mut self, id: RequestId) -> bool {
        self.ids.insert(id)
    }

    pub fn contains(&self, id: &RequestId) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// The address a message is checked against the query node with.
pub fn query_node_of(value: &SystemMessageValue) -> &NodeAddress {
    match &value.message {
        SystemMessage::QueryRequest(_) => &value.metadata.publisher_id,
        SystemMessage::QueryResponse(response) => &response.request_publisher_id,
        SystemMessage::QueryPropagate(propagate) => &propagate.request_publisher_id,
    }
}

/// Applies the admission rules in order, cheapest first.
pub fn is_admissible(
    value: &SystemMessageValue,
    query_node: &NodeAddress,
    impossible: &ImpossibleRequestIds,
    http_request_id: Option<&RequestId>,
) -> bool {
    let request_id = value.message.request_id();

    if impossible.contains(request_id) {
        return false;
    }

    if let Some(expected) = http_request_id {
        if request_id != expected {
            return false;
        }
    }

    query_node_of(value) == query_node
}

/// Whether a query request cannot be the one issued for `input`.
///
/// Compares type and stream partition, then the type-specific parameters.
pub fn has_incompatible_query_input(input: &QueryInput, request: &QueryRequest) -> bool {
    if input.query_type() != request.query_type() {
        return true;
    }

    if input.stream_part_id != request.stream_part_id() {
        return true;
    }

    match (&input.query, &request.query_options) {
        (HttpQuery::Last { count }, QueryOptions::Last { last }) => count != last,
        (
            HttpQuery::From {
                from_timestamp,
                from_sequence_number,
                publisher_id,
            },
            QueryOptions::From {
                from,
                publisher_id: request_publisher,
            },
        ) => {
            *from_timestamp != from.timestamp
                || *from_sequence_number != from.sequence_number
                || publisher_id != request_publisher
        }
        (
            HttpQuery::Range {
                from_timestamp,
                from_sequence_number,
                to_timestamp,
                to_sequence_number,
                publisher_id,
                msg_chain_id,
            },
            QueryOptions::Range {
                from,
                to,
                msg_chain_id: request_chain,
                publisher_id: request_publisher,
            },
        ) => {
            *from_timestamp != from.timestamp
                || *to_timestamp != to.timestamp
                || *from_sequence_number != from.sequence_number
                || *to_sequence_number != to.sequence_number
                || publisher_id != request_publisher
                || msg_chain_id != request_chain
        }
        // Query types already compared equal
        _ => true,
    }
}
