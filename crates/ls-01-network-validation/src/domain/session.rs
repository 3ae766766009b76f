//! # Validation Session
//!
//! Single-owner state machine for one validation. The orchestrator feeds it
//! one event at a time; it owns the impossible-request set, the pools and the
//! completion state, and never blocks.
//!
//! ```text
//!  on_query_node_resolved ─┐
//!  on_expected_nodes ──────┤
//!  on_request_id ──────────┼──→ admit → pools → evaluate ──→ CollectionState
//!  on_system_message ──────┘                       │
//!                                                  └─ Complete: snapshot matrix
//! ```
//!
//! Messages that arrive before the query node address is known cannot be
//! admitted yet; they are buffered and replayed once it resolves.

use crate::domain::admission::{has_incompatible_query_input, is_admissible, ImpossibleRequestIds};
use crate::domain::completion::check_collection_completion;
use crate::domain::entities::{
    CollectionState, ExpectedNodes, QueryInput, StorageMatrix, ValidationReport,
};
use crate::domain::errors::ValidationError;
use crate::domain::pools::MessagePools;
use crate::domain::storage_matrix::{convert_to_storage_matrix, find_disagreement, find_unattested};
use shared_types::{LogStoreMessage, NodeAddress, RequestId, SystemMessage, SystemMessageValue};
use std::collections::BTreeSet;
use tracing::{debug, trace, warn};

/// Snapshot taken the moment collection completes.
///
/// Later system messages never change it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedCollection {
    pub request_id: RequestId,
    pub query_node: NodeAddress,
    pub storage_matrix: StorageMatrix,
    pub responding_nodes: BTreeSet<NodeAddress>,
}

impl CompletedCollection {
    /// Checks the HTTP payload against the snapshot.
    ///
    /// Nodes must agree on every message, and every payload message must be
    /// attested by at least one node.
    pub fn verify(&self, payload: &[LogStoreMessage]) -> Result<ValidationReport, ValidationError> {
        if let Some(message_id) = find_disagreement(&self.storage_matrix) {
            return Err(ValidationError::NodesDisagree {
                message_id: message_id.clone(),
            });
        }

        if let Some(message_id) = find_unattested(payload, &self.storage_matrix) {
            return Err(ValidationError::MissingAttestation { message_id });
        }

        Ok(ValidationReport {
            request_id: self.request_id.clone(),
            query_node: self.query_node.clone(),
            responding_nodes: self.responding_nodes.clone(),
            verified_messages: payload.len(),
        })
    }
}

/// State of one validation.
#[derive(Debug)]
pub struct ValidationSession {
    query_input: QueryInput,
    query_node: Option<NodeAddress>,
    http_request_id: Option<RequestId>,
    impossible: ImpossibleRequestIds,
    expected: Option<ExpectedNodes>,
    /// Messages received before the query node was known.
    pending: Vec<SystemMessageValue>,
    pools: MessagePools,
    state: CollectionState,
    completed: Option<CompletedCollection>,
}

impl ValidationSession {
    pub fn new(query_input: QueryInput) -> Self {
        Self {
            query_input,
            query_node: None,
            http_request_id: None,
            impossible: ImpossibleRequestIds::new(),
            expected: None,
            pending: Vec::new(),
            pools: MessagePools::new(),
            state: CollectionState::AwaitingResponses,
            completed: None,
        }
    }

    /// The query node address became known. Replays buffered messages.
    pub fn on_query_node_resolved(&mut self, address: NodeAddress) -> CollectionState {
        if let Some(current) = &self.query_node {
            if *current != address {
                warn!(current = %current, ignored = %address, "Query node already resolved");
            }
            return self.state;
        }

        debug!(query_node = %address, buffered = self.pending.len(), "Query node resolved");
        self.query_node = Some(address);

        for value in std::mem::take(&mut self.pending) {
            self.admit(value);
        }
        self.evaluate()
    }

    /// A new estimate or authoritative list of expected nodes.
    pub fn on_expected_nodes(&mut self, nodes: ExpectedNodes) -> CollectionState {
        let authoritative = nodes.is_authoritative();
        let count = nodes.nodes().len();
        if ExpectedNodes::refine(&mut self.expected, nodes) {
            debug!(authoritative, nodes = count, "Expected nodes refined");
            return self.evaluate();
        }
        self.state
    }

    /// The HTTP response revealed its request id. Shrinks the pools once.
    pub fn on_request_id(&mut self, request_id: RequestId) -> CollectionState {
        if let Some(current) = &self.http_request_id {
            if *current != request_id {
                warn!(current = %current, ignored = %request_id, "Request id already known");
            }
            return self.state;
        }

        let dropped = self.pools.shrink_to(&request_id);
        debug!(request_id = %request_id, dropped, "Request id known, pools shrunk");
        self.http_request_id = Some(request_id);
        self.evaluate()
    }

    /// A decoded message from the system stream.
    pub fn on_system_message(&mut self, value: SystemMessageValue) -> CollectionState {
        if self.completed.is_some() {
            return self.state;
        }

        if self.query_node.is_none() {
            self.pending.push(value);
            return self.state;
        }

        if self.admit(value) {
            return self.evaluate();
        }
        self.state
    }

    /// Admits one message into the pools. Returns whether it was pooled.
    fn admit(&mut self, value: SystemMessageValue) -> bool {
        let Some(query_node) = &self.query_node else {
            return false;
        };

        if !is_admissible(
            &value,
            query_node,
            &self.impossible,
            self.http_request_id.as_ref(),
        ) {
            trace!(
                kind = value.message.kind().as_str(),
                request_id = %value.message.request_id(),
                sender = %value.sender(),
                "System message not admitted"
            );
            return false;
        }

        if let SystemMessage::QueryRequest(request) = &value.message {
            if has_incompatible_query_input(&self.query_input, request) {
                let request_id = request.request_id.clone();
                let purged = self.pools.purge(&request_id);
                debug!(request_id = %request_id, purged, "Request id is impossible for this query");
                self.impossible.insert(request_id);
                return false;
            }
        }

        self.pools.push(value);
        true
    }

    fn evaluate(&mut self) -> CollectionState {
        if self.completed.is_some() {
            return self.state;
        }

        let request = self
            .http_request_id
            .as_ref()
            .and_then(|id| self.pools.request_for(id));

        let state = check_collection_completion(
            request,
            self.pools.responses(),
            self.pools.propagates(),
            self.expected.as_ref(),
        );

        if state != self.state {
            debug!(from = self.state.as_str(), to = state.as_str(), "Collection state changed");
        }
        self.state = state;

        if state == CollectionState::Complete {
            if let (Some(request), Some(query_node)) = (request, &self.query_node) {
                let responses = self.pools.responses();
                self.completed = Some(CompletedCollection {
                    request_id: request.message.request_id.clone(),
                    query_node: query_node.clone(),
                    storage_matrix: convert_to_storage_matrix(responses),
                    responding_nodes: responses.iter().map(|r| r.sender().clone()).collect(),
                });
            }
        }
        self.state
    }

    pub fn state(&self) -> CollectionState {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        self.completed.is_some()
    }

    pub fn completed(&self) -> Option<&CompletedCollection> {
        self.completed.as_ref()
    }

    pub fn query_node(&self) -> Option<&NodeAddress> {
        self.query_node.as_ref()
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.http_request_id.as_ref()
    }

    pub fn expected_nodes(&self) -> Option<&ExpectedNodes> {
        self.expected.as_ref()
    }

    pub fn impossible_request_ids(&self) -> &ImpossibleRequestIds {
        &self.impossible
    }

    pub fn pools(&self) -> &MessagePools {
        &self.pools
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}
