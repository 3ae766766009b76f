//! # Message Pools
//!
//! Every admitted request, response and propagate, in arrival order.
//!
//! Pools only grow while the HTTP request id is unknown. Once it is known
//! they are shrunk once to that id, and ids proven impossible are purged.
//! Duplicates are kept: every consumer of the pools reduces into sets keyed
//! by message id.

use shared_types::{
    QueryPropagate, QueryRequest, QueryResponse, RequestId, SystemMessage, SystemMessageValue,
};

/// Accumulated system messages for one validation session.
#[derive(Debug, Default, Clone)]
pub struct MessagePools {
    requests: Vec<SystemMessageValue<QueryRequest>>,
    responses: Vec<SystemMessageValue<QueryResponse>>,
    propagates: Vec<SystemMessageValue<QueryPropagate>>,
}

impl MessagePools {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an admitted message to the pool of its kind.
    pub fn push(&mut self, value: SystemMessageValue) {
        let SystemMessageValue { message, metadata } = value;
        match message {
            SystemMessage::QueryRequest(m) => {
                self.requests.push(SystemMessageValue::new(m, metadata));
            }
            SystemMessage::QueryResponse(m) => {
                self.responses.push(SystemMessageValue::new(m, metadata));
            }
            SystemMessage::QueryPropagate(m) => {
                self.propagates.push(SystemMessageValue::new(m, metadata));
            }
        }
    }

    /// Keeps only entries for `request_id`. Returns how many were dropped.
    pub fn shrink_to(&mut self, request_id: &RequestId) -> usize {
        self.retain(|id| id == request_id)
    }

    /// Drops every entry for `request_id`. Returns how many were dropped.
    pub fn purge(&mut self, request_id: &RequestId) -> usize {
        self.retain(|id| id != request_id)
    }

    fn retain<F: Fn(&RequestId) -> bool>(&mut self, keep: F) -> usize {
        let before = self.len();
        self.requests.retain(|v| keep(&v.message.request_id));
        self.responses.retain(|v| keep(&v.message.request_id));
        self.propagates.retain(|v| keep(&v.message.request_id));
        before - self.len()
    }

    /// The first pooled request for `request_id`.
    pub fn request_for(&self, request_id: &RequestId) -> Option<&SystemMessageValue<QueryRequest>> {
        self.requests
            .iter()
            .find(|v| &v.message.request_id == request_id)
    }

    pub fn requests(&self) -> &[SystemMessageValue<QueryRequest>] {
        &self.requests
    }

    pub fn responses(&self) -> &[SystemMessageValue<QueryResponse>] {
        &self.responses
    }

    pub fn propagates(&self) -> &[SystemMessageValue<QueryPropagate>] {
        &self.propagates
    }

    pub fn len(&self) -> usize {
        self.requests.len() + self.responses.len() + self.propagates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
