//! # Outbound Ports
//!
//! Collaborators the validator depends on: the node registry and the HTTP
//! query response it is asked to confirm.

use crate::domain::ValidationError;
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use shared_types::{LogStoreMessage, NodeAddress, RequestId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Node registry - outbound port.
#[async_trait]
pub trait NodeManager: Send + Sync {
    /// Address of the storage node serving `url`.
    async fn get_node_address_from_url(&self, url: &str) -> Result<NodeAddress, ValidationError>;

    /// Currently registered storage nodes. May include nodes that will not
    /// take part in a given query.
    async fn get_active_nodes(&self) -> Result<Vec<NodeAddress>, ValidationError>;
}

/// Metadata frame of the HTTP response.
///
/// Fields arrive independently and possibly in separate frames.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseMetadata {
    pub request_id: Option<RequestId>,
    /// Nodes the query node actually consulted.
    pub participating_nodes: Option<Vec<NodeAddress>>,
}

impl ResponseMetadata {
    pub fn with_request_id(request_id: impl AsRef<str>) -> Self {
        Self {
            request_id: Some(RequestId::new(request_id)),
            ..Default::default()
        }
    }

    pub fn with_participating_nodes<I>(nodes: I) -> Self
    where
        I: IntoIterator<Item = NodeAddress>,
    {
        Self {
            participating_nodes: Some(nodes.into_iter().collect()),
            ..Default::default()
        }
    }
}

/// The HTTP query response under validation.
///
/// `messages` is the payload, `metadata` the side channel carrying the
/// request id and participating nodes. Both are owned by the validation.
pub struct QueryResponseStreams {
    pub messages: BoxStream<'static, Result<LogStoreMessage, ValidationError>>,
    pub metadata: BoxStream<'static, Result<ResponseMetadata, ValidationError>>,
}

impl QueryResponseStreams {
    pub fn new(
        messages: BoxStream<'static, Result<LogStoreMessage, ValidationError>>,
        metadata: BoxStream<'static, Result<ResponseMetadata, ValidationError>>,
    ) -> Self {
        Self { messages, metadata }
    }

    /// A response already fully received.
    pub fn from_parts(messages: Vec<LogStoreMessage>, metadata: Vec<ResponseMetadata>) -> Self {
        Self {
            messages: stream::iter(messages.into_iter().map(Ok)).boxed(),
            metadata: stream::iter(metadata.into_iter().map(Ok)).boxed(),
        }
    }
}

impl std::fmt::Debug for QueryResponseStreams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryResponseStreams").finish_non_exhaustive()
    }
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Mock node registry for testing.
#[derive(Default)]
pub struct MockNodeManager {
    /// Node address per query URL.
    pub addresses: HashMap<String, NodeAddress>,
    /// Returned by `get_active_nodes`.
    pub active_nodes: Vec<NodeAddress>,
    /// Should fail?
    pub should_fail: bool,
    calls: AtomicU64,
}

impl MockNodeManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_node(mut self, url: impl Into<String>, address: impl AsRef<str>) -> Self {
        self.addresses.insert(url.into(), NodeAddress::new(address));
        self
    }

    pub fn with_active_nodes<I, S>(mut self, nodes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.active_nodes = nodes.into_iter().map(NodeAddress::new).collect();
        self
    }

    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Default::default()
        }
    }

    /// Number of calls made to either method.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl NodeManager for MockNodeManager {
    async fn get_node_address_from_url(&self, url: &str) -> Result<NodeAddress, ValidationError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if self.should_fail {
            return Err(ValidationError::Network("Mock failure".to_string()));
        }
        self.addresses
            .get(url)
            .cloned()
            .ok_or_else(|| ValidationError::Network(format!("Unknown node url {url}")))
    }

    async fn get_active_nodes(&self) -> Result<Vec<NodeAddress>, ValidationError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if self.should_fail {
            return Err(ValidationError::Network("Mock failure".to_string()));
        }
        Ok(self.active_nodes.clone())
    }
}
