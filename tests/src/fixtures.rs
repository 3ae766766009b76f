//! Builders for system messages and HTTP responses shared by the
//! integration flows and benchmarks.

use futures::stream::{self, StreamExt};
use ls_01_network_validation::{HttpQuery, QueryInput, QueryResponseStreams, ResponseMetadata};
use shared_types::{
    LogStoreMessage, MessageHash, MessageId, MessageMetadata, NodeAddress, QueryOptions,
    QueryPropagate, QueryRequest, QueryResponse, RequestId, SerializedMessageId, StreamPartId,
    SystemMessage, SystemMessageValue,
};
use std::collections::BTreeMap;

pub const STREAM_ID: &str = "0xowner/logstore-demo";
pub const PUBLISHER: &str = "0x5e98df807c09a91557d8b3161f2d01852fb005b9";
pub const CONSUMER: &str = "0x9a2e04a6b3e2ecd6e2c7a1b1e1f8cb4e6d1a7f02";

/// A stored stream message published at `timestamp`.
pub fn log_message(timestamp: u64) -> LogStoreMessage {
    LogStoreMessage::new(
        MessageId {
            stream_id: STREAM_ID.to_string(),
            partition: 0,
            timestamp,
            sequence_number: 0,
            publisher_id: NodeAddress::new(PUBLISHER),
            msg_chain_id: "chain-1".to_string(),
        },
        serde_json::json!({ "reading": timestamp * 3 }),
    )
}

pub fn log_messages(timestamps: impl IntoIterator<Item = u64>) -> Vec<LogStoreMessage> {
    timestamps.into_iter().map(log_message).collect()
}

/// `(id, hash)` pairs as a storage node would report them.
pub fn attestations(messages: &[LogStoreMessage]) -> Vec<(SerializedMessageId, MessageHash)> {
    messages
        .iter()
        .map(|m| (m.serialized_id(), m.content_hash()))
        .collect()
}

pub fn node(index: u8) -> NodeAddress {
    NodeAddress::new(format!("0x{:040x}", index))
}

/// One `last N` query served by `query_node`.
#[derive(Debug, Clone)]
pub struct QueryScenario {
    pub request_id: RequestId,
    pub query_node: NodeAddress,
    pub last: u64,
}

impl QueryScenario {
    pub fn new(request_id: &str, query_node: NodeAddress, last: u64) -> Self {
        Self {
            request_id: RequestId::new(request_id),
            query_node,
            last,
        }
    }

    pub fn query_input(&self) -> QueryInput {
        QueryInput::new(
            StreamPartId::new(STREAM_ID, 0),
            HttpQuery::Last { count: self.last },
        )
    }

    pub fn query_url(&self) -> String {
        format!("https://{}.storage.example", self.query_node)
    }

    /// The query request broadcast by the query node.
    pub fn request(&self) -> SystemMessageValue {
        self.request_with(QueryOptions::Last { last: self.last })
    }

    pub fn request_with(&self, query_options: QueryOptions) -> SystemMessageValue {
        SystemMessageValue::new(
            SystemMessage::QueryRequest(QueryRequest {
                seq_num: 0,
                request_id: self.request_id.clone(),
                consumer_id: NodeAddress::new(CONSUMER),
                stream_id: STREAM_ID.to_string(),
                partition: 0,
                query_options,
            }),
            MessageMetadata::new(self.query_node.clone(), 1),
        )
    }

    pub fn response(&self, from: &NodeAddress, messages: &[LogStoreMessage]) -> SystemMessageValue {
        self.response_with(from, attestations(messages))
    }

    pub fn response_with(
        &self,
        from: &NodeAddress,
        entries: Vec<(SerializedMessageId, MessageHash)>,
    ) -> SystemMessageValue {
        SystemMessageValue::new(
            SystemMessage::QueryResponse(QueryResponse {
                seq_num: 0,
                request_id: self.request_id.clone(),
                request_publisher_id: self.query_node.clone(),
                is_final: true,
                hash_map: entries.into_iter().collect::<BTreeMap<_, _>>(),
            }),
            MessageMetadata::new(from.clone(), 2),
        )
    }

    pub fn propagate(&self, from: &NodeAddress, messages: &[LogStoreMessage]) -> SystemMessageValue {
        SystemMessageValue::new(
            SystemMessage::QueryPropagate(QueryPropagate {
                seq_num: 0,
                request_id: self.request_id.clone(),
                request_publisher_id: self.query_node.clone(),
                payload: attestations(messages),
            }),
            MessageMetadata::new(from.clone(), 3),
        )
    }

    /// The HTTP response, fully received.
    pub fn http_response(
        &self,
        messages: Vec<LogStoreMessage>,
        participating: &[NodeAddress],
    ) -> QueryResponseStreams {
        QueryResponseStreams::from_parts(
            messages,
            vec![
                ResponseMetadata::with_request_id(self.request_id.as_str()),
                ResponseMetadata::with_participating_nodes(participating.iter().cloned()),
            ],
        )
    }

    /// An HTTP response whose metadata stays open after its frames.
    pub fn streaming_http_response(
        &self,
        messages: Vec<LogStoreMessage>,
        participating: &[NodeAddress],
    ) -> QueryResponseStreams {
        let metadata = vec![
            Ok(ResponseMetadata::with_request_id(self.request_id.as_str())),
            Ok(ResponseMetadata::with_participating_nodes(
                participating.iter().cloned(),
            )),
        ];
        QueryResponseStreams::new(
            stream::iter(messages.into_iter().map(Ok)).boxed(),
            stream::iter(metadata).chain(stream::pending()).boxed(),
        )
    }
}
