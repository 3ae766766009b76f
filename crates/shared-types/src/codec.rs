//! # System Message Codec (wire version 1)
//!
//! Every system message travels as a JSON array headed by
//! `[version, type, seqNum, requestId, ...]`:
//!
//! ```text
//! QueryRequest   [1, 1, seq, requestId, consumerId, streamId, partition, queryType, ...options]
//!                  last:  [count]
//!                  from:  [fromTs, fromSeq|null, publisherId|null]
//!                  range: [fromTs, fromSeq|null, toTs, toSeq|null, msgChainId|null, publisherId|null]
//! QueryResponse  [1, 2, seq, requestId, requestPublisherId, isFinal, [[messageId, hash], ...]]
//! QueryPropagate [1, 3, seq, requestId, requestPublisherId, [[messageId, hash], ...]]
//! ```
//!
//! Other system messages share the stream; they decode to
//! [`CodecError::UnsupportedType`] and are skipped by the bus.

use crate::entities::{MessageHash, NodeAddress, RequestId, SerializedMessageId};
use crate::errors::CodecError;
use crate::system_message::{
    QueryOptions, QueryPropagate, QueryRef, QueryRequest, QueryResponse, QueryType,
    SystemMessage, SystemMessageKind,
};
use serde_json::{json, Value};

/// Latest (and only) wire version.
pub const LATEST_VERSION: u64 = 1;

impl SystemMessage {
    /// Encodes to the JSON array string.
    pub fn serialize(&self) -> String {
        self.to_array().to_string()
    }

    /// Encodes to the JSON array value.
    pub fn to_array(&self) -> Value {
        let kind = self.kind().wire_code();
        match self {
            SystemMessage::QueryRequest(request) => {
                let mut items = vec![
                    json!(LATEST_VERSION),
                    json!(kind),
                    json!(request.seq_num),
                    json!(request.request_id.as_str()),
                    json!(request.consumer_id.as_str()),
                    json!(request.stream_id),
                    json!(request.partition),
                    json!(request.query_type().as_str()),
                ];
                match &request.query_options {
                    QueryOptions::Last { last } => items.push(json!(last)),
                    QueryOptions::From { from, publisher_id } => {
                        items.push(json!(from.timestamp));
                        items.push(json!(from.sequence_number));
                        items.push(json!(publisher_id.as_ref().map(NodeAddress::as_str)));
                    }
                    QueryOptions::Range {
                        from,
                        to,
                        msg_chain_id,
                        publisher_id,
                    } => {
                        items.push(json!(from.timestamp));
                        items.push(json!(from.sequence_number));
                        items.push(json!(to.timestamp));
                        items.push(json!(to.sequence_number));
                        items.push(json!(msg_chain_id));
                        items.push(json!(publisher_id.as_ref().map(NodeAddress::as_str)));
                    }
                }
                Value::Array(items)
            }
            SystemMessage::QueryResponse(response) => json!([
                LATEST_VERSION,
                kind,
                response.seq_num,
                response.request_id.as_str(),
                response.request_publisher_id.as_str(),
                response.is_final,
                encode_pairs(response.hash_map.iter()),
            ]),
            SystemMessage::QueryPropagate(propagate) => json!([
                LATEST_VERSION,
                kind,
                propagate.seq_num,
                propagate.request_id.as_str(),
                propagate.request_publisher_id.as_str(),
                encode_pairs(propagate.payload.iter().map(|(id, hash)| (id, hash))),
            ]),
        }
    }

    /// Decodes a JSON array string.
    pub fn deserialize(raw: &str) -> Result<Self, CodecError> {
        let value: Value =
            serde_json::from_str(raw).map_err(|e| CodecError::InvalidJson(e.to_string()))?;
        Self::from_array(&value)
    }

    /// Decodes an already parsed JSON array.
    pub fn from_array(value: &Value) -> Result<Self, CodecError> {
        let items = value.as_array().ok_or(CodecError::NotAnArray)?;
        let fields = Fields(items);

        let version = fields.u64(0, "version")?;
        if version != LATEST_VERSION {
            return Err(CodecError::UnsupportedVersion(version));
        }
        let code = fields.u64(1, "messageType")?;
        let kind = SystemMessageKind::from_wire_code(code).ok_or(CodecError::UnsupportedType(code))?;
        let seq_num = fields.u64(2, "seqNum")?;
        let request_id = RequestId::new(fields.str(3, "requestId")?);

        let message = match kind {
            SystemMessageKind::QueryRequest => {
                let raw_type = fields.str(7, "queryType")?;
                let query_type = QueryType::parse(raw_type)
                    .ok_or_else(|| CodecError::UnknownQueryType(raw_type.to_string()))?;
                let query_options = match query_type {
                    QueryType::Last => QueryOptions::Last {
                        last: fields.u64(8, "last")?,
                    },
                    QueryType::From => QueryOptions::From {
                        from: QueryRef::new(
                            fields.u64(8, "from.timestamp")?,
                            fields.opt_u64(9, "from.sequenceNumber")?,
                        ),
                        publisher_id: fields.opt_str(10, "publisherId")?.map(NodeAddress::new),
                    },
                    QueryType::Range => QueryOptions::Range {
                        from: QueryRef::new(
                            fields.u64(8, "from.timestamp")?,
                            fields.opt_u64(9, "from.sequenceNumber")?,
                        ),
                        to: QueryRef::new(
                            fields.u64(10, "to.timestamp")?,
                            fields.opt_u64(11, "to.sequenceNumber")?,
                        ),
                        msg_chain_id: fields.opt_str(12, "msgChainId")?.map(str::to_string),
                        publisher_id: fields.opt_str(13, "publisherId")?.map(NodeAddress::new),
                    },
                };
                let partition = u32::try_from(fields.u64(6, "partition")?).map_err(|_| {
                    CodecError::InvalidField {
                        name: "partition",
                        expected: "u32",
                    }
                })?;
                SystemMessage::QueryRequest(QueryRequest {
                    seq_num,
                    request_id,
                    consumer_id: NodeAddress::new(fields.str(4, "consumerId")?),
                    stream_id: fields.str(5, "streamId")?.to_string(),
                    partition,
                    query_options,
                })
            }
            SystemMessageKind::QueryResponse => SystemMessage::QueryResponse(QueryResponse {
                seq_num,
                request_id,
                request_publisher_id: NodeAddress::new(fields.str(4, "requestPublisherId")?),
                is_final: fields.bool(5, "isFinal")?,
                hash_map: fields.pairs(6, "hashMap")?.into_iter().collect(),
            }),
            SystemMessageKind::QueryPropagate => SystemMessage::QueryPropagate(QueryPropagate {
                seq_num,
                request_id,
                request_publisher_id: NodeAddress::new(fields.str(4, "requestPublisherId")?),
                payload: fields.pairs(5, "payload")?,
            }),
        };
        Ok(message)
    }
}

fn encode_pairs<'a, I>(pairs: I) -> Value
where
    I: Iterator<Item = (&'a SerializedMessageId, &'a MessageHash)>,
{
    Value::Array(
        pairs
            .map(|(id, hash)| json!([id.as_str(), hash.as_str()]))
            .collect(),
    )
}

/// Positional accessor over a decoded array.
struct Fields<'a>(&'a [Value]);

impl<'a> Fields<'a> {
    fn get(&self, index: usize, name: &'static str) -> Result<&'a Value, CodecError> {
        self.0.get(index).ok_or(CodecError::MissingField { index, name })
    }

    fn u64(&self, index: usize, name: &'static str) -> Result<u64, CodecError> {
        self.get(index, name)?
            .as_u64()
            .ok_or(CodecError::InvalidField {
                name,
                expected: "unsigned integer",
            })
    }

    fn opt_u64(&self, index: usize, name: &'static str) -> Result<Option<u64>, CodecError> {
        match self.0.get(index) {
            None | Some(Value::Null) => Ok(None),
            Some(_) => self.u64(index, name).map(Some),
        }
    }

    fn str(&self, index: usize, name: &'static str) -> Result<&'a str, CodecError> {
        self.get(index, name)?.as_str().ok_or(CodecError::InvalidField {
            name,
            expected: "string",
        })
    }

    fn opt_str(&self, index: usize, name: &'static str) -> Result<Option<&'a str>, CodecError> {
        match self.0.get(index) {
            None | Some(Value::Null) => Ok(None),
            Some(_) => self.str(index, name).map(Some),
        }
    }

    fn bool(&self, index: usize, name: &'static str) -> Result<bool, CodecError> {
        self.get(index, name)?.as_bool().ok_or(CodecError::InvalidField {
            name,
            expected: "boolean",
        })
    }

    fn pairs(
        &self,
        index: usize,
        name: &'static str,
    ) -> Result<Vec<(SerializedMessageId, MessageHash)>, CodecError> {
        let invalid = CodecError::InvalidField {
            name,
            expected: "array of [messageId, hash] pairs",
        };
        let entries = self.get(index, name)?.as_array().ok_or(invalid.clone())?;
        entries
            .iter()
            .map(|entry| match entry.as_array().map(Vec::as_slice) {
                Some([Value::String(id), Value::String(hash)]) => {
                    Ok((SerializedMessageId::new(id.clone()), MessageHash::new(hash)))
                }
                _ => Err(invalid.clone()),
            })
            .collect()
    }
}
