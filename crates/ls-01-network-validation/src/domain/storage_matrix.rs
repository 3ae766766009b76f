//! # Storage Matrix
//!
//! Reconciled view of which node claims to store which message, and with
//! what content hash:
//!
//! ```text
//! id-1 -> {(0xa, 0x45), (0xb, 0x45)}   agreed
//! id-2 -> {(0xa, 0x45), (0xb, 0x99)}   disagreement
//! id-3 -> {(0xb, 0x12)}                single attestor, always agreed
//! ```

use crate::domain::entities::{NodeAttestation, StorageMatrix};
use shared_types::{LogStoreMessage, QueryResponse, SerializedMessageId, SystemMessageValue};

/// Builds the matrix from every pooled response.
///
/// Re-adding the same (message, node, hash) triple is a no-op, so duplicate
/// responses do not change the result.
pub fn convert_to_storage_matrix(responses: &[SystemMessageValue<QueryResponse>]) -> StorageMatrix {
    let mut matrix = StorageMatrix::new();
    for response in responses {
        for (message_id, message_hash) in &response.message.hash_map {
            matrix
                .entry(message_id.clone())
                .or_default()
                .insert(NodeAttestation {
                    node_address: response.metadata.publisher_id.clone(),
                    message_hash: message_hash.clone(),
                });
        }
    }
    matrix
}

/// First message whose attestors report different hashes.
pub fn find_disagreement(matrix: &StorageMatrix) -> Option<&SerializedMessageId> {
    matrix.iter().find_map(|(message_id, nodes)| {
        let mut hashes = nodes.iter().map(|n| &n.message_hash);
        let first = hashes.next()?;
        hashes.any(|h| h != first).then_some(message_id)
    })
}

/// Whether every attestor of every message reports the same hash.
pub fn nodes_agree_on_storage_matrix(matrix: &StorageMatrix) -> bool {
    find_disagreement(matrix).is_none()
}

/// First HTTP payload message that no node attests.
pub fn find_unattested(
    messages: &[LogStoreMessage],
    matrix: &StorageMatrix,
) -> Option<SerializedMessageId> {
    messages
        .iter()
        .map(LogStoreMessage::serialized_id)
        .find(|id| matrix.get(id).map_or(true, |nodes| nodes.is_empty()))
}

/// Whether each payload message is held by at least one node (not
/// necessarily the query node).
pub fn verify_message_presence_in_storage_matrix(
    messages: &[LogStoreMessage],
    matrix: &StorageMatrix,
) -> bool {
    find_unattested(messages, matrix).is_none()
}
