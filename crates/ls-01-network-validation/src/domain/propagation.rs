//! # Propagation
//!
//! Every secondary node that holds messages the primary node lacks must
//! propagate them to the primary. These functions compute who owes what, and
//! what is still owed after the observed propagates.

use crate::domain::entities::{MissingPropagates, PropagatedMessagesByNode};
use shared_types::{QueryPropagate, QueryResponse, SerializedMessageId, SystemMessageValue};
use std::collections::BTreeSet;

/// Message ids reported by a set of responses.
fn message_ids<'a, I>(responses: I) -> BTreeSet<&'a SerializedMessageId>
where
    I: IntoIterator<Item = &'a SystemMessageValue<QueryResponse>>,
{
    responses
        .into_iter()
        .flat_map(|r| r.message.hash_map.keys())
        .collect()
}

/// For each secondary node, the ids it holds that the primary does not.
///
/// Responses from the same node are merged, so a node that answered in
/// several messages owes the union of its ids. Every secondary node gets an
/// entry, possibly empty.
pub fn get_expected_propagated_messages(
    primary_responses: &[&SystemMessageValue<QueryResponse>],
    secondary_responses: &[&SystemMessageValue<QueryResponse>],
) -> PropagatedMessagesByNode {
    let primary_ids = message_ids(primary_responses.iter().copied());

    let mut expected = PropagatedMessagesByNode::new();
    for response in secondary_responses {
        let owed = expected
            .entry(response.metadata.publisher_id.clone())
            .or_default();
        owed.extend(
            response
                .message
                .hash_map
                .keys()
                .filter(|id| !primary_ids.contains(id))
                .cloned(),
        );
    }
    expected
}

/// What is still owed once `propagates` are accounted for.
///
/// Propagates are attributed to their transport sender. Nodes with nothing
/// left are dropped; an empty result means propagation is complete.
pub fn get_missing_propagated_messages(
    expected: &PropagatedMessagesByNode,
    propagates: &[SystemMessageValue<QueryPropagate>],
) -> MissingPropagates {
    let mut missing = expected.clone();
    for propagate in propagates {
        if let Some(owed) = missing.get_mut(&propagate.metadata.publisher_id) {
            for (message_id, _) in &propagate.message.payload {
                owed.remove(message_id);
            }
        }
    }
    missing.retain(|_, owed| !owed.is_empty());
    missing.into_iter().collect()
}
