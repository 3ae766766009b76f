//! # Collection Completion
//!
//! Collection is done when every expected node has responded and no
//! secondary node still owes a propagation to the primary node.
//!
//! The cheap "everyone responded" check gates the propagation diff, which
//! is only computed once it passes.

use crate::domain::entities::{CollectionState, ExpectedNodes, MissingPropagates};
use crate::domain::propagation::{
    get_expected_propagated_messages, get_missing_propagated_messages,
};
use shared_types::{QueryPropagate, QueryRequest, QueryResponse, SystemMessageValue};

/// Whether every expected node has at least one pooled response.
///
/// Unknown expected nodes means no.
pub fn got_response_from_all_nodes(
    responses: &[SystemMessageValue<QueryResponse>],
    expected: Option<&ExpectedNodes>,
) -> bool {
    let Some(expected) = expected else {
        return false;
    };
    expected
        .nodes()
        .iter()
        .all(|node| responses.iter().any(|r| r.sender() == node))
}

/// Splits responses into the primary node's own and everyone else's.
///
/// The primary node is the sender of the matched query request.
pub fn split_primary_responses<'a>(
    request: &SystemMessageValue<QueryRequest>,
    responses: &'a [SystemMessageValue<QueryResponse>],
) -> (
    Vec<&'a SystemMessageValue<QueryResponse>>,
    Vec<&'a SystemMessageValue<QueryResponse>>,
) {
    responses
        .iter()
        .partition(|r| r.sender() == request.sender())
}

/// Propagations still owed, or `None` while the primary response is missing.
pub fn missing_propagates(
    request: &SystemMessageValue<QueryRequest>,
    responses: &[SystemMessageValue<QueryResponse>],
    propagates: &[SystemMessageValue<QueryPropagate>],
) -> Option<MissingPropagates> {
    let (primary, secondary) = split_primary_responses(request, responses);
    if primary.is_empty() {
        return None;
    }
    let expected = get_expected_propagated_messages(&primary, &secondary);
    Some(get_missing_propagated_messages(&expected, propagates))
}

/// Evaluates the collection state from the current pools.
pub fn check_collection_completion(
    request: Option<&SystemMessageValue<QueryRequest>>,
    responses: &[SystemMessageValue<QueryResponse>],
    propagates: &[SystemMessageValue<QueryPropagate>],
    expected: Option<&ExpectedNodes>,
) -> CollectionState {
    if !got_response_from_all_nodes(responses, expected) {
        return CollectionState::AwaitingResponses;
    }

    let Some(request) = request else {
        return CollectionState::AwaitingPrimary;
    };

    match missing_propagates(request, responses, propagates) {
        None => CollectionState::AwaitingPrimary,
        Some(missing) if missing.is_empty() => CollectionState::Complete,
        Some(_) => CollectionState::AwaitingPropagates,
    }
}
