//! # Network Validation Service
//!
//! Orchestrates one validation per call. Five inputs race inside a single
//! task and feed a [`ValidationSession`]:
//!
//! | Input | Session event |
//! |-------|---------------|
//! | `NodeManager::get_node_address_from_url` | query node resolved |
//! | `NodeManager::get_active_nodes` | expected nodes (estimate) |
//! | response metadata | request id, expected nodes (authoritative) |
//! | response payload | buffered for the final presence check |
//! | system message stream | admission into the pools |
//!
//! The whole session runs under one deadline that is never extended.
//! Dropping the returned future cancels everything, including the bus
//! subscription.

use crate::domain::{
    ExpectedNodes, QueryInput, ValidationConfig, ValidationError, ValidationReport,
    ValidationSession,
};
use crate::ports::inbound::NetworkValidationApi;
use crate::ports::outbound::{NodeManager, QueryResponseStreams, ResponseMetadata};

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use logstore_telemetry::metric_inc;
use logstore_telemetry::metrics::{
    VALIDATION_DURATION, VALIDATION_IMPOSSIBLE_REQUESTS, VALIDATION_SESSIONS_TOTAL,
};
use shared_bus::{
    InMemorySystemBus, SystemMessageFilter, SystemMessageStream, SystemMessageSubscriber,
};
use shared_types::SystemMessageValue;
use std::sync::Arc;
use tracing::{debug, error, info, info_span, warn, Instrument};

const RESOLVING_QUERY_NODE: &str = "resolving query node address";
const GETTING_ACTIVE_NODES: &str = "getting active nodes";
const GETTING_REQUEST_ID: &str = "getting request id from response metadata";
const GETTING_PARTICIPATING_NODES: &str = "getting participating nodes from response";
const COLLECTING_RESPONSE_MESSAGES: &str = "collecting response messages";
const COLLECTING_SYSTEM_MESSAGES: &str = "collecting system messages";

/// Outcome label for a successful validation.
const VERIFIED: &str = "verified";

/// The network validation service.
pub struct NetworkValidationService<N: NodeManager, S: SystemMessageSubscriber> {
    config: ValidationConfig,
    node_manager: Arc<N>,
    subscriber: Arc<S>,
}

impl<N: NodeManager, S: SystemMessageSubscriber> NetworkValidationService<N, S> {
    pub fn new(config: ValidationConfig, node_manager: Arc<N>, subscriber: Arc<S>) -> Self {
        Self {
            config,
            node_manager,
            subscriber,
        }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    pub fn subscriber(&self) -> &Arc<S> {
        &self.subscriber
    }

    /// Opens a subscription to query system messages.
    ///
    /// Callers that send the HTTP query themselves should subscribe before
    /// sending it and pass the stream to [`Self::validate_with_messages`],
    /// so no early system message is missed.
    pub fn subscribe(&self) -> SystemMessageStream {
        self.subscriber
            .subscribe(SystemMessageFilter::query_messages())
    }

    /// Validates `response` against an already opened system message stream.
    pub async fn validate_with_messages<M>(
        &self,
        query_input: QueryInput,
        query_url: &str,
        response: QueryResponseStreams,
        system_messages: M,
    ) -> Result<ValidationReport, ValidationError>
    where
        M: Stream<Item = SystemMessageValue> + Send,
    {
        let span = info_span!(
            "network_validation",
            query_url = %query_url,
            stream_part = %query_input.stream_part_id,
        );

        async move {
            let _timer = logstore_telemetry::time_histogram!(VALIDATION_DURATION);

            let session = self.run_session(query_input, query_url, response, system_messages);
            let result = match tokio::time::timeout(self.config.timeout, session).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(
                        timeout = ?self.config.timeout,
                        "Deadline reached before validation concluded"
                    );
                    Err(ValidationError::Timeout)
                }
            };

            match &result {
                Ok(report) => {
                    metric_inc!(VALIDATION_SESSIONS_TOTAL, &[VERIFIED]);
                    info!(
                        request_id = %report.request_id,
                        nodes = report.responding_nodes.len(),
                        messages = report.verified_messages,
                        "Response validated by the network"
                    );
                }
                Err(e) => {
                    metric_inc!(VALIDATION_SESSIONS_TOTAL, &[e.outcome()]);
                    error!(error = %e, "Network validation failed");
                }
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run_session<M>(
        &self,
        query_input: QueryInput,
        query_url: &str,
        response: QueryResponseStreams,
        system_messages: M,
    ) -> Result<ValidationReport, ValidationError>
    where
        M: Stream<Item = SystemMessageValue> + Send,
    {
        let QueryResponseStreams {
            mut messages,
            mut metadata,
        } = response;
        tokio::pin!(system_messages);

        let mut session = ValidationSession::new(query_input);
        let mut query_node = self.node_manager.get_node_address_from_url(query_url);
        let mut active_nodes = self.node_manager.get_active_nodes();

        let mut query_node_pending = true;
        let mut active_nodes_pending = true;
        let mut metadata_open = true;
        let mut payload = Vec::new();
        let mut payload_complete = false;

        loop {
            if let Some(completed) = session.completed() {
                if payload_complete {
                    return completed.verify(&payload);
                }
            }

            tokio::select! {
                address = &mut query_node, if query_node_pending => {
                    query_node_pending = false;
                    let address = address.map_err(|e| e.during(RESOLVING_QUERY_NODE))?;
                    session.on_query_node_resolved(address);
                }
                nodes = &mut active_nodes, if active_nodes_pending => {
                    active_nodes_pending = false;
                    let nodes = nodes.map_err(|e| e.during(GETTING_ACTIVE_NODES))?;
                    session.on_expected_nodes(ExpectedNodes::estimate(nodes));
                }
                frame = metadata.next(), if metadata_open && !session.is_complete() => match frame {
                    Some(Ok(frame)) => {
                        apply_metadata(&mut session, frame);
                        metadata_open = !has_all_metadata(&session);
                    }
                    Some(Err(e)) => return Err(e.during(pending_metadata_action(&session))),
                    None => {
                        return Err(ValidationError::StreamEnded("response metadata")
                            .during(pending_metadata_action(&session)));
                    }
                },
                message = messages.next(), if !payload_complete => match message {
                    Some(Ok(message)) => payload.push(message),
                    Some(Err(e)) => return Err(e.during(COLLECTING_RESPONSE_MESSAGES)),
                    None => {
                        debug!(messages = payload.len(), "Response payload received");
                        payload_complete = true;
                    }
                },
                value = system_messages.next(), if !session.is_complete() => match value {
                    Some(value) => {
                        let impossible = session.impossible_request_ids().len();
                        session.on_system_message(value);
                        let added = session.impossible_request_ids().len() - impossible;
                        if added > 0 {
                            VALIDATION_IMPOSSIBLE_REQUESTS.inc_by(added as f64);
                        }
                    }
                    None => {
                        return Err(ValidationError::BusClosed.during(COLLECTING_SYSTEM_MESSAGES));
                    }
                },
                else => {
                    return Err(ValidationError::StreamEnded("validation inputs"));
                }
            }
        }
    }
}

impl<N: NodeManager> NetworkValidationService<N, InMemorySystemBus> {
    /// Builds a service over its own bus, sized by `config.bus_capacity`.
    pub fn with_in_memory_bus(config: ValidationConfig, node_manager: Arc<N>) -> Self {
        let bus = Arc::new(InMemorySystemBus::with_capacity(config.bus_capacity));
        Self::new(config, node_manager, bus)
    }
}

#[async_trait]
impl<N: NodeManager, S: SystemMessageSubscriber> NetworkValidationApi
    for NetworkValidationService<N, S>
{
    async fn validate(
        &self,
        query_input: QueryInput,
        query_url: &str,
        response: QueryResponseStreams,
    ) -> Result<ValidationReport, ValidationError> {
        let system_messages = self.subscribe();
        self.validate_with_messages(query_input, query_url, response, system_messages)
            .await
    }
}

fn apply_metadata(session: &mut ValidationSession, frame: ResponseMetadata) {
    if let Some(request_id) = frame.request_id {
        session.on_request_id(request_id);
    }
    if let Some(nodes) = frame.participating_nodes {
        session.on_expected_nodes(ExpectedNodes::authoritative(nodes));
    }
}

fn has_participating_nodes(session: &ValidationSession) -> bool {
    session
        .expected_nodes()
        .is_some_and(ExpectedNodes::is_authoritative)
}

fn has_all_metadata(session: &ValidationSession) -> bool {
    session.request_id().is_some() && has_participating_nodes(session)
}

/// The metadata value still being waited for.
fn pending_metadata_action(session: &ValidationSession) -> &'static str {
    if session.request_id().is_none() {
        GETTING_REQUEST_ID
    } else {
        GETTING_PARTICIPATING_NODES
    }
}
