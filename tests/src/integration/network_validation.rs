//! # Network Validation Flows
//!
//! Storage nodes publish encoded query messages on the in-memory system bus
//! while `ls-01-network-validation` checks an HTTP response against them.
//!
//! ## Flows Tested:
//!
//! 1. **Happy path with propagation**: secondaries hold newer messages and
//!    propagate them to the query node
//! 2. **Noise**: undecodable, foreign and impossible messages share the bus
//! 3. **Disagreement**: one node reports a different hash
//! 4. **Silent node**: the deadline fires
//! 5. **Concurrent sessions**: two validations on one bus stay isolated

#[cfg(test)]
mod tests {
    use crate::fixtures::{log_message, log_messages, node, QueryScenario};
    use logstore_telemetry::{TelemetryConfig, VALIDATION_SESSIONS_TOTAL};
    use ls_01_network_validation::{
        MockNodeManager, NetworkValidationApi, NetworkValidationService, ValidationConfig,
        ValidationError, ValidationReport,
    };
    use shared_bus::{InMemorySystemBus, RawSystemMessage, SystemMessagePublisher};
    use shared_types::{
        MessageHash, MessageMetadata, NodeAddress, QueryOptions, SystemMessageValue,
    };
    use std::collections::BTreeSet;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::task::JoinHandle;

    type Service = NetworkValidationService<MockNodeManager, InMemorySystemBus>;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn setup(
        scenarios: &[&QueryScenario],
        active: &[NodeAddress],
    ) -> (Arc<InMemorySystemBus>, Arc<Service>) {
        let mut manager =
            MockNodeManager::new().with_active_nodes(active.iter().map(NodeAddress::as_str));
        for scenario in scenarios {
            manager = manager.with_node(scenario.query_url(), scenario.query_node.as_str());
        }

        let bus = Arc::new(InMemorySystemBus::new());
        let service = Arc::new(NetworkValidationService::new(
            ValidationConfig::default(),
            Arc::new(manager),
            Arc::clone(&bus),
        ));
        (bus, service)
    }

    /// Starts `validate` in its own task, like a client awaiting the HTTP body.
    fn spawn_validation(
        service: &Arc<Service>,
        scenario: &QueryScenario,
        payload: Vec<u64>,
        participating: Vec<NodeAddress>,
    ) -> JoinHandle<Result<ValidationReport, ValidationError>> {
        let service = Arc::clone(service);
        let scenario = scenario.clone();
        tokio::spawn(async move {
            let url = scenario.query_url();
            let response = scenario.http_response(log_messages(payload), &participating);
            service
                .validate(scenario.query_input(), &url, response)
                .await
        })
    }

    async fn wait_for_subscribers(bus: &InMemorySystemBus, count: usize) {
        while bus.subscriber_count() < count {
            tokio::task::yield_now().await;
        }
    }

    async fn publish_all(bus: &InMemorySystemBus, values: &[SystemMessageValue]) {
        for value in values {
            bus.publish(RawSystemMessage::encode(value)).await;
        }
    }

    /// Three nodes: the query node holds 1..=2, the others also hold 3.
    fn three_node_traffic(scenario: &QueryScenario) -> Vec<SystemMessageValue> {
        vec![
            scenario.request(),
            scenario.response(&node(1), &log_messages(1..=2)),
            scenario.response(&node(2), &log_messages(1..=3)),
            scenario.response(&node(3), &log_messages(2..=3)),
            scenario.propagate(&node(2), &log_messages([3])),
            scenario.propagate(&node(3), &log_messages([3])),
        ]
    }

    // =============================================================================
    // INTEGRATION TESTS
    // =============================================================================

    #[tokio::test]
    async fn test_three_nodes_with_propagation_validate() {
        let scenario = QueryScenario::new("req-a", node(1), 3);
        let nodes = vec![node(1), node(2), node(3)];
        let (bus, service) = setup(&[&scenario], &nodes);

        let handle = spawn_validation(&service, &scenario, vec![1, 2, 3], nodes.clone());
        wait_for_subscribers(&bus, 1).await;
        publish_all(&bus, &three_node_traffic(&scenario)).await;

        let report = handle.await.unwrap().unwrap();
        assert_eq!(report.query_node, node(1));
        assert_eq!(report.responding_nodes.len(), 3);
        assert_eq!(report.verified_messages, 3);
    }

    #[tokio::test]
    async fn test_noise_on_the_bus_is_ignored() {
        let scenario = QueryScenario::new("req-a", node(1), 3);
        let nodes = vec![node(1), node(2), node(3)];
        let (bus, service) = setup(&[&scenario], &nodes);

        let handle = spawn_validation(&service, &scenario, vec![1, 2, 3], nodes.clone());
        wait_for_subscribers(&bus, 1).await;

        // Not decodable at all, then a kind this client does not consume
        let metadata = MessageMetadata::new(node(9), 0);
        bus.publish(RawSystemMessage::new("not json", metadata.clone()))
            .await;
        bus.publish(RawSystemMessage::new(r#"[1,7,0,"proof"]"#, metadata))
            .await;

        // Same query node, other query: its id becomes impossible
        let other = QueryScenario::new("req-other", node(1), 50);
        publish_all(
            &bus,
            &[
                other.response(&node(2), &log_messages(10..=20)),
                other.request(),
            ],
        )
        .await;

        // Same id addressed to another query node
        let foreign = QueryScenario::new("req-a", node(5), 3);
        publish_all(&bus, &[foreign.response(&node(4), &log_messages([99]))]).await;

        publish_all(&bus, &three_node_traffic(&scenario)).await;

        let report = handle.await.unwrap().unwrap();
        assert_eq!(
            report.responding_nodes,
            nodes.into_iter().collect::<BTreeSet<_>>()
        );
    }

    #[tokio::test]
    async fn test_hash_disagreement_is_reported() {
        let scenario = QueryScenario::new("req-a", node(1), 2);
        let nodes = vec![node(1), node(2)];
        let (bus, service) = setup(&[&scenario], &nodes);

        let handle = spawn_validation(&service, &scenario, vec![1, 2], nodes.clone());
        wait_for_subscribers(&bus, 1).await;

        let tampered = vec![
            (log_message(1).serialized_id(), log_message(1).content_hash()),
            (log_message(2).serialized_id(), MessageHash::new("0xdeadbeef")),
        ];
        publish_all(
            &bus,
            &[
                scenario.request(),
                scenario.response(&node(1), &log_messages(1..=2)),
                scenario.response_with(&node(2), tampered),
            ],
        )
        .await;

        let err = handle.await.unwrap().unwrap_err();
        assert_eq!(
            err,
            ValidationError::NodesDisagree {
                message_id: log_message(2).serialized_id()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_that_does_not_match_the_query_blocks_validation() {
        let scenario = QueryScenario::new("req-a", node(1), 2);
        let nodes = vec![node(1)];
        let (bus, service) = setup(&[&scenario], &nodes);

        let handle = spawn_validation(&service, &scenario, vec![1, 2], nodes.clone());
        wait_for_subscribers(&bus, 1).await;

        // The query node claims a different query under our request id
        publish_all(
            &bus,
            &[
                scenario.request_with(QueryOptions::Last { last: 200 }),
                scenario.response(&node(1), &log_messages(1..=2)),
            ],
        )
        .await;

        let err = handle.await.unwrap().unwrap_err();
        assert_eq!(err, ValidationError::Timeout);
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_node_times_out() {
        let scenario = QueryScenario::new("req-a", node(1), 3);
        let nodes = vec![node(1), node(2), node(3)];
        let (bus, service) = setup(&[&scenario], &nodes);

        let handle = spawn_validation(&service, &scenario, vec![1, 2, 3], nodes.clone());
        wait_for_subscribers(&bus, 1).await;

        let mut traffic = three_node_traffic(&scenario);
        traffic.retain(|value| value.sender() != &node(3));
        publish_all(&bus, &traffic).await;

        let err = handle.await.unwrap().unwrap_err();
        assert_eq!(err.to_string(), "Network verification timed out");
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_sessions_share_the_bus() {
        let first = QueryScenario::new("req-a", node(1), 2);
        let second = QueryScenario::new("req-b", node(2), 1);
        let (bus, service) = setup(&[&first, &second], &[node(1), node(2), node(3)]);

        let first_handle = spawn_validation(&service, &first, vec![1, 2], vec![node(1), node(2)]);
        let second_handle = spawn_validation(&service, &second, vec![2], vec![node(2), node(3)]);
        wait_for_subscribers(&bus, 2).await;

        publish_all(
            &bus,
            &[
                second.request(),
                first.request(),
                first.response(&node(2), &log_messages(1..=2)),
                second.response(&node(3), &log_messages([2])),
                first.response(&node(1), &log_messages(1..=2)),
                second.response(&node(2), &log_messages([2])),
            ],
        )
        .await;

        let first_report = first_handle.await.unwrap().unwrap();
        let second_report = second_handle.await.unwrap().unwrap();
        assert_eq!(first_report.query_node, node(1));
        assert_eq!(second_report.query_node, node(2));
        assert_eq!(second_report.verified_messages, 1);
    }

    #[tokio::test]
    async fn test_subscribing_before_the_query_keeps_early_messages() {
        let scenario = QueryScenario::new("req-a", node(1), 2);
        let (bus, service) = setup(&[&scenario], &[node(1)]);

        // Client subscribes, sends the query, and nodes answer before the
        // HTTP body is read
        let system_messages = service.subscribe();
        publish_all(
            &bus,
            &[
                scenario.request(),
                scenario.response(&node(1), &log_messages(1..=2)),
            ],
        )
        .await;

        let report = tokio::time::timeout(
            Duration::from_secs(1),
            service.validate_with_messages(
                scenario.query_input(),
                &scenario.query_url(),
                scenario.streaming_http_response(log_messages(1..=2), &[node(1)]),
                system_messages,
            ),
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(report.verified_messages, 2);
    }

    #[tokio::test]
    async fn test_outcomes_are_exported_as_metrics() {
        let _ = logstore_telemetry::init_telemetry(&TelemetryConfig {
            console_output: false,
            ..TelemetryConfig::default()
        });
        let verified = VALIDATION_SESSIONS_TOTAL
            .with_label_values(&["verified"])
            .get();

        let scenario = QueryScenario::new("req-m", node(1), 1);
        let (bus, service) = setup(&[&scenario], &[node(1)]);
        let handle = spawn_validation(&service, &scenario, vec![1], vec![node(1)]);
        wait_for_subscribers(&bus, 1).await;
        publish_all(
            &bus,
            &[scenario.request(), scenario.response(&node(1), &log_messages([1]))],
        )
        .await;
        handle.await.unwrap().unwrap();

        assert!(
            VALIDATION_SESSIONS_TOTAL
                .with_label_values(&["verified"])
                .get()
                > verified
        );
        let exported = logstore_telemetry::encode_metrics().unwrap();
        assert!(exported.contains("ls_validation_sessions_total"));
        assert!(exported.contains("ls_bus_messages_total"));
    }
}
