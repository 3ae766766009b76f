//! # LS-01 Network Validation Benchmarks
//!
//! The reductions run on every admitted system message:
//! - storage matrix construction from all pooled responses
//! - hash agreement over the matrix
//! - expected and missing propagation diffs
//! - completion check over realistic pools
//!
//! Conditions: up to 16 nodes answering `last 1000` queries with partially
//! overlapping holdings.

use crate::fixtures::{log_messages, node, QueryScenario};
use criterion::{black_box, BenchmarkId, Criterion, Throughput};
use ls_01_network_validation::domain::{
    check_collection_completion, convert_to_storage_matrix, get_expected_propagated_messages,
    get_missing_propagated_messages, nodes_agree_on_storage_matrix, ExpectedNodes, MessagePools,
};
use rand::Rng;
use shared_types::{QueryPropagate, QueryRequest, QueryResponse, SystemMessageValue};
use std::time::Duration;

/// Typed pools for one simulated query.
pub struct SimulatedPools {
    pub request: SystemMessageValue<QueryRequest>,
    pub responses: Vec<SystemMessageValue<QueryResponse>>,
    pub propagates: Vec<SystemMessageValue<QueryPropagate>>,
    pub expected: ExpectedNodes,
}

/// `nodes` storage nodes over `messages` messages. Each secondary misses
/// a random head window and holds the tail the primary lacks.
pub fn simulate(nodes: u8, messages: u64) -> SimulatedPools {
    let mut rng = rand::thread_rng();
    let scenario = QueryScenario::new("bench", node(1), messages);
    let primary_end = messages.saturating_sub(messages / 10).max(1);

    let mut pools = MessagePools::new();
    pools.push(scenario.request());
    pools.push(scenario.response(&node(1), &log_messages(1..=primary_end)));

    for index in 2..=nodes {
        let address = node(index);
        let start = rng.gen_range(1..=messages / 2 + 1);
        pools.push(scenario.response(&address, &log_messages(start..=messages)));

        let owed = log_messages(primary_end.max(start - 1) + 1..=messages);
        pools.push(scenario.propagate(&address, &owed));
    }

    SimulatedPools {
        request: pools.requests()[0].clone(),
        responses: pools.responses().to_vec(),
        propagates: pools.propagates().to_vec(),
        expected: ExpectedNodes::authoritative((1..=nodes).map(node)),
    }
}

pub fn bench_storage_matrix(c: &mut Criterion) {
    let mut group = c.benchmark_group("ls-01-storage-matrix");
    group.measurement_time(Duration::from_secs(5));

    for nodes in [2u8, 4, 16] {
        let pools = simulate(nodes, 1_000);
        let entries: u64 = pools
            .responses
            .iter()
            .map(|r| r.message.hash_map.len() as u64)
            .sum();

        group.throughput(Throughput::Elements(entries));
        group.bench_with_input(BenchmarkId::new("build", nodes), &pools, |b, pools| {
            b.iter(|| black_box(convert_to_storage_matrix(&pools.responses)))
        });

        let matrix = convert_to_storage_matrix(&pools.responses);
        group.bench_with_input(BenchmarkId::new("agreement", nodes), &matrix, |b, m| {
            b.iter(|| black_box(nodes_agree_on_storage_matrix(m)))
        });
    }

    group.finish();
}

pub fn bench_propagation(c: &mut Criterion) {
    let mut group = c.benchmark_group("ls-01-propagation");

    for nodes in [2u8, 4, 16] {
        let pools = simulate(nodes, 1_000);
        let (primary, secondary): (Vec<_>, Vec<_>) = pools
            .responses
            .iter()
            .partition(|r| r.sender() == pools.request.sender());

        group.bench_with_input(BenchmarkId::new("expected", nodes), &nodes, |b, _| {
            b.iter(|| black_box(get_expected_propagated_messages(&primary, &secondary)))
        });

        let expected = get_expected_propagated_messages(&primary, &secondary);
        group.bench_with_input(BenchmarkId::new("missing", nodes), &nodes, |b, _| {
            b.iter(|| black_box(get_missing_propagated_messages(&expected, &pools.propagates)))
        });
    }

    group.finish();
}

pub fn bench_completion_check(c: &mut Criterion) {
    let mut group = c.benchmark_group("ls-01-completion");

    for nodes in [2u8, 4, 16] {
        let pools = simulate(nodes, 1_000);
        group.bench_with_input(BenchmarkId::new("full", nodes), &pools, |b, pools| {
            b.iter(|| {
                black_box(check_collection_completion(
                    Some(&pools.request),
                    &pools.responses,
                    &pools.propagates,
                    Some(&pools.expected),
                ))
            })
        });
    }

    group.finish();
}

#[cfg(test)]
mod tests {
    use super::*;
    use ls_01_network_validation::CollectionState;

    #[test]
    fn test_simulated_pools_complete() {
        let pools = simulate(4, 100);
        let state = check_collection_completion(
            Some(&pools.request),
            &pools.responses,
            &pools.propagates,
            Some(&pools.expected),
        );
        assert_eq!(state, CollectionState::Complete);
    }

    #[test]
    fn test_simulated_nodes_agree() {
        let pools = simulate(4, 100);
        let matrix = convert_to_storage_matrix(&pools.responses);
        assert!(nodes_agree_on_storage_matrix(&matrix));
    }
}
