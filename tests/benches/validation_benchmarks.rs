//! # Log-Store Validation Benchmarks
//!
//! | Reduction | Runs on | Input |
//! |-----------|---------|-------|
//! | Storage matrix | completion, once | all pooled responses |
//! | Agreement | completion, once | matrix |
//! | Propagation diff | every admitted message | primary/secondary responses, propagates |
//! | Completion check | every admitted message | all pools |

use criterion::{criterion_group, criterion_main};
use ls_tests::benchmarks::ls_01_network_validation::{
    bench_completion_check, bench_propagation, bench_storage_matrix,
};

criterion_group!(
    benches,
    bench_storage_matrix,
    bench_propagation,
    bench_completion_check,
);

criterion_main!(benches);
