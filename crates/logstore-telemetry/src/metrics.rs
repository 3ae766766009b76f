//! Prometheus metrics for the log-store client.
//!
//! All metrics follow the naming convention: `ls_<area>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., validation sessions)
//! - **Histogram**: Distribution of values (e.g., validation duration)

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Histogram, HistogramOpts, Opts, Registry,
    TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // NETWORK VALIDATION METRICS
    // =========================================================================

    /// Finished validation sessions by outcome
    pub static ref VALIDATION_SESSIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("ls_validation_sessions_total", "Network validation sessions by outcome"),
        &["outcome"]  // outcome: verified/timeout/nodes_disagree/missing_attestation/error
    ).expect("metric creation failed");

    /// Wall time of a validation session
    pub static ref VALIDATION_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "ls_validation_duration_seconds",
            "Time from validation start to outcome"
        ).buckets(exponential_buckets(0.005, 2.0, 12).expect("valid buckets"))
    ).expect("metric creation failed");

    /// Request ids blacklisted because the query they carry cannot be ours
    pub static ref VALIDATION_IMPOSSIBLE_REQUESTS: Counter = Counter::new(
        "ls_validation_impossible_requests_total",
        "Query requests rejected as incompatible with the local query"
    ).expect("metric creation failed");

    // =========================================================================
    // SYSTEM BUS METRICS
    // =========================================================================

    /// Decoded system messages by kind
    pub static ref BUS_MESSAGES_TOTAL: CounterVec = CounterVec::new(
        Opts::new("ls_bus_messages_total", "System messages decoded from the bus"),
        &["kind"]
    ).expect("metric creation failed");

    /// Messages a subscriber never saw
    pub static ref BUS_MESSAGES_DROPPED_TOTAL: CounterVec = CounterVec::new(
        Opts::new("ls_bus_messages_dropped_total", "System messages skipped by a subscriber"),
        &["reason"]  // reason: lagged/malformed/unsupported_type/...
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry.
///
/// Safe to call more than once.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Validation
        Box::new(VALIDATION_SESSIONS_TOTAL.clone()),
        Box::new(VALIDATION_DURATION.clone()),
        Box::new(VALIDATION_IMPOSSIBLE_REQUESTS.clone()),
        // Bus
        Box::new(BUS_MESSAGES_TOTAL.clone()),
        Box::new(BUS_MESSAGES_DROPPED_TOTAL.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        self.histogram.observe(duration);
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::metrics::HistogramTimer::new(&$histogram)
    };
}
