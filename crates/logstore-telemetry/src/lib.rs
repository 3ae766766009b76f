//! # Log-Store Telemetry
//!
//! Logging and metrics for the log-store client.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use logstore_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     init_telemetry(&TelemetryConfig::from_env()).expect("Failed to init telemetry");
//!
//!     // Logs and metrics are now being collected
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OTEL_SERVICE_NAME` | `logstore-client` | Service name in logs |
//! | `LS_LOG_LEVEL` | `info` | Log level filter (`RUST_LOG` also honoured) |
//! | `LS_JSON_LOGS` | `false` | JSON log lines |
//! | `LS_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `LS_NETWORK` | `testnet` | Network name |

pub mod config;
pub mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    encode_metrics, register_metrics, HistogramTimer, BUS_MESSAGES_DROPPED_TOTAL,
    BUS_MESSAGES_TOTAL, VALIDATION_DURATION, VALIDATION_IMPOSSIBLE_REQUESTS,
    VALIDATION_SESSIONS_TOTAL,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Register metrics and install the global log subscriber.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    // Metrics first, they do not depend on the subscriber
    register_metrics()?;
    init_logging(config)
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}
