//! # Value Objects
//!
//! Configuration for network validation.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Hard ceiling on one validation session.
pub const DEFAULT_VALIDATION_TIMEOUT: Duration = Duration::from_millis(5_000);

/// Default bus buffer per subscriber, in messages.
pub const DEFAULT_BUS_CAPACITY: usize = 1_000;

/// Environment variable overriding [`ValidationConfig::timeout`], in milliseconds.
pub const TIMEOUT_ENV_VAR: &str = "LS_VALIDATION_TIMEOUT_MS";

/// Network validation configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Deadline for the whole session, started on invocation and never extended.
    pub timeout: Duration,
    /// Buffer size of the system message subscription.
    pub bus_capacity: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_VALIDATION_TIMEOUT,
            bus_capacity: DEFAULT_BUS_CAPACITY,
        }
    }
}

impl ValidationConfig {
    /// Defaults, with the timeout taken from `LS_VALIDATION_TIMEOUT_MS` when set.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`Self::from_env`] with an injectable variable source.
    ///
    /// Unparseable or zero values are ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(ms) = lookup(TIMEOUT_ENV_VAR)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|ms| *ms > 0)
        {
            config.timeout = Duration::from_millis(ms);
        }
        config
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
