//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files and every
//! section falls back to defaults, so an empty file is a valid config.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Addresses and breaker thresholds of the three backends.
    pub services: ServicesConfig,

    /// Breaker cool-down and retry queue settings.
    pub resilience: ResilienceConfig,

    /// Timeout configuration for outbound calls.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// The three backends the gateway fronts.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServicesConfig {
    pub library: ServiceConfig,
    pub rating: ServiceConfig,
    pub reservation: ServiceConfig,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            library: ServiceConfig::with_address("http://127.0.0.1:8060"),
            rating: ServiceConfig::with_address("http://127.0.0.1:8050"),
            reservation: ServiceConfig::with_address("http://127.0.0.1:8070"),
        }
    }
}

/// A single backend service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Base URL (e.g., "http://library:8060").
    pub address: String,

    /// Consecutive failures before the breaker opens.
    #[serde(default = "default_max_fails")]
    pub max_fails: u64,
}

impl ServiceConfig {
    pub fn with_address(address: &str) -> Self {
        Self {
            address: address.to_string(),
            max_fails: default_max_fails(),
        }
    }
}

fn default_max_fails() -> u64 {
    3
}

/// Breaker and retry queue tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ResilienceConfig {
    /// How long an open circuit stays open after the last failure.
    pub cool_down_secs: u64,

    /// Retry queue tick interval in milliseconds.
    pub retry_interval_ms: u64,

    /// Deadline for a single retry attempt in seconds.
    pub retry_attempt_timeout_secs: u64,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            cool_down_secs: 60,
            retry_interval_ms: 1000,
            retry_attempt_timeout_secs: 5,
        }
    }
}

impl ResilienceConfig {
    pub fn cool_down(&self) -> Duration {
        Duration::from_secs(self.cool_down_secs)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    pub fn retry_attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.retry_attempt_timeout_secs)
    }
}

/// Timeout configuration for outbound calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Per-request timeout (backend calls and inbound API requests) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 2,
            request_secs: 10,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// "pretty" or "json".
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
