//! Configuration validation.
//!
//! Serde handles syntax; this checks values. Every problem is collected so an
//! operator sees the whole list at once.

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::{GatewayConfig, ServiceConfig};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    for (name, service) in [
        ("library", &config.services.library),
        ("rating", &config.services.rating),
        ("reservation", &config.services.reservation),
    ] {
        validate_service(name, service, &mut errors);
    }

    if config.resilience.retry_interval_ms == 0 {
        errors.push(ValidationError::new(
            "resilience.retry_interval_ms",
            "must be greater than zero",
        ));
    }
    if config.resilience.retry_attempt_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "resilience.retry_attempt_timeout_secs",
            "must be greater than zero",
        ));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than zero"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_service(name: &str, service: &ServiceConfig, errors: &mut Vec<ValidationError>) {
    match url::Url::parse(&service.address) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        _ => errors.push(ValidationError::new(
            format!("services.{name}.address"),
            format!("'{}' is not an http(s) URL", service.address),
        )),
    }
    if service.max_fails == 0 {
        errors.push(ValidationError::new(
            format!("services.{name}.max_fails"),
            "must be greater than zero",
        ));
    }
}
