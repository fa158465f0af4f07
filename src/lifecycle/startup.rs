//! Startup wiring.
//!
//! Builds, in order: one breaker per backend, the rating retry queue, the
//! three clients, the orchestrator, and the handler state. Nothing here is a
//! global; every component is owned by the returned [`AppState`].

use std::sync::Arc;
use thiserror::Error;

use crate::backends::{
    build_client, HttpBackend, LibraryClient, RatingClient, ReservationClient,
};
use crate::config::{GatewayConfig, ServiceConfig};
use crate::http::AppState;
use crate::lifecycle::Shutdown;
use crate::orchestrator::Orchestrator;
use crate::resilience::{Breaker, CircuitBreaker, RetryQueue};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("invalid address for {service} service: {source}")]
    Address {
        service: &'static str,
        source: url::ParseError,
    },
}

/// Assemble the gateway from configuration.
pub fn assemble(config: &GatewayConfig, shutdown: &Shutdown) -> Result<AppState, StartupError> {
    let client = build_client(&config.timeouts)?;
    let cool_down = config.resilience.cool_down();

    let backend = |service: &'static str, cfg: &ServiceConfig| {
        let breaker: Arc<dyn Breaker> = Arc::new(CircuitBreaker::new(cfg.max_fails, cool_down));
        HttpBackend::new(service, &cfg.address, client.clone(), breaker)
            .map_err(|source| StartupError::Address { service, source })
    };

    let corrections = Arc::new(RetryQueue::new(
        config.resilience.retry_interval(),
        config.resilience.retry_attempt_timeout(),
        shutdown.clone(),
    ));

    let library = LibraryClient::new(backend("library", &config.services.library)?);
    let rating = RatingClient::new(
        backend("rating", &config.services.rating)?,
        corrections.clone(),
    );
    let reservation = ReservationClient::new(backend("reservation", &config.services.reservation)?);

    tracing::info!(
        library = %config.services.library.address,
        rating = %config.services.rating.address,
        reservation = %config.services.reservation.address,
        cool_down_secs = config.resilience.cool_down_secs,
        "Backend clients ready"
    );

    let orchestrator = Orchestrator::new(Arc::new(library), Arc::new(rating), Arc::new(reservation));
    Ok(AppState::new(orchestrator).with_corrections(corrections))
}
