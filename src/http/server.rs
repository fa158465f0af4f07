//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, request timeout)
//! - Serve until the shutdown signal fires

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::backends::RatingChange;
use crate::config::TimeoutConfig;
use crate::http::handlers;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::lifecycle::Shutdown;
use crate::orchestrator::Orchestrator;
use crate::resilience::RetryQueue;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Orchestrator,
    /// Deferred rating corrections, reported by the health endpoint.
    pub corrections: Option<Arc<RetryQueue<RatingChange>>>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator,
            corrections: None,
        }
    }

    pub fn with_corrections(mut self, queue: Arc<RetryQueue<RatingChange>>) -> Self {
        self.corrections = Some(queue);
        self
    }

    pub fn pending_corrections(&self) -> usize {
        self.corrections.as_ref().map_or(0, |q| q.len())
    }
}

/// HTTP server for the gateway API.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(state: AppState, timeouts: &TimeoutConfig) -> Self {
        Self {
            router: build_router(state, timeouts),
        }
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move { shutdown.wait().await })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(state: AppState, timeouts: &TimeoutConfig) -> Router {
    Router::new()
        .route("/api/v1/libraries", get(handlers::list_libraries))
        .route("/api/v1/libraries/{library_uid}/books", get(handlers::list_books))
        .route("/api/v1/rating", get(handlers::get_rating))
        .route(
            "/api/v1/reservations",
            get(handlers::list_reservations).post(handlers::take_book),
        )
        .route(
            "/api/v1/reservations/{reservation_uid}/return",
            post(handlers::return_book),
        )
        .route("/manage/health", get(handlers::health))
        .with_state(state)
        .layer(TimeoutLayer::new(Duration::from_secs(timeouts.request_secs)))
        .layer(propagate_request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(set_request_id_layer())
}
