//! Shared plumbing for the HTTP backend clients.
//!
//! Every client method follows the same sequence:
//!
//! ```text
//! build url from segments ── bad id ──▶ Err(InvalidRequest), breaker untouched
//!        │
//!        ▼
//! breaker.check(key) ── blocked ──▶ Err(CircuitOpen)
//!        │
//!        ▼
//! send request ── connect/DNS/timeout ──▶ Unavailable
//!        │     ── non-2xx / bad body ───▶ InvalidResponse
//!        ▼
//! decode ──▶ release(key) on success, inc(key) on any failure
//! ```

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::backends::ServiceError;
use crate::config::TimeoutConfig;
use crate::observability::metrics;
use crate::resilience::Breaker;

/// Header carrying the caller identity, both on the gateway API and towards
/// the rating and reservation services.
pub const USER_HEADER: &str = "X-User-Name";

/// Build the pooled client shared by all backends.
pub fn build_client(timeouts: &TimeoutConfig) -> reqwest::Result<Client> {
    Client::builder()
        .connect_timeout(Duration::from_secs(timeouts.connect_secs))
        .timeout(Duration::from_secs(timeouts.request_secs))
        .pool_idle_timeout(Duration::from_secs(30))
        .pool_max_idle_per_host(10)
        .build()
}

/// One backend: base URL, pooled client and the breaker guarding it.
pub struct HttpBackend {
    service: &'static str,
    base_url: Url,
    client: Client,
    breaker: Arc<dyn Breaker>,
}

impl HttpBackend {
    pub fn new(
        service: &'static str,
        address: &str,
        client: Client,
        breaker: Arc<dyn Breaker>,
    ) -> Result<Self, url::ParseError> {
        Ok(Self {
            service,
            base_url: Url::parse(address)?,
            client,
            breaker,
        })
    }

    pub fn service(&self) -> &'static str {
        self.service
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Absolute URL for a path given as segments.
    ///
    /// Each segment is percent-encoded as exactly one path segment (`/`, `?`
    /// and `#` included), so an id can neither climb out of its endpoint nor
    /// replace the query string. Empty, `.` and `..` segments are rejected.
    pub fn url(&self, segments: &[&str]) -> Result<Url, ServiceError> {
        if let Some(bad) = segments.iter().find(|s| matches!(**s, "" | "." | "..")) {
            return Err(ServiceError::InvalidRequest {
                service: self.service,
                reason: format!("invalid path segment '{bad}'"),
            });
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ServiceError::InvalidRequest {
                service: self.service,
                reason: format!("address '{}' cannot carry a path", self.base_url),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Breaker key for one of this backend's operations.
    pub fn key(&self, operation: &str) -> String {
        format!("{}.{}", self.service, operation)
    }

    /// Run `call` under the breaker for `operation`.
    pub async fn guarded<T, F, Fut>(&self, operation: &str, call: F) -> Result<T, ServiceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let key = self.key(operation);
        if self.breaker.check(&key) {
            tracing::debug!(operation = %key, "Circuit open, skipping call");
            metrics::record_backend_call(self.service, operation, "circuit_open");
            return Err(ServiceError::CircuitOpen { operation: key });
        }

        match call().await {
            Ok(value) => {
                self.breaker.release(&key);
                metrics::record_backend_call(self.service, operation, "ok");
                Ok(value)
            }
            Err(e) => {
                self.breaker.inc(&key);
                metrics::record_backend_call(self.service, operation, e.outcome());
                tracing::warn!(operation = %key, error = %e, "Backend call failed");
                Err(e)
            }
        }
    }

    /// Send and decode a JSON body.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ServiceError> {
        let response = self.execute(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ServiceError::from_transport(self.service, e))
    }

    /// Send and ignore the body.
    pub async fn send(&self, request: RequestBuilder) -> Result<(), ServiceError> {
        self.execute(request).await.map(|_| ())
    }

    async fn execute(&self, request: RequestBuilder) -> Result<reqwest::Response, ServiceError> {
        let response = request
            .send()
            .await
            .map_err(|e| ServiceError::from_transport(self.service, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::InvalidResponse {
                service: self.service,
                reason: format!("status {}", status.as_u16()),
            });
        }
        Ok(response)
    }
}

impl std::fmt::Debug for HttpBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBackend")
            .field("service", &self.service)
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}
