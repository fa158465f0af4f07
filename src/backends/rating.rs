//! Rating service client.
//!
//! Reads are plain guarded calls. Writes are corrective side effects of the
//! borrow/return workflows, so they never fail the caller: the first attempt
//! runs on a detached task and a failure parks the change in the retry queue.

use async_trait::async_trait;
use std::sync::Arc;

use crate::backends::http::USER_HEADER;
use crate::backends::{HttpBackend, RatingApi, ServiceError};
use crate::domain::Rating;
use crate::resilience::RetryQueue;

/// A pending star adjustment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatingChange {
    pub username: String,
    pub diff: i64,
}

#[derive(Clone)]
pub struct RatingClient {
    http: Arc<HttpBackend>,
    retries: Arc<RetryQueue<RatingChange>>,
}

impl RatingClient {
    pub fn new(http: HttpBackend, retries: Arc<RetryQueue<RatingChange>>) -> Self {
        Self {
            http: Arc::new(http),
            retries,
        }
    }

    /// Corrections waiting for redelivery.
    pub fn pending_corrections(&self) -> usize {
        self.retries.len()
    }

    fn defer(&self, change: RatingChange) {
        self.retries.append(change);

        let http = self.http.clone();
        self.retries.start(move |change: RatingChange| {
            let http = http.clone();
            async move { apply(&http, &change).await }
        });
    }
}

async fn apply(http: &HttpBackend, change: &RatingChange) -> Result<(), ServiceError> {
    http.guarded("update_user_rating", || async {
        let url = http.url(&["api", "v1", "rating"])?;
        let request = http
            .client()
            .patch(url)
            .header(USER_HEADER, &change.username)
            .query(&[("diff", change.diff)]);
        http.send(request).await
    })
    .await
}

#[async_trait]
impl RatingApi for RatingClient {
    async fn get_user_rating(&self, username: &str) -> Result<Rating, ServiceError> {
        self.http
            .guarded("get_user_rating", || async {
                let url = self.http.url(&["api", "v1", "rating"])?;
                let request = self.http.client().get(url).header(USER_HEADER, username);
                self.http.send_json(request).await
            })
            .await
    }

    async fn update_user_rating(&self, username: &str, diff: i64) -> Result<(), ServiceError> {
        let change = RatingChange {
            username: username.to_string(),
            diff,
        };
        let client = self.clone();

        tokio::spawn(async move {
            if let Err(e) = apply(&client.http, &change).await {
                tracing::warn!(
                    username = %change.username,
                    diff = change.diff,
                    error = %e,
                    "Rating update failed, deferring to retry queue"
                );
                client.defer(change);
            }
        });

        Ok(())
    }
}

impl std::fmt::Debug for RatingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RatingClient")
            .field("http", &self.http)
            .field("pending_corrections", &self.retries.len())
            .finish()
    }
}
