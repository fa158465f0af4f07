//! Deferred retry queue.
//!
//! # Responsibilities
//! - Buffer operations that failed synchronously (unbounded, in memory)
//! - Drain them from a single background task, one item per tick
//! - Re-append failed items to the tail so they cycle round-robin
//!
//! # Design Decisions
//! - Fixed tick interval, no backoff growth, no retry limit
//! - An item leaves the queue before its handler runs; it only comes back
//!   (at the tail) when the handler fails or times out
//! - The drain loop does not inherit any request's cancellation; it stops
//!   on process shutdown and whatever is still queued is dropped

use std::collections::VecDeque;
use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};

use crate::lifecycle::Shutdown;
use crate::observability::metrics;

/// FIFO queue of pending operations with a lazily started drain loop.
pub struct RetryQueue<T> {
    items: Arc<Mutex<VecDeque<T>>>,
    started: AtomicBool,
    interval: Duration,
    attempt_timeout: Duration,
    shutdown: Shutdown,
}

impl<T> RetryQueue<T>
where
    T: Clone + Send + 'static,
{
    /// Create an idle queue. Nothing runs until [`RetryQueue::start`].
    pub fn new(interval: Duration, attempt_timeout: Duration, shutdown: Shutdown) -> Self {
        Self {
            items: Arc::new(Mutex::new(VecDeque::new())),
            started: AtomicBool::new(false),
            interval,
            attempt_timeout,
            shutdown,
        }
    }

    /// Push an item to the tail.
    pub fn append(&self, item: T) {
        let mut items = lock(&self.items);
        items.push_back(item);
        metrics::record_retry_queue_depth(items.len());
    }

    /// Number of items waiting.
    pub fn len(&self) -> usize {
        lock(&self.items).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the drain loop has been started.
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// Spawn the drain loop. Only the first call has any effect.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start<F, Fut, E>(&self, handler: F)
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Display,
    {
        if self
            .started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        let items = self.items.clone();
        let period = self.interval;
        let attempt_timeout = self.attempt_timeout;
        // Subscribe before reading the flag so a trigger in between is not lost.
        let mut shutdown = self.shutdown.subscribe();
        if self.shutdown.is_triggered() {
            tracing::info!(pending = self.len(), "Shutdown already triggered, retry queue not started");
            return;
        }

        tracing::info!(interval_ms = period.as_millis() as u64, "Retry queue started");

        tokio::spawn(async move {
            let mut ticker = time::interval_at(time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = shutdown.recv() => {
                        let abandoned = lock(&items).len();
                        tracing::info!(abandoned, "Retry queue stopped");
                        break;
                    }
                }

                let Some(item) = lock(&items).pop_front() else {
                    continue;
                };

                let ok = match time::timeout(attempt_timeout, handler(item.clone())).await {
                    Ok(Ok(())) => true,
                    Ok(Err(e)) => {
                        tracing::warn!(error = %e, "Retry attempt failed, requeueing");
                        false
                    }
                    Err(_) => {
                        tracing::warn!(
                            timeout_ms = attempt_timeout.as_millis() as u64,
                            "Retry attempt timed out, requeueing"
                        );
                        false
                    }
                };

                let mut queue = lock(&items);
                if !ok {
                    queue.push_back(item);
                }
                metrics::record_retry_attempt(ok);
                metrics::record_retry_queue_depth(queue.len());
            }
        });
    }
}

fn lock<T>(items: &Mutex<VecDeque<T>>) -> MutexGuard<'_, VecDeque<T>> {
    items.lock().unwrap_or_else(PoisonError::into_inner)
}
