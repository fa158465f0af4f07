//! Circuit breaker for backend protection.
//!
//! # States
//! Every operation key carries a consecutive-failure count and the instant of
//! its last failure. There is no explicit half-open state:
//!
//! ```text
//! Closed → Open: failure_count >= max_failures (stamped with the failure time)
//! Open → Closed: cool-down elapsed since the last failure (next call goes through)
//! any → Closed (count = 0): release() after a successful call
//! ```
//!
//! A call admitted after the cool-down that fails again re-opens the key at
//! once, because the count is still at or above the threshold.
//!
//! # Design Decisions
//! - One breaker per backend, keyed by operation name (not global)
//! - Keys are created lazily on first use and live for the process lifetime
//! - `check`/`inc`/`release` are each atomic per key (DashMap shard lock)
//! - Blocked means `failure_count >= max_failures` AND inside the cool-down.
//!   The looser "threshold OR recent failure" form is deliberately not used:
//!   a key below the threshold is never blocked, however recent its failure.

use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;

use crate::observability::metrics;

/// Capability set every call site depends on.
///
/// Callers must `check` before attempting and report exactly one of
/// `inc`/`release` afterwards.
pub trait Breaker: Send + Sync {
    /// Returns true when calls for `operation` are currently blocked.
    fn check(&self, operation: &str) -> bool;

    /// Records a failed attempt.
    fn inc(&self, operation: &str);

    /// Records a successful attempt, closing the circuit.
    fn release(&self, operation: &str);
}

/// Failure bookkeeping for a single operation key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CircuitState {
    /// Consecutive failures since the last release.
    pub failure_count: u64,
    /// `None` means the key never failed (or was released).
    pub last_failure_at: Option<Instant>,
}

/// Counter-based breaker over a map of operation keys.
#[derive(Debug)]
pub struct CircuitBreaker {
    max_failures: u64,
    cool_down: Duration,
    states: DashMap<String, CircuitState>,
}

impl CircuitBreaker {
    /// Create a breaker that opens after `max_failures` consecutive failures
    /// and stays open for `cool_down` after the most recent one.
    pub fn new(max_failures: u64, cool_down: Duration) -> Self {
        Self {
            max_failures: max_failures.max(1),
            cool_down,
            states: DashMap::new(),
        }
    }

    /// Snapshot of the state for `operation` (default if never seen).
    pub fn state(&self, operation: &str) -> CircuitState {
        self.states
            .get(operation)
            .map(|s| *s.value())
            .unwrap_or_default()
    }

    pub fn max_failures(&self) -> u64 {
        self.max_failures
    }

    fn is_open(&self, state: &CircuitState, now: Instant) -> bool {
        let Some(last) = state.last_failure_at else {
            return false;
        };
        state.failure_count >= self.max_failures && now < last + self.cool_down
    }
}

impl Breaker for CircuitBreaker {
    fn check(&self, operation: &str) -> bool {
        let Some(state) = self.states.get(operation) else {
            return false;
        };
        let blocked = self.is_open(state.value(), Instant::now());
        if blocked {
            metrics::record_circuit_rejection(operation);
        }
        blocked
    }

    fn inc(&self, operation: &str) {
        let mut entry = self.states.entry(operation.to_string()).or_default();
        let state = entry.value_mut();
        state.failure_count = state.failure_count.saturating_add(1);
        state.last_failure_at = Some(Instant::now());

        if state.failure_count == self.max_failures {
            tracing::warn!(
                operation = %operation,
                failures = state.failure_count,
                cool_down_secs = self.cool_down.as_secs(),
                "Circuit opened"
            );
        }
    }

    fn release(&self, operation: &str) {
        // Only touch keys that exist; a fresh key is already closed.
        if let Some(mut entry) = self.states.get_mut(operation) {
            if entry.failure_count >= self.max_failures {
                tracing::info!(operation = %operation, "Circuit closed");
            }
            *entry.value_mut() = CircuitState::default();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OP: &str = "library.get_books";

    #[test]
    fn test_fresh_key_is_never_blocked() {
        let cb = CircuitBreaker::new(3, Duration::from_secs(60));
        assert!(!cb.check(OP));
        assert_eq!(cb.state(OP), CircuitState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_opens_exactly_at_threshold() {
        let cb = CircuitBreaker::new(3, Duration::from_secs(60));

        cb.inc(OP);
        assert!(!cb.check(OP));
        cb.inc(OP);
        assert!(!cb.check(OP));
        cb.inc(OP);
        assert!(cb.check(OP), "third failure must open the circuit");
        assert_eq!(cb.state(OP).failure_count, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recent_failure_below_threshold_is_admitted() {
        let cb = CircuitBreaker::new(3, Duration::from_secs(60));
        cb.inc(OP);
        cb.inc(OP);

        // Well inside the cool-down window, but only two of three failures.
        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(!cb.check(OP));
        assert_eq!(cb.state(OP).failure_count, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stays_open_for_cool_down_without_release() {
        let cb = CircuitBreaker::new(2, Duration::from_secs(60));
        cb.inc(OP);
        cb.inc(OP);

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(cb.check(OP));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(!cb.check(OP), "cool-down elapsed, next call is admitted");

        // The admitted call fails again: open immediately, new window.
        cb.inc(OP);
        assert!(cb.check(OP));
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_resets_regardless_of_state() {
        let cb = CircuitBreaker::new(1, Duration::from_secs(60));
        cb.inc(OP);
        cb.inc(OP);
        assert!(cb.check(OP));

        cb.release(OP);
        assert!(!cb.check(OP));
        assert_eq!(cb.state(OP), CircuitState::default());

        // Idempotent.
        cb.release(OP);
        cb.release("never.seen");
        assert!(!cb.check(OP));
    }

    #[tokio::test(start_paused = true)]
    async fn test_keys_are_isolated() {
        let cb = CircuitBreaker::new(1, Duration::from_secs(60));
        cb.inc("rating.get_user_rating");
        assert!(cb.check("rating.get_user_rating"));
        assert!(!cb.check("rating.update_user_rating"));
    }

    #[test]
    fn test_zero_threshold_is_clamped() {
        let cb = CircuitBreaker::new(0, Duration::from_secs(1));
        assert_eq!(cb.max_failures(), 1);
        assert!(!cb.check(OP));
    }
}
