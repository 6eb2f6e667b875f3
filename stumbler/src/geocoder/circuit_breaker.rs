//! Circuit breaker for address lookups.
//!
//! Counts consecutive transport failures of the underlying geocoder. Once the
//! count reaches the threshold, lookups are suppressed until the cooldown has
//! passed since the most recent failure.
//!
//! # State Machine
//!
//! ```text
//! Closed   --[failures reach threshold]-------------> Open
//! Open     --[cooldown elapsed since last failure]--> HalfOpen
//! HalfOpen --[success]------------------------------> Closed (count reset)
//! HalfOpen --[transport failure]--------------------> Open (cooldown restarts)
//! ```
//!
//! Cooldown expiry alone does not reset the failure count; only a success
//! does. Timing uses `tokio::time::Instant` so tests can drive it with paused
//! time.
//!
//! # Thread Safety
//!
//! One instance is shared by every caller of a geocoder. State lives behind a
//! single `parking_lot::Mutex`, so checks and updates are linearizable.

use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

/// Default consecutive failures before the circuit opens.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;

/// Default time lookups stay suppressed after the latest failure.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(10 * 60);

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Lookups are allowed.
    Closed,
    /// Lookups are suppressed.
    Open,
    /// Cooldown has passed; lookups are allowed while the count is still high.
    HalfOpen,
}

impl CircuitState {
    /// User-facing label.
    pub fn display_status(&self) -> &'static str {
        match self {
            CircuitState::Closed => "Available",
            CircuitState::Open => "Paused",
            CircuitState::HalfOpen => "Retrying",
        }
    }
}

#[derive(Debug)]
struct CircuitBreakerInner {
    consecutive_failures: u32,
    last_failure: Option<Instant>,
}

/// Failure-count circuit breaker with a cooldown.
#[derive(Debug)]
pub struct CircuitBreaker {
    failure_threshold: u32,
    cooldown: Duration,
    inner: Mutex<CircuitBreakerInner>,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, cooldown: Duration) -> Self {
        Self {
            failure_threshold,
            cooldown,
            inner: Mutex::new(CircuitBreakerInner {
                consecutive_failures: 0,
                last_failure: None,
            }),
        }
    }

    fn state_of(&self, inner: &CircuitBreakerInner) -> CircuitState {
        if inner.consecutive_failures < self.failure_threshold {
            return CircuitState::Closed;
        }
        match inner.last_failure {
            Some(at) if at.elapsed() < self.cooldown => CircuitState::Open,
            _ => CircuitState::HalfOpen,
        }
    }

    /// Whether a lookup may be attempted now.
    pub fn allow_request(&self) -> bool {
        let inner = self.inner.lock();
        let state = self.state_of(&inner);
        if state == CircuitState::Open {
            tracing::trace!(
                failures = inner.consecutive_failures,
                "Circuit breaker open, suppressing lookup"
            );
        }
        state != CircuitState::Open
    }

    /// Record a successful lookup, closing the circuit.
    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        if inner.consecutive_failures >= self.failure_threshold {
            tracing::info!("Circuit breaker CLOSED - geocoder recovered");
        }
        inner.consecutive_failures = 0;
        inner.last_failure = None;
    }

    /// Record a transport failure.
    pub fn record_failure(&self) {
        let mut inner = self.inner.lock();
        inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);
        inner.last_failure = Some(Instant::now());

        if inner.consecutive_failures == self.failure_threshold {
            tracing::warn!(
                failures = inner.consecutive_failures,
                cooldown_secs = self.cooldown.as_secs(),
                "Circuit breaker OPENED - geocoder lookups paused"
            );
        } else {
            tracing::debug!(
                failures = inner.consecutive_failures,
                "Geocoder transport failure recorded"
            );
        }
    }

    /// Current state.
    pub fn state(&self) -> CircuitState {
        let inner = self.inner.lock();
        self.state_of(&inner)
    }

    /// Current consecutive failure count.
    pub fn consecutive_failures(&self) -> u32 {
        self.inner.lock().consecutive_failures
    }

    pub fn is_open(&self) -> bool {
        self.state() == CircuitState::Open
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(DEFAULT_FAILURE_THRESHOLD, DEFAULT_COOLDOWN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_initial_state_is_closed() {
        let cb = CircuitBreaker::default();
        assert_eq!(cb.state(), CircuitState::Closed);
        assert!(cb.allow_request());
    }

    #[tokio::test(start_paused = true)]
    async fn test_opens_at_threshold() {
        let cb = CircuitBreaker::new(3, Duration::from_secs(600));

        cb.record_failure();
        cb.record_failure();
        assert!(cb.allow_request(), "below threshold stays closed");

        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
        assert!(!cb.allow_request());
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_opens_after_cooldown_without_resetting_count() {
        let cb = CircuitBreaker::new(3, Duration::from_secs(600));
        for _ in 0..3 {
            cb.record_failure();
        }

        tokio::time::advance(Duration::from_secs(599)).await;
        assert!(!cb.allow_request());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        assert!(cb.allow_request());
        assert_eq!(cb.consecutive_failures(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_in_half_open_reopens() {
        let cb = CircuitBreaker::new(3, Duration::from_secs(600));
        for _ in 0..3 {
            cb.record_failure();
        }
        tokio::time::advance(Duration::from_secs(600)).await;
        assert!(cb.allow_request());

        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_resets_count() {
        let cb = CircuitBreaker::new(3, Duration::from_secs(600));
        cb.record_failure();
        cb.record_failure();
        cb.record_success();
        cb.record_failure();
        cb.record_failure();

        assert_eq!(cb.consecutive_failures(), 2);
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn test_circuit_state_display_status() {
        assert_eq!(CircuitState::Closed.display_status(), "Available");
        assert_eq!(CircuitState::Open.display_status(), "Paused");
        assert_eq!(CircuitState::HalfOpen.display_status(), "Retrying");
    }

    #[tokio::test(start_paused = true)]
    async fn test_circuit_breaker_thread_safe() {
        let cb = Arc::new(CircuitBreaker::new(1000, Duration::from_secs(1)));
        let mut handles = vec![];

        for _ in 0..4 {
            let cb = Arc::clone(&cb);
            handles.push(std::thread::spawn(move || {
                for _ in 0..100 {
                    cb.record_failure();
                    cb.allow_request();
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cb.consecutive_failures(), 400);
    }
}
