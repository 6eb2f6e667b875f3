//! Sliding-window rate limiter for scan operations.
//!
//! Bounds how many actions may *start* within any trailing window, shared
//! across every producer holding the same instance. Acquisition never fails;
//! it only delays.
//!
//! # Design
//!
//! ```text
//! grants: [t0, t1, ..., tN-1]   (oldest first, at most N entries)
//!
//! acquire():
//!   lock queue (FIFO)
//!   while queue is full and now - oldest < window: sleep(window - (now - oldest))
//!   drop oldest if full, push now
//! ```
//!
//! The caller keeps the queue lock while it sleeps. `tokio::sync::Mutex`
//! hands the lock to waiters in arrival order, so a later caller can never
//! be granted ahead of an earlier one, and every waiter recomputes its wait
//! against the queue as it is when it gets the lock.
//!
//! Dropping an `acquire()` future before it returns leaves the queue as it
//! was: the grant is only recorded once the wait is over.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Mutex;

use crate::clock::{Clock, MonotonicClock};

/// Default number of scans allowed per window.
pub const DEFAULT_MAX_ACTIONS: usize = 4;

/// Default window length.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(120);

/// Rate limiter configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RateLimiterError {
    /// A limiter that admits nothing would block forever.
    #[error("max_actions must be greater than zero")]
    ZeroCapacity,
}

/// Limiter settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimiterConfig {
    /// Maximum grants within one window.
    pub max_actions: usize,
    /// Trailing window length.
    pub window: Duration,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_actions: DEFAULT_MAX_ACTIONS,
            window: DEFAULT_WINDOW,
        }
    }
}

/// FIFO sliding-window throttle.
///
/// Share it between producers via `Arc<RateLimiter>`.
pub struct RateLimiter {
    max_actions: usize,
    window: Duration,
    clock: Arc<dyn Clock>,
    /// Timestamps of the most recent grants, oldest first.
    grants: Mutex<VecDeque<i64>>,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("max_actions", &self.max_actions)
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}

impl RateLimiter {
    /// Create a limiter with an explicit clock.
    ///
    /// The clock must advance in step with the tokio timer, since waits are
    /// served with `tokio::time::sleep`.
    pub fn new(
        max_actions: usize,
        window: Duration,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, RateLimiterError> {
        if max_actions == 0 {
            return Err(RateLimiterError::ZeroCapacity);
        }

        tracing::debug!(
            max_actions,
            window_ms = window.as_millis() as u64,
            "Created scan rate limiter"
        );

        Ok(Self {
            max_actions,
            window,
            clock,
            grants: Mutex::new(VecDeque::with_capacity(max_actions)),
        })
    }

    /// Create a limiter from configuration using a [`MonotonicClock`].
    pub fn from_config(config: &RateLimiterConfig) -> Result<Self, RateLimiterError> {
        Self::new(
            config.max_actions,
            config.window,
            Arc::new(MonotonicClock::new()),
        )
    }

    /// Wait until the caller may start an action, then record the grant.
    pub async fn acquire(&self) {
        let mut grants = self.grants.lock().await;
        let window_ms = self.window.as_millis() as i64;

        while grants.len() >= self.max_actions {
            let Some(&oldest) = grants.front() else {
                break;
            };
            let elapsed = self.clock.now_ms() - oldest;
            if elapsed >= window_ms {
                grants.pop_front();
                continue;
            }

            let wait = Duration::from_millis((window_ms - elapsed) as u64);
            tracing::debug!(
                wait_ms = wait.as_millis() as u64,
                in_window = grants.len(),
                "Rate limit reached, delaying action"
            );
            tokio::time::sleep(wait).await;
        }

        grants.push_back(self.clock.now_ms());
    }

    /// Maximum grants per window.
    pub fn max_actions(&self) -> usize {
        self.max_actions
    }

    /// Window length.
    pub fn window(&self) -> Duration {
        self.window
    }
}
