//! Time sources.
//!
//! Monotonic readings drive age arithmetic and throttling; wall-clock
//! readings only label reports for the upload protocol.

use tokio::time::Instant;

/// A source of millisecond timestamps.
pub trait Clock: Send + Sync {
    /// Current reading in milliseconds.
    fn now_ms(&self) -> i64;
}

/// Monotonic clock measured from its own creation.
///
/// Backed by `tokio::time::Instant`, so it follows the runtime's timer
/// (including paused time in tests). Components that sleep on the tokio
/// timer and compare against this clock therefore agree on elapsed time.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> i64 {
        self.origin.elapsed().as_millis() as i64
    }
}

/// Wall clock in milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, Default)]
pub struct WallClock;

impl Clock for WallClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}
