//! Monotonic capture time correction for position fixes.
//!
//! Some devices report a fix's monotonic timestamp from a clock that has
//! silently reset. When the reported value is implausibly far from "now",
//! the capture time is rebuilt from the fix's wall-clock time instead.

/// Largest plausible distance between a fix's monotonic timestamp and now.
pub const MAX_CLOCK_DRIFT_MS: i64 = 30_000;

/// Timestamps of a fix as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixTimestamps {
    /// Monotonic (time since boot) capture time.
    pub monotonic_ms: i64,
    /// Wall-clock capture time, milliseconds since the Unix epoch.
    pub wall_clock_ms: i64,
}

/// Clock readings taken when the fix is received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockReadings {
    pub monotonic_ms: i64,
    pub wall_clock_ms: i64,
}

/// Return a trustworthy monotonic capture time for a fix.
///
/// If the reported monotonic time is within [`MAX_CLOCK_DRIFT_MS`] of the
/// current monotonic reading it is used as is. Otherwise it is recomputed as
/// `now_monotonic - (now_wall - fix_wall)`.
pub fn correct_capture_time(fix: FixTimestamps, now: ClockReadings) -> i64 {
    let drift = (now.monotonic_ms - fix.monotonic_ms).abs();
    if drift <= MAX_CLOCK_DRIFT_MS {
        return fix.monotonic_ms;
    }

    let corrected = now.monotonic_ms - (now.wall_clock_ms - fix.wall_clock_ms);
    tracing::debug!(
        reported_ms = fix.monotonic_ms,
        corrected_ms = corrected,
        drift_ms = drift,
        "Fix monotonic timestamp out of range, rebuilt from wall clock"
    );
    corrected
}
