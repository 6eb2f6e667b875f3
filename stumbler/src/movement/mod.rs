//! Movement detection.
//!
//! Produces an ordered, distinct-until-changed stream of "is moving" flags
//! used to gate scanning and report creation. Two detectors are provided:
//!
//! - [`LocationMovementDetector`]: compares successive position fixes
//! - [`MotionSensorMovementDetector`]: listens to a one-shot hardware
//!   significant-motion trigger
//!
//! # Subscription lifetime
//!
//! ```text
//! observe_is_moving() ──► spawn task ──► mpsc ──► MovementStream
//!                              ▲                        │
//!                              └──── CancellationToken ◄┘ (dropped)
//! ```
//!
//! Each call spawns a detector task owning the platform listener (position
//! stream or armed sensor). Dropping the returned [`MovementStream`] cancels
//! the task, which releases the listener before exiting.

mod location;
mod motion;

pub use location::{LocationMovementDetector, LocationSource, MovementState};
pub use motion::{MotionSensorMovementDetector, SignificantMotionSensor};

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::Stream;
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, DropGuard};

/// Default distance that counts as movement (meters).
pub const DEFAULT_DISTANCE_THRESHOLD_M: f64 = 10.0;

/// Default altitude change that counts as movement (meters).
pub const DEFAULT_ALTITUDE_THRESHOLD_M: f64 = 15.0;

/// Default delay before reporting "stopped".
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(45);

/// Movement detection thresholds.
#[derive(Debug, Clone, PartialEq)]
pub struct MovementConfig {
    /// Horizontal distance from the reference fix that counts as moving.
    pub distance_threshold_m: f64,
    /// Absolute altitude change from the reference fix that counts as moving.
    pub altitude_threshold_m: f64,
    /// How long the detector must stay still before emitting `false`.
    pub settle_delay: Duration,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            distance_threshold_m: DEFAULT_DISTANCE_THRESHOLD_M,
            altitude_threshold_m: DEFAULT_ALTITUDE_THRESHOLD_M,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

/// Source of a boolean movement stream.
pub trait MovementDetector: Send + Sync {
    /// Start observing. Must be called from within a tokio runtime.
    fn observe_is_moving(&self) -> MovementStream;
}

/// Stream of movement flags bound to a detector task.
///
/// Dropping the stream stops the task and releases its listener.
pub struct MovementStream {
    receiver: mpsc::UnboundedReceiver<bool>,
    _cancel_on_drop: DropGuard,
}

impl MovementStream {
    /// Spawn `task` with a sender and a cancellation token, returning the
    /// receiving end.
    pub(crate) fn spawn<F, Fut>(task: F) -> Self
    where
        F: FnOnce(MovementSender, CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let token = CancellationToken::new();

        tokio::spawn(task(MovementSender::new(tx), token.clone()));

        Self {
            receiver: rx,
            _cancel_on_drop: token.drop_guard(),
        }
    }
}

impl Stream for MovementStream {
    type Item = bool;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<bool>> {
        self.get_mut().receiver.poll_recv(cx)
    }
}

/// Sending half that suppresses repeated values.
pub(crate) struct MovementSender {
    tx: mpsc::UnboundedSender<bool>,
    last: Option<bool>,
}

impl MovementSender {
    fn new(tx: mpsc::UnboundedSender<bool>) -> Self {
        Self { tx, last: None }
    }

    /// Emit `value` unless it equals the previous emission.
    ///
    /// Returns `false` once the receiver is gone.
    pub(crate) fn emit(&mut self, value: bool) -> bool {
        if self.last == Some(value) {
            return true;
        }
        self.last = Some(value);
        tracing::debug!(is_moving = value, "Movement state changed");
        self.tx.send(value).is_ok()
    }

    /// Last emitted value.
    pub(crate) fn last(&self) -> Option<bool> {
        self.last
    }
}
