//! Significant-motion sensor movement detection.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::{MovementDetector, MovementSender, MovementStream};

/// Platform adapter for a one-shot significant-motion trigger.
///
/// Each `arm()` registers a listener that fires at most once. `disarm()`
/// unregisters any listener still pending.
pub trait SignificantMotionSensor: Send + Sync {
    /// Register a one-shot trigger. The receiver resolves when motion is
    /// detected; it errors if the sensor drops the listener without firing.
    fn arm(&self) -> oneshot::Receiver<()>;

    /// Unregister the pending trigger, if any.
    fn disarm(&self);
}

/// Movement detector driven by hardware motion triggers.
///
/// Emits `true` as soon as observation starts, then `false` once
/// `settle_delay` passes without a trigger. Every trigger emits `true` (if
/// not already moving), re-arms the sensor and restarts the delay.
///
/// A trigger dropped by the sensor without firing is re-armed once. If the
/// replacement is dropped as well, the detector stops listening and stays
/// at its last value until the stream is dropped.
pub struct MotionSensorMovementDetector<S> {
    sensor: Arc<S>,
    settle_delay: Duration,
}

impl<S: SignificantMotionSensor + 'static> MotionSensorMovementDetector<S> {
    pub fn new(sensor: Arc<S>, settle_delay: Duration) -> Self {
        Self {
            sensor,
            settle_delay,
        }
    }
}

impl<S: SignificantMotionSensor + 'static> MovementDetector for MotionSensorMovementDetector<S> {
    fn observe_is_moving(&self) -> MovementStream {
        let sensor = Arc::clone(&self.sensor);
        let settle_delay = self.settle_delay;
        MovementStream::spawn(move |tx, token| run(sensor, settle_delay, tx, token))
    }
}

async fn run<S: SignificantMotionSensor>(
    sensor: Arc<S>,
    settle_delay: Duration,
    mut tx: MovementSender,
    token: CancellationToken,
) {
    if !tx.emit(true) {
        return;
    }

    let mut trigger = sensor.arm();
    let mut armed = true;
    let mut rearmed_after_drop = false;
    let settle = tokio::time::sleep(settle_delay);
    tokio::pin!(settle);
    let mut settled = false;

    loop {
        tokio::select! {
            biased;

            _ = token.cancelled() => {
                tracing::debug!("Motion observation cancelled, disarming sensor");
                break;
            }

            fired = &mut trigger, if armed => {
                match fired {
                    Ok(()) => {
                        tracing::trace!("Significant motion triggered");
                        if !tx.emit(true) {
                            break;
                        }
                        trigger = sensor.arm();
                        rearmed_after_drop = false;
                        settle.as_mut().reset(Instant::now() + settle_delay);
                        settled = false;
                    }
                    Err(_) if !rearmed_after_drop => {
                        tracing::warn!("Motion sensor dropped its trigger without firing, re-arming");
                        trigger = sensor.arm();
                        rearmed_after_drop = true;
                    }
                    Err(_) => {
                        tracing::warn!("Motion sensor dropped its trigger again, giving up on triggers");
                        armed = false;
                    }
                }
            }

            _ = &mut settle, if !settled => {
                settled = true;
                if !tx.emit(false) {
                    break;
                }
            }
        }
    }

    sensor.disarm();
}
