//! Location-delta movement detection.

use std::pin::Pin;
use std::sync::Arc;

use futures::stream::BoxStream;
use futures::StreamExt;
use tokio::time::Sleep;
use tokio_util::sync::CancellationToken;

use super::{MovementConfig, MovementDetector, MovementSender, MovementStream};
use crate::observation::PositionObservation;

/// Platform adapter providing position fixes.
///
/// The returned stream owns the platform listener; dropping it must
/// unregister that listener.
pub trait LocationSource: Send + Sync {
    fn positions(&self) -> BoxStream<'static, PositionObservation>;
}

/// Reference-fix state machine.
///
/// A fix counts as movement when there is no reference yet, or when it is at
/// least `distance_threshold_m` away from the reference, or its altitude
/// differs by at least `altitude_threshold_m`. A moving fix becomes the new
/// reference; a still fix leaves the reference untouched.
#[derive(Debug, Clone)]
pub struct MovementState {
    config: MovementConfig,
    reference: Option<PositionObservation>,
}

impl MovementState {
    pub fn new(config: MovementConfig) -> Self {
        Self {
            config,
            reference: None,
        }
    }

    /// Feed one fix, returning whether it counts as movement.
    pub fn update(&mut self, position: &PositionObservation) -> bool {
        let moving = match &self.reference {
            None => true,
            Some(reference) => {
                let distance = reference.distance_to(position);
                let climbed = reference
                    .altitude_delta(position)
                    .is_some_and(|delta| delta >= self.config.altitude_threshold_m);
                distance >= self.config.distance_threshold_m || climbed
            }
        };

        if moving {
            self.reference = Some(position.clone());
        }
        moving
    }

    /// Current reference fix.
    pub fn reference(&self) -> Option<&PositionObservation> {
        self.reference.as_ref()
    }
}

/// Movement detector driven by position fixes.
pub struct LocationMovementDetector<S> {
    source: Arc<S>,
    config: MovementConfig,
}

impl<S: LocationSource + 'static> LocationMovementDetector<S> {
    pub fn new(source: Arc<S>, config: MovementConfig) -> Self {
        Self { source, config }
    }
}

impl<S: LocationSource + 'static> MovementDetector for LocationMovementDetector<S> {
    fn observe_is_moving(&self) -> MovementStream {
        let positions = self.source.positions();
        let config = self.config.clone();
        MovementStream::spawn(move |tx, token| run(positions, config, tx, token))
    }
}

async fn settle_elapsed(settle: &mut Option<Pin<Box<Sleep>>>) {
    match settle {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}

async fn run(
    mut positions: BoxStream<'static, PositionObservation>,
    config: MovementConfig,
    mut tx: MovementSender,
    token: CancellationToken,
) {
    let settle_delay = config.settle_delay;
    let mut state = MovementState::new(config);
    let mut settle: Option<Pin<Box<Sleep>>> = None;

    loop {
        tokio::select! {
            biased;

            _ = token.cancelled() => {
                tracing::debug!("Location movement observation cancelled");
                return;
            }

            _ = settle_elapsed(&mut settle) => {
                settle = None;
                if !tx.emit(false) {
                    return;
                }
            }

            next = positions.next() => {
                let Some(position) = next else {
                    // Source finished: deliver a pending "stopped" before exiting.
                    if settle.is_some() {
                        tokio::select! {
                            _ = token.cancelled() => {}
                            _ = settle_elapsed(&mut settle) => {
                                tx.emit(false);
                            }
                        }
                    }
                    tracing::debug!("Position source ended");
                    return;
                };

                if state.update(&position) {
                    settle = None;
                    if !tx.emit(true) {
                        return;
                    }
                } else if tx.last() != Some(false) && settle.is_none() {
                    settle = Some(Box::pin(tokio::time::sleep(settle_delay)));
                }
            }
        }
    }
}
