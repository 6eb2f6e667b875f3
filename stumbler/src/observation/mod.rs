//! Observation model.
//!
//! Immutable value types for what the platform adapters hand to the core:
//! position fixes and radio emitter sightings, each paired with a monotonic
//! capture time.

mod emitter;
mod mac;
mod position;

pub use emitter::{
    BluetoothBeacon, CellRadioType, CellTower, EmitterObservation, WifiAccessPoint,
    WifiRadioType,
};
pub use mac::MacAddress;
pub use position::{Coordinate, PositionObservation, PositionSource, EARTH_RADIUS_M};

use thiserror::Error;

/// Validation failures when constructing observation values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ObservationError {
    /// Input was not six colon-separated hex octets.
    #[error("Invalid MAC address: '{0}'")]
    InvalidMacAddress(String),

    /// Latitude or longitude out of range or not finite.
    #[error("Invalid coordinate: ({latitude}, {longitude})")]
    InvalidCoordinate { latitude: f64, longitude: f64 },
}
