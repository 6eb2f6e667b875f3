//! Reverse geocoding for display.
//!
//! [`ResilientGeocoder`] wraps a raw [`AddressLookup`] with per-key result
//! caching, a concurrency gate and a [`CircuitBreaker`] that pauses lookups
//! after repeated transport failures.

mod circuit_breaker;
mod resilient;

pub use circuit_breaker::{CircuitBreaker, CircuitState, DEFAULT_COOLDOWN, DEFAULT_FAILURE_THRESHOLD};
pub use resilient::{GeocoderConfig, ResilientGeocoder, DEFAULT_CACHE_CAPACITY, DEFAULT_MAX_CONCURRENT};

use std::future::Future;

use thiserror::Error;

use crate::observation::Coordinate;

/// Errors from an address lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeocodeError {
    /// I/O failure talking to the geocoding backend.
    #[error("Geocoder transport failure: {0}")]
    Transport(String),

    /// The backend did not answer in time.
    #[error("Geocoder timed out: {0}")]
    Timeout(String),

    /// The backend rejected the request.
    #[error("Invalid geocoder input: {0}")]
    InvalidInput(String),

    #[error("Geocoder error: {0}")]
    Other(String),

    /// The caller's deadline passed before a result was available.
    #[error("Geocoder deadline exceeded")]
    DeadlineExceeded,
}

impl GeocodeError {
    /// Whether this failure counts towards the circuit breaker.
    pub fn is_transport(&self) -> bool {
        matches!(self, GeocodeError::Transport(_) | GeocodeError::Timeout(_))
    }
}

/// Raw, uncached address lookup supplied by the platform.
pub trait AddressLookup: Send + Sync {
    /// Single-line address for `coordinate` in `locale`, if one is known.
    fn lookup(
        &self,
        locale: &str,
        coordinate: Coordinate,
    ) -> impl Future<Output = Result<Option<String>, GeocodeError>> + Send;
}
