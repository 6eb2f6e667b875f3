//! Position fixes and geographic coordinates.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use super::ObservationError;

/// Mean earth radius in meters (IUGG).
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// A validated latitude/longitude pair in degrees.
///
/// Equality is exact: two coordinates are the same key only if both
/// components are bit-for-bit equal. No quantization is applied.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate")]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct RawCoordinate {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = ObservationError;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        Coordinate::new(raw.latitude, raw.longitude)
    }
}

impl Coordinate {
    /// Create a coordinate, rejecting non-finite or out-of-range values.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ObservationError> {
        if !latitude.is_finite()
            || !longitude.is_finite()
            || !(-90.0..=90.0).contains(&latitude)
            || !(-180.0..=180.0).contains(&longitude)
        {
            return Err(ObservationError::InvalidCoordinate {
                latitude,
                longitude,
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Great-circle distance in meters (haversine).
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let dlat = lat2 - lat1;
        let dlon = (other.longitude - self.longitude).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().min(1.0).asin()
    }
}

impl PartialEq for Coordinate {
    fn eq(&self, other: &Self) -> bool {
        self.latitude.to_bits() == other.latitude.to_bits()
            && self.longitude.to_bits() == other.longitude.to_bits()
    }
}

impl Eq for Coordinate {}

impl Hash for Coordinate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.latitude.to_bits().hash(state);
        self.longitude.to_bits().hash(state);
    }
}

/// Which location provider produced a fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSource {
    /// Raw GNSS fix.
    Gps,
    /// Platform fused provider (GNSS + network + sensors).
    Fused,
}

/// A single position fix.
///
/// `capture_timestamp_ms` is a monotonic clock reading, not wall-clock time,
/// so ages can be computed consistently against emitter observations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionObservation {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
    pub altitude: Option<f64>,
    pub altitude_accuracy: Option<f64>,
    pub heading: Option<f64>,
    pub speed: Option<f64>,
    pub pressure: Option<f64>,
    pub source: PositionSource,
    pub capture_timestamp_ms: i64,
}

impl PositionObservation {
    /// Create a fix with only the mandatory fields set.
    pub fn new(
        coordinate: Coordinate,
        source: PositionSource,
        capture_timestamp_ms: i64,
    ) -> Self {
        Self {
            latitude: coordinate.latitude(),
            longitude: coordinate.longitude(),
            accuracy: None,
            altitude: None,
            altitude_accuracy: None,
            heading: None,
            speed: None,
            pressure: None,
            source,
            capture_timestamp_ms,
        }
    }

    /// Set the altitude in meters.
    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = Some(altitude);
        self
    }

    /// Set the horizontal accuracy in meters.
    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = Some(accuracy);
        self
    }

    /// The fix as a validated coordinate.
    pub fn coordinate(&self) -> Result<Coordinate, ObservationError> {
        Coordinate::new(self.latitude, self.longitude)
    }

    /// Great-circle distance to another fix in meters.
    pub fn distance_to(&self, other: &PositionObservation) -> f64 {
        let a = Coordinate {
            latitude: self.latitude,
            longitude: self.longitude,
        };
        let b = Coordinate {
            latitude: other.latitude,
            longitude: other.longitude,
        };
        a.distance_to(&b)
    }

    /// Absolute altitude difference, if both fixes carry an altitude.
    pub fn altitude_delta(&self, other: &PositionObservation) -> Option<f64> {
        match (self.altitude, other.altitude) {
            (Some(a), Some(b)) => Some((a - b).abs()),
            _ => None,
        }
    }
}
