//! Report data types.

use serde::{Deserialize, Serialize};

use crate::observation::{
    BluetoothBeacon, CellTower, EmitterObservation, PositionObservation, WifiAccessPoint,
};

/// One assembly cycle's output, before persistence assigns identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportData {
    pub position: PositionObservation,
    pub cell_towers: Vec<EmitterObservation<CellTower>>,
    pub wifi_access_points: Vec<EmitterObservation<WifiAccessPoint>>,
    pub bluetooth_beacons: Vec<EmitterObservation<BluetoothBeacon>>,
}

impl ReportData {
    /// True when no emitters were seen. Such reports are never stored or uploaded.
    pub fn is_empty(&self) -> bool {
        self.cell_towers.is_empty()
            && self.wifi_access_points.is_empty()
            && self.bluetooth_beacons.is_empty()
    }

    /// Monotonic time every age in the report is measured against.
    pub fn reference_time_ms(&self) -> i64 {
        self.position.capture_timestamp_ms
    }

    /// Attach identity and a wall-clock timestamp, converting capture times
    /// into ages relative to [`reference_time_ms`](Self::reference_time_ms).
    ///
    /// Emitter ids are assigned sequentially from 1 within the report.
    pub fn into_report(self, id: i64, timestamp_ms: i64) -> Report {
        let reference = self.reference_time_ms();
        let mut next_id = 0;
        let mut next = || {
            next_id += 1;
            next_id
        };

        let position = ReportPosition {
            age: age_ms(reference, self.position.capture_timestamp_ms),
            position: self.position,
        };

        let cell_towers = self
            .cell_towers
            .into_iter()
            .map(|o| ReportEmitter::from_observation(next(), reference, o))
            .collect();
        let wifi_access_points = self
            .wifi_access_points
            .into_iter()
            .map(|o| ReportEmitter::from_observation(next(), reference, o))
            .collect();
        let bluetooth_beacons = self
            .bluetooth_beacons
            .into_iter()
            .map(|o| ReportEmitter::from_observation(next(), reference, o))
            .collect();

        Report {
            id,
            timestamp: timestamp_ms,
            uploaded: false,
            upload_timestamp: None,
            position,
            cell_towers,
            wifi_access_points,
            bluetooth_beacons,
        }
    }
}

/// Age of an observation relative to the report reference.
///
/// Observations captured after the reference (clock skew between sources)
/// are clamped to zero.
pub fn age_ms(reference_ms: i64, captured_ms: i64) -> u64 {
    reference_ms.saturating_sub(captured_ms).max(0) as u64
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPosition {
    pub position: PositionObservation,
    pub age: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEmitter<E> {
    pub id: i64,
    pub emitter: E,
    pub age: u64,
}

impl<E> ReportEmitter<E> {
    fn from_observation(id: i64, reference_ms: i64, observation: EmitterObservation<E>) -> Self {
        Self {
            id,
            age: age_ms(reference_ms, observation.capture_timestamp_ms),
            emitter: observation.emitter,
        }
    }
}

/// A persisted report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: i64,
    /// Wall-clock creation time, milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub uploaded: bool,
    pub upload_timestamp: Option<i64>,
    pub position: ReportPosition,
    #[serde(default)]
    pub cell_towers: Vec<ReportEmitter<CellTower>>,
    #[serde(default)]
    pub wifi_access_points: Vec<ReportEmitter<WifiAccessPoint>>,
    #[serde(default)]
    pub bluetooth_beacons: Vec<ReportEmitter<BluetoothBeacon>>,
}

impl Report {
    pub fn is_empty(&self) -> bool {
        self.cell_towers.is_empty()
            && self.wifi_access_points.is_empty()
            && self.bluetooth_beacons.is_empty()
    }

    /// Record a confirmed upload.
    ///
    /// Returns `false` (and changes nothing) if the report was already
    /// marked uploaded.
    pub fn mark_uploaded(&mut self, upload_timestamp_ms: i64) -> bool {
        if self.uploaded {
            return false;
        }
        self.uploaded = true;
        self.upload_timestamp = Some(upload_timestamp_ms);
        true
    }
}
