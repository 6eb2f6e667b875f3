//! Geosubmit v2 and geolocate wire types.
//!
//! Optional fields are omitted from the JSON when absent; the service
//! rejects explicit nulls.

use serde::{Deserialize, Serialize};

use crate::observation::{
    BluetoothBeacon, CellTower, Coordinate, ObservationError, PositionSource, WifiAccessPoint,
};
use crate::report::{Report, ReportEmitter, ReportPosition};

/// Body of a geosubmit upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeosubmitRequest {
    pub items: Vec<ReportDto>,
}

impl GeosubmitRequest {
    pub fn from_reports(reports: &[Report]) -> Self {
        Self {
            items: reports.iter().map(ReportDto::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDto {
    pub timestamp: i64,
    pub position: PositionDto,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub wifi_access_points: Vec<WifiAccessPointDto>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cell_towers: Vec<CellTowerDto>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bluetooth_beacons: Vec<BluetoothBeaconDto>,
}

impl From<&Report> for ReportDto {
    fn from(report: &Report) -> Self {
        Self {
            timestamp: report.timestamp,
            position: PositionDto::from(&report.position),
            wifi_access_points: report.wifi_access_points.iter().map(Into::into).collect(),
            cell_towers: report.cell_towers.iter().map(Into::into).collect(),
            bluetooth_beacons: report.bluetooth_beacons.iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionDto {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    pub age: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude_accuracy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    /// Always `"gps"` or `"fused"`.
    pub source: String,
}

impl From<&ReportPosition> for PositionDto {
    fn from(reported: &ReportPosition) -> Self {
        let p = &reported.position;
        Self {
            latitude: p.latitude,
            longitude: p.longitude,
            accuracy: finite(p.accuracy),
            age: reported.age,
            altitude: finite(p.altitude),
            altitude_accuracy: finite(p.altitude_accuracy),
            heading: finite(p.heading),
            pressure: finite(p.pressure),
            speed: finite(p.speed),
            source: source_name(p.source).to_string(),
        }
    }
}

/// NaN and infinities would serialize as `null`; treat them as absent.
fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

fn source_name(source: PositionSource) -> &'static str {
    match source {
        PositionSource::Gps => "gps",
        PositionSource::Fused => "fused",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WifiAccessPointDto {
    pub mac_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radio_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal_strength: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssid: Option<String>,
}

impl WifiAccessPointDto {
    fn new(ap: &WifiAccessPoint, age: Option<u64>) -> Self {
        Self {
            mac_address: ap.mac_address.to_string(),
            radio_type: ap.radio_type.map(|r| r.as_str().to_string()),
            age,
            channel: ap.channel,
            frequency: ap.frequency,
            signal_strength: ap.signal_strength,
            ssid: ap.ssid.clone(),
        }
    }
}

impl From<&ReportEmitter<WifiAccessPoint>> for WifiAccessPointDto {
    fn from(e: &ReportEmitter<WifiAccessPoint>) -> Self {
        Self::new(&e.emitter, Some(e.age))
    }
}

impl From<&WifiAccessPoint> for WifiAccessPointDto {
    fn from(ap: &WifiAccessPoint) -> Self {
        Self::new(ap, None)
    }
}

/// Cell tower entry.
///
/// Country and network codes are sent twice: as numbers for older servers
/// and as strings so leading zeros (e.g. MNC `"01"`) survive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellTowerDto {
    pub radio_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile_country_code: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile_country_code_str: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile_network_code: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile_network_code_str: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_area_code: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cell_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asu: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_scrambling_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serving: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal_strength: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing_advance: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arfcn: Option<u32>,
}

impl CellTowerDto {
    fn new(tower: &CellTower, age: Option<u64>) -> Self {
        let mcc = tower.mobile_country_code.clone();
        let mnc = tower.mobile_network_code.clone();
        Self {
            radio_type: tower.radio_type.as_str().to_string(),
            mobile_country_code: mcc.as_deref().and_then(|c| c.parse().ok()),
            mobile_country_code_str: mcc,
            mobile_network_code: mnc.as_deref().and_then(|c| c.parse().ok()),
            mobile_network_code_str: mnc,
            location_area_code: tower.location_area_code,
            cell_id: tower.cell_id,
            age,
            asu: tower.asu,
            primary_scrambling_code: tower.primary_scrambling_code,
            serving: tower.serving.map(u8::from),
            signal_strength: tower.signal_strength,
            timing_advance: tower.timing_advance,
            arfcn: tower.arfcn,
        }
    }
}

impl From<&ReportEmitter<CellTower>> for CellTowerDto {
    fn from(e: &ReportEmitter<CellTower>) -> Self {
        Self::new(&e.emitter, Some(e.age))
    }
}

impl From<&CellTower> for CellTowerDto {
    fn from(tower: &CellTower) -> Self {
        Self::new(tower, None)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BluetoothBeaconDto {
    pub mac_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beacon_type: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id3: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal_strength: Option<i32>,
}

impl BluetoothBeaconDto {
    fn new(beacon: &BluetoothBeacon, age: Option<u64>) -> Self {
        let id = |i: usize| beacon.identifiers.get(i).cloned();
        Self {
            mac_address: beacon.mac_address.to_string(),
            age,
            beacon_type: beacon.beacon_type,
            id1: id(0),
            id2: id(1),
            id3: id(2),
            signal_strength: beacon.signal_strength,
        }
    }
}

impl From<&ReportEmitter<BluetoothBeacon>> for BluetoothBeaconDto {
    fn from(e: &ReportEmitter<BluetoothBeacon>) -> Self {
        Self::new(&e.emitter, Some(e.age))
    }
}

impl From<&BluetoothBeacon> for BluetoothBeaconDto {
    fn from(beacon: &BluetoothBeacon) -> Self {
        Self::new(beacon, None)
    }
}

/// Body of a geolocate query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocateRequest {
    #[serde(default)]
    pub consider_ip: bool,
    #[serde(default)]
    pub bluetooth_beacons: Vec<BluetoothBeaconDto>,
    #[serde(default)]
    pub cell_towers: Vec<CellTowerDto>,
    #[serde(default)]
    pub wifi_access_points: Vec<WifiAccessPointDto>,
}

impl LocateRequest {
    /// Query built from emitters currently in view. IP fallback is off.
    pub fn from_emitters(
        cell_towers: &[CellTower],
        wifi_access_points: &[WifiAccessPoint],
        bluetooth_beacons: &[BluetoothBeacon],
    ) -> Self {
        Self {
            consider_ip: false,
            bluetooth_beacons: bluetooth_beacons.iter().map(Into::into).collect(),
            cell_towers: cell_towers.iter().map(Into::into).collect(),
            wifi_access_points: wifi_access_points.iter().map(Into::into).collect(),
        }
    }
}

/// Geolocate answer. Unknown fields such as `fallback` are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocateResponse {
    pub location: LatLng,
    pub accuracy: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// Estimated device position returned by [`get_location`](super::GeosubmitClient::get_location).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationEstimate {
    pub coordinate: Coordinate,
    /// Radius in meters.
    pub accuracy: f64,
}

impl TryFrom<LocateResponse> for LocationEstimate {
    type Error = ObservationError;

    fn try_from(response: LocateResponse) -> Result<Self, Self::Error> {
        Ok(Self {
            coordinate: Coordinate::new(response.location.lat, response.location.lng)?,
            accuracy: response.accuracy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::{
        CellRadioType, EmitterObservation, MacAddress, PositionObservation, WifiRadioType,
    };
    use crate::report::ReportData;

    fn mac(s: &str) -> MacAddress {
        s.parse().unwrap()
    }

    fn minimal_report() -> Report {
        let position = PositionObservation::new(
            Coordinate::new(52.52, 13.405).unwrap(),
            PositionSource::Gps,
            1_000,
        );
        ReportData {
            position,
            cell_towers: vec![EmitterObservation::new(CellTower::new(CellRadioType::Lte), 900)],
            wifi_access_points: vec![EmitterObservation::new(
                WifiAccessPoint::new(mac("AA:BB:CC:00:11:22")),
                1_000,
            )],
            bluetooth_beacons: vec![EmitterObservation::new(
                BluetoothBeacon::new(mac("01:02:03:04:05:06")),
                400,
            )],
        }
        .into_report(1, 1_700_000_000_000)
    }

    #[test]
    fn test_absent_fields_are_omitted_not_null() {
        let body = serde_json::to_string(&GeosubmitRequest::from_reports(&[minimal_report()])).unwrap();

        assert!(!body.contains("null"), "unexpected null in {body}");
        assert!(!body.contains("accuracy"));
        assert!(!body.contains("ssid"));
        assert!(!body.contains("mobileNetworkCode"));
    }

    #[test]
    fn test_non_finite_position_fields_are_omitted() {
        let mut report = minimal_report();
        report.position.position.accuracy = Some(f64::NAN);
        report.position.position.speed = Some(f64::INFINITY);
        report.position.position.altitude = Some(35.5);

        let body = serde_json::to_string(&GeosubmitRequest::from_reports(&[report])).unwrap();
        assert!(!body.contains("null"), "unexpected null in {body}");
        assert!(!body.contains("accuracy"));
        assert!(!body.contains("speed"));
        assert!(body.contains(r#""altitude":35.5"#));
    }

    #[test]
    fn test_report_dto_shape() {
        let value = serde_json::to_value(ReportDto::from(&minimal_report())).unwrap();

        assert_eq!(value["timestamp"], 1_700_000_000_000i64);
        assert_eq!(value["position"]["source"], "gps");
        assert_eq!(value["position"]["age"], 0);
        assert_eq!(value["wifiAccessPoints"][0]["macAddress"], "aa:bb:cc:00:11:22");
        assert_eq!(value["cellTowers"][0]["radioType"], "lte");
        assert_eq!(value["cellTowers"][0]["age"], 100);
        assert_eq!(value["bluetoothBeacons"][0]["age"], 600);
    }

    #[test]
    fn test_empty_emitter_lists_are_omitted() {
        let mut report = minimal_report();
        report.cell_towers.clear();
        report.bluetooth_beacons.clear();

        let value = serde_json::to_value(ReportDto::from(&report)).unwrap();
        assert!(value.get("cellTowers").is_none());
        assert!(value.get("bluetoothBeacons").is_none());
        assert!(value.get("wifiAccessPoints").is_some());
    }

    #[test]
    fn test_cell_codes_carry_numeric_and_string_forms() {
        let mut tower = CellTower::new(CellRadioType::Gsm);
        tower.mobile_country_code = Some("262".into());
        tower.mobile_network_code = Some("01".into());
        tower.serving = Some(true);

        let value = serde_json::to_value(CellTowerDto::from(&tower)).unwrap();
        assert_eq!(value["mobileCountryCode"], 262);
        assert_eq!(value["mobileCountryCodeStr"], "262");
        assert_eq!(value["mobileNetworkCode"], 1);
        assert_eq!(value["mobileNetworkCodeStr"], "01");
        assert_eq!(value["serving"], 1);
    }

    #[test]
    fn test_wifi_and_beacon_fields() {
        let mut ap = WifiAccessPoint::new(mac("aa:bb:cc:dd:ee:ff"));
        ap.radio_type = Some(WifiRadioType::Ax);
        ap.ssid = Some("cafe".into());
        let value = serde_json::to_value(WifiAccessPointDto::from(&ap)).unwrap();
        assert_eq!(value["radioType"], "802.11ax");
        assert_eq!(value["ssid"], "cafe");
        assert!(value.get("age").is_none());

        let mut beacon = BluetoothBeacon::new(mac("aa:bb:cc:dd:ee:ff"));
        beacon.identifiers = vec!["uuid".into(), "1".into(), "2".into(), "extra".into()];
        let value = serde_json::to_value(BluetoothBeaconDto::from(&beacon)).unwrap();
        assert_eq!(value["id1"], "uuid");
        assert_eq!(value["id3"], "2");
    }

    #[test]
    fn test_locate_response_ignores_unknown_fields() {
        let json = r#"{
            "location": {"lat": 51.0, "lng": -0.1},
            "accuracy": 25.5,
            "fallback": "ipf",
            "license": "CC0"
        }"#;
        let response: LocateResponse = serde_json::from_str(json).unwrap();
        let estimate = LocationEstimate::try_from(response).unwrap();

        assert_eq!(estimate.coordinate, Coordinate::new(51.0, -0.1).unwrap());
        assert_eq!(estimate.accuracy, 25.5);
    }

    #[test]
    fn test_locate_request_keeps_empty_lists() {
        let value = serde_json::to_value(LocateRequest::from_emitters(&[], &[], &[])).unwrap();
        assert_eq!(value["considerIp"], false);
        assert_eq!(value["cellTowers"], serde_json::json!([]));
    }
}
