//! Radio emitter observations (Wi-Fi, cellular, Bluetooth).

use serde::{Deserialize, Serialize};

use super::MacAddress;

/// An emitter reading paired with its monotonic capture time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmitterObservation<E> {
    pub emitter: E,
    pub capture_timestamp_ms: i64,
}

impl<E> EmitterObservation<E> {
    pub fn new(emitter: E, capture_timestamp_ms: i64) -> Self {
        Self {
            emitter,
            capture_timestamp_ms,
        }
    }
}

/// IEEE 802.11 standard an access point was seen on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WifiRadioType {
    #[serde(rename = "802.11a")]
    A,
    #[serde(rename = "802.11b")]
    B,
    #[serde(rename = "802.11g")]
    G,
    #[serde(rename = "802.11n")]
    N,
    #[serde(rename = "802.11ac")]
    Ac,
    #[serde(rename = "802.11ax")]
    Ax,
    #[serde(rename = "802.11be")]
    Be,
}

impl WifiRadioType {
    /// Wire name used by the geosubmit protocol.
    pub fn as_str(&self) -> &'static str {
        match self {
            WifiRadioType::A => "802.11a",
            WifiRadioType::B => "802.11b",
            WifiRadioType::G => "802.11g",
            WifiRadioType::N => "802.11n",
            WifiRadioType::Ac => "802.11ac",
            WifiRadioType::Ax => "802.11ax",
            WifiRadioType::Be => "802.11be",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WifiAccessPoint {
    pub mac_address: MacAddress,
    pub radio_type: Option<WifiRadioType>,
    pub channel: Option<u16>,
    pub frequency: Option<u32>,
    pub signal_strength: Option<i32>,
    pub ssid: Option<String>,
}

impl WifiAccessPoint {
    pub fn new(mac_address: MacAddress) -> Self {
        Self {
            mac_address,
            radio_type: None,
            channel: None,
            frequency: None,
            signal_strength: None,
            ssid: None,
        }
    }
}

/// Cellular radio generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellRadioType {
    Gsm,
    /// UMTS
    Wcdma,
    Lte,
    Nr,
}

impl CellRadioType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CellRadioType::Gsm => "gsm",
            CellRadioType::Wcdma => "wcdma",
            CellRadioType::Lte => "lte",
            CellRadioType::Nr => "nr",
        }
    }
}

/// A cell tower as reported by the modem.
///
/// Country and network codes are kept as strings so that leading zeros
/// (e.g. MNC `"01"` vs `"001"`) survive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellTower {
    pub radio_type: CellRadioType,
    pub mobile_country_code: Option<String>,
    pub mobile_network_code: Option<String>,
    pub cell_id: Option<u64>,
    pub location_area_code: Option<u32>,
    pub asu: Option<i32>,
    pub primary_scrambling_code: Option<u16>,
    pub serving: Option<bool>,
    pub signal_strength: Option<i32>,
    pub timing_advance: Option<i32>,
    pub arfcn: Option<u32>,
}

impl CellTower {
    pub fn new(radio_type: CellRadioType) -> Self {
        Self {
            radio_type,
            mobile_country_code: None,
            mobile_network_code: None,
            cell_id: None,
            location_area_code: None,
            asu: None,
            primary_scrambling_code: None,
            serving: None,
            signal_strength: None,
            timing_advance: None,
            arfcn: None,
        }
    }

    /// Identity tuple used to match sightings of the same cell when the
    /// network code may be missing from some of them.
    pub fn identity_without_network(&self) -> (Option<&str>, Option<u64>, Option<u32>) {
        (
            self.mobile_country_code.as_deref(),
            self.cell_id,
            self.location_area_code,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BluetoothBeacon {
    pub mac_address: MacAddress,
    pub beacon_type: Option<u16>,
    /// Ordered identifier fragments (e.g. iBeacon UUID, major, minor).
    #[serde(default)]
    pub identifiers: Vec<String>,
    pub signal_strength: Option<i32>,
}

impl BluetoothBeacon {
    pub fn new(mac_address: MacAddress) -> Self {
        Self {
            mac_address,
            beacon_type: None,
            identifiers: Vec::new(),
            signal_strength: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wifi_radio_type_wire_names_match_serde() {
        for radio in [WifiRadioType::N, WifiRadioType::Ax, WifiRadioType::Be] {
            let json = serde_json::to_string(&radio).unwrap();
            assert_eq!(json, format!("\"{}\"", radio.as_str()));
        }
    }

    #[test]
    fn test_cell_identity_ignores_network_code() {
        let mut a = CellTower::new(CellRadioType::Lte);
        a.mobile_country_code = Some("262".to_string());
        a.cell_id = Some(42);
        a.location_area_code = Some(7);
        let mut b = a.clone();
        b.mobile_network_code = Some("01".to_string());

        assert_eq!(a.identity_without_network(), b.identity_without_network());
    }

    #[test]
    fn test_beacon_identifiers_default_to_empty() {
        let beacon: BluetoothBeacon =
            serde_json::from_str(r#"{"macAddress":"00:11:22:33:44:55"}"#).unwrap();
        assert!(beacon.identifiers.is_empty());
        assert!(beacon.signal_strength.is_none());
    }
}
