//! Canonical MAC address value type.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::ObservationError;

/// Number of octets in an EUI-48 hardware address.
const OCTETS: usize = 6;

/// A 6-octet hardware address.
///
/// Parsing accepts colon-separated hex in either case; the canonical
/// rendering is always lowercase (`aa:bb:cc:dd:ee:ff`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MacAddress([u8; OCTETS]);

impl MacAddress {
    /// Create an address from raw octets.
    pub const fn from_octets(octets: [u8; OCTETS]) -> Self {
        Self(octets)
    }

    /// Parse a colon-separated address.
    ///
    /// # Errors
    ///
    /// Returns [`ObservationError::InvalidMacAddress`] unless the input is
    /// exactly six two-digit hex groups separated by `:`.
    pub fn parse(input: &str) -> Result<Self, ObservationError> {
        let invalid = || ObservationError::InvalidMacAddress(input.to_string());

        let mut octets = [0u8; OCTETS];
        let mut groups = input.split(':');

        for octet in octets.iter_mut() {
            let group = groups.next().ok_or_else(invalid)?;
            if group.len() != 2 || !group.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(invalid());
            }
            *octet = u8::from_str_radix(group, 16).map_err(|_| invalid())?;
        }

        if groups.next().is_some() {
            return Err(invalid());
        }

        Ok(Self(octets))
    }

    /// Raw octets.
    pub fn octets(&self) -> [u8; OCTETS] {
        self.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            a, b, c, d, e, g
        )
    }
}

impl FromStr for MacAddress {
    type Err = ObservationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for MacAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MacAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_canonicalizes_to_lowercase() {
        let mac = MacAddress::parse("AA:BB:CC:0D:EE:FF").unwrap();
        assert_eq!(mac.to_string(), "aa:bb:cc:0d:ee:ff");
    }

    #[test]
    fn test_rejects_malformed_input() {
        for input in [
            "",
            "aa:bb:cc:dd:ee",
            "aa:bb:cc:dd:ee:ff:00",
            "aa-bb-cc-dd-ee-ff",
            "aabbccddeeff",
            "a:bb:cc:dd:ee:ff",
            "gg:bb:cc:dd:ee:ff",
            "aa:bb:cc:dd:ee:ff:",
            "+a:bb:cc:dd:ee:ff",
        ] {
            assert!(
                MacAddress::parse(input).is_err(),
                "'{}' should be rejected",
                input
            );
        }
    }

    #[test]
    fn test_serde_uses_canonical_string() {
        let mac: MacAddress = serde_json::from_str("\"01:23:45:67:89:AB\"").unwrap();
        assert_eq!(serde_json::to_string(&mac).unwrap(), "\"01:23:45:67:89:ab\"");
        assert!(serde_json::from_str::<MacAddress>("\"nope\"").is_err());
    }

    proptest! {
        #[test]
        fn prop_parse_is_case_insensitive_and_idempotent(octets in any::<[u8; 6]>()) {
            let text = MacAddress::from_octets(octets).to_string();
            let lower = MacAddress::parse(&text).unwrap();
            let upper = MacAddress::parse(&text.to_uppercase()).unwrap();

            prop_assert_eq!(lower, upper);
            prop_assert_eq!(lower.octets(), octets);
            prop_assert_eq!(MacAddress::parse(&lower.to_string()).unwrap(), lower);
        }

        #[test]
        fn prop_wrong_group_count_fails(octets in prop::collection::vec(any::<u8>(), 0..12)) {
            prop_assume!(octets.len() != 6);
            let text = octets
                .iter()
                .map(|o| format!("{:02x}", o))
                .collect::<Vec<_>>()
                .join(":");
            prop_assert!(MacAddress::parse(&text).is_err());
        }
    }
}
