//! Stumbler - radio observation aggregation and geosubmit upload
//!
//! This library merges independently timed position fixes and radio emitter
//! sightings (Wi-Fi, cell, Bluetooth) into reports, gates report creation on
//! movement, throttles active scans, reverse-geocodes fixes for display and
//! uploads reports using the geosubmit v2 protocol.
//!
//! Platform concerns (sensors, storage, UI) stay outside the crate and plug
//! in through the collaborator traits each module exposes.

pub mod clock;
pub mod config;
pub mod geocoder;
pub mod geosubmit;
pub mod logging;
pub mod movement;
pub mod observation;
pub mod rate_limiter;
pub mod report;
