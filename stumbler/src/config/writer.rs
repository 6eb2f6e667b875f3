//! INI serialization logic for converting `ConfigFile` → INI string.

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let s = &config.submission;
    let g = &config.geocoder;
    let m = &config.movement;
    let api_key = s.api_key.as_deref().unwrap_or("");
    let cache_ttl = g.cache_ttl.unwrap_or(0);

    format!(
        r#"[submission]
; Geosubmit service base URL
base_url = {}
; Upload and geolocate paths appended to base_url
submission_path = {}
locate_path = {}
; Optional API key, sent as ?key=
api_key = {}
; HTTP request timeout in seconds (default: 30)
timeout = {}
; Reports per upload request (default: 50)
batch_size = {}

[geocoder]
; Reverse geocoding for display. false disables all lookups
enabled = {}
; Lookups in flight at once (default: 5)
max_concurrent = {}
; Consecutive transport failures before lookups pause (default: 3)
failure_threshold = {}
; Pause length in seconds after the latest failure (default: 600)
cooldown = {}
; Cached address lifetime in seconds, 0 = until exit
cache_ttl = {}
cache_capacity = {}

[movement]
; location - GNSS distance/altitude deltas
; motion   - significant motion sensor
detector = {}
; Meters of horizontal movement that count as moving (default: 10)
distance_threshold = {}
; Meters of altitude change that count as moving (default: 15)
altitude_threshold = {}
; Seconds without movement before scanning stops (default: 45)
settle_delay = {}

[scanning]
; Active scans allowed per window (default: 4 per 120 s)
max_scans_per_window = {}
window = {}

[logging]
; Log file path
file = {}
; Filter directive when RUST_LOG is unset, e.g. info or stumbler=debug
filter = {}
"#,
        s.base_url,
        s.submission_path,
        s.locate_path,
        api_key,
        s.timeout,
        s.batch_size,
        g.enabled,
        g.max_concurrent,
        g.failure_threshold,
        g.cooldown,
        cache_ttl,
        g.cache_capacity,
        m.detector.as_str(),
        m.distance_threshold,
        m.altitude_threshold,
        m.settle_delay,
        config.scanning.max_scans_per_window,
        config.scanning.window,
        config.logging.file.display(),
        config.logging.filter,
    )
}
