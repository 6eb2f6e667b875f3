//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use std::path::PathBuf;
use std::str::FromStr;

use ini::{Ini, Properties};

use super::file::ConfigFileError;
use super::settings::{ConfigFile, DetectorKind};

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    if let Some(section) = ini.section(Some("submission")) {
        let s = &mut config.submission;
        if let Some(v) = non_empty(section, "base_url") {
            reqwest::Url::parse(v).map_err(|e| invalid("submission", "base_url", v, &e.to_string()))?;
            s.base_url = v.to_string();
        }
        if let Some(v) = non_empty(section, "submission_path") {
            s.submission_path = v.to_string();
        }
        if let Some(v) = non_empty(section, "locate_path") {
            s.locate_path = v.to_string();
        }
        if let Some(v) = non_empty(section, "api_key") {
            s.api_key = Some(v.to_string());
        }
        if let Some(v) = non_empty(section, "timeout") {
            s.timeout = positive("submission", "timeout", v, "must be a positive integer (seconds)")?;
        }
        if let Some(v) = non_empty(section, "batch_size") {
            s.batch_size = positive("submission", "batch_size", v, "must be a positive integer")?;
        }
    }

    if let Some(section) = ini.section(Some("geocoder")) {
        let g = &mut config.geocoder;
        if let Some(v) = non_empty(section, "enabled") {
            g.enabled = parse_bool(v).ok_or_else(|| {
                invalid("geocoder", "enabled", v, "must be true or false")
            })?;
        }
        if let Some(v) = non_empty(section, "max_concurrent") {
            g.max_concurrent = positive("geocoder", "max_concurrent", v, "must be a positive integer")?;
        }
        if let Some(v) = non_empty(section, "failure_threshold") {
            g.failure_threshold =
                positive("geocoder", "failure_threshold", v, "must be a positive integer")?;
        }
        if let Some(v) = non_empty(section, "cooldown") {
            g.cooldown = parse("geocoder", "cooldown", v, "must be an integer (seconds)")?;
        }
        if let Some(v) = non_empty(section, "cache_ttl") {
            let ttl: u64 = parse("geocoder", "cache_ttl", v, "must be an integer (seconds), 0 = no expiry")?;
            g.cache_ttl = (ttl > 0).then_some(ttl);
        }
        if let Some(v) = non_empty(section, "cache_capacity") {
            g.cache_capacity = positive("geocoder", "cache_capacity", v, "must be a positive integer")?;
        }
    }

    if let Some(section) = ini.section(Some("movement")) {
        let m = &mut config.movement;
        if let Some(v) = non_empty(section, "detector") {
            m.detector = DetectorKind::from_str(v)
                .map_err(|_| invalid("movement", "detector", v, "must be 'location' or 'motion'"))?;
        }
        if let Some(v) = non_empty(section, "distance_threshold") {
            m.distance_threshold = meters("movement", "distance_threshold", v)?;
        }
        if let Some(v) = non_empty(section, "altitude_threshold") {
            m.altitude_threshold = meters("movement", "altitude_threshold", v)?;
        }
        if let Some(v) = non_empty(section, "settle_delay") {
            m.settle_delay = parse("movement", "settle_delay", v, "must be an integer (seconds)")?;
        }
    }

    if let Some(section) = ini.section(Some("scanning")) {
        let s = &mut config.scanning;
        if let Some(v) = non_empty(section, "max_scans_per_window") {
            s.max_scans_per_window =
                positive("scanning", "max_scans_per_window", v, "must be a positive integer")?;
        }
        if let Some(v) = non_empty(section, "window") {
            s.window = positive("scanning", "window", v, "must be a positive integer (seconds)")?;
        }
    }

    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = non_empty(section, "file") {
            config.logging.file = expand_tilde(v);
        }
        if let Some(v) = non_empty(section, "filter") {
            config.logging.filter = v.to_string();
        }
    }

    Ok(config)
}

fn non_empty<'a>(section: &'a Properties, key: &str) -> Option<&'a str> {
    section.get(key).map(str::trim).filter(|v| !v.is_empty())
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse<T: FromStr>(section: &str, key: &str, value: &str, reason: &str) -> Result<T, ConfigFileError> {
    value.parse().map_err(|_| invalid(section, key, value, reason))
}

fn positive<T>(section: &str, key: &str, value: &str, reason: &str) -> Result<T, ConfigFileError>
where
    T: FromStr + PartialOrd + Default,
{
    let parsed: T = parse(section, key, value, reason)?;
    if parsed <= T::default() {
        return Err(invalid(section, key, value, reason));
    }
    Ok(parsed)
}

fn meters(section: &str, key: &str, value: &str) -> Result<f64, ConfigFileError> {
    let reason = "must be a non-negative number (meters)";
    let parsed: f64 = parse(section, key, value, reason)?;
    if !parsed.is_finite() || parsed < 0.0 {
        return Err(invalid(section, key, value, reason));
    }
    Ok(parsed)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// Expand a leading `~` to the home directory.
pub(super) fn expand_tilde(value: &str) -> PathBuf {
    if let Some(rest) = value.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn parse_str(content: &str) -> Result<ConfigFile, ConfigFileError> {
        parse_ini(&Ini::load_from_str(content).unwrap())
    }

    #[test]
    fn test_empty_ini_yields_defaults() {
        assert_eq!(parse_str("").unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_overlays_values() {
        let config = parse_str(
            r#"
[submission]
base_url = https://example.com/api/
api_key = abc123
batch_size = 10

[geocoder]
enabled = false
cache_ttl = 3600

[movement]
detector = motion
distance_threshold = 25.5
settle_delay = 60

[scanning]
max_scans_per_window = 2
window = 30
"#,
        )
        .unwrap();

        assert_eq!(config.submission.base_url, "https://example.com/api/");
        assert_eq!(config.submission.api_key.as_deref(), Some("abc123"));
        assert_eq!(config.submission.batch_size, 10);
        assert!(!config.geocoder.enabled);
        assert_eq!(config.geocoder_config().cache_ttl, Some(Duration::from_secs(3600)));
        assert_eq!(config.movement.detector, DetectorKind::MotionSensor);
        assert_eq!(config.movement_config().distance_threshold_m, 25.5);
        assert_eq!(config.movement_config().settle_delay, Duration::from_secs(60));
        assert_eq!(config.rate_limiter_config().max_actions, 2);
        assert_eq!(config.rate_limiter_config().window, Duration::from_secs(30));
    }

    #[test]
    fn test_blank_values_keep_defaults() {
        let config = parse_str("[submission]\napi_key =\n[geocoder]\ncache_ttl = 0\n").unwrap();
        assert!(config.submission.api_key.is_none());
        assert!(config.geocoder.cache_ttl.is_none());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let cases = [
            ("[geocoder]\nmax_concurrent = 0", "max_concurrent"),
            ("[geocoder]\nenabled = maybe", "enabled"),
            ("[scanning]\nmax_scans_per_window = -1", "max_scans_per_window"),
            ("[movement]\ndetector = psychic", "detector"),
            ("[movement]\ndistance_threshold = -5", "distance_threshold"),
            ("[submission]\nbase_url = not a url", "base_url"),
        ];

        for (content, expected_key) in cases {
            match parse_str(content) {
                Err(ConfigFileError::InvalidValue { key, .. }) => assert_eq!(key, expected_key),
                other => panic!("expected InvalidValue for {expected_key}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_expand_tilde() {
        assert_eq!(expand_tilde("/var/log/x.log"), PathBuf::from("/var/log/x.log"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~/x.log"), home.join("x.log"));
        }
    }
}
