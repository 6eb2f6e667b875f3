//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.

use std::path::PathBuf;
use std::time::Duration;

use crate::geocoder::{
    GeocoderConfig, DEFAULT_CACHE_CAPACITY, DEFAULT_COOLDOWN, DEFAULT_FAILURE_THRESHOLD,
    DEFAULT_MAX_CONCURRENT,
};
use crate::geosubmit::{
    GeosubmitConfig, DEFAULT_BASE_URL, DEFAULT_BATCH_SIZE, DEFAULT_LOCATE_PATH,
    DEFAULT_SUBMISSION_PATH, DEFAULT_TIMEOUT,
};
use crate::movement::{
    MovementConfig, DEFAULT_ALTITUDE_THRESHOLD_M, DEFAULT_DISTANCE_THRESHOLD_M,
    DEFAULT_SETTLE_DELAY,
};
use crate::rate_limiter::{RateLimiterConfig, DEFAULT_MAX_ACTIONS, DEFAULT_WINDOW};

use super::file::config_directory;

/// Default log filter directive.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigFile {
    pub submission: SubmissionSettings,
    pub geocoder: GeocoderSettings,
    pub movement: MovementSettings,
    pub scanning: ScanningSettings,
    pub logging: LoggingSettings,
}

/// `[submission]`: geosubmit endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionSettings {
    pub base_url: String,
    pub submission_path: String,
    pub locate_path: String,
    pub api_key: Option<String>,
    /// Request timeout in seconds
    pub timeout: u64,
    /// Reports per upload request
    pub batch_size: usize,
}

impl Default for SubmissionSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            submission_path: DEFAULT_SUBMISSION_PATH.to_string(),
            locate_path: DEFAULT_LOCATE_PATH.to_string(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT.as_secs(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// `[geocoder]`: reverse geocoding guards.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocoderSettings {
    pub enabled: bool,
    pub max_concurrent: usize,
    pub failure_threshold: u32,
    /// Breaker cooldown in seconds
    pub cooldown: u64,
    /// Cache entry lifetime in seconds; `None` keeps entries for the process lifetime
    pub cache_ttl: Option<u64>,
    pub cache_capacity: u64,
}

impl Default for GeocoderSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            cooldown: DEFAULT_COOLDOWN.as_secs(),
            cache_ttl: None,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

/// Which movement detector drives scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetectorKind {
    #[default]
    Location,
    MotionSensor,
}

impl DetectorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectorKind::Location => "location",
            DetectorKind::MotionSensor => "motion",
        }
    }
}

impl std::str::FromStr for DetectorKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "location" => Ok(DetectorKind::Location),
            "motion" | "motion_sensor" => Ok(DetectorKind::MotionSensor),
            _ => Err(()),
        }
    }
}

/// `[movement]`: movement detection.
#[derive(Debug, Clone, PartialEq)]
pub struct MovementSettings {
    pub detector: DetectorKind,
    pub distance_threshold: f64,
    pub altitude_threshold: f64,
    /// Settle delay in seconds
    pub settle_delay: u64,
}

impl Default for MovementSettings {
    fn default() -> Self {
        Self {
            detector: DetectorKind::default(),
            distance_threshold: DEFAULT_DISTANCE_THRESHOLD_M,
            altitude_threshold: DEFAULT_ALTITUDE_THRESHOLD_M,
            settle_delay: DEFAULT_SETTLE_DELAY.as_secs(),
        }
    }
}

/// `[scanning]`: active scan throttle.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanningSettings {
    pub max_scans_per_window: usize,
    /// Window length in seconds
    pub window: u64,
}

impl Default for ScanningSettings {
    fn default() -> Self {
        Self {
            max_scans_per_window: DEFAULT_MAX_ACTIONS,
            window: DEFAULT_WINDOW.as_secs(),
        }
    }
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
    /// Filter directive used when `RUST_LOG` is unset
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            file: config_directory().join("stumbler.log"),
            filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl ConfigFile {
    pub fn geosubmit_config(&self) -> GeosubmitConfig {
        let s = &self.submission;
        GeosubmitConfig {
            base_url: s.base_url.clone(),
            submission_path: s.submission_path.clone(),
            locate_path: s.locate_path.clone(),
            api_key: s.api_key.clone(),
            timeout: Duration::from_secs(s.timeout),
        }
    }

    pub fn geocoder_config(&self) -> GeocoderConfig {
        let g = &self.geocoder;
        GeocoderConfig {
            max_concurrent: g.max_concurrent,
            failure_threshold: g.failure_threshold,
            cooldown: Duration::from_secs(g.cooldown),
            cache_ttl: g.cache_ttl.map(Duration::from_secs),
            cache_capacity: g.cache_capacity,
            enabled: g.enabled,
        }
    }

    pub fn movement_config(&self) -> MovementConfig {
        MovementConfig {
            distance_threshold_m: self.movement.distance_threshold,
            altitude_threshold_m: self.movement.altitude_threshold,
            settle_delay: Duration::from_secs(self.movement.settle_delay),
        }
    }

    pub fn rate_limiter_config(&self) -> RateLimiterConfig {
        RateLimiterConfig {
            max_actions: self.scanning.max_scans_per_window,
            window: Duration::from_secs(self.scanning.window),
        }
    }
}
