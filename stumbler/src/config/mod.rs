//! User configuration (`~/.stumbler/config.ini`).
//!
//! [`ConfigFile`] groups one settings struct per INI section and converts
//! them into the configs the pipeline components take.

mod file;
mod parser;
mod settings;
mod writer;

pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{
    ConfigFile, DetectorKind, GeocoderSettings, LoggingSettings, MovementSettings,
    ScanningSettings, SubmissionSettings, DEFAULT_LOG_FILTER,
};
