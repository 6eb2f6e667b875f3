//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::path::PathBuf;
use std::process;

use stumbler::config::ConfigFileError;
use stumbler::geosubmit::{SubmitError, TransportError, UploadError};

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(std::io::Error),
    /// Configuration error
    Config(ConfigFileError),
    /// Failed to start the async runtime
    Runtime(std::io::Error),
    /// Input file unreadable or malformed
    Input { path: PathBuf, reason: String },
    /// HTTP client could not be created
    Transport(TransportError),
    /// Upload or geolocate request failed
    Submit(SubmitError),
    /// Report storage failed during upload
    Upload(UploadError),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        let retryable = match self {
            CliError::Submit(e) => e.is_retryable(),
            CliError::Upload(e) => e.is_retryable(),
            _ => false,
        };
        if retryable {
            eprintln!();
            eprintln!("This failure is temporary; run the command again later.");
            process::exit(75)
        }

        if let CliError::Config(ConfigFileError::InvalidValue { .. }) = self {
            eprintln!();
            eprintln!("Run 'stumbler config show' to see the expected format.");
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(e) => write!(f, "Failed to initialize logging: {}", e),
            CliError::Config(e) => write!(f, "{}", e),
            CliError::Runtime(e) => write!(f, "Failed to start runtime: {}", e),
            CliError::Input { path, reason } => {
                write!(f, "Failed to read '{}': {}", path.display(), reason)
            }
            CliError::Transport(e) => write!(f, "Failed to create HTTP client: {}", e),
            CliError::Submit(e) => write!(f, "Request failed: {}", e),
            CliError::Upload(e) => write!(f, "Upload failed: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::LoggingInit(e) | CliError::Runtime(e) => Some(e),
            CliError::Config(e) => Some(e),
            CliError::Transport(e) => Some(e),
            CliError::Submit(e) => Some(e),
            CliError::Upload(e) => Some(e),
            CliError::Input { .. } => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

impl From<SubmitError> for CliError {
    fn from(e: SubmitError) -> Self {
        CliError::Submit(e)
    }
}

impl From<UploadError> for CliError {
    fn from(e: UploadError) -> Self {
        CliError::Upload(e)
    }
}
