//! Common helpers shared across CLI commands.

use std::path::Path;

use serde::de::DeserializeOwned;
use stumbler::config::ConfigFile;
use stumbler::geosubmit::{GeosubmitClient, ReqwestTransport};

use crate::error::CliError;

/// Read and parse a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let content = std::fs::read_to_string(path).map_err(|e| CliError::Input {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    serde_json::from_str(&content).map_err(|e| CliError::Input {
        path: path.to_path_buf(),
        reason: format!("invalid JSON: {}", e),
    })
}

/// Geosubmit client for the configured endpoint.
pub fn build_client(config: &ConfigFile) -> Result<GeosubmitClient<ReqwestTransport>, CliError> {
    let settings = config.geosubmit_config();
    let transport = ReqwestTransport::with_timeout(settings.timeout).map_err(CliError::Transport)?;
    Ok(GeosubmitClient::new(transport, settings))
}
