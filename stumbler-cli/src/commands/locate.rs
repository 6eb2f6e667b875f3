//! `stumbler locate`: ask the geolocate service where a set of emitters is.

use std::path::PathBuf;

use stumbler::config::ConfigFile;
use stumbler::geosubmit::LocateRequest;

use super::common::{build_client, read_json};
use crate::error::CliError;

/// Run `locate` with a geolocate request read from `file`.
pub async fn run(file: PathBuf, config: &ConfigFile) -> Result<(), CliError> {
    let request: LocateRequest = read_json(&file)?;
    tracing::debug!(
        cells = request.cell_towers.len(),
        wifis = request.wifi_access_points.len(),
        beacons = request.bluetooth_beacons.len(),
        "Locating"
    );

    let client = build_client(config)?;
    let estimate = client.get_location(&request).await?;

    println!(
        "{:.6}, {:.6} (±{:.0} m)",
        estimate.coordinate.latitude(),
        estimate.coordinate.longitude(),
        estimate.accuracy
    );
    Ok(())
}
