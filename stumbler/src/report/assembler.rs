//! Report assembly and missing-data reconciliation.
//!
//! The assembler never fails: reconciliation is best effort and a field no
//! sibling can supply stays absent.

use std::collections::HashMap;

use crate::observation::{
    BluetoothBeacon, CellTower, EmitterObservation, PositionObservation, WifiAccessPoint,
};

use super::ReportData;

/// Builds [`ReportData`] from a reference fix and the emitters seen around it.
#[derive(Debug, Clone, Default)]
pub struct ReportAssembler {
    /// Combined MCC+MNC operator code (e.g. `"26201"`) from the SIM/network.
    operator_code: Option<String>,
}

impl ReportAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Supply the combined numeric operator code used to fill missing MNCs.
    pub fn with_operator_code(mut self, operator_code: Option<String>) -> Self {
        self.operator_code = operator_code.filter(|code| !code.is_empty());
        self
    }

    /// Package one report. Ages are derived later from the position's
    /// capture time, see [`ReportData::into_report`].
    pub fn assemble(
        &self,
        position: PositionObservation,
        cell_towers: Vec<EmitterObservation<CellTower>>,
        wifi_access_points: Vec<EmitterObservation<WifiAccessPoint>>,
        bluetooth_beacons: Vec<EmitterObservation<BluetoothBeacon>>,
    ) -> ReportData {
        let cell_towers = reconcile_cell_towers(cell_towers, self.operator_code.as_deref());

        tracing::trace!(
            cells = cell_towers.len(),
            wifis = wifi_access_points.len(),
            beacons = bluetooth_beacons.len(),
            "Assembled report"
        );

        ReportData {
            position,
            cell_towers,
            wifi_access_points,
            bluetooth_beacons,
        }
    }
}

/// Fill missing mobile network codes.
///
/// 1. Cells sharing `(mcc, cell id, lac)` lend their network code to siblings
///    that lack one. Cells with neither cell id nor area code have no siblings. If siblings disagree, the smallest code wins, so the
///    result does not depend on input order.
/// 2. A cell still lacking a network code takes the suffix of
///    `operator_code` when its country code is that code's prefix.
pub fn reconcile_cell_towers(
    mut cells: Vec<EmitterObservation<CellTower>>,
    operator_code: Option<&str>,
) -> Vec<EmitterObservation<CellTower>> {
    let mut known: HashMap<CellKey, String> = HashMap::new();

    for cell in &cells {
        let tower = &cell.emitter;
        if let (Some(mnc), Some(key)) = (&tower.mobile_network_code, sibling_key(tower)) {
            known
                .entry(key)
                .and_modify(|existing| {
                    if *mnc < *existing {
                        *existing = mnc.clone();
                    }
                })
                .or_insert_with(|| mnc.clone());
        }
    }

    for cell in cells.iter_mut() {
        let tower = &mut cell.emitter;
        if tower.mobile_network_code.is_some() {
            continue;
        }

        if let Some(mnc) = sibling_key(tower).and_then(|key| known.get(&key)) {
            tower.mobile_network_code = Some(mnc.clone());
            continue;
        }

        if let (Some(code), Some(mcc)) = (operator_code, tower.mobile_country_code.as_deref()) {
            if let Some(mnc) = network_code_from_operator(code, mcc) {
                tower.mobile_network_code = Some(mnc.to_string());
            }
        }
    }

    cells
}

/// Owned form of [`CellTower::identity_without_network`].
type CellKey = (Option<String>, Option<u64>, Option<u32>);

/// Grouping key for sibling reconciliation.
///
/// Cells with neither a cell id nor an area code (neighbours reporting only
/// PCI/PSC) are not grouped at all.
fn sibling_key(tower: &CellTower) -> Option<CellKey> {
    let (mcc, cell_id, lac) = tower.identity_without_network();
    if cell_id.is_none() && lac.is_none() {
        return None;
    }
    Some((mcc.map(str::to_string), cell_id, lac))
}

/// Split a combined operator code into its network part, given the country code.
fn network_code_from_operator<'a>(operator_code: &'a str, mcc: &str) -> Option<&'a str> {
    let suffix = operator_code.strip_prefix(mcc)?;
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(suffix)
}
