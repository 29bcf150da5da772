use crate::catalog::CatalogEntry;
use crate::time;

/// Current Earth-fixed position of one healthy catalog entry.
#[derive(Debug, Clone, PartialEq)]
pub struct SatellitePosition {
    pub index: usize,
    pub norad_id: u64,
    pub name: String,
    pub special: bool,
    pub position: [f64; 3],
}

/// Positions of every healthy entry at the given time.
///
/// Entries past their error budget are left out. An entry that fails to
/// propagate still gets a (degenerate) position this call.
pub fn compute_positions(catalog: &mut [CatalogEntry], minutes_from_epoch: f64) -> Vec<SatellitePosition> {
    let phase = time::earth_phase(minutes_from_epoch);
    catalog
        .iter_mut()
        .enumerate()
        .filter(|(_, entry)| entry.is_healthy())
        .map(|(index, entry)| SatellitePosition {
            index,
            norad_id: entry.state.norad_id(),
            name: entry.name.clone(),
            special: entry.special,
            position: entry.position_at(minutes_from_epoch, phase),
        })
        .collect()
}
