use std::fmt;

use sgp4::{Constants, Elements, MinutesSinceEpoch, Prediction};

use crate::catalog::error::CatalogError;
use crate::engine::observer::rotate_to_earth_fixed;
use crate::time;

/// Entries that have failed to propagate more often than this are skipped
/// for the rest of the session.
pub const MAX_PROPAGATION_ERRORS: u32 = 10;

/// Parsed orbital state of one object. Propagation never mutates it.
#[derive(Clone)]
pub struct OrbitalState {
    constants: Constants,
    norad_id: u64,
    epoch_minutes: f64,
}

impl OrbitalState {
    pub fn from_tle(name: Option<String>, line1: &str, line2: &str) -> Result<Self, CatalogError> {
        let elements = Elements::from_tle(name, line1.as_bytes(), line2.as_bytes())?;
        let constants = Constants::from_elements(&elements)?;
        Ok(Self {
            constants,
            norad_id: elements.norad_id,
            epoch_minutes: time::naive_to_minutes(&elements.datetime),
        })
    }

    pub fn norad_id(&self) -> u64 {
        self.norad_id
    }

    /// Element set epoch, in minutes from the Unix epoch.
    pub fn epoch_minutes(&self) -> f64 {
        self.epoch_minutes
    }

    /// Inertial (TEME) state at `minutes` after the element set epoch.
    pub fn propagate(&self, minutes: f64) -> Result<Prediction, sgp4::Error> {
        self.constants.propagate(MinutesSinceEpoch(minutes))
    }
}

impl fmt::Debug for OrbitalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrbitalState")
            .field("norad_id", &self.norad_id)
            .field("epoch_minutes", &self.epoch_minutes)
            .finish()
    }
}

/// One tracked object in the catalog.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub state: OrbitalState,
    pub name: String,
    pub special: bool,
    pub error_count: u32,
}

impl CatalogEntry {
    pub fn is_healthy(&self) -> bool {
        self.error_count <= MAX_PROPAGATION_ERRORS
    }

    /// Earth-fixed position (km) at the given time.
    ///
    /// A propagation failure bumps `error_count` and yields the origin.
    pub fn position_at(&mut self, minutes_from_epoch: f64, earth_phase: f64) -> [f64; 3] {
        let minutes = minutes_from_epoch - self.state.epoch_minutes();
        match self.state.propagate(minutes) {
            Ok(prediction) => rotate_to_earth_fixed(prediction.position, earth_phase),
            Err(e) => {
                log::warn!(
                    "Sat {} error {} at {:.3} mins from sat epoch. (Error count = {}.)",
                    self.name,
                    e,
                    minutes,
                    self.error_count
                );
                self.error_count += 1;
                [0.0; 3]
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    pub const ISS_2008: [&str; 3] = [
        "ISS (ZARYA)",
        "1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927",
        "2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537",
    ];

    pub const ISS_2020: [&str; 3] = [
        "ZARYA 2020",
        "1 25544U 98067A   20148.21301450  .00001715  00000-0  38778-4 0  9992",
        "2 25544  51.6435  92.2789 0002570 358.0648 144.9972 15.49396855228767",
    ];

    /// ISS_2020 with an extreme drag term; it has re-entered by September 2020.
    pub const DECAYED_2020: [&str; 3] = [
        "DECAYED 2020",
        "1 25544U 98067A   20148.21301450  .00001715  00000-0  99999-1 0  9991",
        "2 25544  51.6435  92.2789 0002570 358.0648 144.9972 15.49396855228767",
    ];

    /// 2020-09-01T00:00:00Z in minutes from the Unix epoch.
    pub const AFTER_DECAY_MINUTES: f64 = 1_598_918_400.0 / 60.0;

    pub fn lines(records: &[[&str; 3]]) -> Vec<String> {
        records
            .iter()
            .flat_map(|r| r.iter().map(|l| l.to_string()))
            .collect()
    }

    pub fn text(records: &[[&str; 3]]) -> String {
        let mut text = lines(records).join("\n");
        text.push('\n');
        text
    }
}
