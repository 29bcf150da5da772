pub mod observer;
mod path;
mod position;
pub mod predictor;
mod proximity;
mod signal;

use std::sync::{Mutex, MutexGuard, PoisonError};

pub use observer::ViewerPosition;
pub use path::{PathPoint, SatellitePath};
pub use position::{compute_positions, SatellitePosition};
pub use predictor::PathPredictor;
pub use proximity::ProximitySorter;
pub use signal::FrameSignal;

use crate::catalog::{CatalogEntry, CatalogSource};

/// How many of the closest satellites a frame ranks unless told otherwise.
pub const DEFAULT_MAX_VISIBLE: usize = 40;

pub(crate) struct Shared {
    pub catalog: Vec<CatalogEntry>,
    pub paths: Vec<SatellitePath>,
    pub requested: ViewerPosition,
    pub committed: Option<ViewerPosition>,
    pub show_predictions: bool,
    pub source: CatalogSource,
    pub label: String,
    pub loaded: bool,
    pub max_visible: usize,
}

/// Catalog, predicted paths and viewer state shared by the frame loop and
/// the background workers.
pub struct TrackingEngine {
    shared: Mutex<Shared>,
}

impl TrackingEngine {
    pub fn new(viewer: ViewerPosition, source: CatalogSource, show_predictions: bool) -> Self {
        Self {
            shared: Mutex::new(Shared {
                catalog: Vec::new(),
                paths: Vec::new(),
                requested: viewer,
                committed: None,
                show_predictions,
                source,
                label: String::new(),
                loaded: false,
                max_visible: DEFAULT_MAX_VISIBLE,
            }),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Swap in a new catalog. Every path is reset to empty, index-aligned
    /// with the new entries.
    pub fn replace_catalog(&self, entries: Vec<CatalogEntry>, label: &str) {
        let mut shared = self.lock();
        shared.paths = entries
            .iter()
            .map(|e| SatellitePath::new(e.name.clone(), e.special))
            .collect();
        shared.loaded = shared.loaded || !entries.is_empty();
        shared.catalog = entries;
        shared.label = label.to_string();
    }

    pub fn catalog_len(&self) -> usize {
        self.lock().catalog.len()
    }

    pub fn catalog_label(&self) -> String {
        self.lock().label.clone()
    }

    /// True once any non-empty catalog has been loaded.
    pub fn satellites_loaded(&self) -> bool {
        self.lock().loaded
    }

    /// Record where the viewer wants predictions for. The predictor picks it
    /// up on its next cycle.
    pub fn set_viewer_position(&self, latitude_deg: f64, longitude_deg: f64) {
        self.lock().requested = ViewerPosition::new(latitude_deg, longitude_deg);
    }

    pub fn viewer_position(&self) -> ViewerPosition {
        self.lock().requested
    }

    pub fn set_show_predictions(&self, show: bool) {
        self.lock().show_predictions = show;
    }

    pub fn show_predictions(&self) -> bool {
        self.lock().show_predictions
    }

    /// Number of closest satellites each frame ranks.
    pub fn max_visible(&self) -> usize {
        self.lock().max_visible
    }

    pub fn set_max_visible(&self, max_visible: usize) {
        self.lock().max_visible = max_visible;
    }

    pub fn catalog_source(&self) -> CatalogSource {
        self.lock().source.clone()
    }

    pub fn set_catalog_source(&self, source: CatalogSource) {
        self.lock().source = source;
    }

    pub fn compute_positions(&self, minutes_from_epoch: f64) -> Vec<SatellitePosition> {
        let mut shared = self.lock();
        compute_positions(&mut shared.catalog, minutes_from_epoch)
    }

    /// Deep copy of the paths that have at least one point above threshold.
    pub fn copy_paths(&self) -> Vec<SatellitePath> {
        self.lock()
            .paths
            .iter()
            .filter(|p| p.above_threshold_count() > 0)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::entry::fixtures::{lines, ISS_2008, ISS_2020};
    use crate::catalog::load;

    fn engine() -> TrackingEngine {
        TrackingEngine::new(ViewerPosition::new(10.0, 20.0), CatalogSource::default(), true)
    }

    #[test]
    fn reload_aligns_empty_paths() {
        let engine = engine();
        engine.replace_catalog(load(&lines(&[ISS_2008, ISS_2020])), "brightest");

        let shared = engine.lock();
        assert_eq!(shared.catalog.len(), shared.paths.len());
        assert!(shared.paths.iter().all(|p| p.is_empty()));
        assert_eq!(shared.paths[0].name, "International Space Station");
        assert!(shared.paths[0].special);
        drop(shared);

        assert_eq!(engine.catalog_label(), "brightest");
        assert!(engine.satellites_loaded());
    }

    #[test]
    fn loaded_flag_is_sticky() {
        let engine = engine();
        assert!(!engine.satellites_loaded());
        engine.replace_catalog(load(&lines(&[ISS_2020])), "");
        engine.replace_catalog(Vec::new(), "");
        assert_eq!(engine.catalog_len(), 0);
        assert!(engine.satellites_loaded());
    }

    #[test]
    fn viewer_request_does_not_commit() {
        let engine = engine();
        engine.set_viewer_position(1.5, -2.5);
        assert_eq!(engine.viewer_position(), ViewerPosition::new(1.5, -2.5));
        assert!(engine.lock().committed.is_none());
    }

    #[test]
    fn copy_paths_skips_invisible_paths() {
        let engine = engine();
        engine.replace_catalog(load(&lines(&[ISS_2008, ISS_2020])), "");
        {
            let mut shared = engine.lock();
            shared.paths[1].push(PathPoint {
                position: [1.0, 2.0, 3.0],
                minutes_from_epoch: 10.0,
                above_threshold: true,
            });
            shared.paths[0].push(PathPoint {
                position: [1.0, 2.0, 3.0],
                minutes_from_epoch: 10.0,
                above_threshold: false,
            });
        }
        let copies = engine.copy_paths();
        assert_eq!(copies.len(), 1);
        assert_eq!(copies[0].name, "ZARYA 2020");

        engine.lock().paths[1].clear();
        assert_eq!(copies[0].len(), 1);
        assert!(engine.copy_paths().is_empty());
    }
}
