use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, info};

use crate::catalog::CatalogEntry;
use crate::config::PredictionConfig;
use crate::engine::observer::{min_zenith_dot, Observer};
use crate::engine::{FrameSignal, PathPoint, SatellitePath, Shared, TrackingEngine};
use crate::time::{self, Clock};

/// Viewer moves smaller than this (degrees) keep the current predictions.
const VIEWER_EPSILON_DEG: f64 = 0.01;
const MAX_EXPIRED_PER_CYCLE: usize = 2;

/// Per-cycle work limits derived from the prediction settings.
#[derive(Debug, Clone, Copy)]
struct Budget {
    step_minutes: f64,
    max_points: usize,
    min_dot: f64,
    special_min_dot: f64,
}

impl Budget {
    fn new(config: &PredictionConfig) -> Self {
        let step_seconds = config.step_seconds.max(1);
        Self {
            step_minutes: step_seconds as f64 / 60.0,
            max_points: (config.horizon_seconds / step_seconds) as usize,
            min_dot: min_zenith_dot(config.min_elevation_deg),
            special_min_dot: min_zenith_dot(config.special_min_elevation_deg),
        }
    }

    fn limits(&self, special: bool) -> (usize, f64) {
        if special {
            (2 * self.max_points, self.special_min_dot)
        } else {
            (self.max_points, self.min_dot)
        }
    }

    /// Expire old points and append at most one new one. Returns whether a
    /// point was added.
    fn advance_path(
        &self,
        entry: &mut CatalogEntry,
        path: &mut SatellitePath,
        observer: &Observer,
        mfe: f64,
    ) -> bool {
        if !entry.is_healthy() {
            if !path.is_empty() {
                path.clear();
            }
            return false;
        }

        let (max_points, min_dot) = self.limits(entry.special);
        let stale_before = mfe - 2.0 * self.step_minutes;

        if path
            .last()
            .is_some_and(|p| p.minutes_from_epoch < stale_before)
        {
            path.clear();
        } else {
            for _ in 0..MAX_EXPIRED_PER_CYCLE {
                if path
                    .first()
                    .is_some_and(|p| p.minutes_from_epoch < stale_before)
                {
                    path.pop_front();
                } else {
                    break;
                }
            }
        }

        // Off screen and already at full length: not worth extending.
        if path.len() >= max_points && path.last().is_some_and(|p| !p.above_threshold) {
            return false;
        }

        let next = match path.first() {
            Some(first) => first.minutes_from_epoch + path.len() as f64 * self.step_minutes,
            None => mfe,
        };
        let position = entry.position_at(next, time::earth_phase(next));
        path.push(PathPoint {
            position,
            minutes_from_epoch: next,
            above_threshold: observer.zenith_dot(position) >= min_dot,
        })
    }
}

/// Background worker keeping every catalog entry's predicted path filled
/// up to the prediction horizon.
pub struct PathPredictor {
    engine: Arc<TrackingEngine>,
    clock: Arc<dyn Clock>,
    config: PredictionConfig,
    budget: Budget,
    show_predictions: bool,
}

impl PathPredictor {
    pub fn new(engine: Arc<TrackingEngine>, clock: Arc<dyn Clock>, config: PredictionConfig) -> Self {
        let show_predictions = engine.show_predictions();
        Self {
            engine,
            clock,
            budget: Budget::new(&config),
            config,
            show_predictions,
        }
    }

    pub fn spawn(self, signal: Arc<FrameSignal>) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("satellite-path".into())
            .spawn(move || self.run(&signal))
    }

    fn run(mut self, signal: &FrameSignal) {
        loop {
            signal.wait();
            let pause = self.cycle();
            thread::sleep(pause);
        }
    }

    /// One bounded unit of work. Returns how long to sleep before waiting
    /// for the next frame.
    pub fn cycle(&mut self) -> Duration {
        if self.advance() {
            self.config.busy_sleep
        } else {
            self.config.idle_sleep
        }
    }

    fn advance(&mut self) -> bool {
        let now = self.clock.minutes_from_epoch();
        let engine = Arc::clone(&self.engine);
        let mut guard = engine.lock();
        let shared = &mut *guard;

        let observer = self.commit_viewer(shared);
        if !self.show_predictions {
            return false;
        }

        let mfe = time::quantize(now, self.budget.step_minutes);
        let mut advanced = false;
        for (entry, path) in shared.catalog.iter_mut().zip(shared.paths.iter_mut()) {
            advanced |= self.budget.advance_path(entry, path, &observer, mfe);
        }
        advanced
    }

    /// Reset all paths when the viewer moved, the toggle flipped or the path
    /// set is empty, and return the observer to predict for.
    fn commit_viewer(&mut self, shared: &mut Shared) -> Observer {
        let requested = shared.requested;
        let delta = shared.committed.map(|c| c.delta(&requested));
        let moved = delta.is_some_and(|d| d > VIEWER_EPSILON_DEG);
        let toggled = self.show_predictions != shared.show_predictions;
        let empty = shared.paths.is_empty() || shared.paths.len() != shared.catalog.len();

        if moved || toggled || empty || delta.is_none() {
            if let Some(d) = delta.filter(|_| moved) {
                info!("Update reason: viewer moved by {:.4} deg", d);
            }
            if toggled {
                info!(
                    "Update reason: predictions {}",
                    if shared.show_predictions { "enabled" } else { "disabled" }
                );
            }
            debug!(
                "Predicting for viewer ({:.4}, {:.4})",
                requested.latitude_deg, requested.longitude_deg
            );
            self.show_predictions = shared.show_predictions;
            shared.committed = Some(requested);
            shared.paths = shared
                .catalog
                .iter()
                .map(|e| SatellitePath::new(e.name.clone(), e.special))
                .collect();
        }

        Observer::new(shared.committed.get_or_insert(requested))
    }
}
