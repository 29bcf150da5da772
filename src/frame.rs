use std::io;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use crate::config::RenderConfig;
use crate::engine::observer::distance;
use crate::engine::{
    FrameSignal, ProximitySorter, SatellitePath, SatellitePosition, TrackingEngine, ViewerPosition,
};
use crate::time::Clock;

/// One of the closest satellites in a frame.
#[derive(Debug, Clone)]
pub struct VisibleSatellite {
    pub satellite: SatellitePosition,
    pub distance_km: f64,
}

/// Read-only result of one rendered frame.
#[derive(Debug, Clone, Default)]
pub struct FrameSnapshot {
    pub frame: u64,
    pub taken_at: Option<DateTime<Utc>>,
    pub viewer: ViewerPosition,
    pub satellites: Vec<VisibleSatellite>,
    pub paths: Vec<SatellitePath>,
}

/// Latest published frame, shared with readers.
#[derive(Debug, Clone, Default)]
pub struct SnapshotHandle(Arc<Mutex<FrameSnapshot>>);

impl SnapshotHandle {
    pub fn latest(&self) -> FrameSnapshot {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn publish(&self, snapshot: FrameSnapshot) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = snapshot;
    }
}

/// Headless render loop. Each frame wakes the workers, then ranks the
/// current positions and publishes a snapshot.
pub struct FrameLoop {
    engine: Arc<TrackingEngine>,
    clock: Arc<dyn Clock>,
    signal: Arc<FrameSignal>,
    sorter: ProximitySorter,
    interval: Duration,
    snapshots: SnapshotHandle,
}

impl FrameLoop {
    pub fn new(
        engine: Arc<TrackingEngine>,
        clock: Arc<dyn Clock>,
        signal: Arc<FrameSignal>,
        config: &RenderConfig,
    ) -> Self {
        Self {
            sorter: ProximitySorter::new(engine.max_visible(), config.resort_interval),
            interval: Duration::from_secs_f64(1.0 / config.frame_rate.max(1) as f64),
            snapshots: SnapshotHandle::default(),
            engine,
            clock,
            signal,
        }
    }

    pub fn snapshots(&self) -> SnapshotHandle {
        self.snapshots.clone()
    }

    pub fn spawn(self) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("frame-loop".into())
            .spawn(move || self.run())
    }

    fn run(mut self) {
        loop {
            let started = Instant::now();
            self.render(started);
            thread::sleep(self.interval.saturating_sub(started.elapsed()));
        }
    }

    pub fn render(&mut self, now: Instant) -> FrameSnapshot {
        self.signal.broadcast();

        let taken_at = self.clock.now();
        let positions = self.engine.compute_positions(self.clock.minutes_from_epoch());
        let viewer = self.engine.viewer_position();
        let origin = viewer.position_km();

        self.sorter.set_max_visible(self.engine.max_visible());
        self.sorter.sort(origin, &positions, now);
        let satellites = (0..self.sorter.count())
            .map(|rank| &positions[self.sorter[rank]])
            .map(|p| VisibleSatellite {
                distance_km: distance(p.position, origin),
                satellite: p.clone(),
            })
            .collect();

        let snapshot = FrameSnapshot {
            frame: self.signal.frame(),
            taken_at: Some(taken_at),
            viewer,
            satellites,
            paths: self.engine.copy_paths(),
        };
        self.snapshots.publish(snapshot.clone());
        snapshot
    }
}
