use std::sync::Arc;

use crate::engine::TrackingEngine;
use crate::frame::SnapshotHandle;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<TrackingEngine>,
    pub snapshots: SnapshotHandle,
}
