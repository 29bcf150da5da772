use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::engine::{PathPoint, SatellitePath};
use crate::frame::{FrameSnapshot, VisibleSatellite};
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::state::AppState;

/// Earth-fixed cartesian position in km.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl From<[f64; 3]> for Vec3 {
    fn from(v: [f64; 3]) -> Self {
        Vec3 {
            x: v[0],
            y: v[1],
            z: v[2],
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SatelliteResponse {
    /// Index of the satellite in the loaded catalog.
    pub catalog_index: usize,
    pub name: String,
    pub norad_id: u64,
    pub special: bool,
    pub position: Vec3,
    pub distance_km: f64,
}

impl From<&VisibleSatellite> for SatelliteResponse {
    fn from(v: &VisibleSatellite) -> Self {
        SatelliteResponse {
            catalog_index: v.satellite.index,
            name: v.satellite.name.clone(),
            norad_id: v.satellite.norad_id,
            special: v.satellite.special,
            position: v.satellite.position.into(),
            distance_km: v.distance_km,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PathPointResponse {
    pub position: Vec3,
    pub minutes_from_epoch: f64,
    pub above_threshold: bool,
}

impl From<&PathPoint> for PathPointResponse {
    fn from(p: &PathPoint) -> Self {
        PathPointResponse {
            position: p.position.into(),
            minutes_from_epoch: p.minutes_from_epoch,
            above_threshold: p.above_threshold,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PathResponse {
    pub name: String,
    pub special: bool,
    pub above_threshold_count: usize,
    pub points: Vec<PathPointResponse>,
}

impl From<&SatellitePath> for PathResponse {
    fn from(path: &SatellitePath) -> Self {
        PathResponse {
            name: path.name.clone(),
            special: path.special,
            above_threshold_count: path.above_threshold_count(),
            points: path.points().iter().map(PathPointResponse::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct DisplaySettings {
    pub max_satellites: usize,
}

fn rendered(state: &AppState) -> ApiResult<FrameSnapshot> {
    let snapshot = state.snapshots.latest();
    if snapshot.taken_at.is_none() {
        return Err(ApiError::Unavailable("no_frame_rendered"));
    }
    Ok(snapshot)
}

#[utoipa::path(
    get,
    path = "/api/satellites",
    responses(
        (status = 200, description = "Closest satellites of the latest frame", body = Vec<SatelliteResponse>),
        (status = 503, description = "No frame rendered yet", body = ErrorResponse)
    ),
    tag = "satellites"
)]
pub async fn list_satellites(State(state): State<AppState>) -> ApiResult<Json<Vec<SatelliteResponse>>> {
    let snapshot = rendered(&state)?;
    Ok(Json(snapshot.satellites.iter().map(SatelliteResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/paths",
    responses(
        (status = 200, description = "Predicted paths with at least one visible point", body = Vec<PathResponse>),
        (status = 503, description = "No frame rendered yet", body = ErrorResponse)
    ),
    tag = "satellites"
)]
pub async fn list_paths(State(state): State<AppState>) -> ApiResult<Json<Vec<PathResponse>>> {
    let snapshot = rendered(&state)?;
    Ok(Json(snapshot.paths.iter().map(PathResponse::from).collect()))
}

#[utoipa::path(
    put,
    path = "/api/display",
    request_body = DisplaySettings,
    responses(
        (status = 200, description = "Number of satellites ranked per frame", body = DisplaySettings)
    ),
    tag = "satellites"
)]
pub async fn set_display(
    State(state): State<AppState>,
    Json(request): Json<DisplaySettings>,
) -> Json<DisplaySettings> {
    state.engine.set_max_visible(request.max_satellites);
    Json(DisplaySettings {
        max_satellites: state.engine.max_visible(),
    })
}
