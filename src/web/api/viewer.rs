use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::engine::ViewerPosition;
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::state::AppState;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct PredictionsToggle {
    pub show: bool,
}

#[utoipa::path(
    get,
    path = "/api/viewer",
    responses(
        (status = 200, description = "Requested viewer position", body = ViewerPosition)
    ),
    tag = "viewer"
)]
pub async fn get_viewer(State(state): State<AppState>) -> Json<ViewerPosition> {
    Json(state.engine.viewer_position())
}

/// Only records the position; predictions catch up on the next cycle.
#[utoipa::path(
    put,
    path = "/api/viewer",
    request_body = ViewerPosition,
    responses(
        (status = 200, description = "Position recorded", body = ViewerPosition),
        (status = 400, description = "Coordinates out of range", body = ErrorResponse)
    ),
    tag = "viewer"
)]
pub async fn set_viewer(
    State(state): State<AppState>,
    Json(request): Json<ViewerPosition>,
) -> ApiResult<Json<ViewerPosition>> {
    if !(-90.0..=90.0).contains(&request.latitude_deg) {
        return Err(ApiError::Validation("latitude_deg must be within [-90, 90]".into()));
    }
    if !(-180.0..=180.0).contains(&request.longitude_deg) {
        return Err(ApiError::Validation("longitude_deg must be within [-180, 180]".into()));
    }
    state
        .engine
        .set_viewer_position(request.latitude_deg, request.longitude_deg);
    Ok(Json(state.engine.viewer_position()))
}

#[utoipa::path(
    put,
    path = "/api/predictions",
    request_body = PredictionsToggle,
    responses(
        (status = 200, description = "Prediction toggle updated", body = PredictionsToggle)
    ),
    tag = "viewer"
)]
pub async fn set_predictions(
    State(state): State<AppState>,
    Json(request): Json<PredictionsToggle>,
) -> Json<PredictionsToggle> {
    state.engine.set_show_predictions(request.show);
    Json(PredictionsToggle {
        show: state.engine.show_predictions(),
    })
}
