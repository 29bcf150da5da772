use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::catalog::CatalogSource;
use crate::engine::ViewerPosition;
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusResponse {
    pub catalog_size: usize,
    pub catalog_label: String,
    pub satellites_loaded: bool,
    pub source: CatalogSource,
    pub show_predictions: bool,
    pub frame: u64,
    pub frame_time: Option<DateTime<Utc>>,
    /// Viewer position the latest frame was ranked for.
    pub frame_viewer: ViewerPosition,
}

#[utoipa::path(
    get,
    path = "/api/status",
    responses(
        (status = 200, description = "Engine status", body = StatusResponse)
    ),
    tag = "catalog"
)]
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let snapshot = state.snapshots.latest();
    Json(StatusResponse {
        catalog_size: state.engine.catalog_len(),
        catalog_label: state.engine.catalog_label(),
        satellites_loaded: state.engine.satellites_loaded(),
        source: state.engine.catalog_source(),
        show_predictions: state.engine.show_predictions(),
        frame: snapshot.frame,
        frame_time: snapshot.taken_at,
        frame_viewer: snapshot.viewer,
    })
}

/// Switch the catalog source. An empty URL disables the catalog.
#[utoipa::path(
    put,
    path = "/api/catalog",
    request_body = CatalogSource,
    responses(
        (status = 200, description = "Source recorded, fetched on the next poll", body = CatalogSource),
        (status = 400, description = "Unsupported URL", body = ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn set_catalog(
    State(state): State<AppState>,
    Json(request): Json<CatalogSource>,
) -> ApiResult<Json<CatalogSource>> {
    let url = request.url.trim();
    if !url.is_empty() && !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ApiError::Validation(format!("unsupported catalog url: {}", url)));
    }
    let source = CatalogSource::new(url, request.identity);
    state.engine.set_catalog_source(source.clone());
    Ok(Json(source))
}
