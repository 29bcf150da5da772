use utoipa::OpenApi;

use super::api::catalog::StatusResponse;
use super::api::error::ErrorResponse;
use super::api::satellites::{
    DisplaySettings, PathPointResponse, PathResponse, SatelliteResponse, Vec3,
};
use super::api::viewer::PredictionsToggle;

#[derive(OpenApi)]
#[openapi(
    paths(
        super::api::satellites::list_satellites,
        super::api::satellites::list_paths,
        super::api::satellites::set_display,
        super::api::viewer::get_viewer,
        super::api::viewer::set_viewer,
        super::api::viewer::set_predictions,
        super::api::catalog::status,
        super::api::catalog::set_catalog,
    ),
    components(
        schemas(
            SatelliteResponse,
            PathResponse,
            PathPointResponse,
            Vec3,
            DisplaySettings,
            PredictionsToggle,
            StatusResponse,
            ErrorResponse,
            crate::engine::ViewerPosition,
            crate::catalog::CatalogSource,
        )
    ),
    info(
        title = "Sat-O-Scope API",
        description = "Read-only view of satellite positions and predicted visibility",
        version = "0.1.0"
    ),
    tags(
        (name = "satellites", description = "Closest satellites and predicted paths"),
        (name = "viewer", description = "Observer position and prediction toggle"),
        (name = "catalog", description = "Catalog source and engine status")
    )
)]
pub struct ApiDoc;
