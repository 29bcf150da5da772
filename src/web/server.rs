use axum::{
    routing::{get, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::api::catalog as catalog_handlers;
use super::api::satellites as satellite_handlers;
use super::api::viewer as viewer_handlers;
use super::api_doc::ApiDoc;
use super::state::AppState;

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/satellites", get(satellite_handlers::list_satellites))
        .route("/api/paths", get(satellite_handlers::list_paths))
        .route("/api/display", put(satellite_handlers::set_display))
        .route(
            "/api/viewer",
            get(viewer_handlers::get_viewer).put(viewer_handlers::set_viewer),
        )
        .route("/api/predictions", put(viewer_handlers::set_predictions))
        .route("/api/catalog", put(catalog_handlers::set_catalog))
        .route("/api/status", get(catalog_handlers::status))
        // OpenAPI / Swagger
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(state: AppState, bind_addr: &str) -> std::io::Result<()> {
    let app = router(state);

    log::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).await
}
