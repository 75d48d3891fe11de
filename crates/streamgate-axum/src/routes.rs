//! Route definitions and router construction.

use axum::Router;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};

use crate::handlers;
use crate::server::CorsConfig;
use crate::state::AppState;

/// Build CORS layer from configuration.
fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    match config {
        CorsConfig::AllowAll => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
        CorsConfig::AllowOrigins(origins) => {
            let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            CorsLayer::new()
                .allow_origin(allowed)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    }
}

/// API routes without the `/api` prefix.
fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/streams",
            get(handlers::streams::list).post(handlers::streams::add),
        )
        // Static segments take precedence over `{name}`
        .route("/streams/start-all", post(handlers::streams::start_all))
        .route("/streams/stop-all", post(handlers::streams::stop_all))
        .route(
            "/streams/{name}",
            get(handlers::streams::get).delete(handlers::streams::remove),
        )
        .route("/streams/{name}/start", post(handlers::streams::start))
        .route("/streams/{name}/stop", post(handlers::streams::stop))
        .route("/streams/{name}/toggle", post(handlers::streams::toggle))
        .route("/streams/{name}/logs", get(handlers::streams::logs))
        // Events (SSE)
        .route("/events", get(handlers::events::stream))
}

/// Create the main Axum router.
///
/// `/health` is served at the root; everything else lives under `/api`.
pub fn create_router(state: AppState, cors_config: &CorsConfig) -> Router {
    let cors = build_cors_layer(cors_config);

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api", api_routes().with_state(state).layer(cors))
}
