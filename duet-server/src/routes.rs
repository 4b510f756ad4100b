use crate::signaling::ws_handler;
use crate::state::AppState;
use crate::upload::{health_check, upload_chunk};
use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Builds the router: signaling socket, chunk upload and health check.
pub fn create_router(state: AppState, upload_limit_bytes: usize) -> Router {
    // Browsers upload from another origin than the signaling host.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/ws", get(ws_handler))
        .route(
            "/upload",
            post(upload_chunk).layer(DefaultBodyLimit::max(upload_limit_bytes)),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
