use axum::{
    routing::{any, get},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::AppState;

/// Create the routes for one served target
pub fn router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // Listing or download page
        .route("/", any(handlers::page))
        // Downloads, addressed by opaque id
        .route("/files/:id", get(handlers::get_file))
        .route("/archive", get(handlers::get_archive))
        .route("/archive/:id", get(handlers::get_child_archive))
        // Every other path gets the page
        .fallback(handlers::page)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
