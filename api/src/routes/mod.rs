pub mod ingredients;
pub mod recipes;

use axum::{Router, extract::DefaultBodyLimit, routing::get};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::AppState;
use crate::constants::MAX_VIDEO_UPLOAD_SIZE;

/// Build all routes for the API
pub fn build_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .merge(ingredients::routes())
        .merge(recipes::routes())
}

/// The full application with its layers and state attached
pub fn app(state: Arc<AppState>) -> Router {
    build_routes()
        .layer(DefaultBodyLimit::max(MAX_VIDEO_UPLOAD_SIZE))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
