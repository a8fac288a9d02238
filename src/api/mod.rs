use std::sync::Arc;

use axum::{
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::services::RecommenderService;

mod handlers;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<RecommenderService>,
}

impl AppState {
    pub fn new(service: Arc<RecommenderService>) -> Self {
        Self { service }
    }
}

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/moods", get(handlers::list_moods))
        .route("/recommendations/:mood", get(handlers::recommendations))
        .route(
            "/recommendations/:mood/original",
            get(handlers::original_recommendations),
        )
        .route("/movies/:movie_id", get(handlers::movie_details))
        .route("/movies/:movie_id/similar", get(handlers::similar_movies))
        .route("/sessions/:session_id/stats", get(handlers::session_stats))
        .route("/sessions/:session_id", delete(handlers::clear_session))
        .route("/cache/stats", get(handlers::cache_stats))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
