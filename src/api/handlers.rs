use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::AppState;
use crate::error::AppResult;
use crate::models::{MoodSummary, MovieDetails, MovieId, RecommendedMovie, SimilarMovie, UserId};

fn default_limit() -> usize {
    10
}

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
    pub session_id: Option<String>,
    pub user_id: Option<UserId>,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

pub async fn list_moods(State(state): State<AppState>) -> Json<Vec<MoodSummary>> {
    Json(state.service.moods())
}

/// Handler for the main recommendations endpoint
///
/// Adds cache headers so clients can see how warm the metadata cache is.
pub async fn recommendations(
    State(state): State<AppState>,
    Path(mood): Path<String>,
    Query(query): Query<RecommendationQuery>,
) -> AppResult<(HeaderMap, Json<Vec<RecommendedMovie>>)> {
    let movies = state
        .service
        .recommendations(
            &mood,
            query.limit,
            query.session_id.as_deref(),
            query.user_id,
        )
        .await?;

    let stats = state.service.cache_stats();
    let mut headers = HeaderMap::new();
    if let Ok(value) = format!("{}%", stats.hit_rate_percent).parse() {
        headers.insert("X-Cache-Hit-Rate", value);
    }
    if let Ok(value) = stats.cached_items.to_string().parse() {
        headers.insert("X-Cache-Size", value);
    }

    Ok((headers, Json(movies)))
}

/// Raw mood-scored list for comparison against the full pipeline
pub async fn original_recommendations(
    State(state): State<AppState>,
    Path(mood): Path<String>,
    Query(query): Query<LimitQuery>,
) -> AppResult<Json<Vec<RecommendedMovie>>> {
    let movies = state
        .service
        .original_recommendations(&mood, query.limit)
        .await?;
    Ok(Json(movies))
}

pub async fn movie_details(
    State(state): State<AppState>,
    Path(movie_id): Path<MovieId>,
) -> AppResult<Json<MovieDetails>> {
    let details = state.service.movie_details(movie_id).await?;
    Ok(Json(details))
}

pub async fn similar_movies(
    State(state): State<AppState>,
    Path(movie_id): Path<MovieId>,
    Query(query): Query<LimitQuery>,
) -> AppResult<Json<Vec<SimilarMovie>>> {
    let similar = state.service.similar_movies(movie_id, query.limit)?;
    Ok(Json(similar))
}

pub async fn session_stats(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Json<Value> {
    Json(json!(state.service.session_stats(&session_id)))
}

pub async fn clear_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Json<Value> {
    let cleared = state.service.clear_session(&session_id);
    Json(json!({
        "session_id": session_id,
        "cleared": cleared,
    }))
}

pub async fn cache_stats(State(state): State<AppState>) -> Json<Value> {
    Json(json!(state.service.cache_stats()))
}
