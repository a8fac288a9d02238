mod common;

use axum_test::TestServer;
use common::{service_with, StubMode};
use moodbinge_api::api::{create_router, AppState};

fn create_test_server(mode: StubMode) -> TestServer {
    let (service, _) = service_with(mode);
    let app = create_router(AppState::new(service));
    TestServer::new(app).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server(StubMode::NotFound);
    let response = server.get("/health").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_list_moods() {
    let server = create_test_server(StubMode::NotFound);
    let response = server.get("/api/v1/moods").await;
    response.assert_status_ok();

    let moods: Vec<serde_json::Value> = response.json();
    assert_eq!(moods.len(), 10);
    assert!(moods.iter().any(|m| m["id"] == "euphoria_wave"));
    assert!(moods[0]["color"].as_str().unwrap().starts_with('#'));
}

#[tokio::test]
async fn test_recommendations_endpoint() {
    let server = create_test_server(StubMode::Success);
    let response = server
        .get("/api/v1/recommendations/phantom_fear")
        .add_query_param("limit", 5)
        .add_query_param("session_id", "api-test")
        .await;
    response.assert_status_ok();

    // Cache stats ride along as headers
    assert!(response.headers().contains_key("X-Cache-Hit-Rate"));
    assert!(response.headers().contains_key("X-Cache-Size"));

    let movies: Vec<serde_json::Value> = response.json();
    assert_eq!(movies.len(), 5);
    for movie in &movies {
        let genres: Vec<String> = movie["genres"]
            .as_array()
            .unwrap()
            .iter()
            .map(|g| g.as_str().unwrap().to_string())
            .collect();
        assert!(!genres.contains(&"Comedy".to_string()));
        assert!(movie["overview"].is_string());
    }
}

#[tokio::test]
async fn test_original_recommendations_endpoint() {
    let server = create_test_server(StubMode::NotFound);
    let response = server
        .get("/api/v1/recommendations/euphoria_wave/original")
        .add_query_param("limit", 3)
        .await;
    response.assert_status_ok();

    let movies: Vec<serde_json::Value> = response.json();
    assert_eq!(movies.len(), 3);
    assert_eq!(movies[0]["overview"], "No overview available.");
}

#[tokio::test]
async fn test_unknown_mood_returns_404() {
    let server = create_test_server(StubMode::NotFound);
    let response = server.get("/api/v1/recommendations/rage_quit").await;
    response.assert_status(axum::http::StatusCode::NOT_FOUND);

    let body: serde_json::Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("rage_quit"));
}

#[tokio::test]
async fn test_invalid_limit_returns_400() {
    let server = create_test_server(StubMode::NotFound);
    let response = server
        .get("/api/v1/recommendations/phantom_fear")
        .add_query_param("limit", 0)
        .await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_similar_movies_endpoint() {
    let server = create_test_server(StubMode::NotFound);

    let response = server.get("/api/v1/movies/1/similar").await;
    response.assert_status_ok();
    let similar: Vec<serde_json::Value> = response.json();
    assert!(!similar.is_empty());
    assert!(similar.iter().all(|m| m["movie_id"] != 1));

    // Absent id: empty list, not an error
    let response = server.get("/api/v1/movies/99999/similar").await;
    response.assert_status_ok();
    let similar: Vec<serde_json::Value> = response.json();
    assert!(similar.is_empty());
}

#[tokio::test]
async fn test_movie_details_endpoint() {
    let server = create_test_server(StubMode::Success);

    let response = server.get("/api/v1/movies/2").await;
    response.assert_status_ok();
    let details: serde_json::Value = response.json();
    assert_eq!(details["movie_id"], 2);
    assert!(details["overview"].as_str().unwrap().starts_with("Overview"));

    let response = server.get("/api/v1/movies/99999").await;
    response.assert_status(axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_session_stats_and_clear() {
    let server = create_test_server(StubMode::NotFound);

    let response = server.get("/api/v1/sessions/fresh/stats").await;
    response.assert_status_ok();
    let stats: serde_json::Value = response.json();
    assert_eq!(stats["session_found"], false);

    // Run a recommendation under this session, then check again
    server
        .get("/api/v1/recommendations/phantom_fear")
        .add_query_param("session_id", "fresh")
        .await
        .assert_status_ok();

    let stats: serde_json::Value = server.get("/api/v1/sessions/fresh/stats").await.json();
    assert_eq!(stats["session_found"], true);
    assert_eq!(stats["total_shown"], 10);

    let response = server.delete("/api/v1/sessions/fresh").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["cleared"], true);
}

#[tokio::test]
async fn test_cache_stats_endpoint() {
    let server = create_test_server(StubMode::Success);

    server
        .get("/api/v1/recommendations/phantom_fear")
        .add_query_param("limit", 4)
        .await
        .assert_status_ok();

    let response = server.get("/api/v1/cache/stats").await;
    response.assert_status_ok();
    let stats: serde_json::Value = response.json();
    assert!(stats["hits"].is_number());
    assert!(stats["misses"].is_number());
    assert!(stats["hit_rate_percent"].is_number());
    assert!(stats["cached_items"].as_u64().unwrap() > 0);
}
