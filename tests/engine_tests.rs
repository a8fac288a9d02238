mod common;

use std::collections::HashSet;

use common::{service_with, StubMode};
use moodbinge_api::error::AppError;
use moodbinge_api::models::{MovieId, NO_OVERVIEW};

#[tokio::test]
async fn test_original_recommendations_respect_mood_exclusions() {
    let (service, _) = service_with(StubMode::NotFound);

    let movies = service
        .original_recommendations("phantom_fear", 5)
        .await
        .unwrap();

    assert_eq!(movies.len(), 5);
    for movie in &movies {
        for genre in &movie.genres {
            assert!(
                !["Comedy", "Children", "Musical"].contains(&genre.as_str()),
                "{} carries excluded genre {}",
                movie.title,
                genre
            );
        }
    }
    // Sorted by descending score
    for pair in movies.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[tokio::test]
async fn test_unknown_mood_is_rejected() {
    let (service, _) = service_with(StubMode::NotFound);
    let result = service.recommendations("existential_dread", 5, None, None).await;
    assert!(matches!(result, Err(AppError::UnknownMood(_))));
}

#[tokio::test]
async fn test_out_of_range_count_is_rejected() {
    let (service, _) = service_with(StubMode::NotFound);
    assert!(matches!(
        service.recommendations("phantom_fear", 0, None, None).await,
        Err(AppError::InvalidInput(_))
    ));
    assert!(matches!(
        service.recommendations("phantom_fear", 51, None, None).await,
        Err(AppError::InvalidInput(_))
    ));
}

#[tokio::test]
async fn test_session_anti_repetition_limits_overlap() {
    let (service, _) = service_with(StubMode::NotFound);

    let first = service
        .recommendations("euphoria_wave", 10, Some("abc"), None)
        .await
        .unwrap();
    let second = service
        .recommendations("euphoria_wave", 10, Some("abc"), None)
        .await
        .unwrap();

    assert_eq!(first.len(), 10);
    assert_eq!(second.len(), 10);

    let first_ids: HashSet<MovieId> = first.iter().map(|m| m.movie_id).collect();
    let overlap = second
        .iter()
        .filter(|m| first_ids.contains(&m.movie_id))
        .count();
    assert!(overlap <= 2, "overlap of {overlap} movies across calls");
}

#[tokio::test]
async fn test_session_history_is_tracked() {
    let (service, _) = service_with(StubMode::NotFound);

    service
        .recommendations("phantom_fear", 5, Some("tracked"), None)
        .await
        .unwrap();

    let stats = service.session_stats("tracked");
    assert!(stats.session_found);
    assert_eq!(stats.moods_seen, vec!["phantom_fear".to_string()]);
    assert_eq!(stats.total_shown, 5);
    assert!(stats.last_activity.is_some());

    assert!(service.clear_session("tracked"));
    assert!(!service.session_stats("tracked").session_found);
}

#[tokio::test]
async fn test_different_sessions_get_different_lists() {
    let (service, _) = service_with(StubMode::NotFound);

    let a = service
        .recommendations("phantom_fear", 10, Some("session-a"), None)
        .await
        .unwrap();
    let b = service
        .recommendations("phantom_fear", 10, Some("session-b"), None)
        .await
        .unwrap();

    let a_ids: Vec<MovieId> = a.iter().map(|m| m.movie_id).collect();
    let b_ids: Vec<MovieId> = b.iter().map(|m| m.movie_id).collect();
    // Randomization plus the global recent list should produce some variety
    assert_ne!(a_ids, b_ids);
}

#[tokio::test]
async fn test_similar_movies_absent_id_is_empty() {
    let (service, _) = service_with(StubMode::NotFound);
    let similar = service.similar_movies(99_999, 5).unwrap();
    assert!(similar.is_empty());
}

#[tokio::test]
async fn test_similar_movies_invalid_id_is_an_error() {
    let (service, _) = service_with(StubMode::NotFound);
    assert!(matches!(
        service.similar_movies(-1, 5),
        Err(AppError::InvalidInput(_))
    ));
}

#[tokio::test]
async fn test_similar_movies_excludes_self_and_bounds_count() {
    let (service, _) = service_with(StubMode::NotFound);
    let similar = service.similar_movies(1, 5).unwrap();

    assert!(!similar.is_empty());
    assert!(similar.len() <= 5);
    assert!(similar.iter().all(|m| m.movie_id != 1));
    for pair in similar.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[tokio::test]
async fn test_enrichment_applies_fetched_metadata() {
    let (service, source) = service_with(StubMode::Success);

    let movies = service
        .original_recommendations("phantom_fear", 10)
        .await
        .unwrap();

    // Even ids have TMDB links and get real metadata; odd ids keep placeholders
    for movie in &movies {
        if movie.tmdb_id.is_some() {
            assert!(movie.overview.starts_with("Overview for"));
            assert!(movie.poster_path.is_some());
        } else {
            assert_eq!(movie.overview, NO_OVERVIEW);
            assert!(movie.poster_path.is_none());
        }
    }
    assert!(source.call_count() > 0);
}

#[tokio::test]
async fn test_movie_details_hits_cache_on_second_lookup() {
    let (service, source) = service_with(StubMode::Success);

    let first = service.movie_details(2).await.unwrap();
    assert!(first.overview.is_some());
    let calls_after_first = source.call_count();

    let second = service.movie_details(2).await.unwrap();
    assert_eq!(first.overview, second.overview);
    // Second lookup served from cache, no extra network call
    assert_eq!(source.call_count(), calls_after_first);

    let stats = service.cache_stats();
    assert!(stats.hits >= 1);
    assert!(stats.cached_items >= 1);
}

#[tokio::test]
async fn test_not_found_metadata_is_negatively_cached() {
    let (service, source) = service_with(StubMode::NotFound);

    let details = service.movie_details(2).await.unwrap();
    assert!(details.overview.is_none());
    assert_eq!(source.call_count(), 1);

    // Within the negative TTL the second lookup makes zero network calls
    service.movie_details(2).await.unwrap();
    assert_eq!(source.call_count(), 1);
}

#[tokio::test]
async fn test_persistent_server_errors_still_return_results() {
    let (service, source) = service_with(StubMode::ServerError);

    let movies = service
        .recommendations("phantom_fear", 5, None, None)
        .await
        .unwrap();

    assert_eq!(movies.len(), 5);
    for movie in &movies {
        assert_eq!(movie.overview, NO_OVERVIEW);
        assert!(movie.poster_path.is_none());
    }
    // Each linked movie burned its retry budget, nothing more
    assert!(source.call_count() > 0);
}

#[tokio::test]
async fn test_movie_details_unknown_id() {
    let (service, _) = service_with(StubMode::NotFound);
    assert!(matches!(
        service.movie_details(99_999).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_personalized_request_still_returns_results() {
    let (service, _) = service_with(StubMode::NotFound);

    // User 1 exists in the ratings snapshot; user 999 falls back gracefully
    let known = service
        .recommendations("phantom_fear", 5, Some("u1"), Some(1))
        .await
        .unwrap();
    let unknown = service
        .recommendations("phantom_fear", 5, Some("u2"), Some(999))
        .await
        .unwrap();

    assert_eq!(known.len(), 5);
    assert_eq!(unknown.len(), 5);
}

#[tokio::test]
async fn test_baseline_strategy_ignores_sessions() {
    use moodbinge_api::services::RecommenderService;
    use std::sync::Arc;

    let mut config = common::test_config();
    config.use_enhanced_ranking = false;
    let service = RecommenderService::new(
        Arc::new(common::fixture_catalog()),
        Arc::new(common::StubSource::new(StubMode::NotFound)),
        &config,
    );

    let movies = service
        .recommendations("phantom_fear", 5, Some("ignored"), None)
        .await
        .unwrap();
    assert_eq!(movies.len(), 5);
    // The baseline path records no session history
    assert!(!service.session_stats("ignored").session_found);
}

#[tokio::test]
async fn test_moods_listing() {
    let (service, _) = service_with(StubMode::NotFound);
    let moods = service.moods();
    assert_eq!(moods.len(), 10);
    assert!(moods.iter().any(|m| m.id == "phantom_fear"));
    assert!(moods.iter().all(|m| !m.description.is_empty()));
}
