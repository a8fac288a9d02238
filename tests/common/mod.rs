#![allow(dead_code)]

use std::fmt::Write as _;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use moodbinge_api::catalog::CatalogStore;
use moodbinge_api::config::Config;
use moodbinge_api::error::AppResult;
use moodbinge_api::models::MovieMetadata;
use moodbinge_api::services::providers::{FetchStatus, MetadataSource};
use moodbinge_api::services::RecommenderService;

/// How the stub metadata source responds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StubMode {
    Success,
    NotFound,
    ServerError,
}

/// Deterministic in-memory metadata source with a call counter
pub struct StubSource {
    pub mode: StubMode,
    pub calls: AtomicUsize,
}

impl StubSource {
    pub fn new(mode: StubMode) -> Self {
        Self {
            mode,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl MetadataSource for StubSource {
    async fn fetch_movie(&self, tmdb_id: u64) -> AppResult<FetchStatus> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.mode {
            StubMode::Success => Ok(FetchStatus::Success(MovieMetadata {
                overview: Some(format!("Overview for {tmdb_id}")),
                poster_path: Some(format!("/poster/{tmdb_id}.jpg")),
                ..Default::default()
            })),
            StubMode::NotFound => Ok(FetchStatus::NotFound),
            StubMode::ServerError => Ok(FetchStatus::ServerError(500)),
        }
    }
}

/// A catalog wide enough to exercise every mood path:
/// ids 1-40 horror/thriller, 41-80 comedy variants, 81-100 drama.
/// Even ids carry a TMDB link; every movie has five ratings.
pub fn fixture_catalog() -> CatalogStore {
    let mut movies = String::from("movieId,title,genres\n");
    let mut links = String::from("movieId,imdbId,tmdbId\n");
    let mut ratings = String::from("userId,movieId,rating,timestamp\n");
    let mut tags = String::from("userId,movieId,tag,timestamp\n");

    for id in 1..=100_i64 {
        let (genres, kind) = match id {
            1..=40 => ("Horror|Thriller", "Horror"),
            41..=80 => match id % 3 {
                0 => ("Comedy", "Comedy"),
                1 => ("Comedy|Animation", "Comedy"),
                _ => ("Comedy|Adventure", "Comedy"),
            },
            _ => ("Drama", "Drama"),
        };
        let year = 1950 + (id * 7) % 70;
        writeln!(movies, "{id},{kind} Tale {id} ({year}),{genres}").unwrap();

        if id % 2 == 0 {
            writeln!(links, "{id},{id:07},{}", 10_000 + id).unwrap();
        } else {
            writeln!(links, "{id},{id:07},", ).unwrap();
        }

        for user in 1..=6_i64 {
            if (id + user) % 6 == 0 {
                continue;
            }
            let rating = match (kind, user) {
                ("Horror", 1..=3) => 4.5,
                ("Horror", _) => 2.5,
                ("Comedy", 1..=3) => 2.5,
                ("Comedy", _) => 4.5,
                _ => 3.5,
            };
            writeln!(ratings, "{user},{id},{rating},0").unwrap();
        }
    }

    // A handful of horror movies carry matching tags
    for id in [2, 4, 6, 8] {
        writeln!(tags, "1,{id},scary,0").unwrap();
        writeln!(tags, "2,{id},creepy,0").unwrap();
    }

    CatalogStore::from_readers(
        movies.as_bytes(),
        ratings.as_bytes(),
        links.as_bytes(),
        Some(tags.as_bytes()),
    )
    .unwrap()
}

/// Config tuned for fast tests: tiny delays, no real waiting
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.retry_backoff_ms = 1;
    config.retry_after_cap_secs = 1;
    config.batch_delay_ms = 1;
    config.batch_timeout_secs = 5;
    config.enrichment_timeout_secs = 10;
    config
}

pub fn service_with(mode: StubMode) -> (Arc<RecommenderService>, Arc<StubSource>) {
    let source = Arc::new(StubSource::new(mode));
    let service = Arc::new(RecommenderService::new(
        Arc::new(fixture_catalog()),
        source.clone(),
        &test_config(),
    ));
    (service, source)
}
