use std::time::Duration;

use reqwest::{Client as HttpClient, StatusCode};
use serde::Deserialize;

use crate::config::Config;
use crate::error::AppResult;
use crate::models::MovieMetadata;
use crate::services::providers::{FetchStatus, MetadataSource};

/// TMDB movie-details provider
///
/// Issues `GET {base}/movie/{id}` with bounded connect and read timeouts and
/// maps the response onto `FetchStatus`. Retry policy lives in the pipeline.
#[derive(Clone)]
pub struct TmdbClient {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

#[derive(Debug, Deserialize)]
struct NamedEntry {
    name: String,
}

/// Raw TMDB movie document, reduced to the fields we keep
#[derive(Debug, Deserialize)]
struct TmdbMovieResponse {
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    overview: Option<String>,
    release_date: Option<String>,
    runtime: Option<u32>,
    tagline: Option<String>,
    vote_average: Option<f64>,
    #[serde(default)]
    production_companies: Vec<NamedEntry>,
    #[serde(default)]
    production_countries: Vec<NamedEntry>,
}

impl From<TmdbMovieResponse> for MovieMetadata {
    fn from(raw: TmdbMovieResponse) -> Self {
        Self {
            poster_path: raw.poster_path,
            backdrop_path: raw.backdrop_path,
            overview: raw.overview,
            release_date: raw.release_date,
            runtime: raw.runtime,
            tagline: raw.tagline,
            vote_average: raw.vote_average,
            production_companies: raw.production_companies.into_iter().map(|e| e.name).collect(),
            production_countries: raw.production_countries.into_iter().map(|e| e.name).collect(),
        }
    }
}

impl TmdbClient {
    pub fn new(config: &Config) -> AppResult<Self> {
        let http_client = HttpClient::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http_client,
            api_key: config.tmdb_api_key.clone(),
            api_url: config.tmdb_base_url.clone(),
        })
    }

    /// Whether a usable API key was configured
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

#[async_trait::async_trait]
impl MetadataSource for TmdbClient {
    async fn fetch_movie(&self, tmdb_id: u64) -> AppResult<FetchStatus> {
        if !self.is_configured() {
            // Without a key every lookup is a permanent miss
            return Ok(FetchStatus::NotFound);
        }

        let url = format!("{}/movie/{}", self.api_url, tmdb_id);
        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str()), ("language", "en-US")])
            .send()
            .await?;

        let status = response.status();
        match status {
            StatusCode::OK => {
                let raw: TmdbMovieResponse = response.json().await?;
                Ok(FetchStatus::Success(raw.into()))
            }
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse().ok());
                tracing::debug!(tmdb_id, ?retry_after, "TMDB rate limited");
                Ok(FetchStatus::RateLimited { retry_after })
            }
            StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST => Ok(FetchStatus::NotFound),
            other => {
                tracing::debug!(tmdb_id, status = other.as_u16(), "TMDB error status");
                Ok(FetchStatus::ServerError(other.as_u16()))
            }
        }
    }
}
