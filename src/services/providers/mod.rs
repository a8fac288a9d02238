//! External metadata provider abstraction
//!
//! Providers translate one keyed HTTP lookup into a typed outcome so the
//! enrichment pipeline can drive caching and retries without knowing about
//! status codes or transport details.

use crate::error::AppResult;
use crate::models::MovieMetadata;

#[cfg(test)]
use mockall::automock;

pub mod tmdb;

/// Outcome of a single fetch attempt
#[derive(Debug, Clone, PartialEq)]
pub enum FetchStatus {
    /// 200 with a parsed payload
    Success(MovieMetadata),
    /// 404 or 400: the id will never resolve, cacheable as empty
    NotFound,
    /// 429 with an optional Retry-After hint in seconds
    RateLimited { retry_after: Option<u64> },
    /// 5xx or another retryable server-side failure
    ServerError(u16),
}

/// A keyed metadata lookup against an external service
///
/// One attempt per call; the pipeline owns the retry policy.
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait MetadataSource: Send + Sync {
    /// Fetch metadata for an external id
    ///
    /// Transport-level failures (connect/read timeout, DNS) surface as `Err`;
    /// the pipeline treats them as retryable.
    async fn fetch_movie(&self, tmdb_id: u64) -> AppResult<FetchStatus>;
}
