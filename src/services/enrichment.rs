use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::config::Config;
use crate::models::{MovieMetadata, RecommendedMovie};
use crate::services::providers::{FetchStatus, MetadataSource};

/// A cached lookup result: either a payload or an explicit not-found marker
///
/// Negative entries keep repeated lookups of dead ids off the network.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedMetadata {
    Found(MovieMetadata),
    NotFound,
}

#[derive(Debug)]
struct CacheEntry {
    value: CachedMetadata,
    expires_at: Instant,
}

/// Cache performance counters
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate_percent: f64,
    pub cached_items: usize,
}

/// In-process TTL cache for external metadata
///
/// Shared between the concurrent and sequential fetch paths; reads and
/// writes go through a coarse RwLock (writes are idempotent, so re-caching
/// a key concurrently is harmless). Rebuilt from nothing on restart.
pub struct MetadataCache {
    entries: RwLock<HashMap<u64, CacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Default for MetadataCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Unexpired cached value without touching the hit/miss counters
    pub fn peek(&self, tmdb_id: u64) -> Option<CachedMetadata> {
        let entries = self.entries.read().expect("metadata cache lock poisoned");
        match entries.get(&tmdb_id) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
            _ => None,
        }
    }

    /// Unexpired cached value, counting the hit or miss
    pub fn get(&self, tmdb_id: u64) -> Option<CachedMetadata> {
        let entries = self.entries.read().expect("metadata cache lock poisoned");
        match entries.get(&tmdb_id) {
            Some(entry) if entry.expires_at > Instant::now() => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.value.clone())
            }
            _ => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn insert(&self, tmdb_id: u64, metadata: MovieMetadata, ttl: Duration) {
        self.store(tmdb_id, CachedMetadata::Found(metadata), ttl);
    }

    /// Record a not-found/failed lookup with its own (shorter) TTL
    pub fn insert_negative(&self, tmdb_id: u64, ttl: Duration) {
        self.store(tmdb_id, CachedMetadata::NotFound, ttl);
    }

    fn store(&self, tmdb_id: u64, value: CachedMetadata, ttl: Duration) {
        let mut entries = self.entries.write().expect("metadata cache lock poisoned");
        entries.insert(
            tmdb_id,
            CacheEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        if entries.len() % 100 == 0 {
            let now = Instant::now();
            entries.retain(|_, entry| entry.expires_at > now);
        }
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate_percent = if total > 0 {
            (hits as f64 / total as f64 * 1000.0).round() / 10.0
        } else {
            0.0
        };
        CacheStats {
            hits,
            misses,
            hit_rate_percent,
            cached_items: self.entries.read().expect("metadata cache lock poisoned").len(),
        }
    }
}

/// Tunables for the fetch pipeline
#[derive(Debug, Clone)]
pub struct EnrichmentConfig {
    pub max_retries: u32,
    pub base_backoff: Duration,
    pub retry_after_cap: Duration,
    pub success_ttl: Duration,
    pub negative_ttl: Duration,
    pub failure_ttl: Duration,
    pub batch_size: usize,
    pub batch_timeout: Duration,
    pub batch_delay: Duration,
    pub overall_timeout: Duration,
}

impl EnrichmentConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_retries: config.max_retries.max(1),
            base_backoff: Duration::from_millis(config.retry_backoff_ms),
            retry_after_cap: Duration::from_secs(config.retry_after_cap_secs),
            success_ttl: Duration::from_secs(config.metadata_ttl_secs),
            negative_ttl: Duration::from_secs(config.negative_ttl_secs),
            failure_ttl: Duration::from_secs(config.failure_ttl_secs),
            batch_size: config.enrichment_batch_size.max(1),
            batch_timeout: Duration::from_secs(config.batch_timeout_secs),
            batch_delay: Duration::from_millis(config.batch_delay_ms),
            overall_timeout: Duration::from_secs(config.enrichment_timeout_secs),
        }
    }
}

/// Concurrent, cached, retrying metadata fetcher
///
/// Failures never propagate out of this type: a movie whose metadata cannot
/// be fetched keeps its placeholder fields and the response goes out anyway.
#[derive(Clone)]
pub struct EnrichmentPipeline {
    source: Arc<dyn MetadataSource>,
    cache: Arc<MetadataCache>,
    config: EnrichmentConfig,
}

impl EnrichmentPipeline {
    pub fn new(source: Arc<dyn MetadataSource>, config: EnrichmentConfig) -> Self {
        Self {
            source,
            cache: Arc::new(MetadataCache::new()),
            config,
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Already-cached metadata for an id, if any; never goes to the network
    pub fn cached_metadata(&self, tmdb_id: u64) -> Option<MovieMetadata> {
        match self.cache.peek(tmdb_id) {
            Some(CachedMetadata::Found(metadata)) => Some(metadata),
            _ => None,
        }
    }

    /// Metadata for one id: cache first, then the network with retries
    ///
    /// Returns `None` for cached or fresh not-found results.
    pub async fn lookup(&self, tmdb_id: u64) -> Option<MovieMetadata> {
        if let Some(cached) = self.cache.get(tmdb_id) {
            return match cached {
                CachedMetadata::Found(metadata) => Some(metadata),
                CachedMetadata::NotFound => None,
            };
        }
        self.fetch_with_retry(tmdb_id).await
    }

    async fn fetch_with_retry(&self, tmdb_id: u64) -> Option<MovieMetadata> {
        for attempt in 0..self.config.max_retries {
            if attempt > 0 {
                let backoff = self.config.base_backoff * 2_u32.pow(attempt - 1);
                tokio::time::sleep(backoff).await;
            }

            match self.source.fetch_movie(tmdb_id).await {
                Ok(FetchStatus::Success(metadata)) => {
                    self.cache
                        .insert(tmdb_id, metadata.clone(), self.config.success_ttl);
                    return Some(metadata);
                }
                Ok(FetchStatus::NotFound) => {
                    self.cache.insert_negative(tmdb_id, self.config.negative_ttl);
                    return None;
                }
                Ok(FetchStatus::RateLimited { retry_after }) => {
                    let wait = Duration::from_secs(retry_after.unwrap_or(2))
                        .min(self.config.retry_after_cap);
                    tracing::debug!(tmdb_id, wait_secs = wait.as_secs(), "Honoring Retry-After");
                    tokio::time::sleep(wait).await;
                }
                Ok(FetchStatus::ServerError(status)) => {
                    tracing::debug!(tmdb_id, status, attempt, "Metadata fetch failed");
                    if status < 500 {
                        break;
                    }
                }
                Err(e) => {
                    tracing::debug!(tmdb_id, error = %e, attempt, "Metadata fetch error");
                }
            }
        }

        tracing::warn!(
            tmdb_id,
            attempts = self.config.max_retries,
            "Giving up on metadata fetch"
        );
        self.cache.insert_negative(tmdb_id, self.config.failure_ttl);
        None
    }

    /// Enrich a result list, bounded by the overall timeout
    ///
    /// The concurrent batched path runs first; if it exceeds the overall
    /// bound, a sequential pass over the same cache fills in what it can.
    /// Either way the movies come back, placeholders intact where metadata
    /// is missing.
    pub async fn enrich(&self, mut movies: Vec<RecommendedMovie>) -> Vec<RecommendedMovie> {
        if movies.is_empty() {
            return movies;
        }

        let started = Instant::now();
        match tokio::time::timeout(self.config.overall_timeout, self.enrich_batched(&mut movies))
            .await
        {
            Ok(()) => {}
            Err(_) => {
                tracing::warn!("Concurrent enrichment timed out, running sequential fallback");
                let _ = tokio::time::timeout(
                    self.config.overall_timeout,
                    self.enrich_sequential(&mut movies),
                )
                .await;
            }
        }

        tracing::debug!(
            movies = movies.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Enrichment finished"
        );
        movies
    }

    /// Batched concurrent path: fixed-size batches, a shared deadline per
    /// batch, slow fetches aborted individually, a pause between batches
    async fn enrich_batched(&self, movies: &mut [RecommendedMovie]) {
        let indices: Vec<usize> = (0..movies.len()).collect();
        let batch_count = indices.len().div_ceil(self.config.batch_size);

        for (batch_num, batch) in indices.chunks(self.config.batch_size).enumerate() {
            let deadline = tokio::time::Instant::now() + self.config.batch_timeout;

            let mut handles = Vec::new();
            for &idx in batch {
                let Some(tmdb_id) = movies[idx].tmdb_id else {
                    continue;
                };
                let pipeline = self.clone();
                handles.push((
                    idx,
                    tokio::spawn(async move { pipeline.lookup(tmdb_id).await }),
                ));
            }

            for (idx, mut handle) in handles {
                match tokio::time::timeout_at(deadline, &mut handle).await {
                    Ok(Ok(Some(metadata))) => movies[idx].apply_metadata(&metadata),
                    Ok(Ok(None)) => {}
                    Ok(Err(e)) => {
                        tracing::warn!(error = %e, "Metadata fetch task failed");
                    }
                    Err(_elapsed) => {
                        // Abort only this fetch; siblings keep their results
                        handle.abort();
                        tracing::warn!(
                            movie_id = movies[idx].movie_id,
                            "Abandoned slow metadata fetch"
                        );
                    }
                }
            }

            if batch_num + 1 < batch_count {
                tokio::time::sleep(self.config.batch_delay).await;
            }
        }
    }

    /// Sequential path over the same cache; one lookup at a time
    async fn enrich_sequential(&self, movies: &mut [RecommendedMovie]) {
        for movie in movies.iter_mut() {
            let Some(tmdb_id) = movie.tmdb_id else {
                continue;
            };
            if let Some(metadata) = self.lookup(tmdb_id).await {
                movie.apply_metadata(&metadata);
            }
        }
    }
}
