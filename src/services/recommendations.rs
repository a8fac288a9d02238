use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Datelike;

use crate::catalog::CatalogStore;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::movie::sort_by_score_desc;
use crate::models::{
    Candidate, MoodCatalog, MoodProfile, MoodSummary, MovieDetails, MovieId, RecommendedMovie,
    SimilarMovie, UserId,
};
use crate::services::collaborative::CollaborativeFilter;
use crate::services::diversity::DiversitySelector;
use crate::services::enrichment::{CacheStats, EnrichmentConfig, EnrichmentPipeline};
use crate::services::hybrid::{FusionWeights, HybridFuser};
use crate::services::mood_scorer::{EnhancedScorer, Exploration, MoodScorer};
use crate::services::providers::MetadataSource;
use crate::services::randomizer::SmartRandomizer;
use crate::services::session_tracker::{SessionStats, SessionTracker};

/// Bounds on the requested result count
pub const MIN_RESULTS: usize = 1;
pub const MAX_RESULTS: usize = 50;

/// Which ranking path serves session requests
///
/// The baseline strategy skips session exclusion, randomization and the
/// weighted re-score even when a session id is supplied; it exists as an
/// explicit policy value rather than an exception-driven fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankingStrategy {
    Enhanced,
    Baseline,
}

/// The ranking-and-enrichment engine facade
///
/// Owns the catalog, the mood profiles, every scoring component and the
/// enrichment pipeline. Stateless per request apart from the session tracker
/// and the metadata cache.
pub struct RecommenderService {
    catalog: Arc<CatalogStore>,
    moods: MoodCatalog,
    scorer: MoodScorer,
    collaborative: CollaborativeFilter,
    diversity: DiversitySelector,
    randomizer: SmartRandomizer,
    sessions: SessionTracker,
    enrichment: EnrichmentPipeline,
    strategy: RankingStrategy,
    randomization_strength: f64,
    pool_multiplier: usize,
    max_pool: usize,
}

impl RecommenderService {
    pub fn new(
        catalog: Arc<CatalogStore>,
        source: Arc<dyn MetadataSource>,
        config: &Config,
    ) -> Self {
        let collaborative = CollaborativeFilter::build(&catalog, config.min_user_ratings);
        let strategy = if config.use_enhanced_ranking {
            RankingStrategy::Enhanced
        } else {
            RankingStrategy::Baseline
        };

        tracing::info!(
            movies = catalog.len(),
            strategy = ?strategy,
            "Recommender service initialized"
        );

        Self {
            moods: MoodCatalog::builtin(),
            scorer: MoodScorer::new(Exploration::Seeded(config.random_seed)),
            collaborative,
            diversity: DiversitySelector::default(),
            randomizer: SmartRandomizer::new(config.random_seed),
            sessions: SessionTracker::new(
                config.session_ttl_hours,
                config.recent_memory_size,
                config.max_sessions,
            ),
            enrichment: EnrichmentPipeline::new(source, EnrichmentConfig::from_config(config)),
            strategy,
            randomization_strength: config.randomization_strength,
            pool_multiplier: config.candidate_pool_multiplier.max(1),
            max_pool: config.max_candidate_pool.max(MAX_RESULTS),
            catalog,
        }
    }

    pub fn moods(&self) -> Vec<MoodSummary> {
        self.moods.summaries()
    }

    /// Ranked, enriched recommendations for a mood
    ///
    /// With a session id (and the enhanced strategy) the full pipeline runs:
    /// exclusion, weighted re-score, randomization, diversity selection and
    /// history recording. Without one, the fused ranking goes straight to
    /// diversity selection.
    pub async fn recommendations(
        &self,
        mood: &str,
        n: usize,
        session_id: Option<&str>,
        user_id: Option<UserId>,
    ) -> AppResult<Vec<RecommendedMovie>> {
        let n = validate_count(n)?;
        let profile = self.profile(mood)?;

        let session = match self.strategy {
            RankingStrategy::Enhanced => session_id,
            RankingStrategy::Baseline => None,
        };

        let selected = match session {
            Some(session_id) => self.session_ranking(profile, n, session_id, user_id),
            None => {
                let pool = self.fused_pool(profile, self.pool_size(n), user_id);
                self.diverse_selection(&pool, n)
            }
        };

        tracing::info!(
            mood,
            count = selected.len(),
            session = session.is_some(),
            personalized = user_id.is_some(),
            "Recommendations ranked"
        );

        let movies = self.to_recommended(&selected);
        Ok(self.enrichment.enrich(movies).await)
    }

    /// Raw mood-scored list: no session, diversity or randomization
    pub async fn original_recommendations(
        &self,
        mood: &str,
        n: usize,
    ) -> AppResult<Vec<RecommendedMovie>> {
        let n = validate_count(n)?;
        let profile = self.profile(mood)?;

        let mut pool = self.scorer.score_pool(&self.catalog, profile);
        pool.truncate(n);

        let movies = self.to_recommended(&pool);
        Ok(self.enrichment.enrich(movies).await)
    }

    /// Collaborative neighbors for a movie, with a genre-overlap fallback
    ///
    /// An id absent from the catalog yields an empty list, not an error.
    pub fn similar_movies(&self, movie_id: MovieId, n: usize) -> AppResult<Vec<SimilarMovie>> {
        if movie_id <= 0 {
            return Err(AppError::InvalidInput(format!(
                "Invalid movie id: {movie_id}"
            )));
        }
        let n = n.clamp(MIN_RESULTS, MAX_RESULTS);

        if !self.catalog.contains(movie_id) {
            return Ok(Vec::new());
        }

        let neighbors = self.collaborative.similar_movies(movie_id, n);
        if !neighbors.is_empty() {
            let similar = neighbors
                .into_iter()
                .filter_map(|(id, similarity)| {
                    self.catalog
                        .get(id)
                        .map(|movie| SimilarMovie::from_movie(movie, similarity))
                })
                .collect();
            return Ok(similar);
        }

        tracing::debug!(movie_id, "No collaborative row, using genre fallback");
        Ok(self.similar_by_genre(movie_id, n))
    }

    /// Genre-overlap similarity used when the collaborative model has no row
    fn similar_by_genre(&self, movie_id: MovieId, n: usize) -> Vec<SimilarMovie> {
        let Some(target) = self.catalog.get(movie_id) else {
            return Vec::new();
        };
        let target_genres: HashSet<&str> =
            target.genres.iter().map(String::as_str).collect();
        if target_genres.is_empty() {
            return Vec::new();
        }

        let mut similar: Vec<SimilarMovie> = self
            .catalog
            .movies()
            .iter()
            .filter(|movie| movie.movie_id != movie_id)
            .filter_map(|movie| {
                let overlap = movie
                    .genres
                    .iter()
                    .filter(|g| target_genres.contains(g.as_str()))
                    .count();
                if overlap == 0 {
                    return None;
                }
                let genre_score =
                    overlap as f64 / target.genres.len().max(movie.genres.len()) as f64;
                let rating_score = movie.avg_rating / 5.0;
                let pop_factor = ((1.0 + movie.num_ratings as f64).ln() / 6.0).min(1.0);
                let score = genre_score * 0.6 + rating_score * 0.25 + pop_factor * 0.15;
                Some(SimilarMovie::from_movie(movie, score))
            })
            .collect();

        similar.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        similar.truncate(n);
        similar
    }

    /// Catalog row joined with whatever metadata the pipeline can supply
    pub async fn movie_details(&self, movie_id: MovieId) -> AppResult<MovieDetails> {
        if movie_id <= 0 {
            return Err(AppError::InvalidInput(format!(
                "Invalid movie id: {movie_id}"
            )));
        }
        let movie = self
            .catalog
            .get(movie_id)
            .ok_or_else(|| AppError::NotFound(format!("Movie {movie_id} not found")))?;

        let metadata = match movie.tmdb_id {
            Some(tmdb_id) => self.enrichment.lookup(tmdb_id).await,
            None => None,
        };
        Ok(MovieDetails::new(movie, metadata.as_ref()))
    }

    pub fn session_stats(&self, session_id: &str) -> SessionStats {
        self.sessions.stats(session_id)
    }

    pub fn clear_session(&self, session_id: &str) -> bool {
        self.sessions.clear(session_id)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.enrichment.cache_stats()
    }

    fn profile(&self, mood: &str) -> AppResult<&MoodProfile> {
        self.moods
            .get(mood)
            .ok_or_else(|| AppError::UnknownMood(mood.to_string()))
    }

    fn pool_size(&self, n: usize) -> usize {
        (n * self.pool_multiplier).clamp(n, self.max_pool)
    }

    /// The full session-aware ranking path
    fn session_ranking(
        &self,
        profile: &MoodProfile,
        n: usize,
        session_id: &str,
        user_id: Option<UserId>,
    ) -> Vec<Candidate> {
        let pool_size = self.pool_size(n);
        let excluded = self.sessions.exclusions(session_id, profile.name);
        tracing::debug!(
            mood = profile.name,
            excluded = excluded.len(),
            "Applying anti-repetition exclusions"
        );

        let pool = self.fused_pool(profile, pool_size + excluded.len(), user_id);
        let mut available: Vec<Candidate> = pool
            .iter()
            .filter(|c| !excluded.contains(&c.movie_id))
            .take(pool_size)
            .cloned()
            .collect();

        // Allow repeats rather than come up short
        if available.len() < n {
            available = pool.into_iter().take((n * 2).min(pool_size)).collect();
        }

        // The fused path already blends rating/popularity signals; re-score
        // only the pure mood ranking under the per-mood weight table
        if user_id.is_none() {
            let current_year = chrono::Utc::now().year();
            for candidate in &mut available {
                if let Some(movie) = self.catalog.get(candidate.movie_id) {
                    candidate.score =
                        EnhancedScorer::enhance(movie, profile, candidate.score, current_year);
                }
            }
            sort_by_score_desc(&mut available);
        }

        available.truncate(n * 2);
        self.randomizer.randomize(
            &self.catalog,
            &mut available,
            session_id,
            self.randomization_strength,
        );
        sort_by_score_desc(&mut available);

        let selected = self.diverse_selection(&available, n);

        let shown: Vec<MovieId> = selected.iter().map(|c| c.movie_id).collect();
        self.sessions.record(session_id, profile.name, &shown);
        selected
    }

    /// Mood scores fused with collaborative and popularity signals
    fn fused_pool(
        &self,
        profile: &MoodProfile,
        pool_size: usize,
        user_id: Option<UserId>,
    ) -> Vec<Candidate> {
        let mood_pool = self.scorer.score_pool(&self.catalog, profile);
        let mood_scores: HashMap<MovieId, f64> = mood_pool
            .iter()
            .take(pool_size * 2)
            .map(|c| (c.movie_id, c.score))
            .collect();

        let popularity_scores: HashMap<MovieId, f64> = self
            .collaborative
            .popular_movies(pool_size)
            .into_iter()
            // Only movies that already qualify for the mood may enter
            .filter(|(id, _)| mood_scores.contains_key(id))
            .collect();

        let (weights, collab_scores) = match user_id {
            Some(user_id) => {
                let recs = self.collaborative.recommend_for_user(user_id, pool_size * 2, true);
                let scores: HashMap<MovieId, f64> = recs
                    .into_iter()
                    .filter(|(id, _)| mood_scores.contains_key(id))
                    .collect();
                if scores.is_empty() {
                    // Degraded ranking: fall back to the anonymous blend
                    (FusionWeights::personalized(), None)
                } else {
                    (FusionWeights::personalized(), Some(scores))
                }
            }
            None => (FusionWeights::anonymous(), None),
        };

        HybridFuser::fuse(
            &mood_scores,
            collab_scores.as_ref(),
            &popularity_scores,
            weights,
            pool_size,
        )
    }

    /// Diversity selection with whatever country data the cache already has
    fn diverse_selection(&self, pool: &[Candidate], n: usize) -> Vec<Candidate> {
        let countries = self.known_countries(pool);
        self.diversity
            .select_with_countries(&self.catalog, pool, n, &countries)
    }

    /// Production countries for pool movies already present in the metadata
    /// cache; candidates without cached metadata simply have no country data
    fn known_countries(&self, pool: &[Candidate]) -> HashMap<MovieId, Vec<String>> {
        pool.iter()
            .filter_map(|candidate| {
                let movie = self.catalog.get(candidate.movie_id)?;
                let tmdb_id = movie.tmdb_id?;
                let metadata = self.enrichment.cached_metadata(tmdb_id)?;
                if metadata.production_countries.is_empty() {
                    None
                } else {
                    Some((candidate.movie_id, metadata.production_countries))
                }
            })
            .collect()
    }

    fn to_recommended(&self, candidates: &[Candidate]) -> Vec<RecommendedMovie> {
        candidates
            .iter()
            .filter_map(|candidate| {
                self.catalog
                    .get(candidate.movie_id)
                    .map(|movie| RecommendedMovie::from_movie(movie, candidate.score))
            })
            .collect()
    }
}

fn validate_count(n: usize) -> AppResult<usize> {
    if !(MIN_RESULTS..=MAX_RESULTS).contains(&n) {
        return Err(AppError::InvalidInput(format!(
            "Requested count {n} outside {MIN_RESULTS}-{MAX_RESULTS}"
        )));
    }
    Ok(n)
}
