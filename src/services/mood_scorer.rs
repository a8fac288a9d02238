use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::catalog::CatalogStore;
use crate::models::movie::sort_by_score_desc;
use crate::models::{Candidate, Movie, MoodProfile};

/// Genre-stage score at or below this value rejects the movie outright
const GENRE_CUTOFF: f64 = 0.2;

/// Movies with fewer ratings than this never enter the candidate pool
const MIN_RATINGS: u64 = 3;

/// Probability of the per-candidate exploration boost
const EXPLORATION_CHANCE: f64 = 0.2;

/// Everything a stage may look at when scoring one movie for one mood
pub struct ScoreContext<'a> {
    pub movie: &'a Movie,
    pub profile: &'a MoodProfile,
}

/// One multiplicative step of the scoring pipeline
///
/// Stages are composed at construction instead of layered through
/// inheritance, so each is unit-testable in isolation.
pub trait ScoreStage: Send + Sync {
    fn name(&self) -> &'static str;

    /// Transform the running score; returning 0 rejects the movie
    fn apply(&self, ctx: &ScoreContext<'_>, score: f64) -> f64;
}

/// Primary/secondary genre affinity with excluded-genre penalties
pub struct GenreAffinity;

impl ScoreStage for GenreAffinity {
    fn name(&self) -> &'static str {
        "genre"
    }

    fn apply(&self, ctx: &ScoreContext<'_>, score: f64) -> f64 {
        let mut score = score;
        let genres = &ctx.movie.genres;

        let primary = ctx
            .profile
            .primary_genres
            .iter()
            .filter(|g| genres.iter().any(|mg| mg == *g))
            .count();
        if primary > 0 {
            score *= 1.0 + 0.5 * primary as f64;
        } else {
            score *= 0.5;
        }

        let secondary = ctx
            .profile
            .secondary_genres
            .iter()
            .filter(|g| genres.iter().any(|mg| mg == *g))
            .count();
        if secondary > 0 {
            score *= 1.0 + 0.2 * secondary as f64;
        }

        let excluded = ctx
            .profile
            .excluded_genres
            .iter()
            .filter(|g| genres.iter().any(|mg| mg == *g))
            .count();
        if excluded > 0 {
            score *= 0.3_f64.powi(excluded as i32);
        }

        if score <= GENRE_CUTOFF {
            return 0.0;
        }
        score
    }
}

/// Tag/keyword overlap with diminishing returns
pub struct TagAffinity;

impl TagAffinity {
    fn matches(ctx: &ScoreContext<'_>) -> usize {
        let keywords = ctx.profile.keyword_set();
        ctx.movie
            .tags
            .iter()
            .filter(|tag| keywords.contains(tag.as_str()))
            .count()
    }
}

impl ScoreStage for TagAffinity {
    fn name(&self) -> &'static str {
        "tags"
    }

    fn apply(&self, ctx: &ScoreContext<'_>, score: f64) -> f64 {
        match Self::matches(ctx) {
            0 => score,
            1 => score * 1.2,
            2 => score * 1.35,
            n => score * (1.35 + 0.05 * (n as f64 - 2.0)).min(1.5),
        }
    }
}

/// Inverse-log popularity: fewer ratings earn a larger boost
///
/// A straight popularity bonus drowns the catalog tail, so the curve is
/// deliberately reversed.
pub struct PopularityCurve;

impl ScoreStage for PopularityCurve {
    fn name(&self) -> &'static str {
        "popularity"
    }

    fn apply(&self, ctx: &ScoreContext<'_>, score: f64) -> f64 {
        let popularity = ctx.movie.num_ratings as f64;
        if popularity <= 0.0 {
            return score;
        }
        let pop_factor = ((1.0 + popularity).ln() / 101.0_f64.ln()).min(1.0);
        let inverse = 1.0 - pop_factor * 0.5;
        score * (1.0 + inverse * 0.3)
    }
}

/// Counterweight to the recency skew of the catalog
pub struct TemporalBias;

impl ScoreStage for TemporalBias {
    fn name(&self) -> &'static str {
        "temporal"
    }

    fn apply(&self, ctx: &ScoreContext<'_>, score: f64) -> f64 {
        let Some(decade) = ctx.movie.decade() else {
            return score;
        };
        let mut score = score;
        if decade < 1970 {
            score *= 1.4;
        } else if decade < 1990 {
            score *= 1.2;
        }
        if (2000..=2009).contains(&decade) {
            score *= 0.85;
        }
        score
    }
}

/// Bounded rating bonus
pub struct QualityBonus;

impl ScoreStage for QualityBonus {
    fn name(&self) -> &'static str {
        "quality"
    }

    fn apply(&self, ctx: &ScoreContext<'_>, score: f64) -> f64 {
        if ctx.movie.avg_rating <= 0.0 {
            return score;
        }
        score * (1.0 + (ctx.movie.avg_rating / 5.0) * 0.3)
    }
}

/// Damp Drama so a single genre cannot dominate every mood
pub struct GenreBalance;

impl ScoreStage for GenreBalance {
    fn name(&self) -> &'static str {
        "genre_balance"
    }

    fn apply(&self, ctx: &ScoreContext<'_>, score: f64) -> f64 {
        if !ctx.movie.has_genre("Drama") {
            return score;
        }
        let penalty = if ctx.profile.is_primary("Drama") { 0.15 } else { 0.25 };
        score * (1.0 - penalty)
    }
}

/// Exploration policy for the per-candidate random boost
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exploration {
    /// No random boost; scoring is a pure function of the inputs
    Disabled,
    /// Boost drawn from a stream seeded with this value (plus the mood name)
    Seeded(u64),
}

/// The staged mood-relevance scorer
pub struct MoodScorer {
    stages: Vec<Box<dyn ScoreStage>>,
    exploration: Exploration,
}

impl MoodScorer {
    /// Scorer with the full default stage set
    pub fn new(exploration: Exploration) -> Self {
        Self {
            stages: vec![
                Box::new(GenreAffinity),
                Box::new(TagAffinity),
                Box::new(PopularityCurve),
                Box::new(TemporalBias),
                Box::new(QualityBonus),
                Box::new(GenreBalance),
            ],
            exploration,
        }
    }

    /// Scorer over an explicit stage list
    pub fn with_stages(stages: Vec<Box<dyn ScoreStage>>, exploration: Exploration) -> Self {
        Self { stages, exploration }
    }

    /// Deterministic relevance score for one (movie, mood) pair; >= 0
    pub fn score(&self, movie: &Movie, profile: &MoodProfile) -> f64 {
        let ctx = ScoreContext { movie, profile };
        let mut score = 1.0;
        for stage in &self.stages {
            score = stage.apply(&ctx, score);
            if score <= 0.0 {
                return 0.0;
            }
        }
        score
    }

    /// Score the whole catalog for a mood, returning a descending pool
    ///
    /// The exploration boost (if enabled) is applied here so that `score`
    /// itself stays deterministic for direct lookups and tests.
    pub fn score_pool(&self, catalog: &CatalogStore, profile: &MoodProfile) -> Vec<Candidate> {
        let mut rng = self.exploration_rng(profile.name);
        let mut pool = Vec::new();

        for movie in catalog.movies() {
            if movie.num_ratings < MIN_RATINGS {
                continue;
            }
            let mut score = self.score(movie, profile);
            if score <= 0.0 {
                continue;
            }
            if let Some(rng) = rng.as_mut() {
                if rng.gen::<f64>() < EXPLORATION_CHANCE {
                    score *= 1.0 + rng.gen::<f64>() * 0.3;
                }
            }
            pool.push(Candidate::new(movie.movie_id, score));
        }

        sort_by_score_desc(&mut pool);
        pool
    }

    fn exploration_rng(&self, mood: &str) -> Option<StdRng> {
        match self.exploration {
            Exploration::Disabled => None,
            Exploration::Seeded(seed) => {
                let mood_seed = mood.bytes().fold(seed, |acc, b| {
                    acc.wrapping_mul(31).wrapping_add(b as u64)
                });
                Some(StdRng::seed_from_u64(mood_seed))
            }
        }
    }
}

/// Weighted re-score applied on the session-aware path
///
/// Converts the multiplicative base score into an additive blend under the
/// per-mood weight table, so each mood can emphasize different signals.
pub struct EnhancedScorer;

impl EnhancedScorer {
    /// Tag-match component on a 0-1 scale
    pub fn tag_score(movie: &Movie, profile: &MoodProfile) -> f64 {
        let keywords = profile.keyword_set();
        let matches = movie
            .tags
            .iter()
            .filter(|tag| keywords.contains(tag.as_str()))
            .count();
        match matches {
            0 => 0.0,
            1 => 0.4,
            2 => 0.7,
            3 => 0.9,
            n => (0.9 + 0.05 * (n as f64 - 3.0)).min(1.0),
        }
    }

    /// Blend the base score with rating/popularity/tag/year signals
    pub fn enhance(movie: &Movie, profile: &MoodProfile, base_score: f64, current_year: i32) -> f64 {
        let w = profile.weights;
        let mut enhanced = base_score * w.genre;

        if movie.avg_rating > 0.0 {
            enhanced += (movie.avg_rating / 5.0) * w.rating;
        }

        if movie.num_ratings > 0 {
            let pop = ((1.0 + movie.num_ratings as f64).ln() / 8.0).min(1.0);
            enhanced += pop * w.popularity;
        }

        enhanced += Self::tag_score(movie, profile) * w.tag;

        // Positive bias favors recent releases, negative favors older ones;
        // recency runs 1.0 (this year) down to 0.0 (40+ years old).
        if let Some(year) = movie.year {
            if w.year_bias != 0.0 {
                let age = (current_year - year).max(0) as f64;
                let recency = (1.0 - age / 40.0).clamp(0.0, 1.0);
                enhanced += w.year_bias * recency;
            }
        }

        enhanced.max(0.1)
    }
}
