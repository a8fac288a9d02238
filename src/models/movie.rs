use serde::{Deserialize, Serialize};

/// MovieLens catalog identifier
pub type MovieId = i64;

/// Rater identifier from the ratings snapshot
pub type UserId = i64;

/// A movie row from the loaded catalog
///
/// Owned by the catalog store; every other component reads it immutably.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movie {
    /// Catalog identifier
    pub movie_id: MovieId,
    /// Title, usually suffixed with the release year in parentheses
    pub title: String,
    /// Genre labels parsed from the pipe-delimited catalog column
    pub genres: Vec<String>,
    /// Release year extracted from the title, if present
    pub year: Option<i32>,
    /// Normalized community tags; empty when the tags file is absent
    pub tags: Vec<String>,
    /// Mean rating on the 0-5 scale (0 when unrated)
    pub avg_rating: f64,
    /// Number of ratings backing `avg_rating`
    pub num_ratings: u64,
    /// External id for metadata lookups
    pub tmdb_id: Option<u64>,
}

impl Movie {
    /// Decade of the release year, e.g. 1994 -> 1990
    pub fn decade(&self) -> Option<i32> {
        self.year.map(|y| (y / 10) * 10)
    }

    /// First listed genre
    pub fn primary_genre(&self) -> Option<&str> {
        self.genres.first().map(String::as_str)
    }

    pub fn has_genre(&self, genre: &str) -> bool {
        self.genres.iter().any(|g| g == genre)
    }
}

/// A transient (movie, score) pair flowing through the ranking stages
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub movie_id: MovieId,
    pub score: f64,
}

impl Candidate {
    pub fn new(movie_id: MovieId, score: f64) -> Self {
        Self { movie_id, score }
    }
}

/// Sort candidates by descending score (stable for equal scores)
pub fn sort_by_score_desc(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
}

/// Supplementary fields fetched from the external metadata service
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MovieMetadata {
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub overview: Option<String>,
    pub release_date: Option<String>,
    pub runtime: Option<u32>,
    pub tagline: Option<String>,
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub production_companies: Vec<String>,
    #[serde(default)]
    pub production_countries: Vec<String>,
}

/// A ranked movie as returned to callers, enrichment fields included
///
/// Enrichment is strictly additive: a movie whose metadata could not be
/// fetched keeps the placeholder fields instead of being dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendedMovie {
    pub movie_id: MovieId,
    pub title: String,
    pub genres: Vec<String>,
    pub year: Option<i32>,
    pub rating: f64,
    pub popularity: u64,
    pub score: f64,
    pub tmdb_id: Option<u64>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub overview: String,
}

/// Placeholder shown when no overview could be fetched
pub const NO_OVERVIEW: &str = "No overview available.";

impl RecommendedMovie {
    /// Build the wire shape from a catalog row, with placeholder metadata
    pub fn from_movie(movie: &Movie, score: f64) -> Self {
        Self {
            movie_id: movie.movie_id,
            title: movie.title.clone(),
            genres: movie.genres.clone(),
            year: movie.year,
            rating: movie.avg_rating,
            popularity: movie.num_ratings,
            score,
            tmdb_id: movie.tmdb_id,
            poster_path: None,
            backdrop_path: None,
            overview: NO_OVERVIEW.to_string(),
        }
    }

    /// Overlay fetched metadata, keeping placeholders for absent fields
    pub fn apply_metadata(&mut self, metadata: &MovieMetadata) {
        if metadata.poster_path.is_some() {
            self.poster_path = metadata.poster_path.clone();
        }
        if metadata.backdrop_path.is_some() {
            self.backdrop_path = metadata.backdrop_path.clone();
        }
        if let Some(overview) = metadata.overview.as_deref() {
            if !overview.is_empty() {
                self.overview = overview.to_string();
            }
        }
    }
}

/// A neighbor returned by the similar-movies lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarMovie {
    pub movie_id: MovieId,
    pub title: String,
    pub genres: Vec<String>,
    pub year: Option<i32>,
    pub rating: f64,
    pub score: f64,
}

impl SimilarMovie {
    pub fn from_movie(movie: &Movie, score: f64) -> Self {
        Self {
            movie_id: movie.movie_id,
            title: movie.title.clone(),
            genres: movie.genres.clone(),
            year: movie.year,
            rating: movie.avg_rating,
            score,
        }
    }
}

/// Full detail view for a single movie: catalog fields plus metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieDetails {
    pub movie_id: MovieId,
    pub title: String,
    pub genres: Vec<String>,
    pub year: Option<i32>,
    pub rating: f64,
    pub num_ratings: u64,
    pub tmdb_id: Option<u64>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub overview: Option<String>,
    pub release_date: Option<String>,
    pub runtime: Option<u32>,
    pub tagline: Option<String>,
    pub vote_average: Option<f64>,
    pub production_companies: Vec<String>,
    pub production_countries: Vec<String>,
}

impl MovieDetails {
    pub fn new(movie: &Movie, metadata: Option<&MovieMetadata>) -> Self {
        let meta = metadata.cloned().unwrap_or_default();
        Self {
            movie_id: movie.movie_id,
            title: movie.title.clone(),
            genres: movie.genres.clone(),
            year: movie.year,
            rating: movie.avg_rating,
            num_ratings: movie.num_ratings,
            tmdb_id: movie.tmdb_id,
            poster_path: meta.poster_path,
            backdrop_path: meta.backdrop_path,
            overview: meta.overview,
            release_date: meta.release_date,
            runtime: meta.runtime,
            tagline: meta.tagline,
            vote_average: meta.vote_average,
            production_companies: meta.production_companies,
            production_countries: meta.production_countries,
        }
    }
}
