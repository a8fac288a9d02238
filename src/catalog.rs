use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::models::{Movie, MovieId, UserId};

/// A single rating from the snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rating {
    pub user_id: UserId,
    pub movie_id: MovieId,
    pub rating: f64,
}

#[derive(Debug, Deserialize)]
struct MovieRow {
    #[serde(rename = "movieId")]
    movie_id: MovieId,
    title: String,
    genres: String,
}

#[derive(Debug, Deserialize)]
struct RatingRow {
    #[serde(rename = "userId")]
    user_id: UserId,
    #[serde(rename = "movieId")]
    movie_id: MovieId,
    rating: f64,
}

#[derive(Debug, Deserialize)]
struct LinkRow {
    #[serde(rename = "movieId")]
    movie_id: MovieId,
    #[serde(rename = "tmdbId")]
    tmdb_id: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TagRow {
    #[serde(rename = "movieId")]
    movie_id: MovieId,
    tag: String,
}

/// Immutable, indexed view of the movie/rating/tag dataset
///
/// Loaded once at startup; every other component borrows from it.
#[derive(Debug)]
pub struct CatalogStore {
    movies: Vec<Movie>,
    by_id: HashMap<MovieId, usize>,
    ratings: Vec<Rating>,
}

impl CatalogStore {
    /// Load the catalog from a MovieLens-style directory
    /// (`movies.csv`, `ratings.csv`, `links.csv`, optional `tags.csv`)
    pub fn load(dir: impl AsRef<Path>) -> AppResult<Self> {
        let dir = dir.as_ref();
        let open = |name: &str| -> AppResult<File> {
            File::open(dir.join(name))
                .map_err(|e| AppError::DataLoad(format!("{}: {}", dir.join(name).display(), e)))
        };

        let movies = open("movies.csv")?;
        let ratings = open("ratings.csv")?;
        let links = open("links.csv")?;
        // Tags are optional in the dataset
        let tags = File::open(dir.join("tags.csv")).ok();
        if tags.is_none() {
            tracing::warn!("tags.csv not found, continuing without tags");
        }

        let store = Self::from_readers(movies, ratings, links, tags)?;
        tracing::info!(
            movies = store.movies.len(),
            ratings = store.ratings.len(),
            "Catalog loaded"
        );
        Ok(store)
    }

    /// Build the catalog from raw CSV readers; used directly by tests
    pub fn from_readers<M, R, L, T>(
        movies: M,
        ratings: R,
        links: L,
        tags: Option<T>,
    ) -> AppResult<Self>
    where
        M: Read,
        R: Read,
        L: Read,
        T: Read,
    {
        let mut rating_rows = Vec::new();
        let mut rating_sum: HashMap<MovieId, (f64, u64)> = HashMap::new();
        for row in csv::Reader::from_reader(ratings).deserialize() {
            let row: RatingRow = row?;
            let entry = rating_sum.entry(row.movie_id).or_insert((0.0, 0));
            entry.0 += row.rating;
            entry.1 += 1;
            rating_rows.push(Rating {
                user_id: row.user_id,
                movie_id: row.movie_id,
                rating: row.rating,
            });
        }

        let mut tmdb_ids: HashMap<MovieId, u64> = HashMap::new();
        for row in csv::Reader::from_reader(links).deserialize() {
            let row: LinkRow = row?;
            if let Some(tmdb_id) = row.tmdb_id {
                tmdb_ids.insert(row.movie_id, tmdb_id);
            }
        }

        let mut movie_tags: HashMap<MovieId, Vec<String>> = HashMap::new();
        if let Some(tags) = tags {
            for row in csv::Reader::from_reader(tags).deserialize() {
                let row: TagRow = row?;
                let cleaned = clean_tag(&row.tag);
                if !cleaned.is_empty() {
                    movie_tags.entry(row.movie_id).or_default().push(cleaned);
                }
            }
        }

        let mut rows = Vec::new();
        for row in csv::Reader::from_reader(movies).deserialize() {
            let row: MovieRow = row?;
            let (avg_rating, num_ratings) = rating_sum
                .get(&row.movie_id)
                .map(|(sum, count)| (sum / *count as f64, *count))
                .unwrap_or((0.0, 0));
            rows.push(Movie {
                movie_id: row.movie_id,
                year: extract_year(&row.title),
                genres: split_genres(&row.genres),
                tags: movie_tags.remove(&row.movie_id).unwrap_or_default(),
                avg_rating,
                num_ratings,
                tmdb_id: tmdb_ids.get(&row.movie_id).copied(),
                title: row.title,
            });
        }

        if rows.is_empty() {
            return Err(AppError::DataLoad("catalog contains no movies".to_string()));
        }

        let by_id = rows
            .iter()
            .enumerate()
            .map(|(i, m)| (m.movie_id, i))
            .collect();

        Ok(Self {
            movies: rows,
            by_id,
            ratings: rating_rows,
        })
    }

    pub fn movies(&self) -> &[Movie] {
        &self.movies
    }

    pub fn get(&self, movie_id: MovieId) -> Option<&Movie> {
        self.by_id.get(&movie_id).map(|&i| &self.movies[i])
    }

    pub fn contains(&self, movie_id: MovieId) -> bool {
        self.by_id.contains_key(&movie_id)
    }

    /// The raw ratings snapshot the collaborative model is built from
    pub fn ratings(&self) -> &[Rating] {
        &self.ratings
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }
}

/// Extract a trailing `(YYYY)` release year from a title
fn extract_year(title: &str) -> Option<i32> {
    let trimmed = title.trim_end();
    let open = trimmed.rfind('(')?;
    let inner = trimmed.get(open + 1..trimmed.len().checked_sub(1)?)?;
    if !trimmed.ends_with(')') || inner.len() != 4 {
        return None;
    }
    inner.parse().ok()
}

/// Lowercase a tag and strip everything but alphanumerics and spaces
fn clean_tag(tag: &str) -> String {
    tag.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .trim()
        .to_string()
}

fn split_genres(genres: &str) -> Vec<String> {
    if genres == "(no genres listed)" {
        return Vec::new();
    }
    genres
        .split('|')
        .filter(|g| !g.is_empty())
        .map(str::to_string)
        .collect()
}
