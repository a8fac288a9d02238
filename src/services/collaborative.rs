use std::collections::HashMap;

use crate::catalog::CatalogStore;
use crate::models::{MovieId, UserId};

/// Item-item / user-user collaborative filter over the ratings snapshot
///
/// Built once at startup from a static snapshot; never updated online.
pub struct CollaborativeFilter {
    user_index: HashMap<UserId, usize>,
    movie_index: HashMap<MovieId, usize>,
    movie_ids: Vec<MovieId>,
    /// Dense user x movie rating matrix; 0 means unrated
    matrix: Vec<Vec<f32>>,
    item_similarity: Vec<Vec<f32>>,
    user_similarity: Vec<Vec<f32>>,
    /// Popularity-ranked fallback for unknown users
    popular: Vec<(MovieId, f64)>,
}

impl CollaborativeFilter {
    /// Build the model, keeping only users with at least `min_ratings` ratings
    pub fn build(catalog: &CatalogStore, min_ratings: usize) -> Self {
        let mut per_user: HashMap<UserId, usize> = HashMap::new();
        for rating in catalog.ratings() {
            *per_user.entry(rating.user_id).or_insert(0) += 1;
        }

        let mut user_ids: Vec<UserId> = per_user
            .iter()
            .filter(|(_, &count)| count >= min_ratings)
            .map(|(&id, _)| id)
            .collect();
        user_ids.sort_unstable();

        let mut movie_ids: Vec<MovieId> = catalog
            .ratings()
            .iter()
            .map(|r| r.movie_id)
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect();
        movie_ids.sort_unstable();

        let user_index: HashMap<UserId, usize> =
            user_ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();
        let movie_index: HashMap<MovieId, usize> =
            movie_ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();

        let mut matrix = vec![vec![0.0_f32; movie_ids.len()]; user_ids.len()];
        for rating in catalog.ratings() {
            if let (Some(&u), Some(&m)) = (
                user_index.get(&rating.user_id),
                movie_index.get(&rating.movie_id),
            ) {
                matrix[u][m] = rating.rating as f32;
            }
        }

        let item_similarity = column_cosine_matrix(&matrix, movie_ids.len());
        let user_similarity = row_cosine_matrix(&matrix);
        let popular = popularity_ranking(catalog);

        tracing::info!(
            users = user_ids.len(),
            movies = movie_ids.len(),
            "Collaborative model built"
        );

        Self {
            user_index,
            movie_index,
            movie_ids,
            matrix,
            item_similarity,
            user_similarity,
            popular,
        }
    }

    /// Top-n movies by item-item similarity, excluding the movie itself
    ///
    /// An id absent from the model yields an empty list.
    pub fn similar_movies(&self, movie_id: MovieId, n: usize) -> Vec<(MovieId, f64)> {
        let Some(&idx) = self.movie_index.get(&movie_id) else {
            return Vec::new();
        };

        let mut neighbors: Vec<(MovieId, f64)> = self.item_similarity[idx]
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != idx)
            .map(|(i, &sim)| (self.movie_ids[i], sim as f64))
            .collect();
        neighbors.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        neighbors.truncate(n);
        neighbors
    }

    /// Whether the model has an item row for this movie
    pub fn knows_movie(&self, movie_id: MovieId) -> bool {
        self.movie_index.contains_key(&movie_id)
    }

    /// Predicted-rating recommendations for a user
    ///
    /// Predictions are similarity-weighted averages of ratings from all other
    /// users with positive similarity. Unknown users fall back to the
    /// popularity ranking.
    pub fn recommend_for_user(
        &self,
        user_id: UserId,
        n: usize,
        exclude_rated: bool,
    ) -> Vec<(MovieId, f64)> {
        let Some(&user_idx) = self.user_index.get(&user_id) else {
            tracing::debug!(user_id, "Unknown user, using popularity fallback");
            return self.popular_movies(n);
        };

        let movie_count = self.movie_ids.len();
        let mut weighted = vec![0.0_f64; movie_count];
        let mut sim_sums = vec![0.0_f64; movie_count];

        for (other_idx, &similarity) in self.user_similarity[user_idx].iter().enumerate() {
            if other_idx == user_idx || similarity <= 0.0 {
                continue;
            }
            for (movie_idx, &rating) in self.matrix[other_idx].iter().enumerate() {
                if rating > 0.0 {
                    weighted[movie_idx] += similarity as f64 * rating as f64;
                    sim_sums[movie_idx] += similarity as f64;
                }
            }
        }

        let user_ratings = &self.matrix[user_idx];
        let mut predictions: Vec<(MovieId, f64)> = (0..movie_count)
            .filter(|&i| !(exclude_rated && user_ratings[i] > 0.0))
            // A zero similarity sum predicts 0, never divides
            .map(|i| {
                let predicted = if sim_sums[i] > 0.0 { weighted[i] / sim_sums[i] } else { 0.0 };
                (self.movie_ids[i], predicted)
            })
            .filter(|(_, predicted)| *predicted > 0.0)
            .collect();

        predictions.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        predictions.truncate(n);
        predictions
    }

    /// Popularity ranking: 0.7 * mean rating + 0.3 * ln(1 + rating count)
    pub fn popular_movies(&self, n: usize) -> Vec<(MovieId, f64)> {
        self.popular.iter().take(n).copied().collect()
    }
}

fn popularity_ranking(catalog: &CatalogStore) -> Vec<(MovieId, f64)> {
    let mut ranking: Vec<(MovieId, f64)> = catalog
        .movies()
        .iter()
        .filter(|m| m.num_ratings > 0)
        .map(|m| {
            let score = m.avg_rating * 0.7 + (1.0 + m.num_ratings as f64).ln() * 0.3;
            (m.movie_id, score)
        })
        .collect();
    ranking.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    ranking
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0_f32;
    let mut norm_a = 0.0_f32;
    let mut norm_b = 0.0_f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a.sqrt() * norm_b.sqrt())
    }
}

/// Cosine similarity between every pair of rows
fn row_cosine_matrix(matrix: &[Vec<f32>]) -> Vec<Vec<f32>> {
    let n = matrix.len();
    let mut sims = vec![vec![0.0_f32; n]; n];
    for i in 0..n {
        sims[i][i] = 1.0;
        for j in (i + 1)..n {
            let sim = cosine(&matrix[i], &matrix[j]);
            sims[i][j] = sim;
            sims[j][i] = sim;
        }
    }
    sims
}

/// Cosine similarity between every pair of columns
fn column_cosine_matrix(matrix: &[Vec<f32>], columns: usize) -> Vec<Vec<f32>> {
    // Transpose once so the hot loop runs over contiguous rows
    let mut transposed = vec![vec![0.0_f32; matrix.len()]; columns];
    for (row_idx, row) in matrix.iter().enumerate() {
        for (col_idx, &value) in row.iter().enumerate() {
            transposed[col_idx][row_idx] = value;
        }
    }
    row_cosine_matrix(&transposed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogStore;

    const MOVIES_CSV: &str = "\
movieId,title,genres
1,Alpha (1990),Action
2,Beta (1991),Action
3,Gamma (1992),Comedy
4,Delta (1993),Comedy
";

    // Users 1 and 2 agree on movies 1/2; user 3 likes 3/4
    const RATINGS_CSV: &str = "\
userId,movieId,rating,timestamp
1,1,5.0,0
1,2,5.0,0
1,3,1.0,0
2,1,5.0,0
2,2,4.5,0
2,4,1.0,0
3,3,5.0,0
3,4,5.0,0
3,1,1.0,0
";

    const LINKS_CSV: &str = "movieId,imdbId,tmdbId\n1,1,1\n2,2,2\n3,3,3\n4,4,4\n";

    fn catalog() -> CatalogStore {
        CatalogStore::from_readers(
            MOVIES_CSV.as_bytes(),
            RATINGS_CSV.as_bytes(),
            LINKS_CSV.as_bytes(),
            None::<&[u8]>,
        )
        .unwrap()
    }

    #[test]
    fn test_similar_movies_excludes_self_and_sorts() {
        let model = CollaborativeFilter::build(&catalog(), 3);
        let similar = model.similar_movies(1, 3);

        assert!(similar.len() <= 3);
        assert!(similar.iter().all(|(id, _)| *id != 1));
        for pair in similar.windows(2) {
            assert!(pair[0].1 >= pair[1].1);
        }
        // Movie 2 is rated almost identically to movie 1
        assert_eq!(similar[0].0, 2);
    }

    #[test]
    fn test_similar_movies_unknown_id_is_empty() {
        let model = CollaborativeFilter::build(&catalog(), 3);
        assert!(model.similar_movies(999, 5).is_empty());
    }

    #[test]
    fn test_recommend_for_user_excludes_rated() {
        let model = CollaborativeFilter::build(&catalog(), 3);
        let recs = model.recommend_for_user(1, 10, true);
        // User 1 rated movies 1, 2, 3; only 4 can be recommended
        assert!(recs.iter().all(|(id, _)| *id == 4));
    }

    #[test]
    fn test_recommend_for_unknown_user_falls_back_to_popular() {
        let model = CollaborativeFilter::build(&catalog(), 3);
        let recs = model.recommend_for_user(42, 2, true);
        assert_eq!(recs.len(), 2);
        let popular = model.popular_movies(2);
        assert_eq!(recs, popular);
    }

    #[test]
    fn test_min_ratings_filter_drops_sparse_users() {
        // min_ratings of 4 excludes everyone; predictions all empty but the
        // structure still behaves
        let model = CollaborativeFilter::build(&catalog(), 4);
        let recs = model.recommend_for_user(1, 5, true);
        // User 1 no longer in the model, so popularity fallback applies
        assert!(!recs.is_empty());
    }

    #[test]
    fn test_cosine_zero_vector_guard() {
        assert_eq!(cosine(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
        let identical = cosine(&[1.0, 2.0], &[1.0, 2.0]);
        assert!((identical - 1.0).abs() < 1e-6);
    }
}
