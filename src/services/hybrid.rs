use std::collections::{HashMap, HashSet};

use crate::models::movie::sort_by_score_desc;
use crate::models::{Candidate, MovieId};

/// Weight split across the three score sources
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionWeights {
    pub mood: f64,
    pub collaborative: f64,
    pub popularity: f64,
}

impl FusionWeights {
    /// Mood-heavy split for requests without a user id
    pub fn anonymous() -> Self {
        Self { mood: 0.7, collaborative: 0.0, popularity: 0.3 }
    }

    /// Collaborative-heavier split when a user id is present
    pub fn personalized() -> Self {
        Self { mood: 0.5, collaborative: 0.4, popularity: 0.1 }
    }

    /// Scale the weights so they sum to 1
    pub fn normalized(self) -> Self {
        let total = self.mood + self.collaborative + self.popularity;
        if total <= 0.0 {
            return Self::anonymous();
        }
        Self {
            mood: self.mood / total,
            collaborative: self.collaborative / total,
            popularity: self.popularity / total,
        }
    }

    /// Shift the collaborative share onto the mood component
    pub fn degrade_collaborative(self) -> Self {
        Self {
            mood: self.mood + self.collaborative,
            collaborative: 0.0,
            popularity: self.popularity,
        }
    }
}

/// Combines mood, collaborative and popularity score maps into one ranking
pub struct HybridFuser;

impl HybridFuser {
    /// Normalize a raw (roughly 0-5) score into [0, 1]
    fn normalize(score: f64) -> f64 {
        (score / 5.0).clamp(0.0, 1.0)
    }

    /// Weighted fusion of the three sources
    ///
    /// `collaborative` is `None` when the model is unavailable or failed for
    /// this request; its weight then moves to the mood component instead of
    /// failing the request (degraded ranking, logged).
    pub fn fuse(
        mood_scores: &HashMap<MovieId, f64>,
        collaborative: Option<&HashMap<MovieId, f64>>,
        popularity_scores: &HashMap<MovieId, f64>,
        weights: FusionWeights,
        n: usize,
    ) -> Vec<Candidate> {
        let mut weights = weights.normalized();
        let empty = HashMap::new();
        let collab_scores = match collaborative {
            Some(scores) => scores,
            None => {
                if weights.collaborative > 0.0 {
                    tracing::warn!(
                        "Collaborative scores unavailable, reallocating weight to mood"
                    );
                    weights = weights.degrade_collaborative();
                }
                &empty
            }
        };

        let all_ids: HashSet<MovieId> = mood_scores
            .keys()
            .chain(collab_scores.keys())
            .chain(popularity_scores.keys())
            .copied()
            .collect();

        let mut fused: Vec<Candidate> = all_ids
            .into_iter()
            .map(|id| {
                let mood = Self::normalize(mood_scores.get(&id).copied().unwrap_or(0.0));
                let collab = Self::normalize(collab_scores.get(&id).copied().unwrap_or(0.0));
                let pop = Self::normalize(popularity_scores.get(&id).copied().unwrap_or(0.0));
                let score = weights.mood * mood
                    + weights.collaborative * collab
                    + weights.popularity * pop;
                Candidate::new(id, score)
            })
            .collect();

        sort_by_score_desc(&mut fused);
        fused.truncate(n);
        fused
    }
}
