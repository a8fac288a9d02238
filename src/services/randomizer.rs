use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::catalog::CatalogStore;
use crate::models::Candidate;

/// Chance of the small decade-variety bonus per candidate
const DECADE_BONUS_CHANCE: f64 = 0.3;

/// Upper bound of the decade-variety bonus
const DECADE_BONUS_MAX: f64 = 0.08;

/// Session-seeded score perturbation
///
/// Repeated calls for the same session replay the same stream, so output is
/// reproducible per session while differing across sessions.
#[derive(Debug, Clone, Copy)]
pub struct SmartRandomizer {
    base_seed: u64,
}

impl SmartRandomizer {
    pub fn new(base_seed: u64) -> Self {
        Self { base_seed }
    }

    /// Deterministic stream for a session
    fn session_rng(&self, session_id: &str) -> StdRng {
        let mut hasher = DefaultHasher::new();
        self.base_seed.hash(&mut hasher);
        session_id.hash(&mut hasher);
        StdRng::seed_from_u64(hasher.finish())
    }

    /// Perturb candidate scores in place
    ///
    /// new = orig * preservation + orig * u * strength (+ decade bonus).
    /// `strength` in [0, 1]; at 0 the ranking order is left untouched.
    pub fn randomize(
        &self,
        catalog: &CatalogStore,
        candidates: &mut [Candidate],
        session_id: &str,
        strength: f64,
    ) {
        if candidates.is_empty() || strength <= 0.0 {
            return;
        }
        let strength = strength.min(1.0);
        let mut rng = self.session_rng(session_id);
        let preservation = 0.75 + strength * 0.15;

        for candidate in candidates.iter_mut() {
            let boost = rng.gen::<f64>() * strength;

            let mut decade_bonus = 0.0;
            let has_year = catalog
                .get(candidate.movie_id)
                .and_then(|m| m.year)
                .is_some();
            if has_year && rng.gen::<f64>() < DECADE_BONUS_CHANCE {
                decade_bonus = rng.gen::<f64>() * DECADE_BONUS_MAX;
            }

            candidate.score =
                candidate.score * preservation + candidate.score * boost + decade_bonus;
        }
    }
}
