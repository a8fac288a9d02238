use std::collections::HashMap;

use crate::catalog::CatalogStore;
use crate::models::{Candidate, MovieId};

/// Regions whose cinema the quota variant steers slots toward
const UNDERREPRESENTED_REGIONS: &[(&str, &[&str])] = &[
    ("South America", &["Argentina", "Brazil", "Chile", "Colombia", "Peru", "Venezuela"]),
    ("Asia", &["China", "Japan", "South Korea", "India", "Thailand", "Vietnam", "Indonesia"]),
    ("Africa", &["South Africa", "Nigeria", "Kenya", "Morocco", "Egypt"]),
    ("Middle East", &["Iran", "Turkey", "Israel", "Lebanon", "Saudi Arabia"]),
    ("Eastern Europe", &["Russia", "Poland", "Czech Republic", "Hungary", "Romania"]),
];

const WESTERN_EUROPE: &[&str] = &["United Kingdom", "France", "Germany", "Italy", "Spain"];

/// Whether a production-country list marks a movie as underrepresented
pub fn is_underrepresented(countries: &[String]) -> bool {
    if countries.is_empty() {
        return false;
    }
    for (_, region_countries) in UNDERREPRESENTED_REGIONS {
        if countries.iter().any(|c| region_countries.contains(&c.as_str())) {
            return true;
        }
    }
    // Anything outside the US and Western Europe also counts
    !countries.iter().any(|c| {
        c == "United States of America" || WESTERN_EUROPE.contains(&c.as_str())
    })
}

/// Picks a final top-n list from a score-sorted pool while bounding
/// repetition across decades and genres (and, in the quota variant,
/// production countries)
pub struct DiversitySelector {
    /// Fraction of n taken purely by score before diversity kicks in
    top_fraction: f64,
    /// Fraction of n reserved for underrepresented-region movies
    quota_fraction: f64,
    /// Selections allowed per decade before it saturates
    decade_cap: usize,
    /// Selections allowed per genre before it stops counting as new
    genre_cap: usize,
    /// How far down the remaining pool each greedy pass looks
    scan_window: usize,
}

impl Default for DiversitySelector {
    fn default() -> Self {
        Self {
            top_fraction: 0.2,
            quota_fraction: 0.2,
            decade_cap: 2,
            genre_cap: 2,
            scan_window: 30,
        }
    }
}

#[derive(Default)]
struct SelectionCounts {
    decades: HashMap<i32, usize>,
    genres: HashMap<String, usize>,
    countries: HashMap<String, usize>,
}

impl SelectionCounts {
    fn track(&mut self, catalog: &CatalogStore, movie_id: MovieId, countries: Option<&[String]>) {
        if let Some(movie) = catalog.get(movie_id) {
            if let Some(decade) = movie.decade() {
                *self.decades.entry(decade).or_insert(0) += 1;
            }
            for genre in &movie.genres {
                *self.genres.entry(genre.clone()).or_insert(0) += 1;
            }
        }
        if let Some(countries) = countries {
            for country in countries {
                *self.countries.entry(country.clone()).or_insert(0) += 1;
            }
        }
    }
}

impl DiversitySelector {
    /// Select n candidates from a descending-score pool
    pub fn select(&self, catalog: &CatalogStore, pool: &[Candidate], n: usize) -> Vec<Candidate> {
        self.select_with_countries(catalog, pool, n, &HashMap::new())
    }

    /// Quota variant: reserves ~20% of n for underrepresented-region movies
    /// before the general diversity fill
    pub fn select_with_countries(
        &self,
        catalog: &CatalogStore,
        pool: &[Candidate],
        n: usize,
        countries: &HashMap<MovieId, Vec<String>>,
    ) -> Vec<Candidate> {
        if n == 0 || pool.is_empty() {
            return Vec::new();
        }

        let mut remaining: Vec<Candidate> = pool.to_vec();
        let mut selected: Vec<Candidate> = Vec::with_capacity(n);
        let mut counts = SelectionCounts::default();

        // Top slice purely by score
        let top_count = ((n as f64 * self.top_fraction) as usize).max(1).min(remaining.len());
        for candidate in remaining.drain(..top_count) {
            counts.track(catalog, candidate.movie_id, countries.get(&candidate.movie_id).map(Vec::as_slice));
            selected.push(candidate);
        }

        // Region quota, subject to decade/country saturation
        if !countries.is_empty() {
            let quota = ((n as f64 * self.quota_fraction) as usize).max(1);
            let mut taken = 0;
            let mut i = 0;
            while i < remaining.len() && taken < quota && selected.len() < n {
                let candidate = &remaining[i];
                let movie_countries = countries.get(&candidate.movie_id);
                let qualifies = movie_countries
                    .map(|c| is_underrepresented(c))
                    .unwrap_or(false);
                if !qualifies || self.saturated(catalog, candidate.movie_id, movie_countries, &counts) {
                    i += 1;
                    continue;
                }
                let candidate = remaining.remove(i);
                counts.track(catalog, candidate.movie_id, movie_countries.map(Vec::as_slice));
                selected.push(candidate);
                taken += 1;
            }
        }

        // General diversity fill
        while selected.len() < n && !remaining.is_empty() {
            let pick = self.pick_diverse(catalog, &remaining, &counts);
            let candidate = remaining.remove(pick);
            counts.track(catalog, candidate.movie_id, countries.get(&candidate.movie_id).map(Vec::as_slice));
            selected.push(candidate);
        }

        selected
    }

    /// Index of the next candidate: prefer an unsaturated decade, then a
    /// genre not yet seen twice; otherwise the highest-scored remaining
    fn pick_diverse(
        &self,
        catalog: &CatalogStore,
        remaining: &[Candidate],
        counts: &SelectionCounts,
    ) -> usize {
        let window = remaining.len().min(self.scan_window);
        let mut decade_diverse: Vec<usize> = Vec::new();

        for (i, candidate) in remaining[..window].iter().enumerate() {
            let Some(decade) = catalog.get(candidate.movie_id).and_then(|m| m.decade()) else {
                continue;
            };
            if counts.decades.get(&decade).copied().unwrap_or(0) < self.decade_cap {
                decade_diverse.push(i);
            }
        }

        for &i in &decade_diverse {
            let Some(movie) = catalog.get(remaining[i].movie_id) else {
                continue;
            };
            let introduces_genre = movie
                .genres
                .iter()
                .any(|g| counts.genres.get(g).copied().unwrap_or(0) < self.genre_cap);
            if introduces_genre {
                return i;
            }
        }

        decade_diverse.first().copied().unwrap_or(0)
    }

    fn saturated(
        &self,
        catalog: &CatalogStore,
        movie_id: MovieId,
        movie_countries: Option<&Vec<String>>,
        counts: &SelectionCounts,
    ) -> bool {
        if let Some(decade) = catalog.get(movie_id).and_then(|m| m.decade()) {
            if counts.decades.get(&decade).copied().unwrap_or(0) >= self.decade_cap {
                return true;
            }
        }
        if let Some(countries) = movie_countries {
            if countries
                .iter()
                .any(|c| counts.countries.get(c).copied().unwrap_or(0) >= self.decade_cap)
            {
                return true;
            }
        }
        false
    }
}
