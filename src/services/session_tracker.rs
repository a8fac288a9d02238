use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::models::MovieId;

/// How many of each other mood's latest movies to exclude
const CROSS_MOOD_TAIL: usize = 3;

/// How many globally recent movies to exclude
const GLOBAL_TAIL: usize = 15;

/// Per-session view returned by the stats endpoint
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SessionStats {
    pub session_found: bool,
    pub moods_seen: Vec<String>,
    pub total_shown: usize,
    pub last_activity: Option<DateTime<Utc>>,
}

#[derive(Debug)]
struct SessionRecord {
    moods: HashMap<String, Vec<MovieId>>,
    last_activity: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct TrackerInner {
    sessions: HashMap<String, SessionRecord>,
    global_recent: Vec<MovieId>,
}

/// Process-wide, time-bounded memory of which movies were shown to whom
///
/// Shared mutable state: all access goes through one coarse mutex, never held
/// across an await point. Rebuilt from nothing on restart.
pub struct SessionTracker {
    inner: Mutex<TrackerInner>,
    session_ttl: Duration,
    max_recent: usize,
    max_sessions: usize,
}

impl SessionTracker {
    pub fn new(session_ttl_hours: i64, max_recent: usize, max_sessions: usize) -> Self {
        Self {
            inner: Mutex::new(TrackerInner::default()),
            session_ttl: Duration::hours(session_ttl_hours),
            max_recent: max_recent.max(2),
            max_sessions: max_sessions.max(1),
        }
    }

    /// Movies to exclude for this (session, mood): everything shown for the
    /// same mood, the tail of every other mood, and the global recent tail
    pub fn exclusions(&self, session_id: &str, mood: &str) -> HashSet<MovieId> {
        let inner = self.inner.lock().expect("session tracker lock poisoned");
        let mut excluded = HashSet::new();

        if let Some(record) = inner.sessions.get(session_id) {
            for (seen_mood, movies) in &record.moods {
                if seen_mood == mood {
                    excluded.extend(movies.iter().copied());
                } else {
                    excluded.extend(movies.iter().rev().take(CROSS_MOOD_TAIL).copied());
                }
            }
        }

        excluded.extend(inner.global_recent.iter().rev().take(GLOBAL_TAIL).copied());
        excluded
    }

    /// Record shown movies and run cleanup
    pub fn record(&self, session_id: &str, mood: &str, movie_ids: &[MovieId]) {
        self.record_at(session_id, mood, movie_ids, Utc::now());
    }

    fn record_at(
        &self,
        session_id: &str,
        mood: &str,
        movie_ids: &[MovieId],
        now: DateTime<Utc>,
    ) {
        let mut inner = self.inner.lock().expect("session tracker lock poisoned");

        let record = inner
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(|| SessionRecord {
                moods: HashMap::new(),
                last_activity: now,
            });
        record
            .moods
            .entry(mood.to_string())
            .or_default()
            .extend_from_slice(movie_ids);
        record.last_activity = now;

        inner.global_recent.extend_from_slice(movie_ids);

        self.cleanup(&mut inner, now);
    }

    fn cleanup(&self, inner: &mut TrackerInner, now: DateTime<Utc>) {
        let ttl = self.session_ttl;
        let before = inner.sessions.len();
        inner
            .sessions
            .retain(|_, record| now - record.last_activity <= ttl);
        let expired = before - inner.sessions.len();
        if expired > 0 {
            tracing::debug!(expired, "Dropped idle sessions");
        }

        // Evict oldest sessions above the cap
        while inner.sessions.len() > self.max_sessions {
            let oldest = inner
                .sessions
                .iter()
                .min_by_key(|(_, record)| record.last_activity)
                .map(|(id, _)| id.clone());
            match oldest {
                Some(id) => {
                    inner.sessions.remove(&id);
                }
                None => break,
            }
        }

        // Truncate the global list to half its cap once it overflows
        if inner.global_recent.len() > self.max_recent {
            let keep_from = inner.global_recent.len() - self.max_recent / 2;
            inner.global_recent.drain(..keep_from);
        }
    }

    pub fn stats(&self, session_id: &str) -> SessionStats {
        let inner = self.inner.lock().expect("session tracker lock poisoned");
        match inner.sessions.get(session_id) {
            Some(record) => {
                let mut moods_seen: Vec<String> = record.moods.keys().cloned().collect();
                moods_seen.sort();
                SessionStats {
                    session_found: true,
                    moods_seen,
                    total_shown: record.moods.values().map(Vec::len).sum(),
                    last_activity: Some(record.last_activity),
                }
            }
            None => SessionStats {
                session_found: false,
                moods_seen: Vec::new(),
                total_shown: 0,
                last_activity: None,
            },
        }
    }

    /// Forget a session's history entirely
    pub fn clear(&self, session_id: &str) -> bool {
        let mut inner = self.inner.lock().expect("session tracker lock poisoned");
        inner.sessions.remove(session_id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> SessionTracker {
        SessionTracker::new(24, 1000, 500)
    }

    #[test]
    fn test_exclusions_cover_same_mood_history() {
        let tracker = tracker();
        tracker.record("s1", "phantom_fear", &[1, 2, 3]);
        tracker.record("s1", "phantom_fear", &[4, 5]);

        let excluded = tracker.exclusions("s1", "phantom_fear");
        for id in [1, 2, 3, 4, 5] {
            assert!(excluded.contains(&id));
        }
    }

    #[test]
    fn test_cross_mood_exclusion_is_limited_to_tail() {
        let tracker = tracker();
        tracker.record("s1", "euphoria_wave", &[1, 2, 3, 4, 5]);

        let excluded = tracker.exclusions("s1", "phantom_fear");
        // Only the last three from the other mood
        assert!(!excluded.contains(&1));
        assert!(!excluded.contains(&2));
        assert!(excluded.contains(&3));
        assert!(excluded.contains(&4));
        assert!(excluded.contains(&5));
    }

    #[test]
    fn test_global_recent_affects_other_sessions() {
        let tracker = tracker();
        tracker.record("s1", "phantom_fear", &[10, 11]);

        let excluded = tracker.exclusions("s2", "euphoria_wave");
        assert!(excluded.contains(&10));
        assert!(excluded.contains(&11));
    }

    #[test]
    fn test_recording_twice_is_idempotent_for_exclusion() {
        let tracker = tracker();
        tracker.record("s1", "phantom_fear", &[1, 2]);
        let first = tracker.exclusions("s1", "phantom_fear");
        tracker.record("s1", "phantom_fear", &[1, 2]);
        let second = tracker.exclusions("s1", "phantom_fear");
        // Exclusion is a set; re-recording adds nothing
        assert_eq!(first, second);
    }

    #[test]
    fn test_idle_sessions_expire() {
        let tracker = tracker();
        let old = Utc::now() - Duration::hours(30);
        tracker.record_at("stale", "phantom_fear", &[1], old);
        assert!(tracker.stats("stale").session_found);

        // Any new record triggers cleanup
        tracker.record("fresh", "phantom_fear", &[2]);
        assert!(!tracker.stats("stale").session_found);
        assert!(tracker.stats("fresh").session_found);
    }

    #[test]
    fn test_session_cap_evicts_oldest() {
        let tracker = SessionTracker::new(24, 1000, 2);
        let base = Utc::now();
        tracker.record_at("oldest", "m", &[1], base - Duration::minutes(30));
        tracker.record_at("middle", "m", &[2], base - Duration::minutes(20));
        tracker.record_at("newest", "m", &[3], base - Duration::minutes(10));

        assert!(!tracker.stats("oldest").session_found);
        assert!(tracker.stats("middle").session_found);
        assert!(tracker.stats("newest").session_found);
    }

    #[test]
    fn test_global_recent_truncates_to_half() {
        let tracker = SessionTracker::new(24, 10, 500);
        let ids: Vec<MovieId> = (0..12).collect();
        tracker.record("s1", "m", &ids);

        // After overflow, only the newest half of the cap remains
        let excluded = tracker.exclusions("s2", "m");
        assert!(excluded.contains(&11));
        assert!(!excluded.contains(&0));
    }

    #[test]
    fn test_stats_shape() {
        let tracker = tracker();
        tracker.record("s1", "phantom_fear", &[1, 2]);
        tracker.record("s1", "euphoria_wave", &[3]);

        let stats = tracker.stats("s1");
        assert!(stats.session_found);
        assert_eq!(stats.total_shown, 3);
        assert_eq!(stats.moods_seen, vec!["euphoria_wave", "phantom_fear"]);
        assert!(stats.last_activity.is_some());

        let missing = tracker.stats("nope");
        assert!(!missing.session_found);
        assert_eq!(missing.total_shown, 0);
    }

    #[test]
    fn test_clear_session() {
        let tracker = tracker();
        tracker.record("s1", "phantom_fear", &[1]);
        assert!(tracker.clear("s1"));
        assert!(!tracker.stats("s1").session_found);
        assert!(!tracker.clear("s1"));
    }
}
