use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Directory containing the MovieLens-style catalog CSVs
    #[serde(default = "default_data_path")]
    pub data_path: String,

    /// TMDB API key; enrichment runs in placeholder-only mode when empty
    #[serde(default)]
    pub tmdb_api_key: String,

    /// TMDB API base URL
    #[serde(default = "default_tmdb_base_url")]
    pub tmdb_base_url: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Connect timeout for metadata requests, seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Per-request read timeout for metadata requests, seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Retry attempts per metadata fetch
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base backoff between retries, milliseconds (doubles per attempt)
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Upper bound honored for a 429 Retry-After hint, seconds
    #[serde(default = "default_retry_after_cap_secs")]
    pub retry_after_cap_secs: u64,

    /// TTL for successfully fetched metadata, seconds
    #[serde(default = "default_metadata_ttl_secs")]
    pub metadata_ttl_secs: u64,

    /// TTL for cached not-found (404/400) lookups, seconds
    #[serde(default = "default_negative_ttl_secs")]
    pub negative_ttl_secs: u64,

    /// TTL for entries cached after exhausting the retry budget, seconds
    #[serde(default = "default_failure_ttl_secs")]
    pub failure_ttl_secs: u64,

    /// Movies fetched concurrently per enrichment batch
    #[serde(default = "default_enrichment_batch_size")]
    pub enrichment_batch_size: usize,

    /// Deadline for a single enrichment batch, seconds
    #[serde(default = "default_batch_timeout_secs")]
    pub batch_timeout_secs: u64,

    /// Pause between enrichment batches, milliseconds
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,

    /// Overall bound on the enrichment phase, seconds
    #[serde(default = "default_enrichment_timeout_secs")]
    pub enrichment_timeout_secs: u64,

    /// Idle time after which a session is dropped, hours
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,

    /// Maximum length of the global recently-shown list
    #[serde(default = "default_recent_memory_size")]
    pub recent_memory_size: usize,

    /// Maximum number of tracked sessions
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Randomization strength in [0, 1]; 0 preserves the ranking
    #[serde(default = "default_randomization_strength")]
    pub randomization_strength: f64,

    /// Base seed for session-derived random streams
    #[serde(default = "default_random_seed")]
    pub random_seed: u64,

    /// Candidate pool size as a multiple of the requested count
    #[serde(default = "default_candidate_pool_multiplier")]
    pub candidate_pool_multiplier: usize,

    /// Hard cap on the candidate pool
    #[serde(default = "default_max_candidate_pool")]
    pub max_candidate_pool: usize,

    /// Minimum ratings for a user to enter the collaborative model
    #[serde(default = "default_min_user_ratings")]
    pub min_user_ratings: usize,

    /// Session-aware ranking path toggle; false forces the baseline path
    #[serde(default = "default_use_enhanced_ranking")]
    pub use_enhanced_ranking: bool,
}

fn default_data_path() -> String {
    "data/ml-latest-small".to_string()
}

fn default_tmdb_base_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_connect_timeout_secs() -> u64 {
    3
}

fn default_request_timeout_secs() -> u64 {
    8
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    500
}

fn default_retry_after_cap_secs() -> u64 {
    5
}

fn default_metadata_ttl_secs() -> u64 {
    3600
}

fn default_negative_ttl_secs() -> u64 {
    300
}

fn default_failure_ttl_secs() -> u64 {
    60
}

fn default_enrichment_batch_size() -> usize {
    5
}

fn default_batch_timeout_secs() -> u64 {
    20
}

fn default_batch_delay_ms() -> u64 {
    1000
}

fn default_enrichment_timeout_secs() -> u64 {
    45
}

fn default_session_ttl_hours() -> i64 {
    24
}

fn default_recent_memory_size() -> usize {
    1000
}

fn default_max_sessions() -> usize {
    500
}

fn default_randomization_strength() -> f64 {
    0.25
}

fn default_random_seed() -> u64 {
    42
}

fn default_candidate_pool_multiplier() -> usize {
    3
}

fn default_max_candidate_pool() -> usize {
    50
}

fn default_min_user_ratings() -> usize {
    5
}

fn default_use_enhanced_ranking() -> bool {
    true
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }
}

impl Default for Config {
    fn default() -> Self {
        // envy sees no matching variables for an empty prefix-free struct,
        // so deserializing from an empty map yields the serde defaults
        envy::from_iter::<_, Config>(std::iter::empty::<(String, String)>())
            .expect("default config must deserialize")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.enrichment_batch_size, 5);
        assert_eq!(config.metadata_ttl_secs, 3600);
        assert_eq!(config.negative_ttl_secs, 300);
        assert_eq!(config.session_ttl_hours, 24);
        assert_eq!(config.recent_memory_size, 1000);
        assert!(config.use_enhanced_ranking);
        assert!(config.tmdb_api_key.is_empty());
    }
}
