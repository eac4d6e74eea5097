use crate::services::profile_builder::CompletionPolicy;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub ranking: RankingConfig,
    pub refresh: ProfileRefreshConfig,
}

/// Settings for aggregation and ranking (`RANKING_` prefix)
#[derive(Debug, Clone, Deserialize)]
pub struct RankingConfig {
    /// Duration assumed for every video when converting watch percentage to seconds
    #[serde(default = "default_assumed_video_duration_secs")]
    pub assumed_video_duration_secs: f64,
    #[serde(default)]
    pub completion_policy: CompletionPolicy,
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,
    #[serde(default)]
    pub page_offset: usize,
    /// JSON snapshot read by the binary
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: String,
}

/// Settings for the periodic profile refresh job (`PROFILE_REFRESH_` prefix)
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileRefreshConfig {
    #[serde(default = "default_refresh_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_run_once")]
    pub run_once: bool,
    /// Users refreshed concurrently within one batch
    #[serde(default = "default_refresh_batch_size")]
    pub batch_size: usize,
    #[serde(default)]
    pub batch_delay_ms: u64,
}

fn default_assumed_video_duration_secs() -> f64 {
    300.0
}

fn default_page_size() -> usize {
    10
}

fn default_snapshot_path() -> String {
    "snapshot.json".to_string()
}

fn default_refresh_interval_secs() -> u64 {
    300
}

fn default_run_once() -> bool {
    true
}

fn default_refresh_batch_size() -> usize {
    50
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            assumed_video_duration_secs: default_assumed_video_duration_secs(),
            completion_policy: CompletionPolicy::default(),
            default_page_size: default_page_size(),
            page_offset: 0,
            snapshot_path: default_snapshot_path(),
        }
    }
}

impl Default for ProfileRefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_refresh_interval_secs(),
            run_once: default_run_once(),
            batch_size: default_refresh_batch_size(),
            batch_delay_ms: 0,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenv::dotenv().ok();

        Ok(Config {
            ranking: envy::prefixed("RANKING_").from_env::<RankingConfig>()?,
            refresh: envy::prefixed("PROFILE_REFRESH_").from_env::<ProfileRefreshConfig>()?,
        })
    }
}
