use serde::Deserialize;
use std::time::Duration;

use crate::models::SelectionRequest;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Bulk recommendation endpoint tried first
    #[serde(default)]
    pub primary_source_url: Option<String>,

    /// Endpoints fetched concurrently and merged when the primary fails
    #[serde(default)]
    pub secondary_source_urls: Vec<String>,

    /// Unfiltered catalogue endpoint
    #[serde(default)]
    pub full_pool_source_url: Option<String>,

    /// Single endpoint tried when everything else failed
    #[serde(default)]
    pub last_resort_source_url: Option<String>,

    /// Deadline applied to every candidate fetch
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,

    #[serde(default = "default_target")]
    pub default_target: usize,

    #[serde(default = "default_channel_cap")]
    pub default_channel_cap: usize,

    #[serde(default = "default_max_relaxation_steps")]
    pub max_relaxation_steps: usize,

    /// Upper bound accepted for a request's `target`
    #[serde(default = "default_max_target")]
    pub max_target: usize,

    /// Raw record fields probed, in order, for the video id
    #[serde(default = "default_id_fields")]
    pub id_fields: Vec<String>,

    /// Raw record fields probed, in order, for the channel id
    #[serde(default = "default_channel_fields")]
    pub channel_fields: Vec<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_fetch_timeout_ms() -> u64 {
    10_000
}

fn default_target() -> usize {
    24
}

fn default_channel_cap() -> usize {
    1
}

fn default_max_relaxation_steps() -> usize {
    1
}

fn default_max_target() -> usize {
    200
}

fn default_id_fields() -> Vec<String> {
    vec!["id".into(), "video_id".into(), "videoId".into()]
}

fn default_channel_fields() -> Vec<String> {
    vec!["channel_id".into(), "channelId".into(), "channel".into()]
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?
            .validated()
    }

    fn validated(self) -> anyhow::Result<Self> {
        if self.fetch_timeout_ms == 0 {
            anyhow::bail!("FETCH_TIMEOUT_MS must be greater than zero");
        }
        if self.default_channel_cap == 0 {
            anyhow::bail!("DEFAULT_CHANNEL_CAP must be at least 1");
        }
        if self.default_channel_cap > self.max_target || self.max_relaxation_steps > self.max_target {
            anyhow::bail!(
                "DEFAULT_CHANNEL_CAP and MAX_RELAXATION_STEPS must not exceed MAX_TARGET ({})",
                self.max_target
            );
        }
        if self.default_target == 0 || self.default_target > self.max_target {
            anyhow::bail!(
                "DEFAULT_TARGET must be between 1 and MAX_TARGET ({})",
                self.max_target
            );
        }
        Ok(self)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    /// Baseline request that feed presets and query overrides build on
    pub fn default_request(&self) -> SelectionRequest {
        SelectionRequest {
            target: self.default_target,
            initial_cap: self.default_channel_cap,
            max_relaxation_steps: self.max_relaxation_steps,
            ..SelectionRequest::default()
        }
    }
}
