//! Configuration types for auction-watch

use crate::listing::{ListingClientConfig, API_BASE_URL, ITEM_URL_BASE};
use crate::telemetry::LogFormat;
use serde::Deserialize;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub watch: WatchConfig,
    pub telemetry: TelemetryConfig,
}

/// Listing API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the listing API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Base URL for public listing links
    #[serde(default = "default_item_url_base")]
    pub item_url_base: String,

    /// Request timeout (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    API_BASE_URL.to_string()
}
fn default_item_url_base() -> String {
    ITEM_URL_BASE.to_string()
}
fn default_timeout_secs() -> u64 {
    10
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            item_url_base: default_item_url_base(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ApiConfig {
    /// Client configuration for the listing API
    pub fn client_config(&self) -> ListingClientConfig {
        ListingClientConfig {
            base_url: self.base_url.clone(),
            item_url_base: self.item_url_base.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

/// Watch scheduler configuration
#[derive(Debug, Clone, Deserialize)]
pub struct WatchConfig {
    /// Capacity of the outbound event channel
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,

    /// Poll interval for listings without an auction clock (seconds)
    #[serde(default = "default_no_countdown_interval_secs")]
    pub no_countdown_interval_secs: u64,
}

fn default_event_buffer() -> usize {
    256
}
fn default_no_countdown_interval_secs() -> u64 {
    3600 // 1 hour
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            event_buffer: default_event_buffer(),
            no_countdown_interval_secs: default_no_countdown_interval_secs(),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
    pub metrics_port: Option<u16>,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
