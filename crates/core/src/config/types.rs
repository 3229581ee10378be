use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    pub delivery: DeliveryConfig,
}

/// Upstream catalog endpoint configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    /// Catalog base URL (e.g. "https://api.example.org")
    pub base_url: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Hard cap on downloaded archive size in bytes (default: 10 MiB)
    #[serde(default = "default_max_archive_bytes")]
    pub max_archive_bytes: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_secs: default_timeout_secs(),
            max_archive_bytes: default_max_archive_bytes(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_archive_bytes() -> u64 {
    10 * 1024 * 1024
}

/// Per-credential lane throttling configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueueConfig {
    /// Minimum interval between search lane starts, in milliseconds
    #[serde(default = "default_search_interval_ms")]
    pub search_interval_ms: u64,
    /// Maximum concurrent downloads per credential
    #[serde(default = "default_download_concurrency")]
    pub download_concurrency: usize,
    /// Minimum spacing between download starts, in milliseconds
    #[serde(default = "default_download_stagger_ms")]
    pub download_stagger_ms: u64,
    /// Retries per job on transient failures
    #[serde(default = "default_retry_limit")]
    pub retry_limit: u32,
    /// Ceiling on live credential lane sets
    #[serde(default = "default_max_credential_states")]
    pub max_credential_states: usize,
    /// Idle time after which a credential's lanes are reclaimed, in seconds
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
}

impl QueueConfig {
    pub fn search_interval(&self) -> Duration {
        Duration::from_millis(self.search_interval_ms)
    }

    pub fn download_stagger(&self) -> Duration {
        Duration::from_millis(self.download_stagger_ms)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            search_interval_ms: default_search_interval_ms(),
            download_concurrency: default_download_concurrency(),
            download_stagger_ms: default_download_stagger_ms(),
            retry_limit: default_retry_limit(),
            max_credential_states: default_max_credential_states(),
            idle_timeout_secs: default_idle_timeout_secs(),
        }
    }
}

fn default_search_interval_ms() -> u64 {
    1000
}

fn default_download_concurrency() -> usize {
    3
}

fn default_download_stagger_ms() -> u64 {
    200
}

fn default_retry_limit() -> u32 {
    2
}

fn default_max_credential_states() -> usize {
    64
}

fn default_idle_timeout_secs() -> u64 {
    3600
}

/// Cache lifetime and capacity configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// TTL for non-empty lookup results, in seconds (default: 6 h)
    #[serde(default = "default_result_ttl_secs")]
    pub result_ttl_secs: u64,
    /// TTL for empty lookup results, in seconds (default: 20 min)
    #[serde(default = "default_empty_result_ttl_secs")]
    pub empty_result_ttl_secs: u64,
    /// TTL for downloaded archives, in seconds (default: 30 min)
    #[serde(default = "default_archive_ttl_secs")]
    pub archive_ttl_secs: u64,
    /// Maximum decoded captions kept in memory
    #[serde(default = "default_caption_capacity")]
    pub caption_capacity: usize,
    /// TTL for decoded captions, in seconds (default: 3 h)
    #[serde(default = "default_caption_ttl_secs")]
    pub caption_ttl_secs: u64,
}

impl CacheConfig {
    pub fn result_ttl(&self) -> Duration {
        Duration::from_secs(self.result_ttl_secs)
    }

    pub fn empty_result_ttl(&self) -> Duration {
        Duration::from_secs(self.empty_result_ttl_secs)
    }

    pub fn archive_ttl(&self) -> Duration {
        Duration::from_secs(self.archive_ttl_secs)
    }

    pub fn caption_ttl(&self) -> Duration {
        Duration::from_secs(self.caption_ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            result_ttl_secs: default_result_ttl_secs(),
            empty_result_ttl_secs: default_empty_result_ttl_secs(),
            archive_ttl_secs: default_archive_ttl_secs(),
            caption_capacity: default_caption_capacity(),
            caption_ttl_secs: default_caption_ttl_secs(),
        }
    }
}

fn default_result_ttl_secs() -> u64 {
    6 * 3600
}

fn default_empty_result_ttl_secs() -> u64 {
    20 * 60
}

fn default_archive_ttl_secs() -> u64 {
    30 * 60
}

fn default_caption_capacity() -> usize {
    512
}

fn default_caption_ttl_secs() -> u64 {
    3 * 3600
}

/// Caption delivery URL configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeliveryConfig {
    /// Base URL the caller serves captions from; track URLs are built
    /// against it
    pub base_url: String,
}
