//! # HMAS Config
//!
//! Single-file configuration for the simulator server and the hypermedia
//! client. One `hmas.yaml` covers the HTTP surface, the dataset to load,
//! client transport behaviour, crawl ceilings and logging.

mod loader;

pub use loader::{load_config, validate_config, ConfigError};

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Top-level configuration schema.
#[derive(Debug, Clone, Deserialize)]
pub struct HmasConfig {
    /// Config schema version.
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

fn default_version() -> u32 {
    1
}

impl Default for HmasConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            server: ServerConfig::default(),
            client: ClientConfig::default(),
            crawl: CrawlConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Dataset the server simulates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum World {
    HomeBench,
    Blocksworld,
}

impl fmt::Display for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            World::HomeBench => "homebench",
            World::Blocksworld => "blocksworld",
        })
    }
}

impl std::str::FromStr for World {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "homebench" => Ok(World::HomeBench),
            "blocksworld" => Ok(World::Blocksworld),
            other => Err(ConfigError::Invalid(format!(
                "unknown world '{}', expected homebench or blocksworld",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
    /// Prefix of every URI in the loaded descriptions
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_world")]
    pub world: World,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Fail the load when an enabled action has no handler.
    #[serde(default = "default_true")]
    pub strict_handlers: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            base_url: default_base_url(),
            world: default_world(),
            data_dir: default_data_dir(),
            strict_handlers: true,
        }
    }
}

fn default_listen() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_world() -> World {
    World::HomeBench
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data/home_description")
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
    #[serde(default = "default_retry_on_status")]
    pub retry_on_status: Vec<u16>,
    /// Also retry action invocations (POST). Off by default: a retried
    /// action whose first attempt took effect runs twice.
    #[serde(default)]
    pub retry_actions: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
            retry_on_status: default_retry_on_status(),
            retry_actions: false,
        }
    }
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    pub fn retry_max_delay(&self) -> Duration {
        Duration::from_millis(self.retry_max_delay_ms)
    }
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    200
}

fn default_retry_max_delay_ms() -> u64 {
    5_000
}

fn default_retry_on_status() -> Vec<u16> {
    vec![408, 429, 500, 502, 503, 504]
}

#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default = "default_max_nodes")]
    pub max_nodes: usize,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            max_nodes: default_max_nodes(),
        }
    }
}

fn default_max_depth() -> usize {
    16
}

fn default_max_nodes() -> usize {
    10_000
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
