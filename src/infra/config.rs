//! Configuration loading from TOML files
//!
//! Config file is selected via:
//! 1. --config <path> command line argument
//! 2. CONFIG_FILE environment variable
//! 3. Default: config/dev.toml

use crate::io::permission::PermissionState;
use anyhow::Context;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// Base URL of the remote health alert service
    pub base_url: String,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_feed_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_poll_interval_secs() -> u64 {
    60
}

fn default_feed_timeout_ms() -> u64 {
    5000
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct SeedConfig {
    /// Optional JSON file overriding the builtin seed alert set
    #[serde(default)]
    pub file: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationsConfig {
    /// Permission state at startup
    #[serde(default = "default_permission_initial")]
    pub permission: PermissionState,
    /// What an undetermined permission resolves to when requested
    #[serde(default = "default_permission_on_request")]
    pub on_request: PermissionState,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            permission: default_permission_initial(),
            on_request: default_permission_on_request(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

fn default_permission_initial() -> PermissionState {
    PermissionState::Undetermined
}

fn default_permission_on_request() -> PermissionState {
    PermissionState::Granted
}

fn default_queue_capacity() -> usize {
    64
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_bind_address")]
    pub bind_address: String,
    /// Local API port (0 to disable)
    #[serde(default = "default_api_port")]
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { bind_address: default_api_bind_address(), port: default_api_port() }
    }
}

fn default_api_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
    8787
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_interval_secs")]
    pub interval_secs: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { interval_secs: default_metrics_interval_secs() }
    }
}

fn default_metrics_interval_secs() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    pub feed: FeedConfig,
    #[serde(default)]
    pub seed: SeedConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    feed_base_url: String,
    feed_poll_interval_secs: u64,
    feed_timeout_ms: u64,
    seed_file: Option<String>,
    permission_initial: PermissionState,
    permission_on_request: PermissionState,
    notification_queue_capacity: usize,
    api_bind_address: String,
    api_port: u16,
    metrics_interval_secs: u64,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feed_base_url: "http://127.0.0.1:5000".to_string(),
            feed_poll_interval_secs: default_poll_interval_secs(),
            feed_timeout_ms: default_feed_timeout_ms(),
            seed_file: None,
            permission_initial: default_permission_initial(),
            permission_on_request: default_permission_on_request(),
            notification_queue_capacity: default_queue_capacity(),
            api_bind_address: default_api_bind_address(),
            api_port: default_api_port(),
            metrics_interval_secs: default_metrics_interval_secs(),
            config_file: "default".to_string(),
        }
    }
}

impl Config {
    /// Determine config file path from the environment
    pub fn resolve_config_path() -> String {
        if let Ok(path) = env::var("CONFIG_FILE") {
            return path;
        }
        "config/dev.toml".to_string()
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let toml_config: TomlConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(Self {
            feed_base_url: toml_config.feed.base_url,
            feed_poll_interval_secs: toml_config.feed.poll_interval_secs,
            feed_timeout_ms: toml_config.feed.timeout_ms,
            seed_file: toml_config.seed.file,
            permission_initial: toml_config.notifications.permission,
            permission_on_request: toml_config.notifications.on_request,
            notification_queue_capacity: toml_config.notifications.queue_capacity,
            api_bind_address: toml_config.api.bind_address,
            api_port: toml_config.api.port,
            metrics_interval_secs: toml_config.metrics.interval_secs,
            config_file: path.display().to_string(),
        })
    }

    /// Load configuration - tries TOML file first, falls back to defaults
    pub fn load_from_path(path: &str) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Warning: {}. Using defaults.", e);
                Self::default()
            }
        }
    }

    pub fn feed_base_url(&self) -> &str {
        &self.feed_base_url
    }

    pub fn feed_poll_interval_secs(&self) -> u64 {
        self.feed_poll_interval_secs
    }

    pub fn feed_timeout_ms(&self) -> u64 {
        self.feed_timeout_ms
    }

    pub fn seed_file(&self) -> Option<&str> {
        self.seed_file.as_deref()
    }

    pub fn permission_initial(&self) -> PermissionState {
        self.permission_initial
    }

    pub fn permission_on_request(&self) -> PermissionState {
        self.permission_on_request
    }

    pub fn notification_queue_capacity(&self) -> usize {
        self.notification_queue_capacity
    }

    pub fn api_bind_address(&self) -> &str {
        &self.api_bind_address
    }

    pub fn api_port(&self) -> u16 {
        self.api_port
    }

    pub fn metrics_interval_secs(&self) -> u64 {
        self.metrics_interval_secs
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }
}
