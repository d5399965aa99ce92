//! Configuration loading and merge.
//!
//! Precedence (lowest to highest): built-in defaults, global config file,
//! workspace config file, `AGENT_SYNC`-prefixed environment. CLI flags
//! override the merged result in the tooling layer.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::client::RetryPolicy;
use crate::error::SyncError;
use crate::logging::LoggingConfig;

/// Merged tool configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SyncConfig {
    /// Base URL of the remote agent service
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Bearer token for the remote service
    #[serde(default)]
    pub api_key: Option<String>,

    /// Default model applied when a definition names none
    #[serde(default)]
    pub model: Option<String>,

    /// Prefix applied to every remote agent name
    #[serde(default)]
    pub prefix: String,

    /// Suffix applied to every remote agent name
    #[serde(default)]
    pub suffix: String,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SyncConfig {
    /// The endpoint is the one value nothing can default.
    pub fn require_endpoint(&self) -> Result<&str, SyncError> {
        self.endpoint
            .as_deref()
            .filter(|e| !e.is_empty())
            .ok_or_else(|| {
                SyncError::ConfigError(
                    "Remote endpoint is required (set endpoint in config, \
                     AGENT_SYNC_ENDPOINT, or --endpoint)"
                        .to_string(),
                )
            })
    }
}

/// Retry knobs for the upsert engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_attempts")]
    pub attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

fn default_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    500
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.attempts, Duration::from_millis(self.base_delay_ms))
    }
}

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Global config file under the platform config directory.
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "agent-sync", "agent-sync")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load configuration from standard sources.
    pub fn load() -> Result<SyncConfig, SyncError> {
        let mut builder = Config::builder();
        if let Some(global) = Self::global_config_path() {
            builder = builder.add_source(File::from(global).required(false));
        }
        builder = builder.add_source(File::with_name("agent-sync").required(false));
        Self::finish(builder)
    }

    /// Load configuration from a specific file with environment overlay.
    pub fn load_from_file(path: &Path) -> Result<SyncConfig, SyncError> {
        let builder = Config::builder().add_source(File::from(path));
        Self::finish(builder)
    }

    fn finish(builder: config::ConfigBuilder<config::builder::DefaultState>) -> Result<SyncConfig, SyncError> {
        let builder = builder.add_source(
            Environment::with_prefix("AGENT_SYNC")
                .separator("__")
                .try_parsing(true),
        );
        let merged = builder
            .build()
            .map_err(|e| SyncError::ConfigError(format!("Failed to load configuration: {}", e)))?;
        merged
            .try_deserialize()
            .map_err(|e| SyncError::ConfigError(format!("Invalid configuration: {}", e)))
    }
}
