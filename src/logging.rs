//! Logging System
//!
//! Structured logging via the `tracing` crate with configurable level,
//! format, and destination. Environment variables (`AGENT_SYNC_LOG`,
//! `AGENT_SYNC_LOG_FORMAT`, `AGENT_SYNC_LOG_OUTPUT`) override the config.

use serde::{Deserialize, Serialize};
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::error::SyncError;

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error, off
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: json, text (default: text)
    #[serde(default = "default_format")]
    pub format: String,

    /// Output destination: stdout, stderr
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable colored output (text format only)
    #[serde(default = "default_true")]
    pub color: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

fn default_output() -> String {
    "stderr".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_format(),
            output: default_output(),
            color: default_true(),
        }
    }
}

/// Initialize the logging system.
///
/// Priority order (highest to lowest): environment variables, configuration
/// file, defaults.
pub fn init_logging(config: Option<&LoggingConfig>) -> Result<(), SyncError> {
    let filter = build_env_filter(config)?;
    let format = determine_format(config)?;
    let to_stderr = determine_output(config)? == Output::Stderr;
    let use_color = config.map(|c| c.color).unwrap_or(true);

    let base = Registry::default().with(filter);
    if format == "json" {
        let layer = fmt::layer()
            .json()
            .with_target(true)
            .with_timer(ChronoUtc::rfc_3339());
        if to_stderr {
            base.with(layer.with_writer(std::io::stderr)).init();
        } else {
            base.with(layer.with_writer(std::io::stdout)).init();
        }
    } else {
        let layer = fmt::layer()
            .with_target(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_ansi(use_color);
        if to_stderr {
            base.with(layer.with_writer(std::io::stderr)).init();
        } else {
            base.with(layer.with_writer(std::io::stdout)).init();
        }
    }

    Ok(())
}

/// Build environment filter from config or the AGENT_SYNC_LOG variable.
fn build_env_filter(config: Option<&LoggingConfig>) -> Result<EnvFilter, SyncError> {
    if let Ok(filter) = EnvFilter::try_from_env("AGENT_SYNC_LOG") {
        return Ok(filter);
    }
    let level = config.map(|c| c.level.as_str()).unwrap_or("info");
    EnvFilter::try_new(level)
        .map_err(|e| SyncError::ConfigError(format!("Invalid log level '{}': {}", level, e)))
}

fn determine_format(config: Option<&LoggingConfig>) -> Result<String, SyncError> {
    if let Ok(format) = std::env::var("AGENT_SYNC_LOG_FORMAT") {
        if format == "json" || format == "text" {
            return Ok(format);
        }
    }
    let format = config.map(|c| c.format.as_str()).unwrap_or("text");
    if format != "json" && format != "text" {
        return Err(SyncError::ConfigError(format!(
            "Invalid log format: {} (must be 'json' or 'text')",
            format
        )));
    }
    Ok(format.to_string())
}

#[derive(Debug, PartialEq)]
enum Output {
    Stdout,
    Stderr,
}

fn determine_output(config: Option<&LoggingConfig>) -> Result<Output, SyncError> {
    let from_env = std::env::var("AGENT_SYNC_LOG_OUTPUT").ok();
    let output = from_env
        .as_deref()
        .or(config.map(|c| c.output.as_str()))
        .unwrap_or("stderr");
    match output {
        "stdout" => Ok(Output::Stdout),
        "stderr" => Ok(Output::Stderr),
        other => Err(SyncError::ConfigError(format!(
            "Invalid log output: {} (must be 'stdout' or 'stderr')",
            other
        ))),
    }
}
