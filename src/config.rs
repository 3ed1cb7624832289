//! Configuration management for repostats
//!
//! This module handles loading, parsing, and validation of configuration files,
//! and resolves the stats API base URL from the environment.

use crate::constants::{
    CONFIG_GENERATED, DEFAULT_MAX_RETRIES, DEFAULT_POLL_INTERVAL_MS, DEFAULT_RETRY_BACKOFF_MS, DEFAULT_TIMEOUT_MS,
    DEV_API_URL, ENV_API_URL, ENV_ENVIRONMENT, MAX_RETRIES_LIMIT, MAX_TIMEOUT_MS, MIN_POLL_INTERVAL_MS, PROD_API_URL,
};
use crate::utils::datetime::{self, DateStyle};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub fetch: FetchConfig,
    pub display: DisplayConfig,
    pub logging: LoggingConfig,
}

/// Stats API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Explicit base URL; empty means resolve from the environment
    pub base_url: String,
    /// Deployment environment used for the fallback base URL
    /// Options: "development", "production"
    pub environment: String,
}

/// Fetch and polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Hard timeout per backend call, in milliseconds
    pub timeout_ms: u64,
    /// Retries for timeouts and connection failures
    pub max_retries: u32,
    /// Base of the linear retry backoff, in milliseconds
    pub retry_backoff_ms: u64,
    /// Poll interval while the backend is processing, in milliseconds
    pub poll_interval_ms: u64,
    /// Raise the shared loading indicator during calls
    pub show_global_indicator: bool,
    /// Raise it for background poll ticks too
    pub indicator_while_polling: bool,
}

/// Display configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Style used for dates in panel output
    pub date_style: DateStyle,
    /// Pattern used when `date_style = "custom"` (tokens: yyyy MM dd HH mm ss)
    pub custom_pattern: String,
    /// Show seconds in times
    pub time_with_seconds: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Write logs to the log file
    pub enabled: bool,
    /// Level filter: off, error, warn, info, debug, trace
    pub level: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            environment: "development".to_string(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff_ms: DEFAULT_RETRY_BACKOFF_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            show_global_indicator: true,
            indicator_while_polling: false,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            date_style: DateStyle::Medium,
            custom_pattern: "yyyy-MM-dd".to_string(),
            time_with_seconds: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            level: "info".to_string(),
        }
    }
}

const ENVIRONMENTS: [&str; 2] = ["development", "production"];
const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

impl Config {
    /// Load configuration from file or return defaults
    pub fn load() -> Result<Self> {
        let config_path = Self::find_config_file()?;

        if let Some(path) = config_path {
            Self::load_from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Find configuration file in order of precedence
    fn find_config_file() -> Result<Option<PathBuf>> {
        // 1. Check current directory
        let current_dir_config = PathBuf::from("repostats.toml");
        if current_dir_config.exists() {
            return Ok(Some(current_dir_config));
        }

        // 2. Check XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("repostats").join("config.toml");
            if xdg_config.exists() {
                return Ok(Some(xdg_config));
            }
        }

        Ok(None)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !ENVIRONMENTS.contains(&self.api.environment.as_str()) {
            anyhow::bail!(
                "environment must be one of {}, got '{}'",
                ENVIRONMENTS.join(", "),
                self.api.environment
            );
        }

        let base_url = self.api.base_url.trim();
        if !base_url.is_empty() && !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            anyhow::bail!("base_url must start with http:// or https://, got '{}'", base_url);
        }

        if self.fetch.timeout_ms == 0 || self.fetch.timeout_ms > MAX_TIMEOUT_MS {
            anyhow::bail!(
                "timeout_ms must be between 1 and {}, got {}",
                MAX_TIMEOUT_MS,
                self.fetch.timeout_ms
            );
        }

        if self.fetch.poll_interval_ms < MIN_POLL_INTERVAL_MS {
            anyhow::bail!(
                "poll_interval_ms must be at least {}, got {}",
                MIN_POLL_INTERVAL_MS,
                self.fetch.poll_interval_ms
            );
        }

        if self.fetch.max_retries > MAX_RETRIES_LIMIT {
            anyhow::bail!("max_retries cannot exceed {}", MAX_RETRIES_LIMIT);
        }

        if self.display.date_style == DateStyle::Custom && self.display.custom_pattern.trim().is_empty() {
            anyhow::bail!("custom_pattern cannot be empty when date_style is 'custom'");
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            anyhow::bail!(
                "Invalid logging level '{}', expected one of {}",
                self.logging.level,
                LOG_LEVELS.join(", ")
            );
        }

        Ok(())
    }

    /// Resolve the stats API base URL.
    ///
    /// `REPOSTATS_API_URL` wins, then `api.base_url`, then the fallback for the
    /// environment named by `REPOSTATS_ENV` or `api.environment`.
    pub fn resolve_base_url(&self) -> String {
        self.resolve_base_url_with(|name| std::env::var(name).ok())
    }

    /// Same as [`resolve_base_url`](Self::resolve_base_url) with an injectable environment lookup
    pub fn resolve_base_url_with<F>(&self, env: F) -> String
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

        let url = non_empty(env(ENV_API_URL))
            .or_else(|| non_empty(Some(self.api.base_url.clone())))
            .unwrap_or_else(|| {
                let environment = non_empty(env(ENV_ENVIRONMENT)).unwrap_or_else(|| self.api.environment.clone());
                match environment.trim().to_ascii_lowercase().as_str() {
                    "production" | "prod" => PROD_API_URL.to_string(),
                    _ => DEV_API_URL.to_string(),
                }
            });

        url.trim().trim_end_matches('/').to_string()
    }

    /// Generate default configuration file
    pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let config = Self::default();
        let toml_content = toml::to_string_pretty(&config).context("Failed to serialize default config")?;

        // Add header comment
        let header = format!(
            "# repostats Configuration File\n# Generated on {}\n\n",
            chrono::Local::now().format(datetime::ISO_DATE_FORMAT)
        );

        let full_content = header + &toml_content;

        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        std::fs::write(&path, full_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        println!("{}: {}", CONFIG_GENERATED, path.as_ref().display());
        Ok(())
    }

    /// Get the XDG config directory path
    pub fn get_xdg_config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
            .map(|dir| dir.join("repostats"))
    }

    /// Get the default config file path
    pub fn get_default_config_path() -> Result<PathBuf> {
        Ok(Self::get_xdg_config_dir()?.join("config.toml"))
    }
}
