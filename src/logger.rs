//! Logging setup.
//!
//! Everything in the crate logs through the `log` facade. With logging enabled the
//! records go to a file under the user cache directory at the configured level;
//! otherwise only warnings and errors reach stderr.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use log::LevelFilter;

use crate::config::LoggingConfig;

pub struct Logger;

impl Logger {
    /// Install the global logger described by `config`
    pub fn init(config: &LoggingConfig) -> Result<()> {
        let log_path = if config.enabled {
            Some(Self::get_log_file_path()?)
        } else {
            None
        };

        Self::dispatch(config, log_path.as_deref())?
            .apply()
            .context("Logger was already initialized")?;

        if let Some(path) = log_path {
            log::info!("Logging to {}", path.display());
        }
        Ok(())
    }

    /// Build the fern dispatch without installing it
    pub fn dispatch(config: &LoggingConfig, log_path: Option<&Path>) -> Result<fern::Dispatch> {
        let base = fern::Dispatch::new().format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            ))
        });

        let dispatch = match (config.enabled, log_path) {
            (true, Some(path)) => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
                }
                let file = fern::log_file(path)
                    .with_context(|| format!("Failed to open log file: {}", path.display()))?;
                base.level(Self::level_filter(&config.level)?).chain(file)
            }
            _ => base.level(LevelFilter::Warn).chain(std::io::stderr()),
        };

        Ok(dispatch)
    }

    /// Parse a configured level name
    pub fn level_filter(level: &str) -> Result<LevelFilter> {
        LevelFilter::from_str(level.trim()).with_context(|| format!("Invalid logging level '{}'", level))
    }

    /// Location of the log file when logging is enabled
    pub fn get_log_file_path() -> Result<PathBuf> {
        dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine cache directory"))
            .map(|dir| dir.join("repostats").join("repostats.log"))
    }
}
