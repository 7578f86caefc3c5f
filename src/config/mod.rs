//! Configuration management
//!
//! Loads and validates the bridge configuration from a TOML file. Every
//! section is optional; missing sections take their defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::input::CursorKind;

pub mod types;

pub use types::{DispatchConfig, InputConfig, LoggingConfig};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Thread configuration
    #[serde(default)]
    pub dispatch: DispatchConfig,
    /// Input configuration
    #[serde(default)]
    pub input: InputConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Create default configuration
    pub fn default_config() -> Self {
        Config {
            dispatch: DispatchConfig::default(),
            input: InputConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.dispatch.ui_thread_name.is_empty() {
            anyhow::bail!("dispatch.ui_thread_name must not be empty");
        }
        if self.dispatch.send_thread_name.is_empty() {
            anyhow::bail!("dispatch.send_thread_name must not be empty");
        }
        if self.dispatch.ui_thread_name == self.dispatch.send_thread_name {
            anyhow::bail!(
                "UI and send threads must have distinct names, both are '{}'",
                self.dispatch.ui_thread_name
            );
        }

        if self.input.seat_name.is_empty() {
            anyhow::bail!("input.seat_name must not be empty");
        }
        self.default_cursor()?;

        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Invalid log level: {}", self.logging.level),
        }

        Ok(())
    }

    /// Parsed default cursor glyph
    pub fn default_cursor(&self) -> Result<CursorKind> {
        self.input
            .default_cursor
            .parse()
            .context("Invalid input.default_cursor")
    }
}
