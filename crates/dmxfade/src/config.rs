//! Application configuration
//!
//! Loaded once from a TOML file at startup:
//!
//! ```toml
//! [logging]
//! level = "debug"
//!
//! [engine]
//! universes = 2
//! devices_per_universe = 16
//! channels_per_device = 3
//!
//! [engine.ambient]
//! enabled = true
//!
//! [startup]
//! color = [254.0, 120.0, 1.0]
//! steps = 120
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dmxfade_core::{Color, EngineConfig};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;

/// Logging settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Level name: trace, debug, info, warn, error
    pub level: String,
    /// Log to stderr
    pub console_output: bool,
    /// Log to a file in `log_dir`
    pub file_output: bool,
    /// Directory for log files
    pub log_dir: PathBuf,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console_output: true,
            file_output: false,
            log_dir: PathBuf::from("logs"),
        }
    }
}

impl LogConfig {
    /// Parse the configured level, falling back to INFO
    pub fn parse_level(&self) -> LevelFilter {
        self.level.parse().unwrap_or(LevelFilter::INFO)
    }

    /// Create the log directory if needed
    pub fn ensure_log_directory(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.log_dir)
    }
}

/// Color every device fades to right after startup
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StartupConfig {
    /// Target color
    pub color: Color,
    /// Fade length, defaults to the engine's `fade_steps`
    pub steps: Option<u32>,
}

/// Top level configuration file
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Logging
    pub logging: LogConfig,
    /// Universe geometry and timing
    pub engine: EngineConfig,
    /// Optional power-on fade
    pub startup: Option<StartupConfig>,
}

impl AppConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).context("Failed to parse configuration")?;
        config
            .engine
            .validate()
            .context("Invalid engine configuration")?;
        Ok(config)
    }

    /// Load from `path`, or use defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file: {:?}", path))?;
                Self::from_toml(&text)
            }
            None => Ok(Self::default()),
        }
    }
}
