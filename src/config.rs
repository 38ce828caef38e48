//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::engine::{default_time_frames, Theme, TimeFrame};
use crate::layout::Dimension;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub chart: ChartConfig,

    #[serde(default)]
    pub loader: LoaderConfig,

    #[serde(default)]
    pub layout: LayoutConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Fixed widget options that do not depend on the binding
#[derive(Debug, Clone, Deserialize)]
pub struct ChartConfig {
    #[serde(default = "default_container_id")]
    pub container_id: String,

    #[serde(default = "default_library_path")]
    pub library_path: String,

    #[serde(default)]
    pub theme: Theme,

    #[serde(default = "default_toolbar_bg")]
    pub toolbar_bg: String,

    #[serde(default)]
    pub fullscreen: bool,

    #[serde(default = "default_disabled_features")]
    pub disabled_features: Vec<String>,

    /// Merged over the built-in dark palette
    #[serde(default)]
    pub overrides: BTreeMap<String, serde_json::Value>,

    #[serde(default = "default_time_frames")]
    pub time_frames: Vec<TimeFrame>,

    #[serde(default = "default_fallback_dimension")]
    pub fallback_width: Dimension,

    #[serde(default = "default_fallback_dimension")]
    pub fallback_height: Dimension,
}

fn default_container_id() -> String {
    "tv_chart_container".to_string()
}

fn default_library_path() -> String {
    "/charting_library/".to_string()
}

fn default_toolbar_bg() -> String {
    "#0b1217".to_string()
}

fn default_disabled_features() -> Vec<String> {
    vec!["header_symbol_search".to_string()]
}

fn default_fallback_dimension() -> Dimension {
    Dimension::Css("100%".to_string())
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            container_id: default_container_id(),
            library_path: default_library_path(),
            theme: Theme::default(),
            toolbar_bg: default_toolbar_bg(),
            fullscreen: false,
            disabled_features: default_disabled_features(),
            overrides: BTreeMap::new(),
            time_frames: default_time_frames(),
            fallback_width: default_fallback_dimension(),
            fallback_height: default_fallback_dimension(),
        }
    }
}

/// Engine bootstrap script configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoaderConfig {
    #[serde(default = "default_script_src")]
    pub script_src: String,

    /// Global the script defines once it has executed
    #[serde(default = "default_engine_global")]
    pub engine_global: String,
}

fn default_script_src() -> String {
    "/charting_library/charting_library.standalone.js".to_string()
}

fn default_engine_global() -> String {
    "TradingView".to_string()
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            script_src: default_script_src(),
            engine_global: default_engine_global(),
        }
    }
}

/// Responsive layout configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LayoutConfig {
    #[serde(default = "default_narrow_max_width")]
    pub narrow_max_width: u32,

    #[serde(default = "default_book_max_width")]
    pub book_max_width: u32,

    #[serde(default = "default_narrow_height")]
    pub narrow_height: u32,

    #[serde(default = "default_height")]
    pub default_height: u32,

    /// Subtracted from the viewport width on narrow screens
    #[serde(default = "default_narrow_margin")]
    pub narrow_margin: u32,

    /// Re-read viewport size on every resize instead of only at mount
    #[serde(default = "default_track_resize")]
    pub track_resize: bool,
}

fn default_narrow_max_width() -> u32 {
    640
}

fn default_book_max_width() -> u32 {
    800
}

fn default_narrow_height() -> u32 {
    600
}

fn default_height() -> u32 {
    450
}

fn default_narrow_margin() -> u32 {
    60
}

fn default_track_resize() -> bool {
    true
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            narrow_max_width: default_narrow_max_width(),
            book_max_width: default_book_max_width(),
            narrow_height: default_narrow_height(),
            default_height: default_height(),
            narrow_margin: default_narrow_margin(),
            track_resize: default_track_resize(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::read(path)?;
        config.validate()?;
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides.
    /// Validation runs on the merged result.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::read(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("tvchart").join("config.toml")),
            Some(PathBuf::from("/etc/tvchart/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Reject layouts whose breakpoints cannot be told apart
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.layout.narrow_max_width > self.layout.book_max_width {
            return Err(ConfigError::Invalid(format!(
                "layout.narrow_max_width ({}) must not exceed layout.book_max_width ({})",
                self.layout.narrow_max_width, self.layout.book_max_width
            )));
        }
        if self.chart.container_id.is_empty() {
            return Err(ConfigError::Invalid(
                "chart.container_id must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("TVCHART_LIBRARY_PATH") {
            self.chart.library_path = path;
        }
        if let Ok(id) = std::env::var("TVCHART_CONTAINER_ID") {
            self.chart.container_id = id;
        }

        if let Ok(src) = std::env::var("TVCHART_SCRIPT_SRC") {
            self.loader.script_src = src;
        }

        if let Ok(track) = std::env::var("TVCHART_TRACK_RESIZE") {
            if let Ok(t) = track.parse() {
                self.layout.track_resize = t;
            }
        }

        if let Ok(level) = std::env::var("TVCHART_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("TVCHART_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r##"# tvchart Configuration
#
# Environment variables override these settings:
# - TVCHART_LIBRARY_PATH
# - TVCHART_CONTAINER_ID
# - TVCHART_SCRIPT_SRC
# - TVCHART_TRACK_RESIZE
# - TVCHART_LOG_LEVEL
# - TVCHART_LOG_FORMAT

[chart]
# Element id of the render surface
container_id = "tv_chart_container"

# Where the charting library serves its assets from
library_path = "/charting_library/"

# Dark or Light
theme = "Dark"

toolbar_bg = "#0b1217"
fullscreen = false
disabled_features = ["header_symbol_search"]

# Used when the viewport is wider than the book breakpoint
fallback_width = "100%"
fallback_height = "100%"

# Extra style overrides, merged over the built-in dark palette
[chart.overrides]
# "scalesProperties.textSize" = 18

[loader]
# Bootstrap script, injected at most once per page
script_src = "/charting_library/charting_library.standalone.js"

# Global the script defines once loaded
engine_global = "TradingView"

[layout]
# Breakpoints (viewport width, px)
narrow_max_width = 640
book_max_width = 800

# Chart height on narrow screens and everywhere else (px)
narrow_height = 600
default_height = 450

# Horizontal margin kept free on narrow screens (px)
narrow_margin = 60

# Follow window resizes; false keeps the size captured at mount
track_resize = true

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"##
    .to_string()
}
