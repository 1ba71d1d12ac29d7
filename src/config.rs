//! Panel configuration
//!
//! Loaded from `config/panel.json` when present. Missing fields take their
//! defaults, and a missing or broken file falls back to the built-in panel.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::rods::RodLayout;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "RBMK_PANEL_CONFIG";

const CONFIG_PATHS: [&str; 2] = ["config/panel.json", "../config/panel.json"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    pub layout: RodLayout,
    pub tick_interval_ms: u64, // Reactor update cadence
    pub frame_interval_ms: u64, // Input/render polling cadence
    pub auto_protection: bool, // Initial state of the auto-protection toggle
    pub json_snapshots: bool,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            layout: RodLayout::default(),
            tick_interval_ms: 1000,
            frame_interval_ms: 16,
            auto_protection: true,
            json_snapshots: true,
        }
    }
}

impl PanelConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn from_json(path: &Path, content: &str) -> Result<Self, ConfigError> {
        let config: PanelConfig =
            serde_json::from_str(content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(path, &content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.layout.grid_size == 0 {
            return Err(ConfigError::Invalid("layout.grid_size must be non-zero"));
        }
        if self.layout.rod_size <= 0 {
            return Err(ConfigError::Invalid("layout.rod_size must be positive"));
        }
        if self.layout.gap < 0 {
            // Negative gaps overlap neighbouring rods
            return Err(ConfigError::Invalid("layout.gap must not be negative"));
        }
        if self.layout.zone_radius < 0 {
            return Err(ConfigError::Invalid("layout.zone_radius must not be negative"));
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid("tick_interval_ms must be non-zero"));
        }
        if self.frame_interval_ms == 0 {
            return Err(ConfigError::Invalid("frame_interval_ms must be non-zero"));
        }
        Ok(())
    }

    /// Load the panel config, falling back to defaults if nothing usable is found
    pub fn load() -> Self {
        let explicit = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let candidates = explicit
            .into_iter()
            .chain(CONFIG_PATHS.iter().map(PathBuf::from));

        for path in candidates {
            if !path.exists() {
                continue;
            }
            match Self::from_file(&path) {
                Ok(config) => {
                    log::info!("loaded panel config from {}", path.display());
                    return config;
                }
                Err(e) => log::warn!("{}", e),
            }
        }

        log::warn!("no panel config found, using built-in defaults");
        Self::default()
    }
}
