use crate::error::ConfigError;
use crate::settings::{DensityTier, WindColor, WindTuning};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Optional startup settings read from a JSON file
///
/// Every field may be omitted; command-line flags take precedence over
/// anything set here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub color: Option<WindColor>,
    pub density_mode: Option<bool>,
    pub density_tier: Option<DensityTier>,
    /// Fixed RNG seed for reproducible runs
    pub seed: Option<u64>,
    pub tuning: WindTuning,
}

impl AppConfig {
    /// Import config from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// `<config dir>/cbreeze/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("cbreeze").join("config.json"))
    }

    /// Load an explicit path, or the default file if it exists, or defaults
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load_from_file(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from_file(&path),
            _ => Ok(Self::default()),
        }
    }
}
