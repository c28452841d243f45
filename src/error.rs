use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building the engine configuration.
///
/// All of these are reported before the terminal is switched into raw mode;
/// nothing inside the running simulation produces them.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Color name outside the supported set.
    #[error("unknown wind color '{0}' (expected one of: cyan, blue, white, magenta, green, yellow, red)")]
    UnknownColor(String),

    /// Density tier name other than normal/high.
    #[error("unknown density tier '{0}' (expected normal or high)")]
    UnknownTier(String),

    /// A tuning value is out of its valid domain.
    #[error("invalid tuning: {0}")]
    InvalidTuning(String),

    /// The config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid JSON for `AppConfig`.
    #[error("failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
