//! Error types for toolbelt-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure (permission denied, read-only home, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization error (save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load; includes file path and line context from serde_yaml.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `dirs::home_dir()` returned `None`, so `~/.toolbelt/` cannot be located.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    /// A value that parsed fine but cannot be used (zero buffer size, ...).
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
