//! Toolbelt configuration.
//!
//! # Storage layout
//!
//! ```text
//! ~/.toolbelt/
//!   config.yaml   (mode 0600, optional; defaults apply when absent)
//! ```
//!
//! # Precedence
//!
//! CLI flags > `TOOLBELT_BUFFER_SIZE` > `config.yaml` > built-in defaults.
//!
//! # API pattern
//!
//! Like the rest of the workspace, every I/O function has two forms:
//! - `fn_at(home: &Path, …)` — explicit home; used in tests with `TempDir`
//! - `fn(…)` — derives home from `dirs::home_dir()`, delegates to `_at`

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Buffer size used by the shared default comparator.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 4 * 1024;

/// Environment variable overriding [`Config::buffer_size`].
pub const BUFFER_SIZE_ENV: &str = "TOOLBELT_BUFFER_SIZE";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Where the replacer creates its temporary file.
///
/// Rename is only atomic within one volume, so the default keeps the
/// temporary file next to the destination.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TempPlacement {
    /// Same directory as the destination.
    #[default]
    SameDirectory,
    /// `std::env::temp_dir()`. Rename fails if it is on another volume.
    SystemTemp,
    /// An explicit directory.
    Dir(PathBuf),
}

/// Effective toolbelt configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Scratch buffer size (bytes) for stream comparison.
    pub buffer_size: usize,
    /// Temporary file placement for atomic replacement.
    pub temp_placement: TempPlacement,
    /// Max bytes of candidate content held in memory by
    /// replace-if-different before spilling to disk. `None` = unbounded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spool_limit: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_READ_BUFFER_SIZE,
            temp_placement: TempPlacement::default(),
            spool_limit: None,
        }
    }
}

impl Config {
    /// Reject values that parse but cannot be used.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buffer_size == 0 {
            return Err(ConfigError::Invalid("buffer_size must be > 0".into()));
        }
        if self.spool_limit == Some(0) {
            return Err(ConfigError::Invalid(
                "spool_limit must be > 0 when set".into(),
            ));
        }
        Ok(())
    }

    /// Apply environment overrides, reading variables through `lookup`.
    pub fn apply_env_with<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(BUFFER_SIZE_ENV) {
            let size = raw.trim().parse::<usize>().map_err(|e| {
                ConfigError::Invalid(format!("{BUFFER_SIZE_ENV}='{raw}': {e}"))
            })?;
            self.buffer_size = size;
        }
        self.validate()?;
        Ok(self)
    }

    /// [`Config::apply_env_with`] against the process environment.
    pub fn apply_env(self) -> Result<Self, ConfigError> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// `<home>/.toolbelt/config.yaml` — pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    home.join(".toolbelt").join("config.yaml")
}

/// `config_path_at` convenience wrapper.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    Ok(config_path_at(&home()?))
}

// ---------------------------------------------------------------------------
// Load / save
// ---------------------------------------------------------------------------

/// Load `<home>/.toolbelt/config.yaml`.
///
/// Returns [`Config::default`] if the file does not exist,
/// `ConfigError::Parse` (with path) if it is malformed and
/// `ConfigError::Invalid` if a value is out of range.
pub fn load_at(home: &Path) -> Result<Config, ConfigError> {
    let path = config_path_at(home);
    if !path.exists() {
        return Ok(Config::default());
    }
    let contents = std::fs::read_to_string(&path)?;
    // An empty file deserializes as YAML null, which serde_yaml rejects for a struct.
    if contents.trim().is_empty() {
        return Ok(Config::default());
    }
    let config: Config =
        serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse { path, source: e })?;
    config.validate()?;
    Ok(config)
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<Config, ConfigError> {
    load_at(&home()?)
}

/// Save `config` to `<home>/.toolbelt/config.yaml` atomically.
///
/// Writes `config.yaml.tmp` (mode 0600) then renames it over the target.
/// Returns the final path.
pub fn save_at(home: &Path, config: &Config) -> Result<PathBuf, ConfigError> {
    config.validate()?;
    let path = config_path_at(home);
    if let Some(dir) = path.parent() {
        if !dir.exists() {
            std::fs::create_dir_all(dir)?;
            set_dir_permissions(dir)?;
        }
    }
    let tmp_path = path.with_file_name("config.yaml.tmp");

    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(&tmp_path, yaml)?;
    set_file_permissions(&tmp_path)?;
    std::fs::rename(&tmp_path, &path)?;
    Ok(path)
}

/// `save_at` convenience wrapper.
pub fn save(config: &Config) -> Result<PathBuf, ConfigError> {
    save_at(&home()?, config)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))?;
    Ok(())
}
#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
