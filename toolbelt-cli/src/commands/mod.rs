pub mod cmp;
pub mod config;
pub mod replace;

use anyhow::{Context, Result};
use toolbelt_core::Config;

/// Configuration from `~/.toolbelt/config.yaml` with environment overrides applied.
pub(crate) fn load_config() -> Result<Config> {
    let config = toolbelt_core::config::load()
        .context("failed to load ~/.toolbelt/config.yaml")?
        .apply_env()
        .context("invalid environment override")?;
    tracing::debug!("effective config: {config:?}");
    Ok(config)
}
