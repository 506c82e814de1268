//! `toolbelt config` — show, initialise, and locate the config file.

use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Subcommand;

use toolbelt_core::{config, Config};

use super::load_config;

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration (file + environment) as YAML.
    Show,
    /// Write a default config file.
    Init {
        /// Overwrite an existing config file.
        #[arg(long)]
        force: bool,
    },
    /// Print the config file path.
    Path,
}

pub fn run(command: ConfigCommand) -> Result<ExitCode> {
    match command {
        ConfigCommand::Show => {
            let effective = load_config()?;
            let yaml = serde_yaml::to_string(&effective).context("failed to serialize config")?;
            print!("{yaml}");
        }
        ConfigCommand::Init { force } => {
            let path = config::config_path().context("cannot locate config file")?;
            if path.exists() && !force {
                bail!(
                    "config already exists at {} (use --force to overwrite)",
                    path.display()
                );
            }
            let path = config::save(&Config::default()).context("failed to write config")?;
            println!("✓ Wrote default config to {}", path.display());
        }
        ConfigCommand::Path => {
            let path = config::config_path().context("cannot locate config file")?;
            println!("{}", path.display());
        }
    }
    Ok(ExitCode::SUCCESS)
}
