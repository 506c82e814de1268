//! `toolbelt replace <DEST>` — atomically overwrite a file.

use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use toolbelt_core::TempPlacement;
use toolbelt_fs::{ReplaceOptions, Replacer};

use super::load_config;

/// Arguments for `toolbelt replace`.
#[derive(Args, Debug)]
pub struct ReplaceArgs {
    /// Existing file to overwrite. Its permission bits are kept.
    pub dest: PathBuf,

    /// Read new content from FILE instead of stdin.
    #[arg(long, value_name = "FILE")]
    pub from: Option<PathBuf>,

    /// Skip the write when DEST already holds the new content.
    #[arg(long)]
    pub if_different: bool,

    /// Create the temporary file in DIR (must be on the same volume as DEST).
    #[arg(long, value_name = "DIR", conflicts_with = "system_temp")]
    pub temp_dir: Option<PathBuf>,

    /// Create the temporary file in the system temp directory.
    #[arg(long)]
    pub system_temp: bool,

    /// Keep at most BYTES of new content in memory for --if-different.
    #[arg(long, value_name = "BYTES")]
    pub spool_limit: Option<usize>,

    /// Comparator buffer size in bytes for --if-different.
    #[arg(long, value_name = "BYTES")]
    pub buffer_size: Option<usize>,
}

impl ReplaceArgs {
    pub fn run(self) -> Result<ExitCode> {
        let mut options = ReplaceOptions::from(&load_config()?);
        if let Some(dir) = self.temp_dir.clone() {
            options.temp_placement = TempPlacement::Dir(dir);
        } else if self.system_temp {
            options.temp_placement = TempPlacement::SystemTemp;
        }
        if let Some(limit) = self.spool_limit {
            options.spool_limit = Some(limit);
        }
        if let Some(size) = self.buffer_size {
            options.buffer_size = size;
        }
        let mut replacer = Replacer::new(options).context("invalid replace options")?;

        let replaced = match &self.from {
            Some(path) => {
                let file = File::open(path)
                    .with_context(|| format!("cannot open source '{}'", path.display()))?;
                self.apply(&mut replacer, file)?
            }
            None => self.apply(&mut replacer, io::stdin().lock())?,
        };

        if replaced {
            println!("{} {}", "✎ replaced".green(), self.dest.display());
        } else {
            println!("{} {}", "· unchanged".dimmed(), self.dest.display());
        }
        Ok(ExitCode::SUCCESS)
    }

    fn apply<R: Read>(&self, replacer: &mut Replacer, source: R) -> Result<bool> {
        let context = || format!("replace failed for '{}'", self.dest.display());
        if self.if_different {
            replacer
                .replace_file_if_different(source, &self.dest)
                .with_context(context)
        } else {
            replacer
                .replace_file(source, &self.dest)
                .with_context(context)?;
            Ok(true)
        }
    }
}
