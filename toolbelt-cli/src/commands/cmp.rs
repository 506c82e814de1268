//! `toolbelt cmp <A> <B>` — byte-exact file comparison.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use toolbelt_fs::{compare_files_with, FileComparison, StreamComparator};

use super::load_config;

/// Arguments for `toolbelt cmp`.
#[derive(Args, Debug)]
pub struct CmpArgs {
    /// First file.
    pub a: PathBuf,

    /// Second file.
    pub b: PathBuf,

    /// Comparator buffer size in bytes (overrides config and TOOLBELT_BUFFER_SIZE).
    #[arg(long, value_name = "BYTES")]
    pub buffer_size: Option<usize>,

    /// Emit a JSON object instead of a human-readable line.
    #[arg(long)]
    pub json: bool,

    /// Print nothing; report only through the exit status.
    #[arg(long, short = 'q', conflicts_with = "json")]
    pub quiet: bool,
}

#[derive(Debug, Serialize)]
struct CmpJson {
    a: PathBuf,
    b: PathBuf,
    equal: bool,
    decided_by: &'static str,
}

impl CmpArgs {
    pub fn run(self) -> Result<ExitCode> {
        let buffer_size = match self.buffer_size {
            Some(size) => size,
            None => load_config()?.buffer_size,
        };
        let mut comparator =
            StreamComparator::new(buffer_size).context("invalid --buffer-size")?;

        let outcome = compare_files_with(&mut comparator, &self.a, &self.b).with_context(|| {
            format!(
                "cannot compare '{}' and '{}'",
                self.a.display(),
                self.b.display()
            )
        })?;

        if self.json {
            let payload = CmpJson {
                a: self.a.clone(),
                b: self.b.clone(),
                equal: outcome.is_equal(),
                decided_by: decided_by(outcome),
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).context("failed to serialize cmp JSON")?
            );
        } else if !self.quiet {
            let verdict = if outcome.is_equal() {
                "equal".green().bold()
            } else {
                "differ".red().bold()
            };
            println!(
                "{} {} {} ({})",
                self.a.display(),
                self.b.display(),
                verdict,
                decided_by(outcome).replace('_', " ")
            );
        }

        Ok(if outcome.is_equal() {
            ExitCode::SUCCESS
        } else {
            ExitCode::from(1)
        })
    }
}

fn decided_by(outcome: FileComparison) -> &'static str {
    match outcome {
        FileComparison::SameFile => "same_file",
        FileComparison::SizeMismatch => "size_mismatch",
        FileComparison::ContentEqual | FileComparison::ContentDiffers => "content",
    }
}
