//! Toolbelt — byte-exact file comparison and atomic file replacement.
//!
//! # Usage
//!
//! ```text
//! toolbelt cmp <A> <B> [--buffer-size N] [--json]
//! toolbelt replace <DEST> [--from FILE] [--if-different] [--temp-dir DIR | --system-temp]
//! toolbelt config show|init|path
//! ```
//!
//! Exit status: 0 on success (for `cmp`: files equal), 1 when `cmp` finds a
//! difference, 2 on error.

mod commands;

use std::process::ExitCode;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

use commands::{cmp::CmpArgs, config::ConfigCommand, replace::ReplaceArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "toolbelt",
    version,
    about = "Compare files byte for byte and replace them atomically",
    long_about = None,
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check whether two files hold exactly the same bytes.
    Cmp(CmpArgs),

    /// Atomically replace an existing file with new content.
    Replace(ReplaceArgs),

    /// Inspect or initialise ~/.toolbelt/config.yaml.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

/// Exit status for errors, distinct from "files differ".
const EXIT_ERROR: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<ExitCode> = match cli.command {
        Commands::Cmp(args) => args.run(),
        Commands::Replace(args) => args.run(),
        Commands::Config { command } => commands::config::run(command),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
