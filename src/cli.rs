// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `dirwatch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "dirwatch",
    version,
    about = "Run commands when files change in watched directories.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `/etc/dirwatch.toml`, then `~/.dirwatch.toml`.
    #[arg(short = 'c', long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log at debug level (overrides `DIRWATCH_LOG`).
    #[arg(short, long)]
    pub verbose: bool,

    /// What to do with the daemon.
    #[arg(value_enum)]
    pub command: Command,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum Command {
    /// Detach and run in the background.
    Start,
    /// Terminate the running daemon.
    Stop,
    /// Stop, then start.
    Restart,
    /// Run in the foreground, logging to stderr.
    Debug,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
