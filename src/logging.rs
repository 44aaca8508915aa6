// src/logging.rs

//! Logging setup for `dirwatch` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. `--verbose` CLI flag (debug)
//! 2. `DIRWATCH_LOG` environment variable (e.g. "info", "debug")
//! 3. the command's default: `debug` for the `debug` command, else `info`
//!
//! The `debug` command logs to STDERR; every other command appends to the
//! configured log file, which stays open across detaching.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::Level;
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::cli::{CliArgs, Command};

/// Initialise global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(args: &CliArgs, logfile: &Path) -> Result<()> {
    let level = resolve_level(args.verbose, std::env::var("DIRWATCH_LOG").ok().as_deref(), args.command);

    let (writer, ansi) = match args.command {
        Command::Debug => (BoxMakeWriter::new(std::io::stderr), true),
        _ => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(logfile)
                .with_context(|| format!("opening log file {:?}", logfile))?;
            (BoxMakeWriter::new(Mutex::new(file)), false)
        }
    };

    let verbose = level >= Level::DEBUG;
    fmt()
        .with_max_level(level)
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(verbose)
        .with_file(verbose)
        .with_line_number(verbose)
        .init();

    Ok(())
}

/// Pick the log level from the flag, the environment value and the
/// command being run.
pub fn resolve_level(verbose: bool, env: Option<&str>, command: Command) -> Level {
    if verbose {
        return Level::DEBUG;
    }
    if let Some(level) = env.and_then(parse_level_str) {
        return level;
    }
    match command {
        Command::Debug => Level::DEBUG,
        _ => Level::INFO,
    }
}

fn parse_level_str(s: &str) -> Option<Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" | "warning" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}
