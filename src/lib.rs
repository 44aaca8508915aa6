// src/lib.rs

pub mod cli;
pub mod config;
pub mod daemon;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod job;
pub mod logging;
pub mod types;
pub mod watch;

use std::sync::Arc;

use tracing::info;

use crate::cli::{CliArgs, Command};
use crate::config::{load_and_validate, ConfigFile};
use crate::daemon::{DaemonController, DaemonOptions, Detach, ForkDetach, NoDetach, PidLock, Runner};
use crate::engine::{run_blocking, Engine};
use crate::errors::Result;
use crate::fs::{FileSystem, RealFileSystem};
use crate::job::build_jobs;

/// Load the config named on the command line, or the first default one.
pub fn load_config(args: &CliArgs) -> Result<ConfigFile> {
    match &args.config {
        Some(path) => load_and_validate(path),
        None => config::loader::load_default(),
    }
}

/// High-level entry point used by `main.rs`.
///
/// Must be called before any thread or async runtime is started: `start`
/// and `restart` fork. The engine builds its own runtime once the process
/// is detached.
pub fn run(args: &CliArgs, cfg: ConfigFile) -> Result<()> {
    // `stop` never runs the engine; skip compiling the jobs.
    let jobs = match args.command {
        Command::Stop => Vec::new(),
        _ => build_jobs(&cfg)?,
    };

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let runner: Runner = Box::new(move || run_blocking(Engine::new(jobs.clone(), Arc::clone(&fs))));

    let detach: Box<dyn Detach> = match args.command {
        Command::Debug => Box::new(NoDetach),
        _ => Box::new(ForkDetach),
    };

    let controller = DaemonController::new(
        PidLock::new(&cfg.daemon.pidfile)?,
        DaemonOptions::from_section(&cfg.daemon),
        detach,
        runner,
    );

    match args.command {
        Command::Start => controller.start(),
        Command::Stop => controller.stop(),
        Command::Restart => controller.restart(),
        Command::Debug => {
            info!("Press Control+C to quit...");
            controller.run()
        }
    }
}
