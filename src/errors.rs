// src/errors.rs

//! Crate-wide error type.
//!
//! Errors below job scope have their own types (`TemplateError`,
//! `ExecError`) and are logged where they happen. Lifecycle errors (config,
//! lock, stop) propagate to `main`.

use thiserror::Error;

use crate::daemon::pidlock::LockError;
use crate::watch::source::WatchError;

#[derive(Error, Debug)]
pub enum DirwatchError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("PID lock error: {0}")]
    Lock(#[from] LockError),

    #[error("Failed to stop daemon: {0}")]
    StopFailed(String),

    #[error("Watch setup failed for job '{job}': {source}")]
    Watch {
        job: String,
        #[source]
        source: WatchError,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, DirwatchError>;
