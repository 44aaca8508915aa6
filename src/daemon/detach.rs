// src/daemon/detach.rs

//! Turning the current process into a background daemon.

use std::fs::{File, OpenOptions};
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};

use nix::sys::stat::{umask, Mode};
use nix::sys::wait::waitpid;
use nix::unistd::{chdir, dup2, fork, setgid, setsid, setuid, ForkResult, Gid, Uid};
use tracing::warn;

use crate::config::DaemonSection;
use crate::errors::{DirwatchError, Result};

const DEV_NULL: &str = "/dev/null";

/// Which side of the detach the caller is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detached {
    /// The original process; it should return without doing anything else.
    Parent,
    /// The process that goes on as the daemon.
    Daemon,
}

/// Process-level settings applied when detaching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonOptions {
    pub umask: u32,
    pub working_directory: PathBuf,
    pub uid: Option<u32>,
    pub gid: Option<u32>,
    pub stdout: Option<PathBuf>,
    pub stderr: Option<PathBuf>,
}

impl Default for DaemonOptions {
    fn default() -> Self {
        Self {
            umask: 0,
            working_directory: PathBuf::from("/"),
            uid: None,
            gid: None,
            stdout: None,
            stderr: None,
        }
    }
}

impl DaemonOptions {
    pub fn from_section(section: &DaemonSection) -> Self {
        let working_directory = match &section.working_directory {
            Some(dir) if dir.is_dir() => dir.clone(),
            Some(dir) => {
                warn!(?dir, "working directory is not a directory; using '/'");
                PathBuf::from("/")
            }
            None => PathBuf::from("/"),
        };

        Self {
            umask: section.umask.unwrap_or(0),
            working_directory,
            uid: section.uid,
            gid: section.gid,
            stdout: section.stdout.clone(),
            stderr: section.stderr.clone(),
        }
    }
}

/// Capability to detach from the controlling terminal.
pub trait Detach: Send + Sync {
    fn detach(&self, options: &DaemonOptions) -> Result<Detached>;
}

/// Classic double fork. Must run before any thread is started.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForkDetach;

impl Detach for ForkDetach {
    fn detach(&self, options: &DaemonOptions) -> Result<Detached> {
        // SAFETY: called from the single-threaded part of `main`, before the
        // async runtime exists.
        match unsafe { fork() }.map_err(std::io::Error::from)? {
            ForkResult::Parent { child } => {
                waitpid(child, None).map_err(std::io::Error::from)?;
                return Ok(Detached::Parent);
            }
            ForkResult::Child => {}
        }

        setsid().map_err(std::io::Error::from)?;

        // SAFETY: still single-threaded, see above.
        match unsafe { fork() }.map_err(std::io::Error::from)? {
            ForkResult::Parent { .. } => std::process::exit(0),
            ForkResult::Child => {}
        }

        umask(Mode::from_bits_truncate(options.umask));
        chdir(options.working_directory.as_path()).map_err(std::io::Error::from)?;

        if let Some(gid) = options.gid {
            setgid(Gid::from_raw(gid)).map_err(|e| {
                DirwatchError::ConfigError(format!("cannot switch to gid {gid}: {e}"))
            })?;
        }
        if let Some(uid) = options.uid {
            setuid(Uid::from_raw(uid)).map_err(|e| {
                DirwatchError::ConfigError(format!("cannot switch to uid {uid}: {e}"))
            })?;
        }

        redirect_std_streams(options)?;
        Ok(Detached::Daemon)
    }
}

/// Stay in the foreground. Used by tests and by `debug`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDetach;

impl Detach for NoDetach {
    fn detach(&self, _options: &DaemonOptions) -> Result<Detached> {
        Ok(Detached::Daemon)
    }
}

fn redirect_std_streams(options: &DaemonOptions) -> Result<()> {
    let stdin = File::open(DEV_NULL)?;
    let stdout = open_sink(options.stdout.as_deref())?;
    let stderr = open_sink(options.stderr.as_deref())?;

    dup2(stdin.as_raw_fd(), 0).map_err(std::io::Error::from)?;
    dup2(stdout.as_raw_fd(), 1).map_err(std::io::Error::from)?;
    dup2(stderr.as_raw_fd(), 2).map_err(std::io::Error::from)?;
    Ok(())
}

fn open_sink(path: Option<&Path>) -> Result<File> {
    let path = path.unwrap_or_else(|| Path::new(DEV_NULL));
    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}
