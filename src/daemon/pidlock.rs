// src/daemon/pidlock.rs

//! PID lock file: one pid followed by a newline.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use nix::errno::Errno;
use nix::sys::signal::kill;
use nix::unistd::Pid;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum LockError {
    #[error("PID file path must be absolute: {0:?}")]
    NotAbsolute(PathBuf),

    #[error("PID file is already locked by pid {pid}")]
    AlreadyLocked { pid: u32 },

    #[error("PID file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// What the lock file says about the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    Unlocked,
    /// Held by this very process.
    LockedBySelf(u32),
    /// Held by another process that is still alive.
    LockedByOther(u32),
    /// The file exists but its owner is gone, or its content is not a pid.
    Stale(Option<u32>),
}

#[derive(Debug, Clone)]
pub struct PidLock {
    path: PathBuf,
}

impl PidLock {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, LockError> {
        let path = path.into();
        if !path.is_absolute() {
            return Err(LockError::NotAbsolute(path));
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> LockError {
        LockError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// Read the pid from the file. `Ok(None)` when the file does not exist,
    /// `Ok(Some(None))` when its content is not a pid.
    pub fn read_pid(&self) -> Result<Option<Option<u32>>, LockError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(content.trim().parse::<u32>().ok().filter(|p| *p > 0))),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(self.io_error(err)),
        }
    }

    pub fn state(&self) -> Result<LockState, LockError> {
        let state = match self.read_pid()? {
            None => LockState::Unlocked,
            Some(None) => LockState::Stale(None),
            Some(Some(pid)) if pid == std::process::id() => LockState::LockedBySelf(pid),
            Some(Some(pid)) if process_alive(pid) => LockState::LockedByOther(pid),
            Some(Some(pid)) => LockState::Stale(Some(pid)),
        };
        debug!(path = ?self.path, ?state, "checked pid lock");
        Ok(state)
    }

    /// Create the file exclusively and write `pid` into it.
    pub fn acquire(&self, pid: u32) -> Result<(), LockError> {
        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
        {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                let holder = self.read_pid()?.flatten().unwrap_or_default();
                return Err(LockError::AlreadyLocked { pid: holder });
            }
            Err(err) => return Err(self.io_error(err)),
        };
        writeln!(file, "{pid}").map_err(|err| self.io_error(err))?;
        Ok(())
    }

    /// Remove the file regardless of who holds it.
    pub fn break_lock(&self) -> Result<(), LockError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(self.io_error(err)),
        }
    }

    /// Remove the file if this process holds it. Returns whether it did.
    pub fn release_if_owned(&self) -> Result<bool, LockError> {
        match self.read_pid()? {
            Some(Some(pid)) if pid == std::process::id() => {
                self.break_lock()?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// Probe `pid` with signal 0. Only `ESRCH` means the process is gone; a
/// permission error still proves it exists.
pub fn process_alive(pid: u32) -> bool {
    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };
    !matches!(kill(Pid::from_raw(raw), None), Err(Errno::ESRCH))
}
