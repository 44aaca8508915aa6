// src/daemon/controller.rs

//! The single-instance daemon state machine: start, stop, restart, run.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tracing::{debug, error, info};

use crate::daemon::detach::{DaemonOptions, Detach, Detached};
use crate::daemon::pidlock::{process_alive, LockError, LockState, PidLock};
use crate::errors::{DirwatchError, Result};

/// How long `stop` waits between SIGTERM and the liveness probe.
pub const STOP_GRACE: Duration = Duration::from_millis(200);

/// What the daemon does once it is running. Returns when it was asked to
/// terminate.
pub type Runner = Box<dyn Fn() -> Result<()> + Send + Sync>;

pub struct DaemonController {
    lock: PidLock,
    options: DaemonOptions,
    detach: Box<dyn Detach>,
    runner: Runner,
    guard: Mutex<()>,
}

impl std::fmt::Debug for DaemonController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DaemonController")
            .field("lock", &self.lock)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl DaemonController {
    pub fn new(
        lock: PidLock,
        options: DaemonOptions,
        detach: Box<dyn Detach>,
        runner: Runner,
    ) -> Self {
        Self {
            lock,
            options,
            detach,
            runner,
            guard: Mutex::new(()),
        }
    }

    pub fn lock(&self) -> &PidLock {
        &self.lock
    }

    fn serialize(&self) -> MutexGuard<'_, ()> {
        self.guard.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Start the daemon unless a live instance holds the lock. Returns once
    /// the daemon has been terminated (or immediately in the detaching
    /// parent).
    pub fn start(&self) -> Result<()> {
        {
            let _guard = self.serialize();
            match self.lock.state()? {
                LockState::Unlocked => {}
                LockState::Stale(pid) => {
                    info!(?pid, "Removing stale PID file {:?}", self.lock.path());
                    self.lock.break_lock()?;
                }
                LockState::LockedBySelf(pid) | LockState::LockedByOther(pid) => {
                    info!("Daemon already running with PID {pid}");
                    return Ok(());
                }
            }
        }

        if self.detach.detach(&self.options)? == Detached::Parent {
            return Ok(());
        }

        let pid = std::process::id();
        {
            let _guard = self.serialize();
            match self.lock.acquire(pid) {
                Ok(()) => {}
                Err(LockError::AlreadyLocked { pid: holder }) => {
                    info!(holder, "PID file {:?} already locked", self.lock.path());
                    return Ok(());
                }
                Err(err) => return Err(err.into()),
            }
        }
        info!("Daemon started with pid {pid}");

        let result = self.run();

        let _guard = self.serialize();
        match self.lock.release_if_owned() {
            Ok(true) => debug!("released PID file"),
            Ok(false) => debug!("PID file no longer ours; left in place"),
            Err(err) => error!(error = %err, "failed to release PID file"),
        }
        result
    }

    /// Terminate the instance holding the lock and remove the lock.
    pub fn stop(&self) -> Result<()> {
        let _guard = self.serialize();
        match self.lock.state()? {
            LockState::Unlocked => {
                info!("PID file {:?} not locked", self.lock.path());
                return Ok(());
            }
            LockState::Stale(pid) => {
                info!(?pid, "Removing stale PID file {:?}", self.lock.path());
            }
            LockState::LockedBySelf(_) => {
                self.lock.release_if_owned()?;
                info!("Daemon stopped");
                return Ok(());
            }
            LockState::LockedByOther(pid) => terminate(pid)?,
        }

        self.lock.break_lock()?;
        info!("Daemon stopped");
        Ok(())
    }

    pub fn restart(&self) -> Result<()> {
        self.stop()?;
        self.start()
    }

    /// Run in the foreground until terminated. Does not touch the lock.
    pub fn run(&self) -> Result<()> {
        (self.runner)()
    }
}

/// SIGTERM `pid`, give it [`STOP_GRACE`] to exit, then check it is gone.
fn terminate(pid: u32) -> Result<()> {
    let raw = i32::try_from(pid)
        .map_err(|_| DirwatchError::StopFailed(format!("invalid pid {pid}")))?;

    kill(Pid::from_raw(raw), Signal::SIGTERM)
        .map_err(|e| DirwatchError::StopFailed(format!("cannot signal pid {pid}: {e}")))?;
    debug!(pid, "sent SIGTERM");

    std::thread::sleep(STOP_GRACE);
    if process_alive(pid) {
        return Err(DirwatchError::StopFailed(format!(
            "process {pid} is still running"
        )));
    }
    info!(pid, "Process {pid} terminated");
    Ok(())
}
