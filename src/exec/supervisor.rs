// src/exec/supervisor.rs

//! Tracking of background children and the loop that reaps them.

use std::collections::HashMap;
use std::process::ExitStatus;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::exec::command::{collect_output, exit_code, CapturedChild};
use crate::exec::report::{ExitReport, StatusReporter};
use crate::job::Job;

/// How often the supervisor scans the child table.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A background command that has been spawned and not yet reaped.
#[derive(Debug)]
pub struct TrackedChild {
    pub pid: u32,
    pub job: Arc<Job>,
    pub command: String,
    pub spawned_at: Instant,
    pub process: CapturedChild,
}

/// Background children keyed by pid, shared between the executor (inserts)
/// and the supervisor (removals).
#[derive(Debug, Clone, Default)]
pub struct ChildTable {
    inner: Arc<Mutex<HashMap<u32, TrackedChild>>>,
}

impl ChildTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<u32, TrackedChild>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn insert(&self, child: TrackedChild) {
        self.lock().insert(child.pid, child);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn contains(&self, pid: u32) -> bool {
        self.lock().contains_key(&pid)
    }

    /// Pids of the children still tracked, in ascending order.
    pub fn pids(&self) -> Vec<u32> {
        let mut pids: Vec<u32> = self.lock().keys().copied().collect();
        pids.sort_unstable();
        pids
    }

    /// Remove and return every child whose exit status is available.
    pub fn reap_finished(&self) -> Vec<(TrackedChild, ExitStatus)> {
        let mut table = self.lock();
        let mut finished = Vec::new();

        for (pid, tracked) in table.iter_mut() {
            match tracked.process.child.try_wait() {
                Ok(Some(status)) => finished.push((*pid, status)),
                Ok(None) => {}
                Err(err) => {
                    warn!(pid, job = %tracked.job.name, error = %err, "failed to poll child");
                }
            }
        }

        finished
            .into_iter()
            .filter_map(|(pid, status)| table.remove(&pid).map(|c| (c, status)))
            .collect()
    }
}

/// Handle to the running supervisor loop.
#[derive(Debug)]
pub struct SupervisorHandle {
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl SupervisorHandle {
    /// Stop the loop after its current scan. Children still in the table
    /// are left running.
    pub async fn shutdown(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Err(err) = self.task.await {
            error!(error = %err, "process supervisor task failed");
        }
    }
}

/// Spawn the loop that reconciles finished background children every
/// `interval` and reports their status.
pub fn spawn_supervisor(
    table: ChildTable,
    reporter: Arc<StatusReporter>,
    interval: Duration,
) -> SupervisorHandle {
    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        info!("process supervisor started");
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    for (tracked, status) in table.reap_finished() {
                        report_child(tracked, status, &reporter).await;
                    }
                }
                _ = &mut stop_rx => break,
            }
        }
        debug!(remaining = table.len(), "process supervisor stopped");
    });

    SupervisorHandle {
        stop: Some(stop_tx),
        task,
    }
}

async fn report_child(tracked: TrackedChild, status: ExitStatus, reporter: &StatusReporter) {
    let TrackedChild {
        pid,
        job,
        command,
        spawned_at,
        process,
    } = tracked;

    let output = match collect_output(process.output).await {
        Ok(output) => output,
        Err(err) => {
            error!(pid, job = %job.name, error = %err, "failed to collect children output");
            Vec::new()
        }
    };

    debug!(
        pid,
        job = %job.name,
        command = %command,
        elapsed_ms = spawned_at.elapsed().as_millis() as u64,
        "background child exited"
    );

    let exit = ExitReport {
        pid: Some(pid),
        code: exit_code(status),
    };
    reporter.report(&job, exit, &output).await;
}
