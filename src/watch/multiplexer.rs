// src/watch/multiplexer.rs

//! One independent delivery task per job.
//!
//! Each task owns its job's event source and feeds every event through
//! [`dispatch`]: filter, render, execute. A synchronous command blocks only
//! its own job's task; the other jobs keep receiving events.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::errors::DirwatchError;
use crate::exec::backend::ExecutorBackend;
use crate::exec::template::render_event_command;
use crate::job::Job;
use crate::watch::filter::{check, Verdict};
use crate::watch::scope::apply_exclusions;
use crate::watch::source::{EventSource, FsEvent, WatchError};

/// Handle one event for one job. Every event kind goes through the same
/// path; the kind only selects the log label.
pub async fn dispatch(job: &Arc<Job>, event: &FsEvent, executor: &dyn ExecutorBackend) {
    info!("{}: {}", event.kind.label(), event.path.display());

    match check(job, event) {
        Verdict::Accept => {}
        Verdict::NotIncluded => {
            debug!(path = ?event.path, "skipped: extension not included");
            return;
        }
        Verdict::ExcludedExtension => {
            debug!(path = ?event.path, "skipped: extension excluded");
            return;
        }
        Verdict::ExcludedPattern => {
            debug!(path = ?event.path, "skipped: name matches exclude_re");
            return;
        }
    }

    let command = match render_event_command(job, event) {
        Ok(command) => command,
        Err(err) => {
            error!(path = ?event.path, error = %err, "failed to render command");
            return;
        }
    };

    if let Err(err) = executor.execute(job, &command).await {
        error!(command = %command, error = %err, "Failed to run command");
    }
}

/// The delivery tasks of every job whose watch could be set up.
#[derive(Debug, Default)]
pub struct WatchMultiplexer {
    tasks: Vec<(String, JoinHandle<()>)>,
}

impl WatchMultiplexer {
    /// Register each job's scope with a fresh source from `make_source` and
    /// spawn its delivery task. A job whose source cannot be created or
    /// registered is skipped with a warning.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<S, F>(jobs: &[Arc<Job>], mut make_source: F, executor: Arc<dyn ExecutorBackend>) -> Self
    where
        S: EventSource,
        F: FnMut(&Job) -> Result<S, WatchError>,
    {
        let mut tasks = Vec::with_capacity(jobs.len());

        for job in jobs {
            let source = match setup_source(job, &mut make_source) {
                Ok(source) => source,
                Err(source) => {
                    let err = DirwatchError::Watch {
                        job: job.name.clone(),
                        source,
                    };
                    warn!(error = %err, "job disabled");
                    continue;
                }
            };

            let span = info_span!("job", name = %job.name);
            let task = tokio::spawn(
                deliver(Arc::clone(job), source, Arc::clone(&executor)).instrument(span),
            );
            tasks.push((job.name.clone(), task));
        }

        info!(jobs = tasks.len(), "watch multiplexer started");
        Self { tasks }
    }

    /// Names of the jobs that have a delivery task, in start order.
    pub fn job_names(&self) -> Vec<&str> {
        self.tasks.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Abort every delivery task. Dropping a task drops its source, which
    /// releases the watches.
    pub async fn shutdown(self) {
        for (name, task) in self.tasks {
            task.abort();
            match task.await {
                Ok(()) => {}
                Err(err) if err.is_cancelled() => {}
                Err(err) => error!(job = %name, error = %err, "delivery task failed"),
            }
        }
        debug!("watch multiplexer stopped");
    }
}

fn setup_source<S, F>(job: &Job, make_source: &mut F) -> Result<S, WatchError>
where
    S: EventSource,
    F: FnMut(&Job) -> Result<S, WatchError>,
{
    let mut source = make_source(job)?;
    let mut watches =
        source.register_watch(&job.watch_path, job.event_mask, job.recursive, job.auto_add)?;
    apply_exclusions(&job.name, &mut source, &mut watches, &job.excluded);
    debug!(
        job = %job.name,
        dirs = watches.len(),
        events = ?job.event_mask.kinds().collect::<Vec<_>>(),
        "watch registered"
    );
    Ok(source)
}

async fn deliver<S: EventSource>(job: Arc<Job>, mut source: S, executor: Arc<dyn ExecutorBackend>) {
    info!(path = %job.watch_path.display(), "watching");
    while let Some(event) = source.next_event().await {
        dispatch(&job, &event, executor.as_ref()).await;
    }
    debug!("event source closed");
}
