// src/engine/mod.rs

//! The running daemon: watch multiplexer plus process supervisor.
//!
//! The engine owns no process-level state (no PID lock, no detaching); the
//! daemon controller decides when it runs.

use std::future::Future;
use std::sync::Arc;

use tokio::signal::unix::{signal, SignalKind};
use tracing::{info, warn};

use crate::errors::Result;
use crate::exec::backend::ExecutorBackend;
use crate::exec::executor::ProcessExecutor;
use crate::exec::report::StatusReporter;
use crate::exec::supervisor::{spawn_supervisor, ChildTable, POLL_INTERVAL};
use crate::fs::FileSystem;
use crate::job::Job;
use crate::watch::multiplexer::WatchMultiplexer;
use crate::watch::inotify_source::InotifyEventSource;
use crate::watch::source::{EventSource, WatchError};

#[derive(Debug)]
pub struct Engine {
    jobs: Vec<Arc<Job>>,
    fs: Arc<dyn FileSystem>,
}

impl Engine {
    pub fn new(jobs: Vec<Arc<Job>>, fs: Arc<dyn FileSystem>) -> Self {
        Self { jobs, fs }
    }

    pub fn jobs(&self) -> &[Arc<Job>] {
        &self.jobs
    }

    /// Watch with inotify until SIGTERM or SIGINT.
    pub async fn run(self) -> Result<()> {
        let fs = Arc::clone(&self.fs);
        let shutdown = wait_for_termination()?;
        self.run_until(move |_| InotifyEventSource::new(Arc::clone(&fs)), shutdown)
            .await;
        Ok(())
    }

    /// Run until `shutdown` completes, creating one event source per job
    /// with `make_source`.
    pub async fn run_until<S, F>(self, make_source: F, shutdown: impl Future<Output = ()>)
    where
        S: EventSource,
        F: FnMut(&Job) -> std::result::Result<S, WatchError>,
    {
        let reporter = Arc::new(StatusReporter::for_local_host(Arc::clone(&self.fs)));
        let children = ChildTable::new();
        let supervisor = spawn_supervisor(children.clone(), Arc::clone(&reporter), POLL_INTERVAL);

        let executor: Arc<dyn ExecutorBackend> =
            Arc::new(ProcessExecutor::new(children.clone(), reporter));
        let multiplexer = WatchMultiplexer::start(&self.jobs, make_source, executor);
        if multiplexer.is_empty() {
            warn!("no job could be started; waiting for termination anyway");
        }

        shutdown.await;
        info!("shutting down");

        multiplexer.shutdown().await;
        supervisor.shutdown().await;
        if !children.is_empty() {
            info!(pids = ?children.pids(), "leaving background children running");
        }
    }
}

/// Completes on the first SIGTERM or SIGINT. The handlers are installed
/// before this returns, so a signal arriving early is not lost.
fn wait_for_termination() -> Result<impl Future<Output = ()>> {
    let mut term = signal(SignalKind::terminate())?;
    let mut int = signal(SignalKind::interrupt())?;
    Ok(async move {
        tokio::select! {
            _ = term.recv() => info!("received SIGTERM"),
            _ = int.recv() => info!("received SIGINT"),
        }
    })
}

/// Build a multi-threaded runtime and run `engine` on it until it is
/// terminated. Background children outlive the runtime.
pub fn run_blocking(engine: Engine) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("dirwatch-worker")
        .build()?;
    let result = runtime.block_on(engine.run());
    runtime.shutdown_background();
    result
}
