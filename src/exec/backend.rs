// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! A job's delivery task talks to an `ExecutorBackend` instead of spawning
//! processes itself. This makes it easy to swap in a fake executor in tests
//! while keeping the production implementation in [`super::executor`].

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::Arc;

use thiserror::Error;

use crate::job::Job;

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("cannot split command line: {command}")]
    Split { command: String },

    #[error("command line is empty")]
    Empty,

    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to wait for command: {0}")]
    Wait(#[source] io::Error),
}

/// Trait abstracting how a rendered command is executed for a job.
///
/// The returned future completes when the job's delivery task may move on
/// to its next event: after the command exited and was reported for
/// synchronous jobs, right after the spawn for background jobs.
pub trait ExecutorBackend: Send + Sync {
    fn execute<'a>(
        &'a self,
        job: &'a Arc<Job>,
        command: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<(), ExecError>> + Send + 'a>>;
}
