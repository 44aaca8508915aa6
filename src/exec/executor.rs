// src/exec/executor.rs

//! Production executor: runs commands as real processes.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use tokio::process::Command;
use tracing::info;

use crate::exec::backend::{ExecError, ExecutorBackend};
use crate::exec::command::{exit_code, spawn_captured, CapturedChild};
use crate::exec::report::{ExitReport, StatusReporter};
use crate::exec::supervisor::{ChildTable, TrackedChild};
use crate::job::Job;

#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    children: ChildTable,
    reporter: Arc<StatusReporter>,
}

impl ProcessExecutor {
    pub fn new(children: ChildTable, reporter: Arc<StatusReporter>) -> Self {
        Self { children, reporter }
    }

    pub fn children(&self) -> &ChildTable {
        &self.children
    }

    async fn run_foreground(&self, job: &Arc<Job>, command: &str) -> Result<(), ExecError> {
        info!(job = %job.name, "Running command: '{command}'");
        let child = spawn_command(command)?;
        let (status, output) = child.wait_with_output().await.map_err(ExecError::Wait)?;

        let exit = ExitReport {
            pid: None,
            code: exit_code(status),
        };
        self.reporter.report(job, exit, &output).await;
        Ok(())
    }

    fn run_background(&self, job: &Arc<Job>, command: &str) -> Result<(), ExecError> {
        let process = spawn_command(command)?;
        // A spawned child always has a pid until it is reaped.
        let pid = process.id().unwrap_or_default();
        info!(job = %job.name, "Executed child ({pid}): '{command}'");

        self.children.insert(TrackedChild {
            pid,
            job: Arc::clone(job),
            command: command.to_string(),
            spawned_at: Instant::now(),
            process,
        });
        Ok(())
    }
}

impl ExecutorBackend for ProcessExecutor {
    fn execute<'a>(
        &'a self,
        job: &'a Arc<Job>,
        command: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<(), ExecError>> + Send + 'a>> {
        Box::pin(async move {
            if job.background {
                self.run_background(job, command)
            } else {
                self.run_foreground(job, command).await
            }
        })
    }
}

/// Split a rendered command line into argv and spawn it.
pub fn spawn_command(command: &str) -> Result<CapturedChild, ExecError> {
    let argv = split_command(command)?;
    let (program, args) = argv.split_first().ok_or(ExecError::Empty)?;

    let mut cmd = Command::new(program);
    cmd.args(args);
    spawn_captured(cmd).map_err(|source| ExecError::Spawn {
        program: program.clone(),
        source,
    })
}

/// Shell-style word splitting of a rendered command.
pub fn split_command(command: &str) -> Result<Vec<String>, ExecError> {
    shlex::split(command).ok_or_else(|| ExecError::Split {
        command: command.to_string(),
    })
}
