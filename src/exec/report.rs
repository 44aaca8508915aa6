// src/exec/report.rs

//! Reporting the outcome of a finished command: post actions, log lines,
//! output logging.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::exec::command::run_shell;
use crate::exec::decode::decode_output;
use crate::exec::template::render_action;
use crate::fs::FileSystem;
use crate::job::Job;

/// How a command ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitReport {
    /// Set for background children; used in log messages.
    pub pid: Option<u32>,
    pub code: i32,
}

impl ExitReport {
    pub fn success(&self) -> bool {
        self.code == 0
    }

    fn prefix(&self) -> String {
        match self.pid {
            Some(pid) => format!("Child {pid}"),
            None => "Command".to_string(),
        }
    }
}

/// Shared by the synchronous executor path and the process supervisor.
#[derive(Debug, Clone)]
pub struct StatusReporter {
    fs: Arc<dyn FileSystem>,
    host: String,
}

impl StatusReporter {
    pub fn new(fs: Arc<dyn FileSystem>, host: impl Into<String>) -> Self {
        Self {
            fs,
            host: host.into(),
        }
    }

    /// Reporter using this machine's hostname.
    pub fn for_local_host(fs: Arc<dyn FileSystem>) -> Self {
        let host = match nix::unistd::gethostname() {
            Ok(name) => name.to_string_lossy().into_owned(),
            Err(err) => {
                warn!(error = %err, "failed to read hostname; using 'localhost'");
                "localhost".to_string()
            }
        };
        Self::new(fs, host)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub async fn report(&self, job: &Job, exit: ExitReport, output: &[u8]) {
        let prefix = exit.prefix();
        if exit.success() {
            self.post_action(job.action_on_success.as_deref(), job, output)
                .await;
            info!(job = %job.name, "{prefix} finished successfully");
        } else {
            self.post_action(job.action_on_failure.as_deref(), job, output)
                .await;
            info!(
                job = %job.name,
                "{prefix} failed, return code was {}",
                exit.code
            );
        }

        if job.log_output {
            self.log_output(job, output).await;
        }
    }

    async fn log_output(&self, job: &Job, output: &[u8]) {
        match &job.outfile {
            Some(path) => {
                let fs = Arc::clone(&self.fs);
                let target = path.clone();
                let contents = output.to_vec();
                match tokio::task::spawn_blocking(move || fs.append(&target, &contents)).await {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => {
                        error!(job = %job.name, ?path, error = %format!("{err:#}"), "failed to write command output");
                    }
                    Err(err) => {
                        error!(job = %job.name, ?path, error = %err, "output writer task failed");
                    }
                }
            }
            None => info!(
                job = %job.name,
                "Output was: '{}'",
                String::from_utf8_lossy(output)
            ),
        }
    }

    async fn post_action(&self, template: Option<&str>, job: &Job, output: &[u8]) {
        let Some(template) = template else {
            return;
        };

        let text = decode_output(output);
        let command = match render_action(template, &job.name, &self.host, &text) {
            Ok(c) => c,
            Err(err) => {
                error!(job = %job.name, template = %template, error = %err, "failed to render post action");
                return;
            }
        };

        match run_shell(&command).await {
            Ok((0, out)) => {
                debug!(job = %job.name, "post action succeed: '{}'", String::from_utf8_lossy(&out));
            }
            Ok((code, out)) => {
                error!(
                    job = %job.name,
                    "post action failed, return code was {code}: '{}'",
                    String::from_utf8_lossy(&out)
                );
            }
            Err(err) => {
                error!(job = %job.name, command = %command, error = %err, "failed to run post action");
            }
        }
    }
}
