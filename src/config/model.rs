// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [daemon]
/// pidfile = "/tmp/dirwatch.pid"
/// logfile = "/tmp/dirwatch.log"
///
/// [job.incoming]
/// watch = "/srv/incoming"
/// events = ["create", "move_to"]
/// command = "process ${filename}"
/// ```
///
/// This is the unvalidated form; see [`ConfigFile`].
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    /// Process-level settings from `[daemon]`.
    #[serde(default)]
    pub daemon: DaemonSection,

    /// All jobs from `[job.<name>]`, keyed by job name.
    #[serde(default)]
    pub job: BTreeMap<String, JobConfig>,
}

/// Validated configuration. Built through `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub daemon: DaemonSection,
    pub job: BTreeMap<String, JobConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(daemon: DaemonSection, job: BTreeMap<String, JobConfig>) -> Self {
        Self { daemon, job }
    }
}

/// `[daemon]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct DaemonSection {
    /// Absolute path of the PID lock file.
    #[serde(default = "default_pidfile")]
    pub pidfile: PathBuf,

    /// Log file used by every command except `debug`.
    #[serde(default = "default_logfile")]
    pub logfile: PathBuf,

    #[serde(default)]
    pub uid: Option<u32>,

    #[serde(default)]
    pub gid: Option<u32>,

    /// File mode creation mask applied after detaching (default 0).
    #[serde(default)]
    pub umask: Option<u32>,

    /// Working directory of the daemon; `/` when unset or not a directory.
    #[serde(default)]
    pub working_directory: Option<PathBuf>,

    /// Where the detached daemon's stdout goes (default `/dev/null`).
    #[serde(default)]
    pub stdout: Option<PathBuf>,

    /// Where the detached daemon's stderr goes (default `/dev/null`).
    #[serde(default)]
    pub stderr: Option<PathBuf>,
}

fn default_pidfile() -> PathBuf {
    PathBuf::from("/tmp/dirwatch.pid")
}

fn default_logfile() -> PathBuf {
    PathBuf::from("/tmp/dirwatch.log")
}

impl Default for DaemonSection {
    fn default() -> Self {
        Self {
            pidfile: default_pidfile(),
            logfile: default_logfile(),
            uid: None,
            gid: None,
            umask: None,
            working_directory: None,
            stdout: None,
            stderr: None,
        }
    }
}

/// `[job.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct JobConfig {
    /// Directory to watch (absolute).
    pub watch: PathBuf,

    /// Event names, e.g. `["create", "write_close"]` or `["move,close"]`.
    pub events: Vec<String>,

    /// Command template run for each accepted event.
    pub command: String,

    #[serde(default = "default_true")]
    pub recursive: bool,

    #[serde(default = "default_true")]
    pub autoadd: bool,

    /// Path prefixes removed from the watch scope after registration.
    #[serde(default)]
    pub excluded: Vec<String>,

    /// Only run for paths ending with one of these (`video` expands to the
    /// built-in media set).
    #[serde(default)]
    pub include_extensions: Vec<String>,

    #[serde(default)]
    pub exclude_extensions: Vec<String>,

    /// Regex searched in the basename; a match skips the event.
    #[serde(default)]
    pub exclude_re: Option<String>,

    #[serde(default)]
    pub background: bool,

    #[serde(default = "default_true")]
    pub log_output: bool,

    /// Output file template; only `${job}` is available.
    #[serde(default)]
    pub outfile: Option<String>,

    #[serde(default)]
    pub action_on_success: Option<String>,

    #[serde(default)]
    pub action_on_failure: Option<String>,
}

fn default_true() -> bool {
    true
}
