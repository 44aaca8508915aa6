// src/job.rs

//! Compiled, immutable job definitions.
//!
//! A [`Job`] is built once from its `[job.<name>]` section and then shared
//! (as `Arc<Job>`) by the job's delivery task, the executor, and the process
//! supervisor.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use regex::Regex;

use crate::config::model::{ConfigFile, JobConfig};
use crate::errors::{DirwatchError, Result};
use crate::exec::template::render_outfile;
use crate::types::EventMask;

/// Name of the alias that expands to [`VIDEO_EXTENSIONS`] in
/// `include_extensions`.
pub const VIDEO_ALIAS: &str = "video";

/// Built-in media extensions substituted for the `video` alias.
pub const VIDEO_EXTENSIONS: &[&str] = &[
    ".3g2", ".3gp", ".3gp2", ".3gpp", ".60d", ".ajp", ".asf", ".asx", ".avchd", ".avi", ".bik",
    ".bix", ".box", ".cam", ".dat", ".divx", ".dmf", ".dv", ".dvr-ms", ".evo", ".flc", ".fli",
    ".flic", ".flv", ".flx", ".gvi", ".gvp", ".h264", ".m1v", ".m2p", ".m2ts", ".m2v", ".m4e",
    ".m4v", ".mjp", ".mjpeg", ".mjpg", ".mkv", ".moov", ".mov", ".movhd", ".movie", ".movx", ".mp4",
    ".mpe", ".mpeg", ".mpg", ".mpv", ".mpv2", ".mxf", ".nsv", ".nut", ".ogg", ".ogm", ".omf", ".ps",
    ".qt", ".ram", ".rm", ".rmvb", ".swf", ".ts", ".vfw", ".vid", ".video", ".viv", ".vivo", ".vob",
    ".vro", ".wm", ".wmv", ".wmx", ".wrap", ".wvx", ".wx", ".x264", ".xvid",
];

/// One watch-and-react rule.
#[derive(Clone)]
pub struct Job {
    pub name: String,
    pub watch_path: PathBuf,
    pub event_mask: EventMask,
    pub recursive: bool,
    pub auto_add: bool,
    pub excluded: Vec<String>,
    pub include_extensions: Option<BTreeSet<String>>,
    pub exclude_extensions: Option<BTreeSet<String>>,
    pub exclude_pattern: Option<Regex>,
    pub command: String,
    pub background: bool,
    pub log_output: bool,
    pub outfile: Option<PathBuf>,
    pub action_on_success: Option<String>,
    pub action_on_failure: Option<String>,
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("name", &self.name)
            .field("watch_path", &self.watch_path)
            .field("event_mask", &self.event_mask)
            .field("command", &self.command)
            .field("background", &self.background)
            .finish_non_exhaustive()
    }
}

impl Job {
    /// Compile a job from its config section.
    pub fn from_config(name: &str, cfg: &JobConfig) -> Result<Job> {
        if !cfg.watch.is_absolute() {
            return Err(DirwatchError::ConfigError(format!(
                "job '{name}': watch path must be absolute (got {:?})",
                cfg.watch
            )));
        }

        let event_mask = EventMask::parse_names(&cfg.events)
            .map_err(|e| DirwatchError::ConfigError(format!("job '{name}': {e}")))?;
        if event_mask.is_empty() {
            return Err(DirwatchError::ConfigError(format!(
                "job '{name}': `events` must name at least one event"
            )));
        }

        let exclude_pattern = match cfg.exclude_re.as_deref() {
            Some(re) if !re.is_empty() => Some(Regex::new(re).map_err(|e| {
                DirwatchError::ConfigError(format!("job '{name}': invalid exclude_re: {e}"))
            })?),
            _ => None,
        };

        let outfile = match cfg.outfile.as_deref() {
            Some(tpl) if !tpl.is_empty() => Some(PathBuf::from(
                render_outfile(tpl, name)
                    .map_err(|e| DirwatchError::ConfigError(format!("job '{name}': outfile: {e}")))?,
            )),
            _ => None,
        };

        Ok(Job {
            name: name.to_string(),
            watch_path: cfg.watch.clone(),
            event_mask,
            recursive: cfg.recursive,
            auto_add: cfg.autoadd,
            excluded: cfg.excluded.iter().filter(|e| !e.is_empty()).cloned().collect(),
            include_extensions: expand_include_extensions(&cfg.include_extensions),
            exclude_extensions: extension_set(&cfg.exclude_extensions),
            exclude_pattern,
            command: cfg.command.clone(),
            background: cfg.background,
            log_output: cfg.log_output,
            outfile,
            action_on_success: non_empty(&cfg.action_on_success),
            action_on_failure: non_empty(&cfg.action_on_failure),
        })
    }
}

/// Build every job of a validated config, in config (name) order.
pub fn build_jobs(cfg: &ConfigFile) -> Result<Vec<Arc<Job>>> {
    cfg.job
        .iter()
        .map(|(name, job)| Job::from_config(name, job).map(Arc::new))
        .collect()
}

/// `include_extensions` with the `video` alias replaced by the built-in set.
pub fn expand_include_extensions(exts: &[String]) -> Option<BTreeSet<String>> {
    let mut set = extension_set(exts)?;
    if set.remove(VIDEO_ALIAS) {
        set.extend(VIDEO_EXTENSIONS.iter().map(|e| e.to_string()));
    }
    Some(set)
}

fn extension_set(exts: &[String]) -> Option<BTreeSet<String>> {
    let set: BTreeSet<String> = exts
        .iter()
        .map(|e| e.trim())
        .filter(|e| !e.is_empty())
        .map(str::to_string)
        .collect();
    if set.is_empty() { None } else { Some(set) }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.trim().is_empty()).cloned()
}
