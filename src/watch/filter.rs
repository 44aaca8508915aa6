// src/watch/filter.rs

//! Decide whether an event should run its job's command.

use crate::job::Job;
use crate::watch::source::FsEvent;

/// Outcome of [`check`]. Anything but `Accept` names the first check that
/// rejected the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    /// `include_extensions` is set and the path ends with none of them.
    NotIncluded,
    /// The path ends with one of `exclude_extensions`.
    ExcludedExtension,
    /// `exclude_re` matched the basename.
    ExcludedPattern,
}

/// Run the include-list, exclude-list and exclude-pattern checks, in that
/// order. Extensions are plain suffixes of the full path string.
pub fn check(job: &Job, event: &FsEvent) -> Verdict {
    let path = event.path.to_string_lossy();

    if let Some(include) = &job.include_extensions {
        if !include.iter().any(|ext| path.ends_with(ext.as_str())) {
            return Verdict::NotIncluded;
        }
    }

    if let Some(exclude) = &job.exclude_extensions {
        if exclude.iter().any(|ext| path.ends_with(ext.as_str())) {
            return Verdict::ExcludedExtension;
        }
    }

    if let Some(re) = &job.exclude_pattern {
        let basename = event
            .path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        if re.is_match(&basename) {
            return Verdict::ExcludedPattern;
        }
    }

    Verdict::Accept
}

/// True if the event passes every configured check.
pub fn should_run(job: &Job, event: &FsEvent) -> bool {
    check(job, event) == Verdict::Accept
}
