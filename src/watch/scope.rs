// src/watch/scope.rs

//! Helpers for building and trimming a job's watch scope.

use std::path::{Path, PathBuf};

use tracing::{debug, error, warn};

use crate::fs::FileSystem;
use crate::watch::source::{EventSource, WatchError, WatchMap};

/// Directories to watch for `root`: just `root`, or `root` plus every
/// directory below it when `recursive` is set. Returned in walk order,
/// parents before children.
pub fn collect_watch_dirs(
    fs: &dyn FileSystem,
    root: &Path,
    recursive: bool,
) -> Result<Vec<PathBuf>, WatchError> {
    if !fs.is_dir(root) {
        return Err(WatchError::NotADirectory(root.to_path_buf()));
    }

    let mut dirs = vec![root.to_path_buf()];
    if !recursive {
        return Ok(dirs);
    }

    let mut next = 0;
    while next < dirs.len() {
        let dir = dirs[next].clone();
        next += 1;
        let mut children = match fs.read_dir(&dir) {
            Ok(children) => children,
            // A subdirectory can vanish while we scan it.
            Err(err) if dir != root => {
                debug!(?dir, error = %err, "skipping unreadable directory");
                continue;
            }
            Err(err) => {
                return Err(WatchError::Scan {
                    path: dir,
                    reason: format!("{err:#}"),
                });
            }
        };
        children.sort();
        dirs.extend(children.into_iter().filter(|c| fs.is_dir(c)));
    }

    Ok(dirs)
}

/// Remove from `watches` (and from the source) every directory whose path
/// starts with one of the `excluded` prefixes.
///
/// Prefixes are compared as strings, so `/data/tmp` also excludes
/// `/data/tmpfiles`. Entries whose path is not valid UTF-8 cannot be
/// compared and are kept; the failure is logged per entry.
pub fn apply_exclusions<S: EventSource + ?Sized>(
    job: &str,
    source: &mut S,
    watches: &mut WatchMap,
    excluded: &[String],
) {
    for prefix in excluded {
        let mut matched = Vec::new();
        for path in watches.keys() {
            match path.to_str() {
                Some(s) if s.starts_with(prefix.as_str()) => matched.push(path.clone()),
                Some(_) => {}
                None => {
                    error!(
                        job,
                        path = ?path,
                        "failed to check exclude for path (decoding error)"
                    );
                }
            }
        }

        for path in matched {
            if let Some(handle) = watches.remove(&path) {
                if let Err(err) = source.remove_watch(handle) {
                    warn!(job, ?path, error = %err, "failed to remove excluded watch");
                }
            }
        }
        debug!(job, excluded = %prefix, "excluded dirs");
    }
}
