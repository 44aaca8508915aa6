// src/watch/source.rs

//! The event source abstraction.
//!
//! A job's delivery task talks to an `EventSource` instead of a concrete
//! watcher. Production uses [`super::inotify_source::InotifyEventSource`];
//! tests provide a fake that replays scripted events.

use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use thiserror::Error;

use crate::types::{EventKind, EventMask, IN_ISDIR};

/// Opaque identifier of one registered directory watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatchHandle(pub u64);

/// Watched directory -> handle, as returned by [`EventSource::register_watch`].
pub type WatchMap = BTreeMap<PathBuf, WatchHandle>;

/// A single filesystem change delivered to a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEvent {
    /// Absolute path of the entry the event is about.
    pub path: PathBuf,
    pub kind: EventKind,
    /// The entry is a directory.
    pub is_dir: bool,
    /// Correlates a `MovedFrom` with its `MovedTo`.
    pub cookie: Option<u32>,
    /// The watched directory that reported the event.
    pub watched: PathBuf,
}

impl FsEvent {
    /// Event about `path`, reported by the watch on its parent directory.
    pub fn new(path: impl Into<PathBuf>, kind: EventKind) -> Self {
        let path = path.into();
        let watched = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| path.clone());
        Self {
            path,
            kind,
            is_dir: false,
            cookie: None,
            watched,
        }
    }

    pub fn with_dir(mut self, is_dir: bool) -> Self {
        self.is_dir = is_dir;
        self
    }

    pub fn with_cookie(mut self, cookie: u32) -> Self {
        self.cookie = Some(cookie);
        self
    }

    pub fn with_watched(mut self, watched: impl Into<PathBuf>) -> Self {
        self.watched = watched.into();
        self
    }

    /// Numeric inotify flags (`nflags` placeholder).
    pub fn flags(&self) -> u32 {
        let dir = if self.is_dir { IN_ISDIR } else { 0 };
        self.kind.bits() | dir
    }

    /// Symbolic flags, e.g. `IN_CREATE|IN_ISDIR` (`tflags` placeholder).
    pub fn flag_names(&self) -> String {
        if self.is_dir {
            format!("{}|IN_ISDIR", self.kind.flag_name())
        } else {
            self.kind.flag_name().to_string()
        }
    }
}

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("{0:?} is not a directory")]
    NotADirectory(PathBuf),

    #[error("failed to scan {path:?}: {reason}")]
    Scan { path: PathBuf, reason: String },

    #[error("failed to initialise inotify: {0}")]
    Init(#[source] std::io::Error),

    #[error("failed to watch {path:?}: {source}")]
    Inotify {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown watch handle {0:?}")]
    UnknownHandle(WatchHandle),
}

/// Capability that subscribes to filesystem changes for one watch scope.
pub trait EventSource: Send + 'static {
    /// Watch `path` (and, if `recursive`, every directory below it) for the
    /// kinds in `mask`. With `auto_add`, directories created later inside
    /// the scope are watched as well.
    fn register_watch(
        &mut self,
        path: &Path,
        mask: EventMask,
        recursive: bool,
        auto_add: bool,
    ) -> Result<WatchMap, WatchError>;

    fn remove_watch(&mut self, handle: WatchHandle) -> Result<(), WatchError>;

    /// Wait for the next event of this scope. `None` once the source is
    /// closed.
    fn next_event(&mut self) -> Pin<Box<dyn Future<Output = Option<FsEvent>> + Send + '_>>;
}
