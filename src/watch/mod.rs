// src/watch/mod.rs

//! Filesystem watching.
//!
//! - [`source`] defines the `EventSource` trait and `FsEvent`.
//! - [`inotify_source`] implements it on top of `inotify`.
//! - [`scope`] walks a job's directory tree and applies exclusions.
//! - [`filter`] decides whether an event runs the job's command.
//! - [`multiplexer`] runs one delivery task per job.

pub mod filter;
pub mod inotify_source;
pub mod multiplexer;
pub mod scope;
pub mod source;

pub use filter::{check, should_run, Verdict};
pub use inotify_source::InotifyEventSource;
pub use multiplexer::{dispatch, WatchMultiplexer};
pub use source::{EventSource, FsEvent, WatchError, WatchHandle, WatchMap};
