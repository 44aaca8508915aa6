#![allow(dead_code)]

pub use dirwatch_test_utils::builders;
pub use dirwatch_test_utils::{init_tracing, wait_until, with_timeout};

use std::path::Path;

use dirwatch::types::EventKind;
use dirwatch::watch::FsEvent;

/// Event about a regular file.
pub fn file_event(path: impl AsRef<Path>, kind: EventKind) -> FsEvent {
    FsEvent::new(path.as_ref(), kind)
}

/// Event about a directory.
pub fn dir_event(path: impl AsRef<Path>, kind: EventKind) -> FsEvent {
    FsEvent::new(path.as_ref(), kind).with_dir(true)
}
