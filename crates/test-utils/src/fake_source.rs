use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use dirwatch::job::Job;
use dirwatch::types::EventMask;
use dirwatch::watch::{EventSource, FsEvent, WatchError, WatchHandle, WatchMap};
use tokio::sync::mpsc;

/// What the source was asked to do.
#[derive(Debug, Default, Clone)]
pub struct SourceLog {
    pub registered: Vec<(PathBuf, EventMask, bool, bool)>,
    pub watched: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
}

/// An event source that:
/// - pretends to watch the registered path plus the given subdirectories
/// - delivers whatever the test pushes through its [`FakeSourceHandle`]
/// - closes once the handle is dropped.
pub struct FakeEventSource {
    rx: mpsc::UnboundedReceiver<FsEvent>,
    subdirs: Vec<PathBuf>,
    watches: WatchMap,
    log: Arc<Mutex<SourceLog>>,
    fail_register: bool,
}

/// Test-side end of a [`FakeEventSource`].
#[derive(Clone)]
pub struct FakeSourceHandle {
    tx: mpsc::UnboundedSender<FsEvent>,
    log: Arc<Mutex<SourceLog>>,
}

impl FakeEventSource {
    pub fn new() -> (Self, FakeSourceHandle) {
        Self::with_subdirs(Vec::<PathBuf>::new())
    }

    /// Recursive registrations also report these directories.
    pub fn with_subdirs<P: Into<PathBuf>>(subdirs: impl IntoIterator<Item = P>) -> (Self, FakeSourceHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let log = Arc::new(Mutex::new(SourceLog::default()));
        let source = Self {
            rx,
            subdirs: subdirs.into_iter().map(Into::into).collect(),
            watches: WatchMap::new(),
            log: Arc::clone(&log),
            fail_register: false,
        };
        (source, FakeSourceHandle { tx, log })
    }

    /// A source whose registration fails.
    pub fn failing() -> (Self, FakeSourceHandle) {
        let (mut source, handle) = Self::new();
        source.fail_register = true;
        (source, handle)
    }
}

impl FakeSourceHandle {
    pub fn send(&self, event: FsEvent) {
        self.tx.send(event).expect("fake source was dropped");
    }

    /// True once the source itself has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    pub fn log(&self) -> SourceLog {
        self.log.lock().unwrap().clone()
    }
}

/// Hand out the prepared source of each job by name; a job without one
/// fails to register.
pub fn source_factory(
    mut sources: HashMap<String, FakeEventSource>,
) -> impl FnMut(&Job) -> Result<FakeEventSource, WatchError> {
    move |job: &Job| {
        sources
            .remove(&job.name)
            .ok_or_else(|| WatchError::NotADirectory(job.watch_path.clone()))
    }
}

impl EventSource for FakeEventSource {
    fn register_watch(
        &mut self,
        path: &Path,
        mask: EventMask,
        recursive: bool,
        auto_add: bool,
    ) -> Result<WatchMap, WatchError> {
        self.log
            .lock()
            .unwrap()
            .registered
            .push((path.to_path_buf(), mask, recursive, auto_add));
        if self.fail_register {
            return Err(WatchError::NotADirectory(path.to_path_buf()));
        }

        let mut dirs = vec![path.to_path_buf()];
        if recursive {
            dirs.extend(self.subdirs.iter().cloned());
        }
        for (i, dir) in dirs.into_iter().enumerate() {
            self.watches.insert(dir, WatchHandle(i as u64 + 1));
        }
        self.log.lock().unwrap().watched = self.watches.keys().cloned().collect();
        Ok(self.watches.clone())
    }

    fn remove_watch(&mut self, handle: WatchHandle) -> Result<(), WatchError> {
        let path = self
            .watches
            .iter()
            .find(|(_, h)| **h == handle)
            .map(|(p, _)| p.clone())
            .ok_or(WatchError::UnknownHandle(handle))?;
        self.watches.remove(&path);
        let mut log = self.log.lock().unwrap();
        log.removed.push(path);
        log.watched = self.watches.keys().cloned().collect();
        Ok(())
    }

    fn next_event(&mut self) -> Pin<Box<dyn Future<Output = Option<FsEvent>> + Send + '_>> {
        Box::pin(self.rx.recv())
    }
}
