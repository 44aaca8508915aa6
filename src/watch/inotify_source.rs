// src/watch/inotify_source.rs

//! `EventSource` backed by the `inotify` crate.
//!
//! Every directory of the scope gets its own watch descriptor, so single
//! directories can be dropped from the scope (exclusions) and new ones
//! added (`auto_add`). The job's mask is passed to the kernel as is; each
//! kernel event maps onto exactly one [`FsEvent`].

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use inotify::{EventMask as KernelMask, EventOwned, Inotify, WatchDescriptor, WatchMask};
use tokio::io::unix::AsyncFd;
use tracing::{debug, warn};

use crate::fs::FileSystem;
use crate::types::{EventKind, EventMask};
use crate::watch::scope::collect_watch_dirs;
use crate::watch::source::{EventSource, FsEvent, WatchError, WatchHandle, WatchMap};

/// Room for a batch of events, each at most 16 bytes plus `NAME_MAX + 1`.
const READ_BUFFER: usize = 4096;

#[derive(Debug, Clone)]
struct DirWatch {
    handle: WatchHandle,
    descriptor: WatchDescriptor,
}

pub struct InotifyEventSource {
    inotify: AsyncFd<Inotify>,
    fs: Arc<dyn FileSystem>,
    watches: BTreeMap<PathBuf, DirWatch>,
    dirs: HashMap<WatchDescriptor, PathBuf>,
    mask: EventMask,
    recursive: bool,
    auto_add: bool,
    next_handle: u64,
    pending: VecDeque<FsEvent>,
}

impl std::fmt::Debug for InotifyEventSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InotifyEventSource")
            .field("watches", &self.watches.len())
            .field("mask", &self.mask)
            .finish_non_exhaustive()
    }
}

impl InotifyEventSource {
    /// Must be called from within a tokio runtime.
    pub fn new(fs: Arc<dyn FileSystem>) -> Result<Self, WatchError> {
        let inotify = Inotify::init().map_err(WatchError::Init)?;
        let inotify = AsyncFd::new(inotify).map_err(WatchError::Init)?;

        Ok(Self {
            inotify,
            fs,
            watches: BTreeMap::new(),
            dirs: HashMap::new(),
            mask: EventMask::EMPTY,
            recursive: false,
            auto_add: false,
            next_handle: 1,
            pending: VecDeque::new(),
        })
    }

    /// Kinds subscribed at the kernel. Directory creation is always needed
    /// for `auto_add`, even when the job does not react to it.
    fn kernel_mask(&self) -> WatchMask {
        let mut bits = self.mask.bits();
        if self.auto_add {
            bits |= EventKind::Create.bits();
        }
        WatchMask::from_bits_truncate(bits)
    }

    fn watch_dir(&mut self, dir: &Path) -> Result<WatchHandle, WatchError> {
        if let Some(existing) = self.watches.get(dir) {
            return Ok(existing.handle);
        }
        let descriptor = self
            .inotify
            .get_ref()
            .watches()
            .add(dir, self.kernel_mask())
            .map_err(|source| WatchError::Inotify {
                path: dir.to_path_buf(),
                source,
            })?;

        let handle = WatchHandle(self.next_handle);
        self.next_handle += 1;
        self.dirs.insert(descriptor.clone(), dir.to_path_buf());
        self.watches.insert(dir.to_path_buf(), DirWatch { handle, descriptor });
        Ok(handle)
    }

    /// Start watching a directory created inside the scope.
    fn add_created_dir(&mut self, dir: &Path) {
        let dirs = match collect_watch_dirs(self.fs.as_ref(), dir, self.recursive) {
            Ok(dirs) => dirs,
            Err(err) => {
                debug!(?dir, error = %err, "new directory vanished before it could be watched");
                return;
            }
        };
        for d in dirs {
            match self.watch_dir(&d) {
                Ok(_) => debug!(dir = ?d, "auto-added watch"),
                Err(err) => warn!(dir = ?d, error = %err, "failed to auto-add watch"),
            }
        }
    }

    /// The kernel dropped a watch (its directory is gone or it was removed).
    fn forget(&mut self, descriptor: &WatchDescriptor) {
        let Some(dir) = self.dirs.remove(descriptor) else {
            return;
        };
        if self
            .watches
            .get(&dir)
            .is_some_and(|w| &w.descriptor == descriptor)
        {
            self.watches.remove(&dir);
        }
        debug!(?dir, "watch dropped");
    }

    fn ingest(&mut self, event: EventOwned) {
        if event.mask.contains(KernelMask::Q_OVERFLOW) {
            warn!("inotify queue overflowed; events were lost");
            return;
        }
        let Some(watched) = self.dirs.get(&event.wd).cloned() else {
            debug!(mask = ?event.mask, "event for a watch no longer in scope");
            return;
        };
        if event.mask.contains(KernelMask::IGNORED) {
            self.forget(&event.wd);
            return;
        }

        let entry_is_dir = event.mask.contains(KernelMask::ISDIR);
        let path = match &event.name {
            Some(name) => watched.join(name),
            None => watched.clone(),
        };
        let raw = event.mask.bits();

        for kind in EventKind::ALL.into_iter().filter(|k| raw & k.bits() != 0) {
            let is_self = matches!(kind, EventKind::DeleteSelf | EventKind::MoveSelf);
            let is_dir = entry_is_dir || is_self;

            if kind == EventKind::Create && is_dir && self.auto_add && event.name.is_some() {
                self.add_created_dir(&path);
            }
            if !self.mask.contains(kind) {
                continue;
            }

            let mut fs_event = FsEvent::new(path.clone(), kind)
                .with_dir(is_dir)
                .with_watched(watched.clone());
            if event.cookie != 0 {
                fs_event = fs_event.with_cookie(event.cookie);
            }
            self.pending.push_back(fs_event);
        }
    }

    /// Wait until the descriptor is readable and read one batch of events.
    async fn read_batch(&mut self) -> io::Result<Vec<EventOwned>> {
        let mut buffer = [0u8; READ_BUFFER];
        loop {
            let mut guard = self.inotify.readable_mut().await?;
            let read = guard.try_io(|inner| {
                inner
                    .get_mut()
                    .read_events(&mut buffer)
                    .map(|events| events.map(|e| e.to_owned()).collect::<Vec<_>>())
            });
            match read {
                Ok(result) => return result,
                Err(_would_block) => continue,
            }
        }
    }
}

impl EventSource for InotifyEventSource {
    fn register_watch(
        &mut self,
        path: &Path,
        mask: EventMask,
        recursive: bool,
        auto_add: bool,
    ) -> Result<WatchMap, WatchError> {
        self.mask = mask;
        self.recursive = recursive;
        self.auto_add = auto_add;

        let dirs = collect_watch_dirs(self.fs.as_ref(), path, recursive)?;
        let mut registered = WatchMap::new();
        for dir in dirs {
            match self.watch_dir(&dir) {
                Ok(handle) => {
                    registered.insert(dir, handle);
                }
                Err(err) if dir.as_path() == path => return Err(err),
                Err(err) => warn!(?dir, error = %err, "failed to watch subdirectory"),
            }
        }
        Ok(registered)
    }

    fn remove_watch(&mut self, handle: WatchHandle) -> Result<(), WatchError> {
        let path = self
            .watches
            .iter()
            .find(|(_, w)| w.handle == handle)
            .map(|(p, _)| p.clone())
            .ok_or(WatchError::UnknownHandle(handle))?;
        let Some(removed) = self.watches.remove(&path) else {
            return Err(WatchError::UnknownHandle(handle));
        };
        self.dirs.remove(&removed.descriptor);
        self.inotify
            .get_ref()
            .watches()
            .remove(removed.descriptor)
            .map_err(|source| WatchError::Inotify { path, source })
    }

    fn next_event(&mut self) -> Pin<Box<dyn Future<Output = Option<FsEvent>> + Send + '_>> {
        Box::pin(async move {
            loop {
                if let Some(event) = self.pending.pop_front() {
                    return Some(event);
                }
                match self.read_batch().await {
                    Ok(events) => {
                        for event in events {
                            debug!(?event, "received inotify event");
                            self.ingest(event);
                        }
                    }
                    Err(err) => {
                        warn!(error = %err, "reading inotify events failed; closing source");
                        return None;
                    }
                }
            }
        })
    }
}
