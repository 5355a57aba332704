//! `notify`-backed file watch service.
//!
//! Watches the parent directory of each advised file (reference counted, so
//! editors that save by replacing the file are still seen) and forwards
//! events for advised files only.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use notify::event::{EventKind, MetadataKind, ModifyKind};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use rustc_hash::FxHashMap;

use super::{ChangeSender, FileWatchService, WatchFlags, WatchHandle};
use crate::error::{Error, Result};
use crate::sync::lock;

/// Advised files and the flags they were advised with.
type Subscribed = FxHashMap<PathBuf, (WatchHandle, WatchFlags)>;

struct Inner {
    watcher: RecommendedWatcher,
    handles: FxHashMap<WatchHandle, PathBuf>,
    directories: FxHashMap<PathBuf, usize>,
}

/// File watch service built on the platform's recommended `notify` watcher.
///
/// The event handler only ever locks `subscribed`, and that lock is never
/// held while calling into the watcher.
pub struct NotifyWatchService {
    inner: Mutex<Inner>,
    subscribed: Arc<Mutex<Subscribed>>,
    next_handle: AtomicU64,
}

/// Whether `kind` is reported under `flags`.
fn matches_flags(kind: &EventKind, flags: WatchFlags) -> bool {
    match kind {
        EventKind::Modify(ModifyKind::Data(_)) => flags.contains(WatchFlags::SIZE),
        EventKind::Modify(ModifyKind::Metadata(MetadataKind::WriteTime | MetadataKind::Any)) => {
            flags.contains(WatchFlags::WRITE_TIME)
        }
        // Backends that cannot tell what changed, and atomic saves that
        // re-create the file, both move the write time.
        EventKind::Modify(ModifyKind::Any | ModifyKind::Other | ModifyKind::Name(_))
        | EventKind::Create(_) => flags.intersects(WatchFlags::WRITE_TIME | WatchFlags::SIZE),
        _ => false,
    }
}

impl NotifyWatchService {
    /// Create a service publishing change batches on `tx`.
    pub fn new(tx: ChangeSender) -> Result<Self> {
        let subscribed: Arc<Mutex<Subscribed>> = Arc::default();
        let handler_subscribed = subscribed.clone();

        let watcher = notify::recommended_watcher(move |result: notify::Result<notify::Event>| {
            let event = match result {
                Ok(event) => event,
                Err(e) => {
                    tracing::warn!("File watch error: {}", e);
                    return;
                }
            };

            let batch: Vec<PathBuf> = {
                let subscribed = lock(&handler_subscribed);
                event
                    .paths
                    .iter()
                    .filter(|path| {
                        subscribed
                            .get(*path)
                            .is_some_and(|(_, flags)| matches_flags(&event.kind, *flags))
                    })
                    .cloned()
                    .collect()
            };

            if !batch.is_empty() {
                let _ = tx.send(batch);
            }
        })
        .map_err(|e| Error::Watch(e.to_string()))?;

        Ok(Self {
            inner: Mutex::new(Inner {
                watcher,
                handles: FxHashMap::default(),
                directories: FxHashMap::default(),
            }),
            subscribed,
            next_handle: AtomicU64::new(1),
        })
    }

    fn watch_dir(path: &Path) -> PathBuf {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

#[async_trait]
impl FileWatchService for NotifyWatchService {
    async fn advise(&self, path: &Path, flags: WatchFlags) -> Result<WatchHandle> {
        let mut inner = lock(&self.inner);

        if let Some((handle, _)) = lock(&self.subscribed).get(path) {
            return Ok(*handle);
        }

        let dir = Self::watch_dir(path);
        let count = inner.directories.get(&dir).copied().unwrap_or(0);
        if count == 0 {
            inner
                .watcher
                .watch(&dir, RecursiveMode::NonRecursive)
                .map_err(|e| Error::Watch(format!("{}: {}", dir.display(), e)))?;
        }
        inner.directories.insert(dir, count + 1);

        let handle = WatchHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        inner.handles.insert(handle, path.to_path_buf());
        lock(&self.subscribed).insert(path.to_path_buf(), (handle, flags));
        Ok(handle)
    }

    async fn unadvise(&self, handle: WatchHandle) -> Result<()> {
        let mut inner = lock(&self.inner);

        let Some(path) = inner.handles.remove(&handle) else {
            return Ok(());
        };
        lock(&self.subscribed).remove(&path);

        let dir = Self::watch_dir(&path);
        let remaining = match inner.directories.get_mut(&dir) {
            Some(count) => {
                *count -= 1;
                *count
            }
            None => return Ok(()),
        };
        if remaining == 0 {
            inner.directories.remove(&dir);
            inner
                .watcher
                .unwatch(&dir)
                .map_err(|e| Error::Watch(format!("{}: {}", dir.display(), e)))?;
        }
        Ok(())
    }
}
