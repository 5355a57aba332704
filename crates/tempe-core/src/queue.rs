//! Deduplicated compilation queue.
//!
//! Holds at most one pending request per file. Producers push from the
//! pipeline task, the compile loop pops, and every operation takes the
//! single internal lock exactly once.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use rustc_hash::FxHashMap;

use crate::snapshot::{ChangeRecord, Snapshot};
use crate::sync;

/// A pending compilation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueItem {
    pub file: PathBuf,
    pub shared_inputs: BTreeSet<PathBuf>,
    pub output_directory: PathBuf,
    pub project_dir: PathBuf,
    pub ignore_staleness_check: bool,
}

impl QueueItem {
    /// Build an item for `change` using the snapshot's shared inputs and
    /// output directory.
    pub fn from_change(change: &ChangeRecord, snapshot: &Snapshot) -> Self {
        Self {
            file: change.file.clone(),
            shared_inputs: snapshot.shared_inputs.clone(),
            output_directory: snapshot.output_directory.clone(),
            project_dir: snapshot.project_dir.clone(),
            ignore_staleness_check: change.ignore_staleness_check,
        }
    }

    /// Inputs handed to the compiler: the file itself, then every shared
    /// input other than it.
    pub fn compile_inputs(&self) -> Vec<PathBuf> {
        std::iter::once(self.file.clone())
            .chain(
                self.shared_inputs
                    .iter()
                    .filter(|shared| **shared != self.file)
                    .cloned(),
            )
            .collect()
    }
}

/// Mergeable map of `file → QueueItem`.
#[derive(Debug, Default)]
pub struct CompilationQueue {
    items: Mutex<FxHashMap<PathBuf, QueueItem>>,
}

impl CompilationQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FxHashMap<PathBuf, QueueItem>> {
        sync::lock(&self.items)
    }

    /// Insert or merge a request.
    ///
    /// An existing entry takes the new shared inputs and output directory;
    /// `ignore_staleness_check` is OR-merged so a forced request is never lost.
    pub fn push(&self, item: QueueItem) {
        let mut items = self.lock();
        match items.get_mut(&item.file) {
            Some(existing) => {
                existing.ignore_staleness_check |= item.ignore_staleness_check;
                existing.shared_inputs = item.shared_inputs;
                existing.output_directory = item.output_directory;
                existing.project_dir = item.project_dir;
            }
            None => {
                items.insert(item.file.clone(), item);
            }
        }
    }

    /// Push every change of `snapshot`.
    pub fn push_snapshot(&self, snapshot: &Snapshot) {
        for change in &snapshot.changed_inputs {
            self.push(QueueItem::from_change(change, snapshot));
        }
    }

    /// Remove and return an arbitrary item.
    pub fn pop(&self) -> Option<QueueItem> {
        let mut items = self.lock();
        let key = items.keys().next().cloned()?;
        items.remove(&key)
    }

    /// Drop every item whose file is not in `master`.
    ///
    /// Returns the number of dropped items.
    pub fn reconcile(&self, master: &BTreeSet<PathBuf>) -> usize {
        let mut items = self.lock();
        let before = items.len();
        items.retain(|file, _| master.contains(file));
        before - items.len()
    }

    /// Remove the pending request for `file`, if any.
    pub fn remove(&self, file: &Path) -> Option<QueueItem> {
        self.lock().remove(file)
    }

    /// Whether a request for `file` is pending.
    pub fn contains(&self, file: &Path) -> bool {
        self.lock().contains_key(file)
    }

    /// Number of pending requests.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
