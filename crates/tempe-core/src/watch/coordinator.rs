//! Reconciles watch subscriptions with the current input set.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use rustc_hash::FxHashMap;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use super::{FileWatchService, WatchFlags, WatchHandle};
use crate::snapshot::InputSet;

/// First delay before retrying a failed `advise`.
const INITIAL_RETRY_DELAY: Duration = Duration::from_millis(50);

/// Cap on the delay between `advise` retries.
const MAX_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Owns the watch subscription table `file → handle`.
///
/// Each input set is applied as a diff computed from scratch: files no
/// longer present are unadvised, new files are advised, and files already
/// watched are left alone.
///
/// A failing `advise` is retried with capped exponential backoff, so an
/// unavailable watch service blocks `apply` until it recovers or `cancel`
/// fires.
pub struct WatchCoordinator {
    service: Arc<dyn FileWatchService>,
    flags: WatchFlags,
    table: Mutex<FxHashMap<PathBuf, WatchHandle>>,
    cancel: CancellationToken,
}

impl WatchCoordinator {
    /// Create a coordinator over `service`. Cancelling `cancel` abandons any
    /// pending `advise` retries.
    pub fn new(
        service: Arc<dyn FileWatchService>,
        flags: WatchFlags,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            service,
            flags,
            table: Mutex::new(FxHashMap::default()),
            cancel,
        }
    }

    /// Bring the subscription table in line with `input_set`.
    pub async fn apply(&self, input_set: &InputSet) {
        let wanted = input_set.all_files();
        let mut table = self.table.lock().await;

        let stale: Vec<PathBuf> = table
            .keys()
            .filter(|file| !wanted.contains(*file))
            .cloned()
            .collect();
        for file in stale {
            if let Some(handle) = table.remove(&file) {
                tracing::debug!("Unwatching {}", file.display());
                if let Err(e) = self.service.unadvise(handle).await {
                    tracing::warn!("Failed to unwatch {}: {}", file.display(), e);
                }
            }
        }

        let missing: BTreeSet<&PathBuf> = wanted
            .iter()
            .filter(|file| !table.contains_key(*file))
            .collect();
        for file in missing {
            let Some(handle) = self.advise_with_retry(file).await else {
                return;
            };
            tracing::debug!("Watching {}", file.display());
            table.insert(file.clone(), handle);
        }
    }

    /// Advise `file`, retrying until the service accepts it.
    ///
    /// Returns `None` only once `cancel` fires.
    async fn advise_with_retry(&self, file: &Path) -> Option<WatchHandle> {
        let mut delay = INITIAL_RETRY_DELAY;
        let mut attempt = 1u32;
        loop {
            if self.cancel.is_cancelled() {
                return None;
            }
            match self.service.advise(file, self.flags).await {
                Ok(handle) => return Some(handle),
                Err(e) if attempt == 1 => tracing::warn!(
                    "Failed to watch {}, waiting for the watch service: {}",
                    file.display(),
                    e
                ),
                Err(e) => tracing::debug!(
                    "Watch attempt {} for {} failed: {}",
                    attempt,
                    file.display(),
                    e
                ),
            }

            tokio::select! {
                _ = self.cancel.cancelled() => return None,
                _ = tokio::time::sleep(delay) => {}
            }
            delay = (delay * 2).min(MAX_RETRY_DELAY);
            attempt += 1;
        }
    }

    /// Currently watched files, sorted.
    pub async fn watched(&self) -> Vec<PathBuf> {
        let table = self.table.lock().await;
        let mut files: Vec<PathBuf> = table.keys().cloned().collect();
        files.sort();
        files
    }

    /// Release every outstanding subscription.
    pub async fn release_all(&self) {
        let mut table = self.table.lock().await;
        for (file, handle) in table.drain() {
            if let Err(e) = self.service.unadvise(handle).await {
                tracing::warn!("Failed to unwatch {}: {}", file.display(), e);
            }
        }
    }
}
