//! Manifest-backed input set source.
//!
//! Publishes the manifest as version 1, then re-reads and republishes it
//! under the next version every time the manifest file changes.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use notify_debouncer_mini::{DebounceEventResult, Debouncer, new_debouncer, notify::RecursiveMode};
use tokio::sync::mpsc;

use tempe_core::UpdateSender;

use crate::manifest::Project;

/// Debounce applied to manifest edits.
const MANIFEST_DEBOUNCE: Duration = Duration::from_millis(200);

/// Handle that keeps the manifest watcher alive.
pub struct ManifestSource {
    _debouncer: Debouncer<notify::RecommendedWatcher>,
}

impl ManifestSource {
    /// Publish `project` and keep republishing it on change.
    pub async fn start(project: Project, updates: UpdateSender) -> anyhow::Result<Self> {
        updates
            .send(project.to_update(1))
            .await
            .context("Pipeline stopped before the first input set")?;

        let manifest_path = project.manifest_path.clone();
        let watch_dir = manifest_path
            .parent()
            .unwrap_or(Path::new("/"))
            .to_path_buf();

        let (tx, rx) = mpsc::unbounded_channel();
        let target = manifest_path.clone();
        let mut debouncer = new_debouncer(MANIFEST_DEBOUNCE, move |result: DebounceEventResult| {
            match result {
                Ok(events) => {
                    if events.iter().any(|event| event.path == target) {
                        let _ = tx.send(());
                    }
                }
                Err(e) => tracing::warn!("Manifest watch error: {}", e),
            }
        })
        .context("Failed to create manifest watcher")?;

        debouncer
            .watcher()
            .watch(&watch_dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch {}", watch_dir.display()))?;

        tokio::spawn(republish(project, rx, updates));
        tracing::debug!("Watching manifest {}", manifest_path.display());

        Ok(Self {
            _debouncer: debouncer,
        })
    }
}

async fn republish(mut project: Project, mut rx: mpsc::UnboundedReceiver<()>, updates: UpdateSender) {
    let mut version = 1;
    while rx.recv().await.is_some() {
        match project.reload() {
            Ok(reloaded) => project = reloaded,
            Err(e) => {
                tracing::warn!("Keeping previous manifest: {:#}", e);
                continue;
            }
        }

        version += 1;
        tracing::info!("Manifest changed, publishing input set v{}", version);
        if updates.send(project.to_update(version)).await.is_err() {
            break;
        }
    }
}
