//! The design-time compilation pipeline.
//!
//! Wires the change tracker, the watch coordinator and the compile scheduler
//! together behind one event loop:
//!
//! ```text
//! input set updates ──► ChangeTracker ──┬──► CompileScheduler
//!                                       └──► WatchCoordinator ──► FileWatchService
//! change batches ─────► ChangeTracker ──────► CompileScheduler
//! ```
//!
//! Disposal stops the event loop, cancels and awaits any in-flight drain,
//! and only then releases the watch subscriptions.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::compile::{ArtifactDescriptor, CompileScheduler, Compiler, FileSystem, StdFileSystem};
use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::snapshot::{InputSetUpdate, Snapshot};
use crate::sync::lock;
use crate::telemetry::{Telemetry, TracingTelemetry};
use crate::tracker::ChangeTracker;
use crate::watch::{ChangeReceiver, FileWatchService, WatchCoordinator};

/// Receiver of versioned input set updates.
pub type UpdateReceiver = mpsc::Receiver<InputSetUpdate>;

/// Sender of versioned input set updates.
pub type UpdateSender = mpsc::Sender<InputSetUpdate>;

/// Capacity of the input set update channel.
const UPDATE_CHANNEL_CAPACITY: usize = 16;

/// Create an input set update channel.
pub fn update_channel() -> (UpdateSender, UpdateReceiver) {
    mpsc::channel(UPDATE_CHANNEL_CAPACITY)
}

struct Shared {
    tracker: Mutex<ChangeTracker>,
    scheduler: CompileScheduler,
    watcher: WatchCoordinator,
}

impl Shared {
    fn tracker(&self) -> MutexGuard<'_, ChangeTracker> {
        lock(&self.tracker)
    }

    fn current(&self) -> Option<Snapshot> {
        self.tracker().current().cloned()
    }

    async fn on_update(&self, update: InputSetUpdate, last_version: &mut Option<u64>) {
        if last_version.is_some_and(|last| update.version <= last) {
            tracing::debug!("Ignoring stale input set v{}", update.version);
            return;
        }
        *last_version = Some(update.version);

        let snapshot = self.tracker().apply(&update);
        tracing::debug!(
            "Input set v{} -> snapshot v{} ({} inputs, {} shared)",
            update.version,
            snapshot.version,
            update.input_set.inputs.len(),
            update.input_set.shared_inputs.len()
        );
        self.scheduler.schedule(&snapshot);
        self.watcher.apply(&update.input_set).await;
    }

    fn on_changes(&self, batch: Vec<std::path::PathBuf>) {
        let snapshot = self.tracker().files_changed(&batch);
        if let Some(snapshot) = snapshot {
            self.scheduler.schedule(&snapshot);
        }
    }

    async fn run(
        self: Arc<Self>,
        mut updates: UpdateReceiver,
        mut changes: ChangeReceiver,
        intake: CancellationToken,
    ) {
        let mut last_version = None;
        let mut updates_open = true;
        let mut changes_open = true;

        loop {
            tokio::select! {
                biased;
                _ = intake.cancelled() => break,
                update = updates.recv(), if updates_open => match update {
                    Some(update) => self.on_update(update, &mut last_version).await,
                    None => {
                        tracing::debug!("Input set source closed");
                        updates_open = false;
                    }
                },
                batch = changes.recv(), if changes_open => match batch {
                    Some(batch) => self.on_changes(batch),
                    None => {
                        tracing::debug!("File change channel closed");
                        changes_open = false;
                    }
                },
            }
        }
    }
}

/// Keeps design-time artifacts compiled as their inputs change.
pub struct DesignTimePipeline {
    shared: Arc<Shared>,
    intake: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
    started: AtomicBool,
    disposed: AtomicBool,
}

impl DesignTimePipeline {
    /// Create a pipeline using the real filesystem and `tracing` telemetry.
    pub fn new(
        config: PipelineConfig,
        compiler: Box<dyn Compiler>,
        watch_service: Arc<dyn FileWatchService>,
    ) -> Self {
        Self::with_collaborators(
            config,
            compiler,
            watch_service,
            Arc::new(StdFileSystem),
            Arc::new(TracingTelemetry),
        )
    }

    /// Create a pipeline with explicit collaborators.
    pub fn with_collaborators(
        config: PipelineConfig,
        compiler: Box<dyn Compiler>,
        watch_service: Arc<dyn FileWatchService>,
        fs: Arc<dyn FileSystem>,
        telemetry: Arc<dyn Telemetry>,
    ) -> Self {
        let lifetime = CancellationToken::new();
        let intake = lifetime.child_token();
        let tracker = ChangeTracker::new(config.output_subfolder.clone());
        let watcher = WatchCoordinator::new(watch_service, config.watch_flags, intake.clone());
        let scheduler = CompileScheduler::new(config, compiler, fs, telemetry, lifetime);

        Self {
            shared: Arc::new(Shared {
                tracker: Mutex::new(tracker),
                scheduler,
                watcher,
            }),
            intake,
            task: Mutex::new(None),
            started: AtomicBool::new(false),
            disposed: AtomicBool::new(false),
        }
    }

    /// Start consuming input set updates and file change batches.
    ///
    /// # Errors
    /// Returns [`Error::AlreadyStarted`] on a second call and
    /// [`Error::Disposed`] after disposal.
    pub fn start(&self, updates: UpdateReceiver, changes: ChangeReceiver) -> Result<()> {
        if self.disposed.load(Ordering::SeqCst) {
            return Err(Error::Disposed);
        }
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(Error::AlreadyStarted);
        }

        let task = tokio::spawn(
            self.shared
                .clone()
                .run(updates, changes, self.intake.clone()),
        );
        *lock(&self.task) = Some(task);
        Ok(())
    }

    /// Project-relative names of every current design-time input.
    pub fn known_artifact_names(&self) -> Vec<String> {
        self.shared
            .current()
            .map(|snapshot| snapshot.artifact_names())
            .unwrap_or_default()
    }

    /// Build the artifact for `name` if it is stale, and describe it.
    pub async fn request_artifact(&self, name: &str) -> Result<ArtifactDescriptor> {
        self.request(name, false).await
    }

    /// Rebuild the artifact for `name` regardless of timestamps.
    pub async fn request_artifact_forced(&self, name: &str) -> Result<ArtifactDescriptor> {
        self.request(name, true).await
    }

    async fn request(&self, name: &str, force: bool) -> Result<ArtifactDescriptor> {
        if self.disposed.load(Ordering::SeqCst) {
            return Err(Error::Disposed);
        }
        let snapshot = self.shared.current().ok_or(Error::NotReady)?;
        self.shared.scheduler.request(&snapshot, name, force).await
    }

    /// The compile scheduler, for inspecting the pending queue.
    pub fn scheduler(&self) -> &CompileScheduler {
        &self.shared.scheduler
    }

    /// Currently watched files.
    pub async fn watched_files(&self) -> Vec<std::path::PathBuf> {
        self.shared.watcher.watched().await
    }

    /// Shut the pipeline down.
    ///
    /// Stops accepting notifications, cancels and awaits any in-flight
    /// drain, then releases every watch subscription. Idempotent.
    pub async fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }

        self.intake.cancel();
        let task = lock(&self.task).take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                tracing::error!("Pipeline event loop failed: {}", e);
            }
        }

        self.shared.scheduler.shutdown().await;
        self.shared.watcher.release_all().await;
        tracing::debug!("Design-time pipeline disposed");
    }
}
