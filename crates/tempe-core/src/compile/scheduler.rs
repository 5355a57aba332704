//! Debounced compile scheduling and the queue drain loop.
//!
//! Every burst of changes moves through:
//!
//! ```text
//! Idle ──schedule──► Debouncing ──quiet period──► Draining ──queue empty──► Idle
//!                        ▲                            │
//!                        └────────schedule (cancel)───┘
//! ```
//!
//! Each burst owns a child of the scheduler's lifetime token. Scheduling
//! cancels the current burst and starts a new one, which waits for its
//! predecessor to finish before draining.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::paths;
use crate::queue::{CompilationQueue, QueueItem};
use crate::snapshot::{ChangeRecord, Snapshot};
use crate::sync::lock;
use crate::telemetry::Telemetry;

use super::context::{CompilationContext, Compiler};
use super::staleness::{FileSystem, needs_recompile};
use super::types::{ArtifactDescriptor, DrainReport, ItemOutcome};

struct Burst {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

struct Inner {
    config: PipelineConfig,
    queue: CompilationQueue,
    context: CompilationContext,
    fs: Arc<dyn FileSystem>,
    telemetry: Arc<dyn Telemetry>,
    lifetime: CancellationToken,
    burst: Mutex<Burst>,
    /// Inputs of the latest scheduled snapshot. Held while reconciling and
    /// while re-queueing so a cancelled item never outlives its removal.
    master: Mutex<BTreeSet<PathBuf>>,
}

/// Owns the compilation queue, the compiler context and the burst lifecycle.
#[derive(Clone)]
pub struct CompileScheduler {
    inner: Arc<Inner>,
}

impl CompileScheduler {
    /// Create a scheduler. Cancelling `lifetime` stops all current and future
    /// bursts.
    pub fn new(
        config: PipelineConfig,
        compiler: Box<dyn Compiler>,
        fs: Arc<dyn FileSystem>,
        telemetry: Arc<dyn Telemetry>,
        lifetime: CancellationToken,
    ) -> Self {
        let burst = Burst {
            token: lifetime.child_token(),
            task: None,
        };
        Self {
            inner: Arc::new(Inner {
                config,
                queue: CompilationQueue::new(),
                context: CompilationContext::new(compiler),
                fs,
                telemetry,
                lifetime,
                burst: Mutex::new(burst),
                master: Mutex::new(BTreeSet::new()),
            }),
        }
    }

    /// The pending compilation queue.
    pub fn queue(&self) -> &CompilationQueue {
        &self.inner.queue
    }

    /// Merge a snapshot's changes into the queue and restart the debounce.
    ///
    /// Invalid snapshots are ignored.
    pub fn schedule(&self, snapshot: &Snapshot) {
        if !snapshot.is_valid() {
            return;
        }

        {
            let mut master = lock(&self.inner.master);
            master.clone_from(&snapshot.inputs);
            let dropped = self.inner.queue.reconcile(&master);
            if dropped > 0 {
                tracing::debug!("Dropped {} queued items no longer in the input set", dropped);
            }
            if snapshot.changed_inputs.is_empty() {
                return;
            }
            self.inner.queue.push_snapshot(snapshot);
        }
        tracing::debug!(
            "Snapshot v{} queued {} changes ({} pending)",
            snapshot.version,
            snapshot.changed_inputs.len(),
            self.inner.queue.len()
        );

        self.restart_burst();
    }

    /// Cancel the current burst and start debouncing a new one.
    pub fn restart_burst(&self) {
        let mut burst = lock(&self.inner.burst);
        if self.inner.lifetime.is_cancelled() {
            return;
        }

        burst.token.cancel();
        let token = self.inner.lifetime.child_token();
        burst.token = token.clone();

        let previous = burst.task.take();
        let inner = self.inner.clone();
        burst.task = Some(tokio::spawn(async move {
            inner.run_burst(token, previous).await;
        }));
    }

    /// Drain the queue under `token` right away, without debouncing.
    pub async fn drain(&self, token: &CancellationToken) -> DrainReport {
        self.inner.drain(token).await
    }

    /// Build or fetch the artifact for `name` synchronously.
    ///
    /// Any queued request for the same file is taken over by this call.
    /// The staleness check is skipped only if `force` is set or the queued
    /// request was itself forced.
    pub async fn request(
        &self,
        snapshot: &Snapshot,
        name: &str,
        force: bool,
    ) -> Result<ArtifactDescriptor> {
        if !snapshot.is_valid() {
            return Err(Error::NotReady);
        }
        let file = snapshot
            .resolve(name)
            .ok_or_else(|| Error::UnknownArtifact(name.to_string()))?
            .to_path_buf();

        let pending = self.inner.queue.remove(&file);
        let change = ChangeRecord {
            ignore_staleness_check: force
                || pending.as_ref().is_some_and(|p| p.ignore_staleness_check),
            file,
        };
        let item = QueueItem::from_change(&change, snapshot);
        let output = self.inner.artifact_path(&item);
        let token = self.inner.lifetime.child_token();

        let mut compiler = tokio::select! {
            guard = self.inner.context.exclusive() => guard,
            _ = token.cancelled() => {
                self.inner.requeue(item);
                return Err(Error::Cancelled);
            }
        };

        tracing::debug!("On-demand request for {}", name);
        match self.inner.compile_item(&mut **compiler, &item, &token).await {
            ItemOutcome::Compiled | ItemOutcome::UpToDate => {
                Ok(ArtifactDescriptor::new(name.to_string(), output))
            }
            ItemOutcome::Failed => Err(Error::CompilationFailed {
                name: name.to_string(),
            }),
            ItemOutcome::Cancelled => {
                self.inner.requeue(item);
                Err(Error::Cancelled)
            }
        }
    }

    /// Stop scheduling, cancel the current burst and wait for it to finish.
    pub async fn shutdown(&self) {
        let task = {
            let mut burst = lock(&self.inner.burst);
            self.inner.lifetime.cancel();
            burst.token.cancel();
            burst.task.take()
        };
        if let Some(task) = task {
            join_burst(task).await;
        }
    }
}

impl Inner {
    fn artifact_path(&self, item: &QueueItem) -> PathBuf {
        paths::artifact_path(
            &item.output_directory,
            &item.project_dir,
            &item.file,
            &self.config.artifact_extension,
        )
    }

    /// Put a cancelled item back, unless it stopped being an input while
    /// it was out of the queue.
    fn requeue(&self, item: QueueItem) {
        let master = lock(&self.master);
        if master.contains(&item.file) {
            self.queue.push(item);
        } else {
            tracing::debug!("Not re-queueing removed input {}", item.file.display());
        }
    }

    async fn run_burst(&self, token: CancellationToken, previous: Option<JoinHandle<()>>) {
        let elapsed = tokio::select! {
            _ = token.cancelled() => false,
            _ = tokio::time::sleep(self.config.debounce) => true,
        };

        // The predecessor was cancelled when this burst started; waiting
        // for it keeps drains strictly one at a time.
        if let Some(previous) = previous {
            join_burst(previous).await;
        }

        if elapsed && !token.is_cancelled() {
            self.drain(&token).await;
        }
    }

    async fn drain(&self, token: &CancellationToken) -> DrainReport {
        let start = Instant::now();
        let mut report = DrainReport {
            initial_queue_length: self.queue.len(),
            ..DrainReport::default()
        };

        let compiler = tokio::select! {
            guard = self.context.exclusive() => Some(guard),
            _ = token.cancelled() => None,
        };

        match compiler {
            Some(mut compiler) => loop {
                if token.is_cancelled() {
                    report.cancelled = true;
                    break;
                }
                let Some(item) = self.queue.pop() else {
                    break;
                };
                match self.compile_item(&mut **compiler, &item, token).await {
                    ItemOutcome::Compiled => report.compiled += 1,
                    ItemOutcome::UpToDate | ItemOutcome::Failed => {}
                    ItemOutcome::Cancelled => {
                        self.requeue(item);
                        report.cancelled = true;
                        break;
                    }
                }
            },
            None => report.cancelled = true,
        }

        report.elapsed = start.elapsed();
        tracing::info!(
            "Compiled {} of {} design-time inputs in {:.2}s{}",
            report.compiled,
            report.initial_queue_length,
            report.elapsed.as_secs_f64(),
            if report.cancelled { " (cancelled)" } else { "" }
        );
        self.telemetry.record(report.to_event());
        report
    }

    async fn compile_item(
        &self,
        compiler: &mut dyn Compiler,
        item: &QueueItem,
        token: &CancellationToken,
    ) -> ItemOutcome {
        let output = self.artifact_path(item);
        let inputs = item.compile_inputs();

        if !item.ignore_staleness_check && !needs_recompile(self.fs.as_ref(), &output, &inputs) {
            tracing::debug!("{} is up to date", output.display());
            return ItemOutcome::UpToDate;
        }

        let succeeded = if token.is_cancelled() {
            false
        } else {
            match self.fs.create_dir_all(&item.output_directory) {
                Ok(()) => {
                    tracing::debug!("Compiling {} -> {}", item.file.display(), output.display());
                    compiler.compile(&output, &inputs, token).await
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to create output directory {}: {}",
                        item.output_directory.display(),
                        e
                    );
                    false
                }
            }
        };

        if succeeded {
            return ItemOutcome::Compiled;
        }

        self.remove_artifact(&output);
        if token.is_cancelled() {
            ItemOutcome::Cancelled
        } else {
            tracing::warn!("Design-time compilation failed for {}", item.file.display());
            ItemOutcome::Failed
        }
    }

    /// Best-effort removal of an artifact that may be out of date.
    fn remove_artifact(&self, output: &std::path::Path) {
        if !self.fs.exists(output) {
            return;
        }
        if let Err(e) = self.fs.remove(output) {
            tracing::debug!("Failed to remove {}: {}", output.display(), e);
        }
    }
}

async fn join_burst(task: JoinHandle<()>) {
    if let Err(e) = task.await {
        if e.is_panic() {
            tracing::error!("Compile burst panicked: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, UNIX_EPOCH};

    use async_trait::async_trait;
    use tempfile::TempDir;
    use tokio::sync::Notify;

    use crate::compile::StdFileSystem;
    use crate::snapshot::{InputSet, InputSetUpdate, OutputPathInputs};
    use crate::telemetry::{TelemetryEvent, TracingTelemetry};
    use crate::tracker::ChangeTracker;

    #[derive(Clone, Default)]
    struct RecordingCompiler {
        calls: Arc<Mutex<Vec<PathBuf>>>,
        fail: bool,
    }

    impl RecordingCompiler {
        fn count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Compiler for RecordingCompiler {
        async fn compile(&mut self, output: &Path, inputs: &[PathBuf], _: &CancellationToken) -> bool {
            self.calls.lock().unwrap().push(inputs[0].clone());
            if self.fail {
                return false;
            }
            fs::write(output, format!("{} inputs", inputs.len())).is_ok()
        }
    }

    /// Compiles the first item only after cancellation, reporting failure.
    struct BlockingCompiler {
        started: Arc<Notify>,
        attempts: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Compiler for BlockingCompiler {
        async fn compile(&mut self, _: &Path, _: &[PathBuf], cancel: &CancellationToken) -> bool {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            self.started.notify_one();
            cancel.cancelled().await;
            false
        }
    }

    #[derive(Default)]
    struct RecordingTelemetry {
        events: Mutex<Vec<TelemetryEvent>>,
    }

    impl Telemetry for RecordingTelemetry {
        fn record(&self, event: TelemetryEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    struct Project {
        temp: TempDir,
        tracker: ChangeTracker,
    }

    impl Project {
        fn new(files: &[&str]) -> Self {
            let temp = TempDir::new().unwrap();
            for file in files {
                write_at(&temp.path().join(file), 1_000);
            }
            Self {
                temp,
                tracker: ChangeTracker::new("TempPE"),
            }
        }

        fn path(&self, file: &str) -> PathBuf {
            self.temp.path().join(file)
        }

        fn artifact(&self, file: &str) -> PathBuf {
            self.temp
                .path()
                .join("obj")
                .join("TempPE")
                .join(format!("{file}.dll"))
        }

        fn snapshot(&mut self, inputs: &[&str], shared: &[&str]) -> Snapshot {
            let version = self.tracker.version() + 1;
            self.tracker.apply(&InputSetUpdate {
                input_set: InputSet::new(
                    inputs.iter().map(|f| self.path(f)),
                    shared.iter().map(|f| self.path(f)),
                ),
                output_path: OutputPathInputs {
                    project_dir: self.temp.path().to_path_buf(),
                    root_namespace: "App".to_string(),
                    intermediate_output_path: PathBuf::from("obj"),
                },
                version,
            })
        }
    }

    fn write_at(path: &Path, secs: u64) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "x").unwrap();
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(UNIX_EPOCH + Duration::from_secs(secs))
            .unwrap();
    }

    fn scheduler(config: PipelineConfig, compiler: impl Compiler + 'static) -> CompileScheduler {
        CompileScheduler::new(
            config,
            Box::new(compiler),
            Arc::new(StdFileSystem),
            Arc::new(TracingTelemetry),
            CancellationToken::new(),
        )
    }

    /// Debounce long enough that no burst drains during a test.
    fn never() -> PipelineConfig {
        PipelineConfig::with_debounce(Duration::from_secs(3600))
    }

    #[tokio::test]
    async fn test_drain_compiles_missing_artifacts() {
        let mut project = Project::new(&["A.cs", "B.cs"]);
        let compiler = RecordingCompiler::default();
        let scheduler = scheduler(never(), compiler.clone());

        scheduler.schedule(&project.snapshot(&["A.cs", "B.cs"], &[]));
        let report = scheduler.drain(&CancellationToken::new()).await;

        assert_eq!(report.compiled, 2);
        assert_eq!(report.initial_queue_length, 2);
        assert!(!report.cancelled);
        assert!(project.artifact("A.cs").exists());
        assert!(project.artifact("B.cs").exists());
        assert!(scheduler.queue().is_empty());
    }

    #[tokio::test]
    async fn test_up_to_date_artifact_is_skipped() {
        let mut project = Project::new(&["A.cs"]);
        write_at(&project.artifact("A.cs"), 2_000);
        let compiler = RecordingCompiler::default();
        let scheduler = scheduler(never(), compiler.clone());

        scheduler.schedule(&project.snapshot(&["A.cs"], &[]));
        let report = scheduler.drain(&CancellationToken::new()).await;

        assert_eq!(report.compiled, 0);
        assert_eq!(compiler.count(), 0);
    }

    #[tokio::test]
    async fn test_forced_item_ignores_timestamps() {
        let mut project = Project::new(&["A.cs", "S.cs"]);
        write_at(&project.artifact("A.cs"), 2_000);
        let compiler = RecordingCompiler::default();
        let scheduler = scheduler(never(), compiler.clone());

        scheduler.schedule(&project.snapshot(&["A.cs"], &[]));
        scheduler.drain(&CancellationToken::new()).await;
        assert_eq!(compiler.count(), 0);

        // Promoting S.cs to shared forces A.cs even though it looks fresh.
        scheduler.schedule(&project.snapshot(&["A.cs"], &["S.cs"]));
        let report = scheduler.drain(&CancellationToken::new()).await;
        assert_eq!(report.compiled, 1);
        assert_eq!(
            fs::read_to_string(project.artifact("A.cs")).unwrap(),
            "2 inputs"
        );
    }

    #[tokio::test]
    async fn test_failure_removes_stale_artifact() {
        let mut project = Project::new(&["A.cs"]);
        write_at(&project.artifact("A.cs"), 500);
        let compiler = RecordingCompiler {
            fail: true,
            ..Default::default()
        };
        let scheduler = scheduler(never(), compiler.clone());

        scheduler.schedule(&project.snapshot(&["A.cs"], &[]));
        let report = scheduler.drain(&CancellationToken::new()).await;

        assert_eq!(report.compiled, 0);
        assert_eq!(compiler.count(), 1);
        assert!(!project.artifact("A.cs").exists());
        assert!(scheduler.queue().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_item_is_requeued() {
        let mut project = Project::new(&["A.cs"]);
        write_at(&project.artifact("A.cs"), 500);
        let started = Arc::new(Notify::new());
        let attempts = Arc::new(AtomicUsize::new(0));
        let scheduler = scheduler(
            never(),
            BlockingCompiler {
                started: started.clone(),
                attempts: attempts.clone(),
            },
        );

        scheduler.schedule(&project.snapshot(&["A.cs"], &[]));
        let token = CancellationToken::new();
        let drain = tokio::spawn({
            let scheduler = scheduler.clone();
            let token = token.clone();
            async move { scheduler.drain(&token).await }
        });

        started.notified().await;
        assert!(scheduler.queue().is_empty());
        token.cancel();
        let report = drain.await.unwrap();

        assert!(report.cancelled);
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert!(!project.artifact("A.cs").exists());
        let item = scheduler.queue().pop().expect("cancelled item was dropped");
        assert_eq!(item.file, project.path("A.cs"));
    }

    #[tokio::test]
    async fn test_debounced_burst_compiles_each_file_once() {
        let mut project = Project::new(&["A.cs", "B.cs"]);
        let compiler = RecordingCompiler::default();
        let scheduler = scheduler(PipelineConfig::immediate(), compiler.clone());

        let first = project.snapshot(&["A.cs"], &[]);
        let second = project.snapshot(&["A.cs", "B.cs"], &[]);
        scheduler.schedule(&first);
        scheduler.schedule(&second);

        tokio::time::timeout(Duration::from_secs(5), async {
            while compiler.count() < 2 || !scheduler.queue().is_empty() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("burst never drained");
        scheduler.shutdown().await;

        assert_eq!(compiler.count(), 2);
    }

    #[tokio::test]
    async fn test_request_takes_over_queued_item() {
        let mut project = Project::new(&["A.cs", "B.cs"]);
        let compiler = RecordingCompiler::default();
        let scheduler = scheduler(never(), compiler.clone());

        let snapshot = project.snapshot(&["A.cs", "B.cs"], &[]);
        scheduler.schedule(&snapshot);
        assert!(scheduler.queue().contains(&project.path("A.cs")));

        let descriptor = scheduler.request(&snapshot, "A.cs", false).await.unwrap();

        assert_eq!(descriptor.name, "A.cs");
        assert_eq!(descriptor.path, project.artifact("A.cs"));
        assert_eq!(descriptor.symbol, "A.cs");
        assert!(descriptor.exists());
        assert_eq!(compiler.count(), 1);
        assert!(!scheduler.queue().contains(&project.path("A.cs")));
        assert!(scheduler.queue().contains(&project.path("B.cs")));

        // A second request finds the artifact fresh.
        scheduler.request(&snapshot, "A.cs", false).await.unwrap();
        assert_eq!(compiler.count(), 1);
        scheduler.request(&snapshot, "A.cs", true).await.unwrap();
        assert_eq!(compiler.count(), 2);
    }

    #[tokio::test]
    async fn test_request_errors() {
        let mut project = Project::new(&["A.cs"]);
        let scheduler = scheduler(
            never(),
            RecordingCompiler {
                fail: true,
                ..Default::default()
            },
        );
        let snapshot = project.snapshot(&["A.cs"], &[]);

        assert!(matches!(
            scheduler.request(&Snapshot::empty(9), "A.cs", false).await,
            Err(Error::NotReady)
        ));
        assert!(matches!(
            scheduler.request(&snapshot, "Nope.cs", false).await,
            Err(Error::UnknownArtifact(_))
        ));
        assert!(matches!(
            scheduler.request(&snapshot, "A.cs", false).await,
            Err(Error::CompilationFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_reconcile_on_schedule_drops_removed_inputs() {
        let mut project = Project::new(&["A.cs", "B.cs"]);
        let scheduler = scheduler(never(), RecordingCompiler::default());

        scheduler.schedule(&project.snapshot(&["A.cs", "B.cs"], &[]));
        scheduler.schedule(&project.snapshot(&["A.cs"], &[]));

        assert_eq!(scheduler.queue().len(), 1);
        assert!(scheduler.queue().contains(&project.path("A.cs")));
    }

    #[tokio::test]
    async fn test_shutdown_waits_for_in_flight_drain() {
        let mut project = Project::new(&["A.cs"]);
        let started = Arc::new(Notify::new());
        let telemetry = Arc::new(RecordingTelemetry::default());
        let scheduler = CompileScheduler::new(
            PipelineConfig::immediate(),
            Box::new(BlockingCompiler {
                started: started.clone(),
                attempts: Arc::default(),
            }),
            Arc::new(StdFileSystem),
            telemetry.clone(),
            CancellationToken::new(),
        );

        scheduler.schedule(&project.snapshot(&["A.cs"], &[]));
        started.notified().await;
        scheduler.shutdown().await;

        // The drain finished (and reported) before shutdown returned.
        let events = telemetry.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].property("cancelled"),
            Some(&serde_json::Value::Bool(true))
        );
        drop(events);

        // Nothing is scheduled after shutdown.
        scheduler.schedule(&project.snapshot(&["A.cs", "B.cs"], &[]));
        assert!(lock(&scheduler.inner.burst).task.is_none());
    }

    #[tokio::test]
    async fn test_cancelled_item_removed_from_inputs_is_not_requeued() {
        let mut project = Project::new(&["A.cs", "B.cs"]);
        let started = Arc::new(Notify::new());
        let scheduler = scheduler(
            never(),
            BlockingCompiler {
                started: started.clone(),
                attempts: Arc::default(),
            },
        );

        scheduler.schedule(&project.snapshot(&["A.cs"], &[]));
        let token = CancellationToken::new();
        let drain = tokio::spawn({
            let scheduler = scheduler.clone();
            let token = token.clone();
            async move { scheduler.drain(&token).await }
        });
        started.notified().await;

        // A is out of the queue being compiled when it stops being an input.
        scheduler.schedule(&project.snapshot(&["B.cs"], &[]));
        token.cancel();
        let report = drain.await.unwrap();

        assert!(report.cancelled);
        assert!(!scheduler.queue().contains(&project.path("A.cs")));
        assert!(scheduler.queue().contains(&project.path("B.cs")));
        assert_eq!(scheduler.queue().len(), 1);
    }

    /// Filesystem whose deletes always fail.
    #[derive(Default)]
    struct UndeletableFileSystem {
        removes: AtomicUsize,
    }

    impl FileSystem for UndeletableFileSystem {
        fn exists(&self, path: &Path) -> bool {
            StdFileSystem.exists(path)
        }

        fn last_write_time(&self, path: &Path) -> Option<std::time::SystemTime> {
            StdFileSystem.last_write_time(path)
        }

        fn remove(&self, _: &Path) -> std::io::Result<()> {
            self.removes.fetch_add(1, Ordering::SeqCst);
            Err(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "artifact is locked",
            ))
        }

        fn create_dir_all(&self, path: &Path) -> std::io::Result<()> {
            StdFileSystem.create_dir_all(path)
        }
    }

    #[tokio::test]
    async fn test_failed_cleanup_does_not_stop_drain() {
        let mut project = Project::new(&["A.cs", "B.cs"]);
        write_at(&project.artifact("A.cs"), 500);
        write_at(&project.artifact("B.cs"), 500);
        let compiler = RecordingCompiler {
            fail: true,
            ..Default::default()
        };
        let fs = Arc::new(UndeletableFileSystem::default());
        let scheduler = CompileScheduler::new(
            never(),
            Box::new(compiler.clone()),
            fs.clone(),
            Arc::new(TracingTelemetry),
            CancellationToken::new(),
        );

        scheduler.schedule(&project.snapshot(&["A.cs", "B.cs"], &[]));
        let report = scheduler.drain(&CancellationToken::new()).await;

        assert!(!report.cancelled);
        assert_eq!(compiler.count(), 2);
        assert_eq!(fs.removes.load(Ordering::SeqCst), 2);
        assert!(project.artifact("A.cs").exists());
        assert!(scheduler.queue().is_empty());
    }
}
