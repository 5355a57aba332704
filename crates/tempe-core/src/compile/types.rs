//! Common types for the compilation pipeline.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;

use crate::telemetry::{COMPILE_BURST_EVENT, TelemetryEvent};

/// Reference to a compiled design-time artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactDescriptor {
    /// Project-relative name of the input.
    pub name: String,

    /// Path to the compiled artifact.
    pub path: PathBuf,

    /// Symbolic name a consumer loads the artifact by (its file stem).
    pub symbol: String,
}

impl ArtifactDescriptor {
    pub(crate) fn new(name: String, path: PathBuf) -> Self {
        let symbol = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { name, path, symbol }
    }

    /// Whether the artifact currently exists on disk.
    pub fn exists(&self) -> bool {
        Path::new(&self.path).exists()
    }
}

/// Outcome of one staleness-check-or-compile step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    /// The compiler ran and succeeded.
    Compiled,
    /// The artifact was newer than every input.
    UpToDate,
    /// The compiler failed; any stale artifact was removed.
    Failed,
    /// Cancellation interrupted the step; any stale artifact was removed.
    Cancelled,
}

/// Summary of one drain of the compilation queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrainReport {
    /// Items the compiler ran for successfully.
    pub compiled: usize,
    /// Queue length when the drain started.
    pub initial_queue_length: usize,
    /// Whether the drain stopped because of cancellation.
    pub cancelled: bool,
    pub elapsed: Duration,
}

impl DrainReport {
    /// Telemetry event describing this drain.
    pub fn to_event(&self) -> TelemetryEvent {
        TelemetryEvent::new(COMPILE_BURST_EVENT)
            .with("compiled", self.compiled as u64)
            .with("initial_queue_length", self.initial_queue_length as u64)
            .with("cancelled", self.cancelled)
            .with("elapsed_ms", self.elapsed.as_millis() as u64)
    }
}
