//! Incremental design-time compilation for single-file artifacts.
//!
//! This crate provides:
//! - Change tracking between versioned input set publications
//! - File watch coordination for every design-time input
//! - A deduplicated, mergeable compilation queue
//! - A debounced compile scheduler with timestamp staleness checks,
//!   cooperative cancellation and on-demand artifact requests

pub mod compile;
pub mod config;
pub mod error;
pub mod paths;
pub mod pipeline;
pub mod queue;
pub mod snapshot;
mod sync;
pub mod telemetry;
pub mod tracker;
pub mod watch;

pub use compile::{
    ArtifactDescriptor, CompilationContext, CompileScheduler, Compiler, DrainReport, FileSystem,
    StdFileSystem,
};
pub use config::PipelineConfig;
pub use error::{Error, Result};
pub use pipeline::{DesignTimePipeline, UpdateReceiver, UpdateSender, update_channel};
pub use queue::{CompilationQueue, QueueItem};
pub use snapshot::{ChangeRecord, InputSet, InputSetUpdate, OutputPathInputs, Snapshot};
pub use telemetry::{Telemetry, TelemetryEvent, TracingTelemetry};
pub use tracker::ChangeTracker;
pub use watch::{
    ChangeReceiver, ChangeSender, FileWatchService, NotifyWatchService, WatchCoordinator,
    WatchFlags, WatchHandle, change_channel,
};

pub use tokio_util::sync::CancellationToken;
