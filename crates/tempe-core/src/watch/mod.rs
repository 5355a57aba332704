//! File watching for design-time inputs.
//!
//! - [`FileWatchService`]: the subscription interface consumed by the pipeline
//! - [`WatchCoordinator`]: keeps subscriptions equal to `inputs ∪ shared_inputs`
//! - [`NotifyWatchService`]: `notify`-backed service delivering change batches
//!
//! Change notifications travel as `Vec<PathBuf>` batches over an unbounded
//! channel rather than callbacks into the pipeline.

mod coordinator;
mod notify_service;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bitflags::bitflags;
use tokio::sync::mpsc;

use crate::error::Result;

pub use coordinator::WatchCoordinator;
pub use notify_service::NotifyWatchService;

bitflags! {
    /// Kinds of change a subscription reports.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct WatchFlags: u8 {
        /// Last-write-time changes.
        const WRITE_TIME = 0b01;
        /// Size (content) changes.
        const SIZE = 0b10;
    }
}

/// Opaque subscription handle returned by [`FileWatchService::advise`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatchHandle(pub u64);

/// Sender half used by watch services to publish changed-path batches.
pub type ChangeSender = mpsc::UnboundedSender<Vec<PathBuf>>;

/// Receiver half consumed by the pipeline.
pub type ChangeReceiver = mpsc::UnboundedReceiver<Vec<PathBuf>>;

/// Create a change channel.
pub fn change_channel() -> (ChangeSender, ChangeReceiver) {
    mpsc::unbounded_channel()
}

/// External file watch service.
///
/// Implementations deliver batches of changed paths on the channel they
/// were created with. `advise` may wait while the service is unavailable.
#[async_trait]
pub trait FileWatchService: Send + Sync {
    /// Subscribe to changes of `path`.
    async fn advise(&self, path: &Path, flags: WatchFlags) -> Result<WatchHandle>;

    /// Release a subscription.
    async fn unadvise(&self, handle: WatchHandle) -> Result<()>;
}
