//! Compilation of design-time artifacts.
//!
//! This module provides:
//! - The compiler collaborator and its serialized context
//! - The timestamp staleness check
//! - The debounced scheduler and queue drain loop
//! - On-demand (synchronous) artifact requests
//!
//! # Architecture
//!
//! ```text
//! Snapshot ──► CompileScheduler::schedule ──► CompilationQueue
//!                      │
//!                      └── debounce ──► drain ──► staleness check ──► Compiler
//!                                                        ▲
//! request_artifact ──────────────────────────────────────┘ (same exclusive context)
//! ```

mod context;
mod scheduler;
mod staleness;
mod types;

pub use context::{CompilationContext, Compiler};
pub use scheduler::CompileScheduler;
pub use staleness::{FileSystem, StdFileSystem, needs_recompile};
pub use types::{ArtifactDescriptor, DrainReport, ItemOutcome};
