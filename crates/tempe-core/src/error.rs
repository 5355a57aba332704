//! Error types for tempe-core.

use thiserror::Error;

/// Result type for tempe-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in tempe-core.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The output directory could not be derived from the project properties.
    #[error("invalid output path: {0}")]
    InvalidOutputPath(String),

    /// No valid snapshot has been published yet.
    #[error("design-time inputs are not available yet")]
    NotReady,

    /// The requested artifact is not a current design-time input.
    #[error("unknown design-time artifact: {0}")]
    UnknownArtifact(String),

    /// The compiler reported failure for an artifact.
    #[error("compilation failed for {name}")]
    CompilationFailed { name: String },

    /// The operation was cancelled before it completed.
    #[error("operation cancelled")]
    Cancelled,

    /// File watch service error.
    #[error("file watch error: {0}")]
    Watch(String),

    /// The pipeline is already running.
    #[error("pipeline already started")]
    AlreadyStarted,

    /// The pipeline has been disposed.
    #[error("pipeline disposed")]
    Disposed,
}

impl Error {
    /// Recovery hint shown alongside the error, if one applies.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::InvalidOutputPath(_) => {
                Some("check the project directory and intermediate output path")
            }
            Self::NotReady => Some("wait for the input set to be loaded and retry"),
            Self::UnknownArtifact(_) => {
                Some("use `tempe list` to see the known design-time inputs")
            }
            Self::CompilationFailed { .. } => {
                Some("run with --verbose to see the compiler invocation")
            }
            _ => None,
        }
    }

    /// Render the error followed by its hint.
    pub fn with_hint(&self) -> String {
        match self.hint() {
            Some(hint) => format!("{self}\n  hint: {hint}"),
            None => self.to_string(),
        }
    }
}
