//! The compiler collaborator and its serialized context.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::{Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;

/// Compiles a set of input files into one artifact.
///
/// Failures are reported as `false`, never as errors. Implementations
/// should return promptly once `cancel` fires.
#[async_trait]
pub trait Compiler: Send {
    async fn compile(
        &mut self,
        output: &Path,
        inputs: &[PathBuf],
        cancel: &CancellationToken,
    ) -> bool;
}

/// Exclusive access to the compiler.
///
/// Background drains and on-demand requests both go through
/// [`CompilationContext::exclusive`], so at most one compilation runs at a time.
pub struct CompilationContext {
    compiler: Mutex<Box<dyn Compiler>>,
}

impl CompilationContext {
    /// Wrap `compiler` in a serialized context.
    pub fn new(compiler: Box<dyn Compiler>) -> Self {
        Self {
            compiler: Mutex::new(compiler),
        }
    }

    /// Wait for exclusive access.
    pub async fn exclusive(&self) -> MutexGuard<'_, Box<dyn Compiler>> {
        self.compiler.lock().await
    }
}
