//! Filesystem access and the timestamp staleness check.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Filesystem operations used by the compile loop.
pub trait FileSystem: Send + Sync {
    fn exists(&self, path: &Path) -> bool;

    /// Last write time, or `None` if it cannot be read.
    fn last_write_time(&self, path: &Path) -> Option<SystemTime>;

    fn remove(&self, path: &Path) -> io::Result<()>;

    fn create_dir_all(&self, path: &Path) -> io::Result<()>;
}

/// [`FileSystem`] backed by `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdFileSystem;

impl FileSystem for StdFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn last_write_time(&self, path: &Path) -> Option<SystemTime> {
        fs::metadata(path).and_then(|m| m.modified()).ok()
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }
}

/// Whether `output` must be rebuilt from `inputs`.
///
/// True if the output is missing, if any timestamp cannot be read, or if
/// any input was written after the output.
pub fn needs_recompile(fs: &dyn FileSystem, output: &Path, inputs: &[PathBuf]) -> bool {
    if !fs.exists(output) {
        return true;
    }
    let Some(output_time) = fs.last_write_time(output) else {
        return true;
    };

    inputs.iter().any(|input| match fs.last_write_time(input) {
        Some(input_time) => input_time > output_time,
        None => {
            tracing::debug!("Cannot read timestamp of {}", input.display());
            true
        }
    })
}
