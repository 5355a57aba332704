//! Pipeline configuration.

use std::time::Duration;

use crate::watch::WatchFlags;

/// Default quiet period before a burst of changes is compiled.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Configuration for the design-time compilation pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Quiet period after the last change before the queue is drained.
    pub debounce: Duration,

    /// Subfolder of the intermediate output path holding artifacts.
    pub output_subfolder: String,

    /// Extension appended to every artifact file name (without the dot).
    pub artifact_extension: String,

    /// Which changes the file watch service should report.
    pub watch_flags: WatchFlags,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            output_subfolder: "TempPE".to_string(),
            artifact_extension: "dll".to_string(),
            watch_flags: WatchFlags::WRITE_TIME | WatchFlags::SIZE,
        }
    }
}

impl PipelineConfig {
    /// Config with a custom debounce window.
    pub fn with_debounce(debounce: Duration) -> Self {
        Self {
            debounce,
            ..Self::default()
        }
    }

    /// Config suited to tests and scripted runs: a short window.
    pub fn immediate() -> Self {
        Self::with_debounce(Duration::from_millis(10))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.debounce, Duration::from_millis(500));
        assert_eq!(config.output_subfolder, "TempPE");
        assert_eq!(config.artifact_extension, "dll");
        assert!(config.watch_flags.contains(WatchFlags::WRITE_TIME));
        assert!(config.watch_flags.contains(WatchFlags::SIZE));
    }

    #[test]
    fn test_with_debounce_keeps_defaults() {
        let config = PipelineConfig::with_debounce(Duration::from_secs(2));
        assert_eq!(config.debounce, Duration::from_secs(2));
        assert_eq!(config.output_subfolder, "TempPE");
    }
}
