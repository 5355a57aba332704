//! Watch command implementation.
//!
//! Runs the design-time pipeline for a project until Ctrl+C, recompiling
//! artifacts as inputs and the manifest change.

use std::sync::Arc;

use tempe_core::{DesignTimePipeline, NotifyWatchService, change_channel, update_channel};

use crate::colors;
use crate::compiler::ProcessCompiler;
use crate::manifest::Project;
use crate::source::ManifestSource;

/// Execute the watch command.
pub async fn execute(manifest: &str) -> anyhow::Result<()> {
    let project = Project::load(manifest)?;
    let compiler = ProcessCompiler::new(project.compiler()?, &project.project_dir())?;

    let (changes_tx, changes_rx) = change_channel();
    let (updates_tx, updates_rx) = update_channel();
    let watch_service = Arc::new(NotifyWatchService::new(changes_tx)?);

    let pipeline = DesignTimePipeline::new(
        project.pipeline_config(),
        Box::new(compiler),
        watch_service,
    );
    pipeline.start(updates_rx, changes_rx)?;

    colors::banner("Watching", &project.manifest_path.display().to_string());
    println!(
        "{}{} inputs, {} shared. Watching for changes... (Ctrl+C to stop){}",
        colors::DIM,
        project.manifest.inputs.len(),
        project.manifest.shared_inputs.len(),
        colors::RESET
    );

    let source = match ManifestSource::start(project, updates_tx).await {
        Ok(source) => source,
        Err(e) => {
            pipeline.dispose().await;
            return Err(e);
        }
    };

    let signal = tokio::signal::ctrl_c().await;

    println!("\n{}Stopping...{}", colors::YELLOW, colors::RESET);
    drop(source);
    pipeline.dispose().await;
    signal?;
    println!("{}Stopped{}", colors::GREEN, colors::RESET);
    Ok(())
}
