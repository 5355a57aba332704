//! Build command implementation.
//!
//! Compiles one design-time artifact on demand, skipping it when it is
//! already up to date.

use std::sync::Arc;
use std::time::Instant;

use tempe_core::{
    CancellationToken, ChangeTracker, CompileScheduler, StdFileSystem, TracingTelemetry,
};

use crate::colors;
use crate::compiler::ProcessCompiler;
use crate::manifest::Project;

/// Execute the build command.
pub async fn execute(manifest: &str, name: &str, force: bool, json: bool) -> anyhow::Result<()> {
    let project = Project::load(manifest)?;
    let config = project.pipeline_config();
    let compiler = ProcessCompiler::new(project.compiler()?, &project.project_dir())?;

    let mut tracker = ChangeTracker::new(config.output_subfolder.clone());
    let snapshot = tracker.apply(&project.to_update(1));

    let scheduler = CompileScheduler::new(
        config,
        Box::new(compiler),
        Arc::new(StdFileSystem),
        Arc::new(TracingTelemetry),
        CancellationToken::new(),
    );

    if !json {
        colors::banner("Building", name);
        print!("{}  ◆ Compiling{} ... ", colors::BLUE, colors::RESET);
        colors::flush_stdout();
    }

    let start = Instant::now();
    let result = scheduler.request(&snapshot, name, force).await;
    scheduler.shutdown().await;

    let descriptor = match result {
        Ok(descriptor) => descriptor,
        Err(e) => {
            if !json {
                println!("{}failed{}", colors::RED, colors::RESET);
            }
            return Err(e.into());
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&descriptor)?);
        return Ok(());
    }

    println!(
        "{}done{} ({:.2}s)",
        colors::GREEN,
        colors::RESET,
        start.elapsed().as_secs_f64()
    );
    println!("\n  name:     {}", descriptor.name);
    println!("  artifact: {}", descriptor.path.display());
    println!("  symbol:   {}", descriptor.symbol);
    Ok(())
}
