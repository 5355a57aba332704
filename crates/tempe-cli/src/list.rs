//! List command implementation.
//!
//! Prints every design-time input of a project with the state of its
//! artifact.

use tempe_core::{
    ChangeRecord, ChangeTracker, Error, QueueItem, StdFileSystem, compile::needs_recompile, paths,
};

use crate::colors;
use crate::manifest::Project;

/// Execute the list command.
pub fn execute(manifest: &str) -> anyhow::Result<()> {
    let project = Project::load(manifest)?;
    let config = project.pipeline_config();

    let mut tracker = ChangeTracker::new(config.output_subfolder.clone());
    let snapshot = tracker.apply(&project.to_update(1));
    if !snapshot.is_valid() {
        return Err(Error::NotReady.into());
    }

    colors::banner("Design-time inputs of", &project.manifest_path.display().to_string());

    let names = snapshot.artifact_names();
    if names.is_empty() {
        println!("{}No inputs{}", colors::DIM, colors::RESET);
        return Ok(());
    }

    for name in &names {
        let Some(file) = snapshot.resolve(name) else {
            continue;
        };
        let artifact = paths::artifact_path(
            &snapshot.output_directory,
            &snapshot.project_dir,
            file,
            &config.artifact_extension,
        );

        let inputs = QueueItem::from_change(&ChangeRecord::checked(file), &snapshot).compile_inputs();

        let status = if !artifact.exists() {
            format!("{}missing{}", colors::RED, colors::RESET)
        } else if needs_recompile(&StdFileSystem, &artifact, &inputs) {
            format!("{}stale{}", colors::YELLOW, colors::RESET)
        } else {
            format!("{}up to date{}", colors::GREEN, colors::RESET)
        };

        println!(
            "  {}  {}{}{}  {}",
            name,
            colors::DIM,
            artifact.display(),
            colors::RESET,
            status
        );
    }

    println!("\n{} inputs", names.len());
    Ok(())
}
