//! Artifact path management.
//!
//! Artifacts live under a fixed subfolder of the project's intermediate
//! output path, named after the project-relative path of their input:
//!
//! ```text
//! project/
//! ├── Forms/Form1.cs
//! └── obj/Debug/
//!     └── TempPE/
//!         └── Forms.Form1.cs.dll
//! ```

use std::path::{Component, Path, PathBuf};

use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::snapshot::OutputPathInputs;

/// Compute `project_dir / intermediate_output_path / subfolder`.
///
/// # Errors
/// Returns [`Error::InvalidOutputPath`] if the project directory is missing
/// or relative, or if any part contains a NUL byte.
pub fn output_directory(inputs: &OutputPathInputs, subfolder: &str) -> Result<PathBuf> {
    let project_dir = &inputs.project_dir;
    if project_dir.as_os_str().is_empty() {
        return Err(Error::InvalidOutputPath(
            "project directory is not set".to_string(),
        ));
    }
    if !project_dir.is_absolute() {
        return Err(Error::InvalidOutputPath(format!(
            "project directory is not absolute: {}",
            project_dir.display()
        )));
    }

    for part in [
        project_dir.as_path(),
        inputs.intermediate_output_path.as_path(),
        Path::new(subfolder),
    ] {
        if part.to_string_lossy().contains('\0') {
            return Err(Error::InvalidOutputPath(format!(
                "path contains a NUL byte: {}",
                part.display()
            )));
        }
    }

    Ok(project_dir
        .join(&inputs.intermediate_output_path)
        .join(subfolder))
}

/// Project-relative name of `file`, always `/`-separated.
///
/// Files outside the project keep their full path.
pub fn relative_name(project_dir: &Path, file: &Path) -> String {
    let relative = file.strip_prefix(project_dir).unwrap_or(file);
    let parts: Vec<String> = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            Component::Prefix(prefix) => Some(prefix.as_os_str().to_string_lossy().into_owned()),
            Component::RootDir | Component::CurDir => None,
        })
        .collect();
    let name = parts.join("/");
    if relative.has_root() && !file.starts_with(project_dir) {
        format!("/{name}")
    } else {
        name
    }
}

/// Flatten the project-relative path of `file` into a single file name.
///
/// Separators and drive colons become `.`, so `Forms/Form1.cs` maps to
/// `Forms.Form1.cs`. The mapping is not injective: `Forms.Form1.cs` at the
/// project root flattens to the same name and both inputs then share one
/// artifact. [`colliding_inputs`] reports such pairs.
pub fn sanitize(project_dir: &Path, file: &Path) -> String {
    let relative = file.strip_prefix(project_dir).unwrap_or(file);
    let parts: Vec<String> = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::ParentDir => Some("_".to_string()),
            Component::Prefix(prefix) => Some(
                prefix
                    .as_os_str()
                    .to_string_lossy()
                    .replace([':', '\\', '/', '?'], ""),
            ),
            Component::RootDir | Component::CurDir => None,
        })
        .filter(|part| !part.is_empty())
        .collect();
    parts.join(".")
}

/// Pairs of inputs whose artifact names collide, in iteration order.
///
/// Each pair holds the first input that claimed the name and a later input
/// mapping to the same name.
pub fn colliding_inputs<'a, I>(project_dir: &Path, files: I) -> Vec<(PathBuf, PathBuf)>
where
    I: IntoIterator<Item = &'a PathBuf>,
{
    let mut claimed: FxHashMap<String, &PathBuf> = FxHashMap::default();
    let mut collisions = Vec::new();
    for file in files {
        let name = sanitize(project_dir, file);
        match claimed.get(&name) {
            Some(first) => collisions.push(((*first).clone(), file.clone())),
            None => {
                claimed.insert(name, file);
            }
        }
    }
    collisions
}

/// Full path of the artifact compiled from `file`.
pub fn artifact_path(
    output_directory: &Path,
    project_dir: &Path,
    file: &Path,
    extension: &str,
) -> PathBuf {
    let stem = sanitize(project_dir, file);
    if extension.is_empty() {
        output_directory.join(stem)
    } else {
        output_directory.join(format!("{stem}.{extension}"))
    }
}
