//! Input sets and the versioned snapshots derived from them.
//!
//! ```text
//! InputSetUpdate ──► ChangeTracker ──► Snapshot { inputs, shared, changed, output dir }
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::paths;

/// The current set of design-time inputs.
///
/// `shared_inputs` are compiled into every artifact in addition to the
/// specific input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputSet {
    /// Files that each get their own artifact.
    pub inputs: BTreeSet<PathBuf>,
    /// Files compiled alongside every input.
    pub shared_inputs: BTreeSet<PathBuf>,
}

impl InputSet {
    /// Create an input set from any iterables of paths.
    pub fn new<I, S>(inputs: I, shared_inputs: S) -> Self
    where
        I: IntoIterator,
        I::Item: Into<PathBuf>,
        S: IntoIterator,
        S::Item: Into<PathBuf>,
    {
        Self {
            inputs: inputs.into_iter().map(Into::into).collect(),
            shared_inputs: shared_inputs.into_iter().map(Into::into).collect(),
        }
    }

    /// Every file that must be watched: `inputs ∪ shared_inputs`.
    pub fn all_files(&self) -> BTreeSet<PathBuf> {
        self.inputs.union(&self.shared_inputs).cloned().collect()
    }
}

/// Project properties that determine where artifacts are written.
///
/// A change to any of them invalidates every artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputPathInputs {
    /// Absolute project directory.
    pub project_dir: PathBuf,
    /// Root namespace of the project.
    pub root_namespace: String,
    /// Intermediate output path, usually relative to the project directory.
    pub intermediate_output_path: PathBuf,
}

/// One versioned publication from the input set source.
#[derive(Debug, Clone)]
pub struct InputSetUpdate {
    pub input_set: InputSet,
    pub output_path: OutputPathInputs,
    pub version: u64,
}

/// A file that must be considered for recompilation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChangeRecord {
    pub file: PathBuf,
    /// Recompile regardless of timestamps.
    pub ignore_staleness_check: bool,
}

impl ChangeRecord {
    /// A change that still goes through the staleness check.
    pub fn checked(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            ignore_staleness_check: false,
        }
    }

    /// A change that forces recompilation.
    pub fn forced(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            ignore_staleness_check: true,
        }
    }
}

/// Immutable result of one change-tracker transition.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub inputs: BTreeSet<PathBuf>,
    pub shared_inputs: BTreeSet<PathBuf>,
    /// Files to reconsider as a result of this transition only.
    pub changed_inputs: Vec<ChangeRecord>,
    pub output_directory: PathBuf,
    pub project_dir: PathBuf,
    pub version: u64,
    valid: bool,
}

impl Snapshot {
    pub(crate) fn new(
        input_set: &InputSet,
        changed_inputs: Vec<ChangeRecord>,
        output_directory: PathBuf,
        project_dir: PathBuf,
        version: u64,
    ) -> Self {
        Self {
            inputs: input_set.inputs.clone(),
            shared_inputs: input_set.shared_inputs.clone(),
            changed_inputs,
            output_directory,
            project_dir,
            version,
            valid: true,
        }
    }

    /// Snapshot published when the output directory cannot be computed.
    ///
    /// File-change processing stays suspended until a valid snapshot follows.
    pub fn empty(version: u64) -> Self {
        Self {
            inputs: BTreeSet::new(),
            shared_inputs: BTreeSet::new(),
            changed_inputs: Vec::new(),
            output_directory: PathBuf::new(),
            project_dir: PathBuf::new(),
            version,
            valid: false,
        }
    }

    /// Whether this snapshot may drive compilation.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Same sets and output directory, different changes and version.
    pub(crate) fn with_changes(&self, changed_inputs: Vec<ChangeRecord>, version: u64) -> Self {
        Self {
            changed_inputs,
            version,
            ..self.clone()
        }
    }

    /// Project-relative names of every input, sorted.
    pub fn artifact_names(&self) -> Vec<String> {
        self.inputs
            .iter()
            .map(|file| paths::relative_name(&self.project_dir, file))
            .collect()
    }

    /// Find the input whose project-relative name is `name`.
    pub fn resolve(&self, name: &str) -> Option<&Path> {
        let wanted = name.replace('\\', "/");
        self.inputs
            .iter()
            .find(|file| paths::relative_name(&self.project_dir, file) == wanted)
            .map(PathBuf::as_path)
    }
}
