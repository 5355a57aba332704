//! Project manifest (`tempe.json`) loading.
//!
//! A manifest lists the design-time inputs of one project:
//!
//! ```json
//! {
//!   "rootNamespace": "App",
//!   "intermediateOutputPath": "obj/Debug",
//!   "inputs": ["Forms/Form1.cs"],
//!   "sharedInputs": ["Properties/Settings.cs"],
//!   "compiler": { "program": "csc", "args": ["-out:{output}", "{inputs}"] },
//!   "debounceMs": 500
//! }
//! ```
//!
//! Relative paths resolve against the project directory, which defaults to
//! the directory holding the manifest.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use tempe_core::{InputSet, InputSetUpdate, OutputPathInputs, PipelineConfig};

/// Default manifest file name.
pub const MANIFEST_FILE: &str = "tempe.json";

/// External compiler invocation.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CompilerSpec {
    /// Program name (looked up on `PATH`) or path.
    pub program: String,
    /// Argument template. `{output}` is replaced by the artifact path,
    /// `{inputs}` expands to one argument per input file.
    #[serde(default)]
    pub args: Vec<String>,
}

/// Contents of a `tempe.json` file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default)]
    pub project_dir: Option<PathBuf>,
    #[serde(default)]
    pub root_namespace: String,
    #[serde(default = "default_intermediate_output_path")]
    pub intermediate_output_path: PathBuf,
    #[serde(default)]
    pub inputs: Vec<PathBuf>,
    #[serde(default)]
    pub shared_inputs: Vec<PathBuf>,
    #[serde(default)]
    pub compiler: Option<CompilerSpec>,
    #[serde(default)]
    pub debounce_ms: Option<u64>,
}

fn default_intermediate_output_path() -> PathBuf {
    PathBuf::from("obj")
}

/// A manifest together with the absolute location it was read from.
#[derive(Debug, Clone)]
pub struct Project {
    pub manifest_path: PathBuf,
    pub manifest: Manifest,
}

impl Project {
    /// Load a manifest. `path` may name the manifest file or the directory
    /// containing `tempe.json`.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let path = if path.is_dir() {
            path.join(MANIFEST_FILE)
        } else {
            path.to_path_buf()
        };
        if !path.exists() {
            anyhow::bail!("Manifest not found: {}", path.display());
        }

        let manifest_path = path
            .canonicalize()
            .with_context(|| format!("Failed to resolve {}", path.display()))?;
        let manifest = read_manifest(&manifest_path)?;

        Ok(Self {
            manifest_path,
            manifest,
        })
    }

    /// Re-read the manifest from disk.
    pub fn reload(&self) -> anyhow::Result<Self> {
        Ok(Self {
            manifest_path: self.manifest_path.clone(),
            manifest: read_manifest(&self.manifest_path)?,
        })
    }

    /// Absolute project directory.
    pub fn project_dir(&self) -> PathBuf {
        let manifest_dir = self
            .manifest_path
            .parent()
            .unwrap_or(Path::new("/"))
            .to_path_buf();
        match &self.manifest.project_dir {
            Some(dir) => manifest_dir.join(dir),
            None => manifest_dir,
        }
    }

    /// The manifest as a versioned input set publication.
    pub fn to_update(&self, version: u64) -> InputSetUpdate {
        let project_dir = self.project_dir();
        let resolve = |file: &PathBuf| project_dir.join(file);

        InputSetUpdate {
            input_set: InputSet::new(
                self.manifest.inputs.iter().map(resolve),
                self.manifest.shared_inputs.iter().map(resolve),
            ),
            output_path: OutputPathInputs {
                project_dir: project_dir.clone(),
                root_namespace: self.manifest.root_namespace.clone(),
                intermediate_output_path: self.manifest.intermediate_output_path.clone(),
            },
            version,
        }
    }

    /// Pipeline configuration, with the manifest's debounce override.
    pub fn pipeline_config(&self) -> PipelineConfig {
        match self.manifest.debounce_ms {
            Some(ms) => PipelineConfig::with_debounce(Duration::from_millis(ms)),
            None => PipelineConfig::default(),
        }
    }

    /// The configured compiler.
    pub fn compiler(&self) -> anyhow::Result<&CompilerSpec> {
        self.manifest.compiler.as_ref().with_context(|| {
            format!(
                "No compiler configured in {} (add a \"compiler\" entry)",
                self.manifest_path.display()
            )
        })
    }
}

fn read_manifest(path: &Path) -> anyhow::Result<Manifest> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&source).with_context(|| format!("Invalid manifest {}", path.display()))
}
