//! External process compiler.
//!
//! Runs the manifest's compiler program once per artifact. The argument
//! template is expanded per call: `{output}` becomes the artifact path and
//! a lone `{inputs}` argument expands to one argument per input file.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::Context;
use async_trait::async_trait;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use tempe_core::Compiler;

use crate::manifest::CompilerSpec;

const OUTPUT_PLACEHOLDER: &str = "{output}";
const INPUTS_PLACEHOLDER: &str = "{inputs}";

/// Compiler that spawns a configured program.
#[derive(Debug, Clone)]
pub struct ProcessCompiler {
    program: PathBuf,
    args: Vec<String>,
    working_dir: PathBuf,
}

impl ProcessCompiler {
    /// Resolve `spec.program` on `PATH` (or relative to `working_dir` when
    /// it contains a separator).
    pub fn new(spec: &CompilerSpec, working_dir: &Path) -> anyhow::Result<Self> {
        let program = if spec.program.contains(['/', '\\']) {
            working_dir.join(&spec.program)
        } else {
            which::which(&spec.program)
                .with_context(|| format!("Compiler `{}` not found in PATH", spec.program))?
        };

        Ok(Self {
            program,
            args: spec.args.clone(),
            working_dir: working_dir.to_path_buf(),
        })
    }

    /// Expand the argument template for one compilation.
    pub fn expand_args(&self, output: &Path, inputs: &[PathBuf]) -> Vec<String> {
        let output = output.to_string_lossy();
        let mut expanded = Vec::with_capacity(self.args.len() + inputs.len());
        for arg in &self.args {
            if arg == INPUTS_PLACEHOLDER {
                expanded.extend(inputs.iter().map(|p| p.to_string_lossy().into_owned()));
            } else {
                expanded.push(arg.replace(OUTPUT_PLACEHOLDER, &output));
            }
        }
        expanded
    }
}

#[async_trait]
impl Compiler for ProcessCompiler {
    async fn compile(&mut self, output: &Path, inputs: &[PathBuf], cancel: &CancellationToken) -> bool {
        let args = self.expand_args(output, inputs);
        tracing::debug!("Running {} {}", self.program.display(), args.join(" "));

        let child = Command::new(&self.program)
            .args(&args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();
        let child = match child {
            Ok(child) => child,
            Err(e) => {
                tracing::warn!("Failed to spawn {}: {}", self.program.display(), e);
                return false;
            }
        };

        // Dropping the output future kills the child.
        let result = tokio::select! {
            result = child.wait_with_output() => result,
            _ = cancel.cancelled() => {
                tracing::debug!("Cancelled compilation of {}", output.display());
                return false;
            }
        };

        match result {
            Ok(out) if out.status.success() => true,
            Ok(out) => {
                tracing::warn!(
                    "Compiler exited with {} for {}: {}",
                    out.status,
                    output.display(),
                    String::from_utf8_lossy(&out.stderr).trim()
                );
                false
            }
            Err(e) => {
                tracing::warn!("Failed to wait for {}: {}", self.program.display(), e);
                false
            }
        }
    }
}
