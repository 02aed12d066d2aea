//! External package compiler.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{DeployError, Result};
use crate::params::DeploymentParameters;

use super::package::read_entries;

/// Default compiler command line. Placeholders are substituted per artifact.
pub const DEFAULT_COMPILER: &str = "pbi-tools compile {PROJECT_FOLDER} {OUTPUT_PATH} PBIX True";

const OVERRIDES_FILE: &str = "overrides.json";

/// A compiled package on disk plus its archive listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPackage {
    pub path: PathBuf,
    pub entries: Vec<String>,
}

/// Turns a project folder into a deployable package.
#[async_trait]
pub trait PackageCompiler: Send + Sync {
    async fn compile(
        &self,
        project_folder: &Path,
        output_path: &Path,
        parameters: &DeploymentParameters,
    ) -> Result<CompiledPackage>;
}

/// Runs an external program to compile each project.
///
/// Arguments may contain `{PROJECT_FOLDER}`, `{OUTPUT_PATH}` and
/// `{OVERRIDES_PATH}`. The override file holds the artifact parameters as JSON.
#[derive(Debug, Clone)]
pub struct CommandCompiler {
    program: String,
    args: Vec<String>,
}

impl CommandCompiler {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Parse a whitespace-separated command line.
    pub fn from_command_line(command_line: &str) -> Result<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| DeployError::config("compiler command line is empty"))?;
        Ok(Self::new(program, parts.collect()))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn render_args(&self, project: &Path, output: &Path, overrides: &Path) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{PROJECT_FOLDER}", &project.to_string_lossy())
                    .replace("{OUTPUT_PATH}", &output.to_string_lossy())
                    .replace("{OVERRIDES_PATH}", &overrides.to_string_lossy())
            })
            .collect()
    }
}

impl Default for CommandCompiler {
    fn default() -> Self {
        // DEFAULT_COMPILER is never empty
        let mut parts = DEFAULT_COMPILER.split_whitespace().map(str::to_string);
        let program = parts.next().unwrap_or_default();
        Self::new(program, parts.collect())
    }
}

#[async_trait]
impl PackageCompiler for CommandCompiler {
    async fn compile(
        &self,
        project_folder: &Path,
        output_path: &Path,
        parameters: &DeploymentParameters,
    ) -> Result<CompiledPackage> {
        let compile_error = |message: String| DeployError::Compile {
            project: project_folder.to_path_buf(),
            message,
        };

        let scratch_dir = output_path
            .parent()
            .ok_or_else(|| compile_error("output path has no parent directory".to_string()))?;
        tokio::fs::create_dir_all(scratch_dir).await?;

        let overrides_path = scratch_dir.join(OVERRIDES_FILE);
        let overrides = serde_json::to_vec_pretty(parameters)
            .map_err(|e| compile_error(format!("failed to serialize overrides: {}", e)))?;
        tokio::fs::write(&overrides_path, overrides).await?;

        let args = self.render_args(project_folder, output_path, &overrides_path);
        debug!(program = %self.program, ?args, "invoking package compiler");

        let output = Command::new(&self.program)
            .args(&args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| compile_error(format!("failed to start '{}': {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(compile_error(format!(
                "compiler exited with {}: {}",
                output.status, stderr
            )));
        }

        let produced = tokio::fs::metadata(output_path)
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false);
        if !produced {
            return Err(compile_error(format!(
                "compiler did not produce {}",
                output_path.display()
            )));
        }

        let entries = read_entries(output_path)
            .await
            .map_err(|e| compile_error(format!("{:#}", e)))?;
        info!(
            project = %project_folder.display(),
            package = %output_path.display(),
            entries = entries.len(),
            "compiled package"
        );

        Ok(CompiledPackage {
            path: output_path.to_path_buf(),
            entries,
        })
    }
}
