//! Build adapter for the external kustomize tool.
//!
//! The [`Builder`] trait decouples the render pipeline from the actual tool
//! (`kubectl kustomize` by default). Tests use scripted builders that inspect
//! the sandbox instead of spawning processes.

use std::path::Path;
use std::process::Command;

use tracing::{debug, info, instrument, warn};

use crate::error::{RenderError, Result};
use crate::io::config::BuildConfig;
use crate::io::process::run_command_combined;

/// Abstraction over kustomize build backends.
pub trait Builder {
    /// Build the kustomization rooted at `dir` and return the rendered stream.
    fn build(&self, dir: &Path) -> Result<Vec<u8>>;
}

/// Builder that spawns the configured command with `dir` as its last argument.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    config: BuildConfig,
}

impl CommandBuilder {
    pub fn new(config: BuildConfig) -> Self {
        Self { config }
    }
}

impl Builder for CommandBuilder {
    #[instrument(skip_all, fields(dir = %dir.display(), timeout_secs = self.config.timeout_secs))]
    fn build(&self, dir: &Path) -> Result<Vec<u8>> {
        let (program, args) = self
            .config
            .command
            .split_first()
            .ok_or_else(|| RenderError::Build("build command is empty".to_string()))?;
        let label = self.config.command.join(" ");
        info!(command = %label, "running kustomize build");

        let mut cmd = Command::new(program);
        cmd.args(args).arg(dir);

        let output =
            run_command_combined(cmd, self.config.timeout(), self.config.output_limit_bytes)
                .map_err(|e| RenderError::Build(format!("{label} failed: {e:#}")))?;

        if output.timed_out {
            return Err(RenderError::Build(format!(
                "{label} timed out after {}s\nOutput: {}",
                self.config.timeout_secs,
                String::from_utf8_lossy(&output.output)
            )));
        }
        if !output.status.success() {
            warn!(exit_code = ?output.status.code(), "kustomize build failed");
            return Err(RenderError::Build(format!(
                "{label} failed: {}\nOutput: {}",
                output.status,
                String::from_utf8_lossy(&output.output)
            )));
        }
        if output.truncated > 0 {
            return Err(RenderError::Build(format!(
                "{label} output exceeded {} bytes",
                self.config.output_limit_bytes
            )));
        }

        debug!(bytes = output.output.len(), "kustomize build completed");
        Ok(output.output)
    }
}
