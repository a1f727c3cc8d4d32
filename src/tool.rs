//! Runner for external helper tools that variations shell out to.
use crate::error::ToolError;
use std::ffi::OsString;
use std::process::Command;

/// Runs a helper program to completion, failing on a non-zero exit.
pub trait ToolRunner: Send + Sync {
    fn run(&self, program: &str, args: &[OsString]) -> Result<(), ToolError>;
}

/// Runs tools from the host PATH.
#[derive(Debug, Default)]
pub struct SystemToolRunner;

impl ToolRunner for SystemToolRunner {
    fn run(&self, program: &str, args: &[OsString]) -> Result<(), ToolError> {
        let resolved = which::which(program).map_err(|_| ToolError::Missing {
            program: program.to_string(),
        })?;
        tracing::debug!(program, path = %resolved.display(), ?args, "run tool");
        let status = Command::new(&resolved)
            .args(args)
            .status()
            .map_err(|source| ToolError::Spawn {
                program: program.to_string(),
                source,
            })?;
        if !status.success() {
            return Err(ToolError::Failed {
                program: program.to_string(),
                status: status.to_string(),
            });
        }
        Ok(())
    }
}
