//! External artifact comparison.
//!
//! The differ's exit status is the result of the whole check and is passed
//! through untouched: zero means identical, anything else means the
//! artifacts differ or the tool itself failed.
use crate::error::ToolError;
use std::path::Path;
use std::process::{Command, ExitStatus};

pub const DEFAULT_DIFF_TOOL: &str = "diffoscope";

pub trait Differ {
    /// Compare two artifact files and return the tool's exit code.
    fn compare(&self, first: &Path, second: &Path) -> Result<i32, ToolError>;
}

/// Runs an external program as `PROGRAM FIRST SECOND`.
#[derive(Debug, Clone)]
pub struct ExternalDiffer {
    program: String,
}

impl ExternalDiffer {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Fail early when the tool cannot be found on PATH.
    pub fn ensure_available(&self) -> Result<(), ToolError> {
        which::which(&self.program)
            .map(|_| ())
            .map_err(|_| ToolError::Missing {
                program: self.program.clone(),
            })
    }
}

impl Differ for ExternalDiffer {
    fn compare(&self, first: &Path, second: &Path) -> Result<i32, ToolError> {
        tracing::info!(program = %self.program, "compare artifacts");
        let status = Command::new(&self.program)
            .arg(first)
            .arg(second)
            .status()
            .map_err(|source| ToolError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        let code = exit_code(&status);
        tracing::info!(program = %self.program, code, "diff tool finished");
        Ok(code)
    }
}

/// Exit code of a finished process, using the shell's `128 + signal`
/// convention for processes killed by a signal.
pub fn exit_code(status: &ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}
