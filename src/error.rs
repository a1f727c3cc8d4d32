//! Error taxonomy for a reproducibility check.
//!
//! Every internal failure collapses into one exit status at the orchestrator
//! boundary, so the variants only need to carry enough detail for the log line.
use std::path::PathBuf;
use thiserror::Error;

/// Failures raised while entering or leaving a variation scope.
#[derive(Debug, Error)]
pub enum VariationError {
    #[error("variation {variation} needs {var} in the first build environment")]
    MissingEnv {
        variation: &'static str,
        var: &'static str,
    },

    #[error("variation {variation}: {source}")]
    Tool {
        variation: &'static str,
        #[source]
        source: ToolError,
    },

    #[error("variation {}: create {}: {}", .variation, .path.display(), .source)]
    Io {
        variation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures from external helper tools (overlay mount, unmount).
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("required tool {program} not found on PATH")]
    Missing { program: String },

    #[error("spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with status {status}")]
    Failed { program: String, status: String },
}

/// Top-level failure of a check run.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("unknown variation: {0}")]
    UnknownVariation(String),

    #[error("setup failed: {0}")]
    Setup(String),

    #[error(transparent)]
    Variation(#[from] VariationError),

    #[error("build failed: {0}")]
    Build(String),

    #[error("diff tool: {0}")]
    Differ(#[from] ToolError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
