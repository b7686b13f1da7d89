//! Top-level error for a run. Every variant is fatal and maps to exit code 1.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;
use crate::discover::DiscoverError;
use crate::process::ProcessError;

#[derive(Error, Debug)]
pub enum RunError {
    #[error("{program} should be invoked from the project root (missing: {})", display_paths(.missing))]
    WrongDirectory {
        program: String,
        missing: Vec<PathBuf>,
    },

    #[error("Command [{command}] failed with exit code [{status}], aborting")]
    CommandFailed {
        command: String,
        status: i32,
        /// Last lines of stderr, present only when output was captured
        stderr_tail: Option<String>,
    },

    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error(transparent)]
    Discover(#[from] DiscoverError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to write run log: {0}")]
    Report(#[from] std::io::Error),
}

impl RunError {
    pub fn exit_code(&self) -> i32 {
        1
    }

    /// Whether the service may have been touched, in which case its log is
    /// worth dumping.
    pub fn touched_service(&self) -> bool {
        matches!(self, RunError::CommandFailed { .. } | RunError::Process(_))
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
