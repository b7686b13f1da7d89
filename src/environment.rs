//! Environment detection: CI marker and project root check.

use std::path::{Path, PathBuf};

/// Artifacts that must exist relative to the Coco project root.
pub const DEFAULT_REQUIRED_ARTIFACTS: &[&str] = &[
    "README.md",
    "LICENSE",
    "main.go",
    "coco.yml",
    "tests",
    "tests/assets",
    "tests/loadgen.yml",
];

/// Environment variable GitHub Actions sets to `true`.
pub const DEFAULT_CI_ENV_VAR: &str = "GITHUB_ACTIONS";

/// Check whether `root` looks like the project root.
///
/// A missing artifact is a normal answer (wrong invocation directory), not an
/// error, so this only ever returns a bool.
pub fn is_project_root<S: AsRef<Path>>(root: &Path, required: &[S]) -> bool {
    required.iter().all(|artifact| root.join(artifact).exists())
}

/// Required artifacts that are absent under `root`, in the order given.
pub fn missing_artifacts<S: AsRef<Path>>(root: &Path, required: &[S]) -> Vec<PathBuf> {
    required
        .iter()
        .map(|artifact| artifact.as_ref().to_path_buf())
        .filter(|artifact| !root.join(artifact).exists())
        .collect()
}

/// Whether we are running inside CI, judged by `var` being set to `true`.
pub fn running_in_ci(var: &str) -> bool {
    std::env::var(var)
        .map(|value| is_affirmative(&value))
        .unwrap_or(false)
}

fn is_affirmative(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}
