//! Scenario discovery
//!
//! Walks the scenario directory (`tests/` by default) and collects every file
//! with the scenario extension. Paths are kept relative to the project root,
//! e.g. `tests/sub/b.dsl`, and sorted by their byte representation so the run
//! order never depends on filesystem iteration order.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiscoverError {
    #[error("Failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// One discovered scenario file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    path: PathBuf,
}

impl Scenario {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path relative to the project root.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Discover scenarios under `project_root/scenario_dir`.
///
/// A missing scenario directory yields an empty list. Directory symlinks are
/// not followed.
pub fn discover_scenarios(
    project_root: &Path,
    scenario_dir: &Path,
    extension: &str,
) -> Result<Vec<Scenario>, DiscoverError> {
    let suffix = format!(".{}", extension.trim_start_matches('.'));
    let mut found = Vec::new();
    walk(project_root, scenario_dir, &suffix, &mut found)?;

    sort_scenarios(&mut found);
    log::debug!(
        "discovered {} scenario(s) under {}",
        found.len(),
        scenario_dir.display()
    );

    Ok(found.into_iter().map(Scenario::new).collect())
}

/// Keep only scenarios whose path contains `needle`.
pub fn filter_scenarios(scenarios: Vec<Scenario>, needle: &str) -> Vec<Scenario> {
    scenarios
        .into_iter()
        .filter(|s| s.path.to_string_lossy().contains(needle))
        .collect()
}

fn sort_scenarios(paths: &mut [PathBuf]) {
    // Full-string order, not component order: "a-b/x" sorts before "a/x".
    paths.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
}

fn walk(
    project_root: &Path,
    relative: &Path,
    suffix: &str,
    found: &mut Vec<PathBuf>,
) -> Result<(), DiscoverError> {
    let dir = project_root.join(relative);
    let read_dir = match fs::read_dir(&dir) {
        Ok(rd) => rd,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(source) => return Err(DiscoverError::ReadDir { path: dir, source }),
    };

    for entry in read_dir {
        let entry = entry.map_err(|source| DiscoverError::ReadDir {
            path: dir.clone(),
            source,
        })?;
        let file_type = entry.file_type().map_err(|source| DiscoverError::ReadDir {
            path: entry.path(),
            source,
        })?;
        let child = relative.join(entry.file_name());

        if file_type.is_dir() {
            walk(project_root, &child, suffix, found)?;
            continue;
        }

        if file_type.is_symlink() && entry.path().is_dir() {
            log::debug!("not following directory symlink {}", child.display());
            continue;
        }

        if entry.file_name().to_string_lossy().ends_with(suffix) {
            found.push(child);
        }
    }

    Ok(())
}
