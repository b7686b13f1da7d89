//! Configuration file support for coco-itest
//!
//! Reads an optional JSON file, either passed with `--config` or found at
//! `<root>/tests/itest.json`. Every key is optional:
//!
//! ```json
//! {
//!   "scenario_dir": "tests",
//!   "scenario_extension": "dsl",
//!   "load_profile": "./tests/loadgen.yml",
//!   "loadgen": ["loadgen"],
//!   "stop": ["bash", "./tests/assets/stop_coco.sh"],
//!   "reset": ["bash", "./tests/assets/reset_coco_indices.sh"],
//!   "start": ["bash", "./tests/assets/start_coco.sh"],
//!   "service_log": "~/es_install_dir/easysearch.log",
//!   "ci_env_var": "GITHUB_ACTIONS"
//! }
//! ```

use crate::environment::{DEFAULT_CI_ENV_VAR, DEFAULT_REQUIRED_ARTIFACTS};
use crate::process::CommandSpec;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file looked up relative to the project root when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "tests/itest.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Command '{name}' in config must have at least a program")]
    EmptyCommand { name: &'static str },
}

/// Top-level configuration structure
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory walked for scenarios, relative to the project root
    pub scenario_dir: PathBuf,
    /// Scenario file extension, without the dot
    pub scenario_extension: String,
    /// Artifacts whose presence identifies the project root
    pub required_artifacts: Vec<PathBuf>,
    /// Load profile handed to loadgen with `-config`
    pub load_profile: PathBuf,
    /// Loadgen program and any leading arguments
    pub loadgen: Vec<String>,
    pub stop: Vec<String>,
    pub reset: Vec<String>,
    pub start: Vec<String>,
    /// Service log dumped on failure; `~/` expands to the home directory
    pub service_log: PathBuf,
    /// Variable that marks a CI run when set to `true`
    pub ci_env_var: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scenario_dir: PathBuf::from("tests"),
            scenario_extension: "dsl".to_string(),
            required_artifacts: DEFAULT_REQUIRED_ARTIFACTS
                .iter()
                .map(PathBuf::from)
                .collect(),
            load_profile: PathBuf::from("./tests/loadgen.yml"),
            loadgen: vec!["loadgen".to_string()],
            stop: argv(&["bash", "./tests/assets/stop_coco.sh"]),
            reset: argv(&["bash", "./tests/assets/reset_coco_indices.sh"]),
            start: argv(&["bash", "./tests/assets/start_coco.sh"]),
            service_log: PathBuf::from("~/es_install_dir/easysearch.log"),
            ci_env_var: DEFAULT_CI_ENV_VAR.to_string(),
        }
    }
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

/// Service commands resolved from the config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceCommands {
    pub stop: CommandSpec,
    pub reset: CommandSpec,
    pub start: CommandSpec,
    pub loadgen: CommandSpec,
}

impl Config {
    /// Load configuration from `explicit`, or from the default path under
    /// `root` if it exists, or return defaults.
    ///
    /// An explicit path that does not exist is an error; the default one is not.
    /// This only reads files. The project root check runs afterwards since the
    /// config may change the artifact list; see `runner::load_config` for how
    /// a broken config outside the project root is reported.
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let candidate = root.join(DEFAULT_CONFIG_FILE);
                if !candidate.exists() {
                    log::debug!("no config at {}, using defaults", candidate.display());
                    return Ok(Config::default());
                }
                candidate
            }
        };

        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::ReadError {
            path: path.clone(),
            source,
        })?;

        let config = Self::parse(&content).map_err(|source| ConfigError::ParseError {
            path: path.clone(),
            source,
        })?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Turn the argv lists into command specs, rejecting empty ones.
    pub fn service_commands(&self) -> Result<ServiceCommands, ConfigError> {
        let resolve = |name: &'static str, parts: &[String]| {
            CommandSpec::from_argv(parts).ok_or(ConfigError::EmptyCommand { name })
        };

        Ok(ServiceCommands {
            stop: resolve("stop", self.stop.as_slice())?,
            reset: resolve("reset", self.reset.as_slice())?,
            start: resolve("start", self.start.as_slice())?,
            loadgen: resolve("loadgen", self.loadgen.as_slice())?,
        })
    }

    /// Service log path with a leading `~/` expanded. Relative paths are
    /// taken from `root`, where the service scripts run.
    pub fn service_log_path(&self, root: &Path) -> PathBuf {
        let path = expand_home(&self.service_log);
        if path.is_relative() {
            root.join(path)
        } else {
            path
        }
    }
}

fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}
