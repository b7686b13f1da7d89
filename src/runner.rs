//! Run orchestration
//!
//! Gates on the project root, discovers scenarios, then runs each one through
//! the [`Lifecycle`] in order. Errors are returned, never acted on here: the
//! binary owns logging the failure and exiting.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::discover::{discover_scenarios, filter_scenarios};
use crate::environment::{DEFAULT_REQUIRED_ARTIFACTS, is_project_root, missing_artifacts};
use crate::error::RunError;
use crate::lifecycle::Lifecycle;
use crate::process::CommandExecutor;
use crate::report::{Reporter, RunState};

/// Everything a run needs besides the executor and the log sink.
#[derive(Debug, Clone)]
pub struct RunPlan {
    /// Name used in the wrong-directory message
    pub program: String,
    pub root: PathBuf,
    pub config: Config,
    /// Only run scenarios whose path contains this substring
    pub filter: Option<String>,
    /// Report discovered scenarios without running them
    pub list_only: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    NoScenarios,
    Listed { total: usize },
    Passed { total: usize },
}

impl RunPlan {
    pub fn new(program: &str, root: &Path, config: Config) -> Self {
        Self {
            program: program.to_string(),
            root: root.to_path_buf(),
            config,
            filter: None,
            list_only: false,
        }
    }

    pub fn with_filter(mut self, filter: Option<String>) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_list_only(mut self, list_only: bool) -> Self {
        self.list_only = list_only;
        self
    }
}

/// Load the config for a run rooted at `root`.
///
/// A config that cannot be read or parsed is reported as a wrong-directory
/// error when `root` does not look like the project root under the default
/// artifact list, since that is the likelier mistake.
pub fn load_config(
    program: &str,
    root: &Path,
    explicit: Option<&Path>,
) -> Result<Config, RunError> {
    match Config::load(root, explicit) {
        Ok(config) => Ok(config),
        Err(e) if !is_project_root(root, DEFAULT_REQUIRED_ARTIFACTS) => {
            log::debug!("ignoring config error outside project root: {}", e);
            Err(RunError::WrongDirectory {
                program: program.to_string(),
                missing: missing_artifacts(root, DEFAULT_REQUIRED_ARTIFACTS),
            })
        }
        Err(e) => Err(e.into()),
    }
}

/// Execute the plan. The first failing command ends the run.
pub fn run<E, W>(
    plan: &RunPlan,
    executor: &mut E,
    reporter: &mut Reporter<W>,
) -> Result<RunOutcome, RunError>
where
    E: CommandExecutor + ?Sized,
    W: Write,
{
    let config = &plan.config;

    // Nothing destructive may run outside the project root.
    if !is_project_root(&plan.root, &config.required_artifacts) {
        return Err(RunError::WrongDirectory {
            program: plan.program.clone(),
            missing: missing_artifacts(&plan.root, &config.required_artifacts),
        });
    }

    let lifecycle = Lifecycle::new(config.service_commands()?, config.load_profile.clone());

    let mut scenarios = discover_scenarios(
        &plan.root,
        &config.scenario_dir,
        &config.scenario_extension,
    )?;
    if scenarios.is_empty() {
        reporter.no_scenarios(&config.scenario_dir, &config.scenario_extension)?;
        return Ok(RunOutcome::NoScenarios);
    }

    if let Some(filter) = &plan.filter {
        scenarios = filter_scenarios(scenarios, filter);
        if scenarios.is_empty() {
            reporter.no_filter_match(filter)?;
            return Ok(RunOutcome::NoScenarios);
        }
    }

    if plan.list_only {
        for scenario in &scenarios {
            reporter.listed(scenario.path())?;
        }
        return Ok(RunOutcome::Listed {
            total: scenarios.len(),
        });
    }

    let mut state = RunState::new(scenarios.len());
    reporter.scenario_count(state.total)?;

    for scenario in &scenarios {
        let index = state.begin_next();
        reporter.progress(index, state.total, scenario.path())?;
        lifecycle.run_scenario(executor, scenario)?;
        state.mark_passed();
    }

    reporter.all_passed(state.passed)?;
    Ok(RunOutcome::Passed {
        total: state.passed,
    })
}

/// Log a fatal error and, when `service_log` is given, dump the service log.
pub fn report_failure<W: Write>(
    reporter: &mut Reporter<W>,
    error: &RunError,
    service_log: Option<&Path>,
) -> std::io::Result<()> {
    reporter.failure(&error.to_string())?;

    if let RunError::CommandFailed {
        stderr_tail: Some(tail),
        ..
    } = error
    {
        reporter.line("last stderr lines:")?;
        reporter.raw(tail)?;
    }

    let Some(path) = service_log else {
        return Ok(());
    };
    if !error.touched_service() {
        return Ok(());
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => reporter.service_logs(&contents),
        Err(e) => reporter.line(&format!(
            "Unable to read service log {}: {}",
            path.display(),
            e
        )),
    }
}
