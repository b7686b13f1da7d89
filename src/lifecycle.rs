//! Per-scenario lifecycle
//!
//! Each scenario runs through four phases, strictly in order:
//!
//! 1. pre-cleanup: stop the service, reset its indices
//! 2. start: start the service
//! 3. exercise: `loadgen -config <profile> -run <scenario> -debug`
//! 4. post-cleanup: stop the service, reset its indices
//!
//! The first failing command ends the scenario and, through the caller, the
//! whole run. Later commands are never attempted.

use std::fmt;
use std::path::PathBuf;

use crate::config::ServiceCommands;
use crate::discover::Scenario;
use crate::error::RunError;
use crate::process::{CommandExecutor, CommandSpec, run_or_abort};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    PreCleanup,
    Start,
    Exercise,
    PostCleanup,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::PreCleanup => write!(f, "pre-cleanup"),
            Phase::Start => write!(f, "start"),
            Phase::Exercise => write!(f, "exercise"),
            Phase::PostCleanup => write!(f, "post-cleanup"),
        }
    }
}

/// Drives the service through one scenario.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    commands: ServiceCommands,
    load_profile: PathBuf,
}

impl Lifecycle {
    pub fn new(commands: ServiceCommands, load_profile: PathBuf) -> Self {
        Self {
            commands,
            load_profile,
        }
    }

    /// The loadgen invocation for `scenario`.
    pub fn exercise_command(&self, scenario: &Scenario) -> CommandSpec {
        self.commands
            .loadgen
            .clone()
            .arg("-config")
            .arg(self.load_profile.as_os_str())
            .arg("-run")
            .arg(scenario.path().as_os_str())
            .arg("-debug")
    }

    /// Every command for `scenario`, in execution order.
    pub fn plan(&self, scenario: &Scenario) -> Vec<(Phase, CommandSpec)> {
        vec![
            (Phase::PreCleanup, self.commands.stop.clone()),
            (Phase::PreCleanup, self.commands.reset.clone()),
            (Phase::Start, self.commands.start.clone()),
            (Phase::Exercise, self.exercise_command(scenario)),
            (Phase::PostCleanup, self.commands.stop.clone()),
            (Phase::PostCleanup, self.commands.reset.clone()),
        ]
    }

    /// Run the full lifecycle, stopping at the first failure.
    pub fn run_scenario<E: CommandExecutor + ?Sized>(
        &self,
        executor: &mut E,
        scenario: &Scenario,
    ) -> Result<(), RunError> {
        for (phase, command) in self.plan(scenario) {
            log::info!("{}: {} [{}]", scenario.path().display(), phase, command);
            if let Err(e) = run_or_abort(executor, &command) {
                log::error!(
                    "{}: {} phase failed",
                    scenario.path().display(),
                    phase
                );
                return Err(e);
            }
        }
        Ok(())
    }
}
