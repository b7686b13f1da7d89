//! External command execution
//!
//! Commands are spawned from an argument vector, never through a shell
//! string, and always waited on synchronously. The only signal the caller
//! gets back is the exit status (plus captured output when enabled).

use std::ffi::OsString;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use thiserror::Error;

use crate::error::RunError;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Failed to execute [{command}]: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },
}

/// A program plus its arguments and extra environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: OsString,
    pub args: Vec<OsString>,
    pub env: Vec<(OsString, OsString)>,
}

impl CommandSpec {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    /// Build from an argv-style list; the first element is the program.
    pub fn from_argv<S: AsRef<str>>(argv: &[S]) -> Option<Self> {
        let (program, rest) = argv.split_first()?;
        Some(Self::new(program.as_ref()).args(rest.iter().map(|a| a.as_ref())))
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", quote(&self.program.to_string_lossy()))?;
        for arg in &self.args {
            write!(f, " {}", quote(&arg.to_string_lossy()))?;
        }
        Ok(())
    }
}

/// Quote an argument for display only; nothing is ever passed to a shell.
fn quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:@%+,".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

/// Outcome of one command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandResult {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandResult {
    pub fn from_status(status: i32) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// Runs commands on behalf of the lifecycle.
pub trait CommandExecutor {
    /// Run `spec` to completion. `Err` means the command could not be run at
    /// all; a non-zero exit is reported through [`CommandResult::status`].
    fn execute(&mut self, spec: &CommandSpec) -> Result<CommandResult, ProcessError>;
}

/// Spawns real processes in the project root.
#[derive(Debug, Clone)]
pub struct SystemExecutor {
    cwd: PathBuf,
    capture: bool,
}

impl SystemExecutor {
    pub fn new(cwd: &Path) -> Self {
        Self {
            cwd: cwd.to_path_buf(),
            capture: false,
        }
    }

    /// Capture child output instead of inheriting stdio. Captured output is
    /// echoed once the child exits.
    pub fn with_capture(mut self, capture: bool) -> Self {
        self.capture = capture;
        self
    }
}

impl CommandExecutor for SystemExecutor {
    fn execute(&mut self, spec: &CommandSpec) -> Result<CommandResult, ProcessError> {
        log::debug!("spawning [{}] in {}", spec, self.cwd.display());

        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .envs(spec.env.iter().map(|(k, v)| (k, v)))
            .current_dir(&self.cwd)
            .stdin(Stdio::null());

        let spawn_err = |source: std::io::Error| ProcessError::Spawn {
            command: spec.to_string(),
            source,
        };

        if !self.capture {
            let status = command.status().map_err(spawn_err)?;
            return Ok(CommandResult::from_status(exit_code(status)));
        }

        let output = command.output().map_err(spawn_err)?;
        let result = CommandResult {
            status: exit_code(output.status),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        // Best effort echo.
        let _ = std::io::stdout().write_all(result.stdout.as_bytes());
        let _ = std::io::stderr().write_all(result.stderr.as_bytes());

        Ok(result)
    }
}

/// Logs commands instead of running them; every command "succeeds".
#[derive(Debug, Default)]
pub struct DryRunExecutor;

impl CommandExecutor for DryRunExecutor {
    fn execute(&mut self, spec: &CommandSpec) -> Result<CommandResult, ProcessError> {
        println!("[dry-run] {}", spec);
        Ok(CommandResult::from_status(0))
    }
}

/// Map an exit status to an integer, reporting signal deaths as `128 + sig`.
fn exit_code(status: ExitStatus) -> i32 {
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

    -1
}

/// Run a command and turn a non-zero exit into [`RunError::CommandFailed`].
pub fn run_or_abort<E: CommandExecutor + ?Sized>(
    executor: &mut E,
    spec: &CommandSpec,
) -> Result<CommandResult, RunError> {
    let result = executor.execute(spec)?;
    if result.success() {
        return Ok(result);
    }

    Err(RunError::CommandFailed {
        command: spec.to_string(),
        status: result.status,
        stderr_tail: stderr_tail(&result.stderr),
    })
}

const STDERR_TAIL_LINES: usize = 20;

fn stderr_tail(stderr: &str) -> Option<String> {
    let lines: Vec<&str> = stderr.lines().collect();
    if lines.is_empty() {
        return None;
    }
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    Some(lines[start..].join("\n"))
}
