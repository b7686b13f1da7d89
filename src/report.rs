//! CI log protocol
//!
//! Every line a CI scraper cares about starts with [`LOG_IDENTIFIER`] followed
//! by `": "` and a human-readable message. Service and loadgen output is
//! interleaved on the same stream, so nothing else here is machine-parseable.
//!
//! Example: `COCO_TEST_INFO: all [2] tests passed!`

use std::io::{self, Write};
use std::path::Path;

/// Prefix of every orchestration line.
pub const LOG_IDENTIFIER: &str = "COCO_TEST_INFO";

/// Tag a message with the log identifier.
pub fn tag(message: &str) -> String {
    format!("{}: {}", LOG_IDENTIFIER, message)
}

/// Process-wide counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunState {
    /// Number of scenarios that will be run
    pub total: usize,
    /// 1-based index of the scenario currently running (0 before the first)
    pub current: usize,
    /// Scenarios whose whole lifecycle succeeded
    pub passed: usize,
}

impl RunState {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            current: 0,
            passed: 0,
        }
    }

    /// Advance to the next scenario and return its 1-based index.
    pub fn begin_next(&mut self) -> usize {
        self.current += 1;
        self.current
    }

    pub fn mark_passed(&mut self) {
        self.passed += 1;
    }
}

/// Writes tagged lines to a sink, flushing after each one so they never sit
/// in a buffer while a child process writes to the same stream.
pub struct Reporter<W: Write> {
    out: W,
}

impl Reporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Emit one tagged line.
    pub fn line(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.out, "{}", tag(message))?;
        self.out.flush()
    }

    pub fn scenario_count(&mut self, total: usize) -> io::Result<()> {
        self.line(&format!("{} tests to run", total))
    }

    pub fn progress(&mut self, index: usize, total: usize, scenario: &Path) -> io::Result<()> {
        self.line(&format!(
            "Run tests in [{}/{}:{}]",
            index,
            total,
            scenario.display()
        ))
    }

    pub fn all_passed(&mut self, passed: usize) -> io::Result<()> {
        self.line(&format!("all [{}] tests passed!", passed))
    }

    /// Nothing under the scenario dir carries the extension, e.g.
    /// `No DSL files found under tests/.`
    pub fn no_scenarios(&mut self, scenario_dir: &Path, extension: &str) -> io::Result<()> {
        self.line(&format!(
            "No {} files found under {}/.",
            extension.trim_start_matches('.').to_uppercase(),
            scenario_dir.display()
        ))
    }

    /// Scenarios exist but `--filter` dropped all of them.
    pub fn no_filter_match(&mut self, filter: &str) -> io::Result<()> {
        self.line(&format!("No scenarios match filter [{}]", filter))
    }

    pub fn listed(&mut self, scenario: &Path) -> io::Result<()> {
        self.line(&format!("found {}", scenario.display()))
    }

    /// Failure line for any fatal error; the message is the error's display.
    pub fn failure(&mut self, message: &str) -> io::Result<()> {
        self.line(message)
    }

    /// Dump the service log under a tagged header. The contents are written
    /// verbatim so they stay readable in the CI console.
    pub fn service_logs(&mut self, contents: &str) -> io::Result<()> {
        self.line("Easysearch logs:")?;
        self.raw(contents)
    }

    /// Write untagged text, newline-terminated.
    pub fn raw(&mut self, contents: &str) -> io::Result<()> {
        self.out.write_all(contents.as_bytes())?;
        if !contents.is_empty() && !contents.ends_with('\n') {
            writeln!(self.out)?;
        }
        self.out.flush()
    }
}
