use clap::Parser;
use std::path::PathBuf;

/// Run the loadgen DSL integration tests against a local Coco server
#[derive(Parser, Debug)]
#[command(name = "coco-itest")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Project root to run from
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub root: PathBuf,

    /// JSON config file (default: <root>/tests/itest.json when present)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Only run scenarios whose path contains this substring
    #[arg(long, value_name = "SUBSTR")]
    pub filter: Option<String>,

    /// List discovered scenarios and exit without running them
    #[arg(long)]
    pub list: bool,

    /// Print the commands that would run instead of running them
    #[arg(long)]
    pub dry_run: bool,

    /// Dump the service log on failure even outside CI
    #[arg(long)]
    pub dump_logs: bool,

    /// Capture child output and include the stderr tail in failure reports
    #[arg(long)]
    pub capture_output: bool,
}
