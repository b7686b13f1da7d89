use clap::Parser;
use coco_itest::cli::Cli;
use coco_itest::config::Config;
use coco_itest::environment::running_in_ci;
use coco_itest::error::RunError;
use coco_itest::process::{CommandExecutor, DryRunExecutor, SystemExecutor};
use coco_itest::report::Reporter;
use coco_itest::runner::{self, RunOutcome, RunPlan};
use std::io::Stdout;
use std::path::{Path, PathBuf};

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let mut reporter = Reporter::stdout();

    let loaded = runner::load_config(env!("CARGO_PKG_NAME"), &cli.root, cli.config.as_deref());
    let config = match loaded {
        Ok(config) => config,
        Err(e) => fail(&mut reporter, &e, None),
    };

    let service_log = diagnostics_target(&cli, &config);

    match run(&cli, config, &mut reporter) {
        Ok(RunOutcome::Passed { total }) => log::info!("{} scenario(s) passed", total),
        Ok(RunOutcome::Listed { total }) => log::info!("listed {} scenario(s)", total),
        Ok(RunOutcome::NoScenarios) => log::info!("nothing to run"),
        Err(e) => fail(&mut reporter, &e, service_log.as_deref()),
    }
}

fn run(
    cli: &Cli,
    config: Config,
    reporter: &mut Reporter<Stdout>,
) -> Result<RunOutcome, RunError> {
    let plan = RunPlan::new(env!("CARGO_PKG_NAME"), &cli.root, config)
        .with_filter(cli.filter.clone())
        .with_list_only(cli.list);

    let mut executor: Box<dyn CommandExecutor> = if cli.dry_run {
        Box::new(DryRunExecutor)
    } else {
        Box::new(SystemExecutor::new(&cli.root).with_capture(cli.capture_output))
    };

    runner::run(&plan, executor.as_mut(), reporter)
}

/// Service log to dump on failure: in CI, or when asked for explicitly.
fn diagnostics_target(cli: &Cli, config: &Config) -> Option<PathBuf> {
    if cli.dry_run {
        return None;
    }
    if cli.dump_logs || running_in_ci(&config.ci_env_var) {
        Some(config.service_log_path(&cli.root))
    } else {
        None
    }
}

fn fail(reporter: &mut Reporter<Stdout>, error: &RunError, service_log: Option<&Path>) -> ! {
    if let Err(e) = runner::report_failure(reporter, error, service_log) {
        eprintln!("Error: {}", error);
        eprintln!("Error writing failure report: {}", e);
    }
    std::process::exit(error.exit_code());
}
