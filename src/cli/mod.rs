//! CLI mode for sfx-dl: argument parsing and console output.

mod progress;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use crate::{AppConfig, RunSummary, execute};

pub use progress::{ConsoleProgress, failure_lines, success_line};
use progress::{print_failures, print_summary};

/// Command-line arguments.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "sfx-dl", version, about = "Bulk-download the BBC sound effects archive")]
pub struct Cli {
    /// Number of concurrent downloads (default 10)
    #[arg(short = 'j', long = "workers")]
    pub workers: Option<usize>,

    /// Configuration file (TOML); defaults to the user config directory
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Exit with status 1 if any download failed
    #[arg(long = "fail-on-errors")]
    pub fail_on_errors: bool,
}

impl Cli {
    /// Applies command-line overrides on top of loaded configuration.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(workers) = self.workers {
            config.download.workers = workers;
        }
        if self.fail_on_errors {
            config.download.fail_on_errors = true;
        }
    }
}

/// Prints the end-of-run report.
pub fn report(summary: &RunSummary) {
    print_failures(summary);
    print_summary(&summary.stats);
}

/// Runs a full download and returns the process exit status.
///
/// # Errors
///
/// Returns an error if configuration or the manifest cannot be loaded.
pub async fn run(cli: Cli) -> crate::Result<i32> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    cli.apply(&mut config);
    log::debug!("Effective configuration: {config:?}");

    println!("Reading manifest and checking files on disk");
    let progress = Arc::new(ConsoleProgress::new());
    let summary = execute(&config, progress).await?;

    report(&summary);
    Ok(summary.exit_code(config.download.fail_on_errors))
}
