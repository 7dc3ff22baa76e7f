//! Console progress reporting and summary output for CLI runs.

use std::time::Duration;

use console::style;
use indicatif::{HumanBytes, HumanDuration, ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::{DownloadProgress, FileStats, RunStats, RunSummary, WorkItem};

const SEPARATOR: &str = "────────────────────────────────────────────────────────────";

/// Creates the bar counting finished items.
fn make_items_bar() -> ProgressBar {
    let bar = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stderr());
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} [{bar:40.green/white}] {pos}/{len} ({eta})")
            .expect("progress template is valid")
            .progress_chars("━━╌"),
    );
    bar
}

/// Line printed to stdout when an item lands.
pub fn success_line(item: &WorkItem) -> String {
    format!("Finished {}", item.destination_path().display())
}

/// Lines printed to stderr when an item fails.
pub fn failure_lines(item: &WorkItem, error: &str, failed: usize) -> String {
    format!(
        "FAILED {}\n{error}\n{failed} failed download attempts",
        item.destination_path().display()
    )
}

/// Prints per-item lines above a live item counter.
///
/// Success lines go to stdout, failure lines to stderr. The bar is suspended
/// while a line is written so output never tears.
pub struct ConsoleProgress {
    bar: ProgressBar,
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleProgress {
    /// Creates a console reporter.
    #[must_use]
    pub fn new() -> Self {
        Self {
            bar: make_items_bar(),
        }
    }
}

impl DownloadProgress for ConsoleProgress {
    fn on_run_start(&self, total: usize, skipped: usize) {
        if skipped > 0 {
            println!("{skipped} samples already on disk");
        }
        println!("Downloading {total} samples");
        self.bar.set_length(total as u64);
        if total > 0 {
            self.bar.enable_steady_tick(Duration::from_millis(250));
        }
    }

    fn on_file_complete(&self, item: &WorkItem, _file: &FileStats, _stats: &RunStats) {
        self.bar.suspend(|| println!("{}", success_line(item)));
        self.bar.inc(1);
    }

    fn on_error(&self, item: &WorkItem, error: &str, stats: &RunStats) {
        self.bar.suspend(|| {
            eprintln!("{}", style(failure_lines(item, error, stats.failed)).red());
        });
        self.bar.inc(1);
    }

    fn on_run_finish(&self, _stats: &RunStats) {
        self.bar.finish_and_clear();
    }
}

/// Prints the failure digest followed by the failure count.
pub fn print_failures(summary: &RunSummary) {
    println!("{}", summary.failure_digest());
    println!("{} failures reported.", summary.failure_count());
}

/// Prints a summary of run statistics.
pub fn print_summary(stats: &RunStats) {
    if stats.total == 0 && stats.skipped == 0 {
        return;
    }

    println!("\n{SEPARATOR}");
    println!("Download Summary");
    println!("{SEPARATOR}");

    if stats.completed > 0 {
        println!("  Files downloaded:  {}", stats.completed);
        println!("  Total size:        {}", HumanBytes(stats.total_bytes));
        println!("  Total time:        {}", HumanDuration(stats.elapsed));
        println!("  Average speed:     {}/s", HumanBytes(stats.average_speed()));
    }
    if stats.failed > 0 {
        println!("  Files failed:      {}", stats.failed);
    }
    if stats.skipped > 0 {
        println!("  Files skipped:     {}", stats.skipped);
    }

    println!("{SEPARATOR}");
}
