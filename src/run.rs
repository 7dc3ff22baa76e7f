//! Run orchestration: plan, filter, dispatch, drain, summarize.

use std::fmt::Write as _;
use std::pin::pin;
use std::sync::Arc;

use futures::StreamExt;

use crate::config::AppConfig;
use crate::download::{Downloader, FetchOutcome, WorkItem};
use crate::error::{Error, Result};
use crate::fs::{FileSystem, TokioFileSystem};
use crate::manifest::{ManifestRow, ensure_manifest, read_manifest};
use crate::plan::PathPlanner;
use crate::progress::{DownloadProgress, ProgressReporter};
use crate::stats::RunStats;
use crate::transport::{HttpTransport, Transport};

/// Phases of a run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RunPhase {
    /// Nothing has happened yet.
    Idle,
    /// Turning manifest rows into work items.
    Planning,
    /// Dropping items whose destination already exists.
    Filtering,
    /// Handing items to the fetch pool.
    Dispatching,
    /// Waiting for every dispatched item to finish.
    Draining,
    /// Building the failure digest.
    Summarizing,
    /// Terminal.
    Done,
}

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Final counters.
    pub stats: RunStats,
    /// Every failed outcome, in completion order.
    pub failures: Vec<FetchOutcome>,
}

impl RunSummary {
    /// Number of failed items.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// One line per failure: `<destination> failed with exception: <detail>`.
    #[must_use]
    pub fn failure_digest(&self) -> String {
        let mut digest = String::new();
        for outcome in &self.failures {
            let _ = writeln!(
                digest,
                "{} failed with exception: {}",
                outcome.item.destination_path().display(),
                outcome.error().unwrap_or_default()
            );
        }
        digest
    }

    /// Process exit status for this run.
    ///
    /// Failures only change the status when `fail_on_errors` is set.
    #[must_use]
    pub const fn exit_code(&self, fail_on_errors: bool) -> i32 {
        if fail_on_errors && self.stats.failed > 0 {
            1
        } else {
            0
        }
    }
}

/// Drives one run through its phases.
pub struct RunController<F: FileSystem = TokioFileSystem, T: Transport = HttpTransport> {
    downloader: Downloader<F, T>,
    planner: PathPlanner,
    progress: Arc<dyn DownloadProgress>,
    phase: RunPhase,
}

impl<F: FileSystem, T: Transport> RunController<F, T> {
    /// Creates a controller in the [`RunPhase::Idle`] phase.
    #[must_use]
    pub fn new(
        downloader: Downloader<F, T>,
        planner: PathPlanner,
        progress: Arc<dyn DownloadProgress>,
    ) -> Self {
        Self {
            downloader,
            planner,
            progress,
            phase: RunPhase::Idle,
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> RunPhase {
        self.phase
    }

    /// The underlying downloader.
    #[must_use]
    pub const fn downloader(&self) -> &Downloader<F, T> {
        &self.downloader
    }

    fn enter(&mut self, phase: RunPhase) {
        transition(&mut self.phase, phase);
    }

    /// Plans `rows` and runs the resulting items.
    pub async fn run(&mut self, rows: &[ManifestRow]) -> RunSummary {
        self.enter(RunPhase::Planning);
        let candidates = self.planner.plan_all(rows);
        log::info!("Planned {} items", candidates.len());
        self.run_items(candidates).await
    }

    /// Runs already-planned items from the filtering phase onward.
    pub async fn run_items(&mut self, candidates: Vec<WorkItem>) -> RunSummary {
        self.enter(RunPhase::Filtering);
        let collected = self.downloader.collect_items(candidates).await;
        log::info!(
            "{} items to fetch, {} already present",
            collected.to_download.len(),
            collected.skipped
        );

        self.enter(RunPhase::Dispatching);
        let items = collected.to_download;
        let reporter = ProgressReporter::new(
            items.len(),
            collected.skipped,
            Arc::clone(&self.progress),
        );

        let mut failures = Vec::new();
        {
            let mut outcomes = pin!(self.downloader.fetch_all(&items));
            transition(&mut self.phase, RunPhase::Draining);
            while let Some(outcome) = outcomes.next().await {
                reporter.record(&outcome);
                if !outcome.is_success() {
                    failures.push(outcome);
                }
            }
        }

        self.enter(RunPhase::Summarizing);
        let stats = reporter.finish();
        debug_assert!(stats.is_drained());
        log::info!(
            "Run finished: {} completed, {} failed, {} skipped",
            stats.completed,
            stats.failed,
            stats.skipped
        );
        let summary = RunSummary { stats, failures };

        self.enter(RunPhase::Done);
        summary
    }
}

fn transition(current: &mut RunPhase, next: RunPhase) {
    log::debug!("Run phase {current:?} -> {next:?}");
    *current = next;
}

/// Acquires the manifest described by `config` and runs it to completion.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built or the manifest cannot
/// be acquired or parsed. Per-item failures are reported in the summary.
pub async fn execute(config: &AppConfig, progress: Arc<dyn DownloadProgress>) -> Result<RunSummary> {
    let transport = HttpTransport::new(&config.download)?;
    ensure_manifest(
        &TokioFileSystem,
        &transport,
        &config.paths.manifest_path,
        &config.source.manifest_url,
    )
    .await?;
    let manifest_path = config.paths.manifest_path.clone();
    let rows = tokio::task::spawn_blocking(move || read_manifest(&manifest_path))
        .await
        .map_err(|e| Error::Manifest(format!("manifest reader stopped: {e}")))??;

    let downloader = Downloader::new(transport, config.download.clone());
    let planner = PathPlanner::new(&config.paths.sounds_root, &config.source.asset_base_url);
    let mut controller = RunController::new(downloader, planner, progress);
    Ok(controller.run(&rows).await)
}
