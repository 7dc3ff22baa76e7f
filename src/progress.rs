//! Progress reporting for download runs.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::download::{FetchOutcome, FetchStatus, WorkItem};
use crate::stats::{FileStats, RunStats, RunStatsBuilder};

/// Trait for receiving download progress updates.
///
/// Implement this trait to receive callbacks during a run. All methods have
/// default no-op implementations. Calls arrive through a [`ProgressReporter`],
/// which holds a single lock across each call, so implementations never see
/// two callbacks at once.
pub trait DownloadProgress: Send + Sync {
    /// Called after filtering, before any fetch starts.
    fn on_run_start(&self, _total: usize, _skipped: usize) {}

    /// Called when an item was placed. `stats` already counts it.
    fn on_file_complete(&self, _item: &WorkItem, _file: &FileStats, _stats: &RunStats) {}

    /// Called when an item failed. `stats` already counts it.
    fn on_error(&self, _item: &WorkItem, _error: &str, _stats: &RunStats) {}

    /// Called once every dispatched item has an outcome.
    fn on_run_finish(&self, _stats: &RunStats) {}
}

/// A null progress implementation that ignores all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl DownloadProgress for NoProgress {}

/// Serializes outcome accounting and progress output.
///
/// Counting an outcome and emitting its line happen under one lock, so the
/// counters never lose updates and lines never interleave.
pub struct ProgressReporter {
    state: Mutex<RunStatsBuilder>,
    sink: Arc<dyn DownloadProgress>,
}

impl ProgressReporter {
    /// Starts reporting a run of `total` dispatched items.
    #[must_use]
    pub fn new(total: usize, skipped: usize, sink: Arc<dyn DownloadProgress>) -> Self {
        let mut builder = RunStatsBuilder::new(total);
        builder.set_skipped(skipped);
        sink.on_run_start(total, skipped);
        Self {
            state: Mutex::new(builder),
            sink,
        }
    }

    fn lock(&self) -> MutexGuard<'_, RunStatsBuilder> {
        // Poison only means a sink panicked; the counters are still whole.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Counts `outcome` exactly once and reports it.
    pub fn record(&self, outcome: &FetchOutcome) {
        let mut state = self.lock();
        state.record(outcome);
        let stats = state.snapshot();
        match &outcome.status {
            FetchStatus::Success(file) => self.sink.on_file_complete(&outcome.item, file, &stats),
            FetchStatus::Failure(error) => self.sink.on_error(&outcome.item, error, &stats),
        }
    }

    /// Current counters.
    #[must_use]
    pub fn snapshot(&self) -> RunStats {
        self.lock().snapshot()
    }

    /// Finishes the run and returns the final counters.
    #[must_use]
    pub fn finish(self) -> RunStats {
        let stats = self
            .state
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .build();
        self.sink.on_run_finish(&stats);
        stats
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::time::Duration;

    /// Records every callback as a line of text.
    #[derive(Default)]
    pub(crate) struct RecordingProgress {
        pub(crate) events: Mutex<Vec<String>>,
    }

    impl RecordingProgress {
        pub(crate) fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    impl DownloadProgress for RecordingProgress {
        fn on_run_start(&self, total: usize, skipped: usize) {
            self.events
                .lock()
                .unwrap()
                .push(format!("start {total} {skipped}"));
        }

        fn on_file_complete(&self, item: &WorkItem, _file: &FileStats, stats: &RunStats) {
            self.events.lock().unwrap().push(format!(
                "ok {} {}",
                item.destination_path().display(),
                stats.completed
            ));
        }

        fn on_error(&self, item: &WorkItem, error: &str, stats: &RunStats) {
            self.events.lock().unwrap().push(format!(
                "fail {} {error} {}",
                item.destination_path().display(),
                stats.failed
            ));
        }

        fn on_run_finish(&self, stats: &RunStats) {
            self.events
                .lock()
                .unwrap()
                .push(format!("finish {} {}", stats.completed, stats.failed));
        }
    }

    fn success(dest: &str) -> FetchOutcome {
        FetchOutcome {
            item: WorkItem::new("u", dest),
            status: FetchStatus::Success(FileStats {
                size: 10,
                elapsed: Duration::from_millis(1),
            }),
        }
    }

    fn failure(dest: &str) -> FetchOutcome {
        FetchOutcome {
            item: WorkItem::new("u", dest),
            status: FetchStatus::Failure("HTTP 500".into()),
        }
    }

    #[test]
    fn no_progress_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<NoProgress>();
        assert_send_sync::<ProgressReporter>();
    }

    #[test]
    fn reporter_routes_outcomes_to_callbacks() {
        let sink = Arc::new(RecordingProgress::default());
        let reporter = ProgressReporter::new(3, 1, sink.clone());

        reporter.record(&success("a"));
        reporter.record(&failure("b"));
        reporter.record(&success("c"));
        let stats = reporter.finish();

        assert_eq!(stats.completed, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.skipped, 1);
        assert_eq!(
            sink.events(),
            vec![
                "start 3 1",
                "ok a 1",
                "fail b HTTP 500 1",
                "ok c 2",
                "finish 2 1"
            ]
        );
    }

    #[test]
    fn concurrent_records_are_not_lost() {
        let sink = Arc::new(RecordingProgress::default());
        let reporter = Arc::new(ProgressReporter::new(400, 0, sink.clone()));

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let reporter = Arc::clone(&reporter);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        let dest = format!("{t}-{i}");
                        if i % 10 == 0 {
                            reporter.record(&failure(&dest));
                        } else {
                            reporter.record(&success(&dest));
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let stats = reporter.snapshot();
        assert_eq!(stats.completed, 360);
        assert_eq!(stats.failed, 40);
        assert!(stats.is_drained());
        // start + one line per outcome
        assert_eq!(sink.events().len(), 401);
    }
}
