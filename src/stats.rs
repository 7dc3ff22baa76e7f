//! Run statistics types.

use std::time::{Duration, Instant};

use crate::download::{FetchOutcome, FetchStatus};

/// Statistics for a single placed file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileStats {
    /// Bytes written.
    pub size: u64,
    /// Time from opening the transient file to the final rename.
    pub elapsed: Duration,
}

/// Counters for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStats {
    /// Number of items dispatched to the pool.
    pub total: usize,
    /// Items placed successfully.
    pub completed: usize,
    /// Items that failed.
    pub failed: usize,
    /// Items skipped before dispatch because they already existed.
    pub skipped: usize,
    /// Total bytes written by successful items.
    pub total_bytes: u64,
    /// Wall time from dispatch to the last outcome.
    pub elapsed: Duration,
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}

impl RunStats {
    /// Creates a new empty run stats.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            total: 0,
            completed: 0,
            failed: 0,
            skipped: 0,
            total_bytes: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// Number of outcomes recorded so far.
    #[must_use]
    pub const fn finished(&self) -> usize {
        self.completed + self.failed
    }

    /// Returns true once every dispatched item has an outcome.
    #[must_use]
    pub const fn is_drained(&self) -> bool {
        self.finished() == self.total
    }

    /// Returns the average download speed in bytes per second.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn average_speed(&self) -> u64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            (self.total_bytes as f64 / secs) as u64
        } else {
            0
        }
    }
}

/// Builder for accumulating run statistics as outcomes arrive.
#[derive(Debug)]
pub struct RunStatsBuilder {
    stats: RunStats,
    start_time: Instant,
}

impl RunStatsBuilder {
    /// Starts accounting for `total` dispatched items.
    #[must_use]
    pub fn new(total: usize) -> Self {
        Self {
            stats: RunStats {
                total,
                ..RunStats::new()
            },
            start_time: Instant::now(),
        }
    }

    /// Sets the number of skipped items.
    pub const fn set_skipped(&mut self, count: usize) {
        self.stats.skipped = count;
    }

    /// Counts one outcome as either completed or failed.
    pub fn record(&mut self, outcome: &FetchOutcome) {
        match &outcome.status {
            FetchStatus::Success(file) => {
                self.stats.completed += 1;
                self.stats.total_bytes += file.size;
            }
            FetchStatus::Failure(_) => self.stats.failed += 1,
        }
    }

    /// Current counters, with elapsed time up to now.
    #[must_use]
    pub fn snapshot(&self) -> RunStats {
        RunStats {
            elapsed: self.start_time.elapsed(),
            ..self.stats.clone()
        }
    }

    /// Builds the final run statistics.
    #[must_use]
    pub fn build(self) -> RunStats {
        self.snapshot()
    }
}
