//! sfx-dl - A library for bulk-downloading files listed in a CSV manifest.
//!
//! Every manifest row becomes a [`WorkItem`]. Items whose destination already
//! exists are skipped, the rest are fetched by a bounded pool. Each file is
//! written to a `.part` file and renamed into place, so a partial file never
//! shows up at its final path. A failing item never stops the run; every
//! dispatched item yields exactly one [`FetchOutcome`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use sfx_dl::{DownloadConfig, Downloader, HttpTransport, NoProgress, PathPlanner, RunController};
//!
//! # async fn example() -> sfx_dl::Result<()> {
//! let config = DownloadConfig::default().with_workers(8);
//! let downloader = Downloader::new(HttpTransport::new(&config)?, config);
//! let planner = PathPlanner::new("sounds", "http://bbcsfx.acropolis.org.uk/assets/");
//!
//! let rows = sfx_dl::read_manifest("BBCSoundEffects.csv".as_ref())?;
//! let mut controller = RunController::new(downloader, planner, Arc::new(NoProgress));
//! let summary = controller.run(&rows).await;
//!
//! print!("{}", summary.failure_digest());
//! println!("{} failures reported.", summary.failure_count());
//! # Ok(())
//! # }
//! ```

#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod fs;
pub mod manifest;
pub mod plan;
pub mod progress;
pub mod run;
pub mod stats;
pub mod transport;

// Re-export main types for convenience
pub use config::{AppConfig, DownloadConfig, PathConfig, SourceConfig};
pub use download::{CollectedItems, Downloader, FetchOutcome, FetchStatus, WorkItem, transient_path};
pub use error::{Error, ErrorKind, Result};
pub use fs::{FileSystem, TokioFileSystem};
pub use manifest::{ManifestRow, ensure_manifest, parse_manifest, read_manifest};
pub use plan::{MAX_FILENAME_LENGTH, PathPlanner, build_filename, sanitize_path};
pub use progress::{DownloadProgress, NoProgress, ProgressReporter};
pub use run::{RunController, RunPhase, RunSummary, execute};
pub use stats::{FileStats, RunStats, RunStatsBuilder};
pub use transport::{HttpTransport, Transport};
