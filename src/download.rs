//! Core fetch-and-place logic and the bounded fetch pool.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use futures::{Stream, StreamExt, stream};

use crate::config::DownloadConfig;
use crate::error::{Error, Result};
use crate::fs::{FileSystem, TokioFileSystem};
use crate::stats::FileStats;
use crate::transport::{HttpTransport, Transport};

/// One planned fetch: where to get it and where to put it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkItem {
    source_location: String,
    destination_path: PathBuf,
}

impl WorkItem {
    /// Creates a work item.
    #[must_use]
    pub fn new(source_location: impl Into<String>, destination_path: impl Into<PathBuf>) -> Self {
        Self {
            source_location: source_location.into(),
            destination_path: destination_path.into(),
        }
    }

    /// URL the content is fetched from.
    #[must_use]
    pub fn source_location(&self) -> &str {
        &self.source_location
    }

    /// Final on-disk location.
    #[must_use]
    pub fn destination_path(&self) -> &Path {
        &self.destination_path
    }
}

/// How a single fetch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStatus {
    /// The file was placed at its destination.
    Success(FileStats),
    /// The fetch failed; carries the rendered error.
    Failure(String),
}

/// The result of processing one [`WorkItem`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    /// The item that was processed.
    pub item: WorkItem,
    /// Success or failure detail.
    pub status: FetchStatus,
}

impl FetchOutcome {
    /// Returns true if the item was placed successfully.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.status, FetchStatus::Success(_))
    }

    /// Error detail, if the fetch failed.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match &self.status {
            FetchStatus::Failure(detail) => Some(detail),
            FetchStatus::Success(_) => None,
        }
    }
}

/// Result of filtering candidates against the file system.
#[derive(Debug, Default)]
pub struct CollectedItems {
    /// Items that need to be fetched.
    pub to_download: Vec<WorkItem>,
    /// Number of items skipped because their destination already exists.
    pub skipped: usize,
}

impl CollectedItems {
    /// Returns true if there is nothing to fetch.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.to_download.is_empty()
    }
}

static ATTEMPTS: AtomicU64 = AtomicU64::new(0);

/// Returns a fresh transient path for writing `path`.
///
/// Every call yields a distinct name in the destination's directory, so the
/// final rename never crosses a filesystem boundary and two attempts at the
/// same destination never share a file. The name is short and hidden, which
/// keeps it valid even when the destination name is at the length limit.
#[must_use]
pub fn transient_path(path: &Path) -> PathBuf {
    let attempt = ATTEMPTS.fetch_add(1, Ordering::Relaxed);
    path.with_file_name(format!(".sfx-dl-{}-{attempt}.part", std::process::id()))
}

/// Fetches work items into place with bounded concurrency.
pub struct Downloader<F: FileSystem = TokioFileSystem, T: Transport = HttpTransport> {
    transport: T,
    config: DownloadConfig,
    fs: F,
}

impl<T: Transport> Downloader<TokioFileSystem, T> {
    /// Creates a new downloader with the default file system.
    #[must_use]
    pub const fn new(transport: T, config: DownloadConfig) -> Self {
        Self {
            transport,
            config,
            fs: TokioFileSystem,
        }
    }
}

impl<F: FileSystem, T: Transport> Downloader<F, T> {
    /// Creates a new downloader with a custom file system implementation.
    #[must_use]
    pub const fn with_fs(transport: T, config: DownloadConfig, fs: F) -> Self {
        Self {
            transport,
            config,
            fs,
        }
    }

    /// Returns a reference to the transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Returns a reference to the file system.
    #[must_use]
    pub const fn fs(&self) -> &F {
        &self.fs
    }

    /// Returns a reference to the download configuration.
    #[must_use]
    pub const fn config(&self) -> &DownloadConfig {
        &self.config
    }

    /// Whether `path` still has to be fetched.
    ///
    /// Any existing entry counts as done; contents are not inspected.
    pub async fn needs_fetch(&self, path: &Path) -> bool {
        self.config.force_overwrite || !self.fs.file_exists(path).await
    }

    /// Splits candidates into items to fetch and already-present ones.
    pub async fn collect_items(&self, candidates: Vec<WorkItem>) -> CollectedItems {
        let mut collected = CollectedItems::default();
        for item in candidates {
            if self.needs_fetch(item.destination_path()).await {
                collected.to_download.push(item);
            } else {
                log::debug!("Skipping existing {}", item.destination_path().display());
                collected.skipped += 1;
            }
        }
        collected
    }

    /// Ensures the parent directory exists for a file path.
    async fn ensure_parent_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            self.fs.create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Fetches one item using atomic `.part` file semantics.
    ///
    /// Writes to a [`transient_path`] next to `{path}`, then renames it to
    /// `{path}` on success. On error the `.part` file is removed if
    /// `cleanup_on_error` is enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory, the transient file, the transfer
    /// or the final rename fails.
    pub async fn try_fetch(&self, item: &WorkItem) -> Result<FileStats> {
        let path = item.destination_path();
        self.ensure_parent_dir(path).await?;

        let pp = transient_path(path);
        let started = Instant::now();
        let mut file = self.fs.create_file(&pp).await?;

        let transferred = match self.transport.fetch(item.source_location(), &mut file).await {
            Ok(size) => file.sync_all().await.map(|()| size).map_err(Error::from),
            Err(e) => Err(e),
        };
        drop(file);

        let placed = match transferred {
            Ok(size) => self
                .fs
                .rename_file(&pp, path)
                .await
                .map(|()| size)
                .map_err(Error::from),
            Err(e) => Err(e),
        };

        match placed {
            Ok(size) => Ok(FileStats {
                size,
                elapsed: started.elapsed(),
            }),
            Err(e) => {
                if self.config.cleanup_on_error
                    && let Err(cleanup) = self.fs.remove_file(&pp).await
                    && cleanup.kind() != std::io::ErrorKind::NotFound
                {
                    log::warn!("Could not remove {}: {cleanup}", pp.display());
                }
                Err(e)
            }
        }
    }

    /// Fetches one item, converting any error into a failure outcome.
    pub async fn fetch_item(&self, item: &WorkItem) -> FetchOutcome {
        let status = match self.try_fetch(item).await {
            Ok(stats) => FetchStatus::Success(stats),
            Err(e) => {
                log::debug!("Fetch of {} failed: {e}", item.source_location());
                FetchStatus::Failure(e.to_string())
            }
        };
        FetchOutcome {
            item: item.clone(),
            status,
        }
    }

    /// Runs every item through the pool, yielding outcomes as they finish.
    ///
    /// At most `workers` fetches are in flight at once. The stream ends once
    /// every item has produced exactly one outcome.
    pub fn fetch_all<'a>(&'a self, items: &'a [WorkItem]) -> impl Stream<Item = FetchOutcome> + 'a {
        stream::iter(items)
            .map(move |item| self.fetch_item(item))
            .buffer_unordered(self.config.effective_workers())
    }
}
