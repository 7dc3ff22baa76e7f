//! Configuration types for download runs.
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! whatever the command line overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default number of concurrent fetches.
pub const DEFAULT_WORKERS: usize = 10;

/// Default location of the published manifest.
pub const DEFAULT_MANIFEST_URL: &str = "http://bbcsfx.acropolis.org.uk/assets/BBCSoundEffects.csv";

/// Default prefix joined with each manifest `location`.
pub const DEFAULT_ASSET_BASE_URL: &str = "http://bbcsfx.acropolis.org.uk/assets/";

/// Configuration for the fetch pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Number of concurrent fetches.
    pub workers: usize,
    /// Fetch items even if their destination already exists.
    pub force_overwrite: bool,
    /// Whether to remove `.part` files when a fetch fails.
    pub cleanup_on_error: bool,
    /// Whole-request timeout in seconds. Zero waits forever.
    pub request_timeout_secs: u64,
    /// Connection timeout in seconds. Zero waits forever.
    pub connect_timeout_secs: u64,
    /// Exit with a failure status when any item failed.
    pub fail_on_errors: bool,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            force_overwrite: false,
            cleanup_on_error: true,
            request_timeout_secs: 600,
            connect_timeout_secs: 30,
            fail_on_errors: false,
        }
    }
}

impl DownloadConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of concurrent fetches.
    #[must_use]
    pub const fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Sets whether to fetch items whose destination already exists.
    #[must_use]
    pub const fn with_force_overwrite(mut self, force: bool) -> Self {
        self.force_overwrite = force;
        self
    }

    /// Sets whether to clean up `.part` files on fetch error.
    #[must_use]
    pub const fn with_cleanup_on_error(mut self, cleanup: bool) -> Self {
        self.cleanup_on_error = cleanup;
        self
    }

    /// Sets the whole-request timeout. `None` waits forever.
    ///
    /// Timeouts are kept in whole seconds; a fractional duration rounds up,
    /// so anything under a second becomes one second.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout_secs = timeout_to_secs(timeout);
        self
    }

    /// Sets the connection timeout. `None` waits forever.
    ///
    /// Rounds up to whole seconds like [`Self::with_request_timeout`].
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout_secs = timeout_to_secs(timeout);
        self
    }

    /// Sets whether failures turn into a non-zero exit status.
    #[must_use]
    pub const fn with_fail_on_errors(mut self, fail: bool) -> Self {
        self.fail_on_errors = fail;
        self
    }

    /// Returns the request timeout, if one is configured.
    #[must_use]
    pub const fn request_timeout(&self) -> Option<Duration> {
        secs_to_timeout(self.request_timeout_secs)
    }

    /// Returns the connect timeout, if one is configured.
    #[must_use]
    pub const fn connect_timeout(&self) -> Option<Duration> {
        secs_to_timeout(self.connect_timeout_secs)
    }

    /// Number of pool slots actually used. Never zero.
    #[must_use]
    pub fn effective_workers(&self) -> usize {
        self.workers.max(1)
    }
}

const fn timeout_to_secs(timeout: Option<Duration>) -> u64 {
    match timeout {
        None => 0,
        Some(t) => {
            let secs = if t.subsec_nanos() > 0 {
                t.as_secs().saturating_add(1)
            } else {
                t.as_secs()
            };
            if secs == 0 { 1 } else { secs }
        }
    }
}

const fn secs_to_timeout(secs: u64) -> Option<Duration> {
    if secs == 0 {
        None
    } else {
        Some(Duration::from_secs(secs))
    }
}

/// Where the manifest and the downloaded files live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    /// Root directory; one sub-directory per manifest group.
    pub sounds_root: PathBuf,
    /// Local copy of the manifest.
    pub manifest_path: PathBuf,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            sounds_root: PathBuf::from("sounds"),
            manifest_path: PathBuf::from("BBCSoundEffects.csv"),
        }
    }
}

/// Remote endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// URL the manifest is fetched from when no local copy exists.
    pub manifest_url: String,
    /// Prefix joined with each row's `location`.
    pub asset_base_url: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            manifest_url: DEFAULT_MANIFEST_URL.to_string(),
            asset_base_url: DEFAULT_ASSET_BASE_URL.to_string(),
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Pool and fetch settings.
    pub download: DownloadConfig,
    /// Local paths.
    pub paths: PathConfig,
    /// Remote endpoints.
    pub source: SourceConfig,
}

impl AppConfig {
    /// Creates a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Default location of the configuration file.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("sfx-dl").join("config.toml"))
    }

    /// Loads configuration.
    ///
    /// An explicit `path` must exist. Without one, the file at
    /// [`default_path`](Self::default_path) is read if present, otherwise
    /// defaults are returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.is_file() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Reads and parses a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        let config = Self::from_toml(&text)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the text is not valid configuration.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }
}
