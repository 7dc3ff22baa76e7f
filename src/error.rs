//! Error types for the sfx-dl library.

use thiserror::Error;

/// Errors that can occur while acquiring the manifest or fetching items.
#[derive(Error, Debug)]
pub enum Error {
    /// Connection, protocol or timeout failure from the HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    HttpStatus {
        /// Requested URL.
        url: String,
        /// Status code returned by the server.
        status: u16,
    },

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The manifest is missing required data or could not be acquired.
    #[error("Manifest error: {0}")]
    Manifest(String),

    /// The manifest CSV could not be parsed.
    #[error("Manifest CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Broad classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network, connection or HTTP-level failure during a fetch.
    Transfer,
    /// Directory creation, write or rename failure.
    Filesystem,
    /// Malformed or unreachable manifest. Fatal before dispatch.
    Manifest,
    /// Invalid configuration. Fatal before planning.
    Config,
}

impl Error {
    /// Returns the taxonomy bucket for this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Http(_) | Self::HttpStatus { .. } => ErrorKind::Transfer,
            Self::Io(_) => ErrorKind::Filesystem,
            Self::Manifest(_) | Self::Csv(_) => ErrorKind::Manifest,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    /// Returns true if this error is recoverable at the item boundary.
    #[must_use]
    pub const fn is_item_failure(&self) -> bool {
        matches!(self.kind(), ErrorKind::Transfer | ErrorKind::Filesystem)
    }
}

/// A specialized `Result` type for sfx-dl operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_is_transfer() {
        let err = Error::HttpStatus {
            url: "http://host/a.wav".to_string(),
            status: 404,
        };
        assert_eq!(err.kind(), ErrorKind::Transfer);
        assert!(err.is_item_failure());
        assert_eq!(err.to_string(), "HTTP 404 from http://host/a.wav");
    }

    #[test]
    fn io_error_is_filesystem() {
        let err = Error::from(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        assert_eq!(err.kind(), ErrorKind::Filesystem);
        assert!(err.is_item_failure());
    }

    #[test]
    fn manifest_and_config_errors_are_fatal() {
        assert_eq!(Error::Manifest("x".into()).kind(), ErrorKind::Manifest);
        assert!(!Error::Manifest("x".into()).is_item_failure());
        assert_eq!(Error::Config("x".into()).kind(), ErrorKind::Config);
        assert!(!Error::Config("x".into()).is_item_failure());
    }
}
