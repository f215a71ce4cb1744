//! Error types for SiteMirror
//!
//! This module provides the error hierarchy used across the mirroring
//! pipeline. Only a few of these escalate to the job driver: browser launch
//! failures, [`LoadError`]s and [`Error::Filesystem`]. Everything else is
//! absorbed by the stage that produced it and surfaces as a job warning or a
//! failed [`ResourceRecord`](crate::assets::ResourceRecord).

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for SiteMirror operations
#[derive(Error, Debug)]
pub enum Error {
    /// Browser-related errors
    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),

    /// Page load errors (job-fatal)
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    /// Content extraction errors
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Cannot create output directories or write an artifact (job-fatal)
    #[error("Filesystem error at {}: {source}", path.display())]
    Filesystem {
        /// Path that could not be created or written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// ChromiumOxide errors
    #[error("CDP error: {0}")]
    Cdp(String),

    /// URL could not be parsed or is not mirrorable
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Generic error with message
    #[error("{0}")]
    Generic(String),
}

/// Browser lifecycle and control errors
#[derive(Error, Debug)]
pub enum BrowserError {
    /// Failed to launch browser
    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    /// Browser configuration error
    #[error("Invalid browser configuration: {0}")]
    ConfigError(String),

    /// Failed to create new page/tab
    #[error("Failed to create page: {0}")]
    PageCreationFailed(String),

    /// Failed to apply user agent or viewport to the page
    #[error("Failed to prepare page: {0}")]
    PageSetupFailed(String),
}

/// Page load errors
#[derive(Error, Debug)]
pub enum LoadError {
    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Navigation did not reach network idle in time
    #[error("Navigation timed out after {0}ms")]
    Timeout(u64),

    /// Page load failed
    #[error("Page load failed: {0}")]
    LoadFailed(String),
}

/// Content extraction errors
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// JavaScript execution failed
    #[error("JavaScript execution failed: {0}")]
    JsExecutionFailed(String),

    /// The page returned data of an unexpected shape
    #[error("Unexpected page data: {0}")]
    UnexpectedShape(String),
}

/// Failure to fetch or store a single resource.
///
/// Never escalates: the downloader records it on the resource's
/// [`ResourceRecord`](crate::assets::ResourceRecord) as its error message.
#[derive(Error, Debug)]
pub enum DownloadError {
    /// Request exceeded the per-resource timeout
    #[error("timed out after {0}ms")]
    Timeout(u64),

    /// Server answered with a non-success status
    #[error("HTTP status {0}")]
    Status(u16),

    /// Connection or protocol failure
    #[error("network error: {0}")]
    Network(String),

    /// Payload could not be written to disk
    #[error("write failed: {0}")]
    Write(String),

    /// Body exceeded the configured size cap
    #[error("larger than {0} bytes")]
    TooLarge(u64),
}

impl DownloadError {
    /// Whether another attempt could plausibly succeed
    pub fn is_transient(&self) -> bool {
        match self {
            DownloadError::Timeout(_) | DownloadError::Network(_) => true,
            DownloadError::Status(status) => *status == 429 || *status >= 500,
            DownloadError::Write(_) | DownloadError::TooLarge(_) => false,
        }
    }
}

/// Result type alias for SiteMirror operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a generic error from a string
    pub fn generic<S: Into<String>>(msg: S) -> Self {
        Error::Generic(msg.into())
    }

    /// Create a CDP error from a string
    pub fn cdp<S: Into<String>>(msg: S) -> Self {
        Error::Cdp(msg.into())
    }

    /// Wrap an I/O error with the path it concerns
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Whether this error must abort the whole job
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Load(_) | Error::Browser(_) | Error::Filesystem { .. } | Error::InvalidUrl(_)
        )
    }
}

/// Convert chromiumoxide errors
impl From<chromiumoxide::error::CdpError> for Error {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        Error::Cdp(err.to_string())
    }
}
