//! Error types for osu-mirror-dl
//!
//! Most failures in the pipeline are absorbed locally and turned into degraded
//! results (an empty catalog, a truncated page list, a skipped beatmap set).
//! The variants here cover what is left over: fatal setup errors, identity
//! resolution, and the per-set errors that [`crate::MirroredDownloader::run`]
//! logs and counts.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for osu-mirror-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for osu-mirror-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "base_url")
        key: Option<String>,
    },

    /// The user input cannot name a user at all (e.g. it is empty)
    #[error("invalid user identity: {0:?}")]
    InvalidIdentity(String),

    /// A username could not be turned into a numeric user id
    #[error("could not resolve user {input:?}: {reason}")]
    IdentityResolution {
        /// The username as entered
        input: String,
        /// Why the lookup failed
        reason: String,
    },

    /// Catalog endpoint returned something unusable
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Archive download failed after a mirror had accepted the request
    #[error("download error: {0}")]
    Download(#[from] DownloadError),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for a [`Error::Config`] tied to a configuration key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }
}

/// Errors raised while reading catalog endpoints
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Endpoint answered with a non-success status
    #[error("{url} returned HTTP {status}")]
    HttpStatus {
        /// Requested URL
        url: String,
        /// Status code received
        status: u16,
    },

    /// JSON body lacked a required field
    #[error("response is missing field {field}")]
    MissingField {
        /// Dotted path of the missing field
        field: &'static str,
    },
}

/// Errors raised while writing an archive received from a mirror
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Response body broke off mid-stream
    #[error("stream from {mirror} failed: {reason}")]
    Stream {
        /// Mirror that was streaming the archive
        mirror: String,
        /// Underlying failure
        reason: String,
    },

    /// Archive could not be written or moved into place
    #[error("failed to write {path}: {reason}")]
    Persist {
        /// Path being written
        path: PathBuf,
        /// Underlying failure
        reason: String,
    },
}
