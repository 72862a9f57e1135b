//! Error types for release-feed

use evb_core::VersionError;
use thiserror::Error;

/// Errors that can occur while looking up available releases
#[derive(Error, Debug)]
pub enum FeedError {
    /// Lookup requested with no release stream to consider
    #[error("at least one release stream must be requested")]
    NoReleaseStreams,

    /// Release stream name not recognised
    #[error("unknown release stream '{0}': expected one of Stable, LTS, Beta, Alpha, Patch")]
    UnknownReleaseStream(String),

    /// Feed answered with a non-success status
    #[error("'{url}' responded with status code {status}")]
    Status { url: String, status: u16 },

    /// Feed body could not be deserialised
    #[error("'{url}' responded with data that couldn't be deserialized: {message}")]
    Decode { url: String, message: String },

    /// A release entry is malformed
    #[error("invalid release entry: {0}")]
    Version(#[from] VersionError),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(String),

    /// HTTP client could not be built
    #[error("invalid feed configuration: {0}")]
    Config(String),
}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        FeedError::Http(err.to_string())
    }
}

/// Result type for release-feed operations
pub type Result<T> = std::result::Result<T, FeedError>;
