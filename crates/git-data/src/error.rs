//! Error types for git-data

use thiserror::Error;

/// Errors raised by a [`GitDataClient`](crate::GitDataClient) implementation.
#[derive(Error, Debug)]
pub enum GitDataError {
    /// The hosting API answered with a status other than the documented one
    #[error("{operation} expected HTTP {expected} but got {actual}: {body}")]
    UnexpectedStatus {
        operation: String,
        expected: u16,
        actual: u16,
        body: String,
    },

    /// Request could not be sent or its response could not be read
    #[error("HTTP transport failed: {0}")]
    Transport(String),

    /// Response body did not have the expected shape
    #[error("Failed to decode {operation} response: {message}")]
    Decode { operation: String, message: String },

    /// Repository identifier is not of the form `owner/name`
    #[error("Invalid repository identifier '{0}': expected owner/name")]
    InvalidRepository(String),

    /// Client could not be configured
    #[error("Invalid client configuration: {0}")]
    Config(String),
}

impl GitDataError {
    /// Build an [`GitDataError::UnexpectedStatus`] for `operation`.
    pub fn unexpected_status(
        operation: impl Into<String>,
        expected: u16,
        actual: u16,
        body: impl Into<String>,
    ) -> Self {
        GitDataError::UnexpectedStatus {
            operation: operation.into(),
            expected,
            actual,
            body: body.into(),
        }
    }

    /// Status code returned by the hosting API, when that is what failed.
    pub fn status(&self) -> Option<u16> {
        match self {
            GitDataError::UnexpectedStatus { actual, .. } => Some(*actual),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for GitDataError {
    fn from(err: reqwest::Error) -> Self {
        GitDataError::Transport(err.to_string())
    }
}
