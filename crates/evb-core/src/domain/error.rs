//! Error taxonomy for version handling and reconciliation.

use git_data::GitDataError;

/// Errors produced while parsing version text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    #[error("'{input}' is not a valid version: expected {expected}")]
    InvalidSyntax { input: String, expected: &'static str },

    #[error("'{input}': {field} may be at most {max} characters long but is {actual}")]
    FieldTooLong {
        input: String,
        field: &'static str,
        max: usize,
        actual: usize,
    },

    #[error("'{input}': unsupported release channel '{shorthand}'")]
    UnsupportedChannel { input: String, shorthand: char },

    #[error("'{revision}' is not a valid revision: expected 12 lowercase hex characters")]
    InvalidRevision { revision: String },

    #[error("'{url}' does not contain a revision: expected a download/<12 hex chars>/ segment")]
    InvalidDownloadUrl { url: String },

    #[error("'{input}': {field} does not fit in 32 bits")]
    NumberOutOfRange { input: String, field: &'static str },
}

/// Domain errors for everything above the version model.
#[derive(Debug, thiserror::Error)]
pub enum BumpError {
    #[error("version error: {0}")]
    Version(#[from] VersionError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid project version file: {0}")]
    ProjectVersion(String),

    #[error("unknown package: {0}")]
    UnknownPackage(String),

    #[error("pull request #{number} carries an unreadable version marker: {source}")]
    Marker {
        number: u64,
        #[source]
        source: VersionError,
    },

    #[error("hosting API error: {0}")]
    Git(#[from] GitDataError),
}

/// Result type for evb-core operations.
pub type Result<T> = std::result::Result<T, BumpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_too_long_names_field_and_length() {
        let err = VersionError::FieldTooLong {
            input: "2021.123.0a12".into(),
            field: "minor",
            max: 2,
            actual: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("2021.123.0a12"));
        assert!(msg.contains("minor"));
        assert!(msg.contains("at most 2"));
    }

    #[test]
    fn test_git_error_converts() {
        let err: BumpError = GitDataError::unexpected_status("create_ref", 201, 422, "exists").into();
        assert!(matches!(err, BumpError::Git(_)));
        assert!(err.to_string().contains("422"));
    }
}
