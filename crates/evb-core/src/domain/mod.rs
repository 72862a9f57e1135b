//! Domain models for engine-version-bump.
//!
//! Canonical definitions for the version values the bot compares:
//! - `EngineVersion`: an editor release, e.g. `2022.2.1f2`
//! - `PackageVersion`: a registry package release, e.g. `1.3.0-preview.2`
//! - `project_version`: the project's pinned editor version file

pub mod engine_version;
pub mod error;
pub mod ordering;
pub mod package_version;
pub mod project_version;

// Re-export main types and errors
pub use engine_version::{Channel, EngineVersion, Revision};
pub use error::{BumpError, Result, VersionError};
pub use ordering::{cmp_optional, is_at_least};
pub use package_version::PackageVersion;
