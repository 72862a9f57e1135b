//! Engine Version Bump Core Library
//!
//! Version models, manifest handling, the pull request marker and the
//! per-target reconciliation state machine.

pub mod domain;
pub mod manifest;
pub mod marker;
pub mod obs;
pub mod reconcile;
pub mod telemetry;

pub use domain::{
    cmp_optional, is_at_least, project_version, BumpError, Channel, EngineVersion, PackageVersion,
    Result, Revision, VersionError,
};

pub use manifest::{Dependency, Manifest, ScopedRegistry, DEFAULT_REGISTRY_URL, MANIFEST_PATH};
pub use marker::Marker;

pub use reconcile::{
    pull_request_body, pull_request_title, BumpSettings, BumpVersion, EditorSubject,
    PackageSubject, ReconcileOutcome, Reconciler, TargetReport, UpdateSubject, EDITOR_TARGET,
};

pub use obs::target_span;
pub use telemetry::init_tracing;

/// Engine Version Bump version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
