//! Per-target run summary.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use git_data::RepositoryId;
use serde::Serialize;

use super::{BumpVersion, ReconcileOutcome};
use crate::domain::cmp_optional;

/// What one reconciliation decided, in a form the CLI can print or
/// serialise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetReport {
    pub target: String,
    pub current: String,
    /// Highest qualifying version, if any
    pub latest: Option<String>,
    pub has_newer_version: bool,
    pub outcome: ReconcileOutcome,
    pub checked_at: DateTime<Utc>,
}

impl TargetReport {
    pub fn new<V: BumpVersion>(
        target: &str,
        current: &V,
        latest: Option<&V>,
        outcome: ReconcileOutcome,
    ) -> Self {
        TargetReport {
            target: target.to_string(),
            current: current.to_string(),
            latest: latest.map(|v| v.to_string()),
            has_newer_version: cmp_optional(latest, Some(current)) == Ordering::Greater,
            outcome,
            checked_at: Utc::now(),
        }
    }

    /// Number of the pull request that now carries the bump, if any.
    pub fn pull_request(&self) -> Option<u64> {
        self.outcome.pull_request()
    }

    /// One human-readable line describing the outcome.
    pub fn status_line(&self, repository: &RepositoryId) -> String {
        match &self.outcome {
            ReconcileOutcome::NoCandidate => {
                format!("{}: no release found in the requested channels", self.target)
            }
            ReconcileOutcome::UpToDate => format!(
                "{}: {} is up to date (latest {})",
                self.target,
                self.current,
                self.latest.as_deref().unwrap_or("unknown")
            ),
            ReconcileOutcome::AlreadyProposed { number } => format!(
                "{}: {} already proposed in {}",
                self.target,
                self.latest.as_deref().unwrap_or("unknown"),
                repository.pull_request_url(*number)
            ),
            ReconcileOutcome::Created { number, .. } => format!(
                "{}: bump {} -> {} opened as {}",
                self.target,
                self.current,
                self.latest.as_deref().unwrap_or("unknown"),
                repository.pull_request_url(*number)
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PackageVersion;

    fn v(text: &str) -> PackageVersion {
        PackageVersion::parse(text).unwrap()
    }

    #[test]
    fn test_has_newer_version() {
        let newer = TargetReport::new(
            "com.a",
            &v("1.0.0"),
            Some(&v("1.1.0")),
            ReconcileOutcome::UpToDate,
        );
        assert!(newer.has_newer_version);

        let same = TargetReport::new(
            "com.a",
            &v("1.1.0"),
            Some(&v("1.1.0")),
            ReconcileOutcome::UpToDate,
        );
        assert!(!same.has_newer_version);

        let none = TargetReport::new("com.a", &v("1.1.0"), None, ReconcileOutcome::NoCandidate);
        assert!(!none.has_newer_version);
        assert_eq!(none.latest, None);
    }

    #[test]
    fn test_status_line_links_pull_request() {
        let repo = RepositoryId::parse("octo/game").unwrap();
        let report = TargetReport::new(
            "com.a",
            &v("1.0.0"),
            Some(&v("1.1.0")),
            ReconcileOutcome::Created {
                number: 12,
                branch: "unityversionbump/com-a/1-1-0".into(),
            },
        );
        assert_eq!(report.pull_request(), Some(12));
        assert_eq!(
            report.status_line(&repo),
            "com.a: bump 1.0.0 -> 1.1.0 opened as https://github.com/octo/game/pull/12"
        );
    }

    #[test]
    fn test_report_serialises_outcome_tag() {
        let report = TargetReport::new(
            "editor",
            &v("1.0.0"),
            None,
            ReconcileOutcome::NoCandidate,
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["outcome"]["status"], "no_candidate");
        assert_eq!(json["has_newer_version"], false);
    }
}
