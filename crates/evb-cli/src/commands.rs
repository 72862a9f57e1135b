//! Subcommand implementations.
//!
//! Both commands read the project files from the local checkout, ask the
//! release sources for a candidate and hand it to the reconciler. They are
//! generic over the hosting client and the release sources so the whole
//! flow runs against in-memory doubles in tests.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use evb_core::{
    project_version, EditorSubject, Manifest, PackageSubject, Reconciler, TargetReport,
    UpdateSubject, MANIFEST_PATH,
};
use git_data::{GitDataClient, RepositoryId};
use release_feed::{EditorFeed, PackageRegistry, ReleaseStream};
use tracing::{info, warn};

use crate::outputs::ActionOutputs;

fn read_project_file(project_dir: &Path, relative: &str) -> Result<String> {
    let path = project_dir.join(relative);
    std::fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))
}

// ---------------------------------------------------------------------------
// editor
// ---------------------------------------------------------------------------

/// Bump the editor version pinned in `ProjectSettings/ProjectVersion.txt`.
pub async fn cmd_editor<G, F>(
    reconciler: &Reconciler<G>,
    feed: &F,
    project_dir: &Path,
    streams: &[ReleaseStream],
    repository: &RepositoryId,
) -> Result<ActionOutputs>
where
    G: GitDataClient,
    F: EditorFeed + ?Sized,
{
    let text = read_project_file(project_dir, project_version::PROJECT_VERSION_PATH)?;
    let subject = EditorSubject::from_project_version(&text)
        .context("Failed to parse the project's editor version")?;

    let candidate = feed
        .latest_engine_version(streams)
        .await
        .context("Failed to fetch editor releases")?;
    let report = reconciler
        .run(&subject, candidate.as_ref())
        .await
        .context("Failed to reconcile editor pull requests")?;

    println!("{}", report.status_line(repository));

    let mut outputs = ActionOutputs::new();
    outputs.set("has-newer-version", report.has_newer_version);
    outputs.set(
        "current-unity-version",
        subject.current().display_with_revision(),
    );
    outputs.set(
        "newest-unity-version",
        candidate
            .as_ref()
            .map(|c| c.display_with_revision())
            .unwrap_or_default(),
    );
    outputs.set("current-version", &report.current);
    outputs.set("latest-version", report.latest.as_deref().unwrap_or_default());
    outputs.set(
        "pull-request-id",
        report.pull_request().map(|n| n.to_string()).unwrap_or_default(),
    );
    Ok(outputs)
}

// ---------------------------------------------------------------------------
// packages
// ---------------------------------------------------------------------------

/// A package whose update could not be completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageFailure {
    pub package: String,
    pub error: String,
}

/// Result of one `packages` run.
#[derive(Debug, Default)]
pub struct PackagesRun {
    pub outputs: ActionOutputs,
    pub reports: Vec<TargetReport>,
    pub failures: Vec<PackageFailure>,
}

/// Bump every registry dependency in `Packages/manifest.json`, one pull
/// request per package. A failing package is logged and recorded; the
/// remaining packages are still processed.
pub async fn cmd_packages<G, R>(
    reconciler: &Reconciler<G>,
    registry: &R,
    project_dir: &Path,
    include_prerelease: bool,
    repository: &RepositoryId,
) -> Result<PackagesRun>
where
    G: GitDataClient,
    R: PackageRegistry + ?Sized,
{
    let text = read_project_file(project_dir, MANIFEST_PATH)?;
    let manifest = Manifest::parse(&text).context("Failed to parse the package manifest")?;

    let mut run = PackagesRun::default();
    for (registry_url, packages) in manifest.registry_dependencies() {
        info!(registry = %registry_url, count = packages.len(), "Checking packages");
        for (name, _) in packages {
            match bump_package(
                reconciler,
                registry,
                &manifest,
                &registry_url,
                &name,
                include_prerelease,
            )
            .await
            {
                Ok(report) => {
                    println!("{}", report.status_line(repository));
                    run.reports.push(report);
                }
                Err(err) => {
                    let error = format!("{err:#}");
                    warn!(package = %name, error = %error, "Package update failed");
                    run.failures.push(PackageFailure {
                        package: name,
                        error,
                    });
                }
            }
        }
    }

    let pull_requests: BTreeMap<&str, u64> = run
        .reports
        .iter()
        .filter_map(|r| Some((r.target.as_str(), r.pull_request()?)))
        .collect();
    run.outputs.set(
        "has-newer-version",
        run.reports.iter().any(|r| r.has_newer_version),
    );
    run.outputs.set(
        "package-pull-requests",
        serde_json::to_string(&pull_requests)?,
    );
    Ok(run)
}

async fn bump_package<G, R>(
    reconciler: &Reconciler<G>,
    registry: &R,
    manifest: &Manifest,
    registry_url: &str,
    name: &str,
    include_prerelease: bool,
) -> Result<TargetReport>
where
    G: GitDataClient,
    R: PackageRegistry + ?Sized,
{
    let latest = registry
        .latest_package_version(registry_url, name, include_prerelease)
        .await
        .with_context(|| format!("Failed to look up {name} in {registry_url}"))?;
    let subject = PackageSubject::new(manifest, name)?;
    Ok(reconciler.run(&subject, latest.as_ref()).await?)
}
