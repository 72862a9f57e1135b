//! Pull request reconciliation.
//!
//! Open bot pull requests on the hosting platform are the only record of
//! what has already been proposed. Every run re-derives that state, tidies
//! it, and then decides between reusing a pull request, superseding it,
//! opening a new one or doing nothing.
//!
//! Per target the steps are:
//! 1. collect open pull requests carrying this bot's marker for the target
//! 2. delete bot branches that no open bot pull request uses
//! 3. close every duplicate but the newest
//! 4. stop when there is no candidate version
//! 5. reuse the surviving pull request when it is at least the candidate
//! 6. otherwise close it
//! 7. stop when the project is already at least the candidate
//! 8. build blob, tree, commit and branch, then open the pull request

mod report;
mod subject;

pub use report::TargetReport;
pub use subject::{BumpVersion, EditorSubject, PackageSubject, UpdateSubject, EDITOR_TARGET};

use std::collections::HashSet;
use std::time::Instant;

use futures::TryStreamExt;
use git_data::{CommitAuthor, GitDataClient, NewPullRequest, PullRequestRecord, DEFAULT_PAGE_SIZE};
use serde::{Deserialize, Serialize};
use tracing::{debug, Instrument};

use crate::domain::error::{BumpError, Result};
use crate::domain::is_at_least;
use crate::marker::Marker;
use crate::obs;

/// Branch namespace used when none is configured.
pub const DEFAULT_BRANCH_PREFIX: &str = "unityversionbump";

/// Commit identity used when none is configured.
pub const DEFAULT_AUTHOR_NAME: &str = "UnityVersionBump (bot)";
pub const DEFAULT_AUTHOR_EMAIL: &str = "unity-version-bump@vincent.mahn.ke";

const OUTDATED_COMMENT: &str = "🛑 This PR is targeting a version that is no longer up-to-date. Closing this PR and creating a new PR for the newest version in its stead. 🛑";
const DUPLICATE_COMMENT: &str = "🛑 A pull request for a newer version of this dependency is already open. Closing this PR in its favor. 🛑";

/// How the reconciler identifies itself and where it writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BumpSettings {
    /// First path segment of every bot branch
    pub branch_prefix: String,
    pub author: CommitAuthor,
    /// Labels attached to new pull requests
    pub labels: Vec<String>,
    /// Project directory relative to the repository root; empty for the root
    pub project_path: String,
    pub page_size: u32,
}

impl Default for BumpSettings {
    fn default() -> Self {
        BumpSettings {
            branch_prefix: DEFAULT_BRANCH_PREFIX.to_string(),
            author: CommitAuthor::new(DEFAULT_AUTHOR_NAME, DEFAULT_AUTHOR_EMAIL),
            labels: Vec::new(),
            project_path: String::new(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl BumpSettings {
    pub fn with_branch_prefix(mut self, prefix: &str) -> Self {
        self.branch_prefix = prefix.trim_matches('/').to_string();
        self
    }

    pub fn with_author(mut self, author: CommitAuthor) -> Self {
        self.author = author;
        self
    }

    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_project_path(mut self, path: &str) -> Self {
        self.project_path = path.trim_matches('/').to_string();
        self
    }

    /// Repository path of a project-relative file.
    pub fn repository_path(&self, file: &str) -> String {
        if self.project_path.is_empty() {
            file.to_string()
        } else {
            format!("{}/{}", self.project_path, file)
        }
    }

    /// `{prefix}/{target_kind}/{version with dots replaced by dashes}`
    pub fn branch_name(&self, target_kind: &str, version: &impl std::fmt::Display) -> String {
        format!(
            "{}/{}/{}",
            self.branch_prefix,
            target_kind,
            version.to_string().replace('.', "-")
        )
    }

    fn owns_branch(&self, branch: &str) -> bool {
        branch
            .strip_prefix(self.branch_prefix.as_str())
            .is_some_and(|rest| rest.starts_with('/'))
    }
}

/// Result of reconciling one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReconcileOutcome {
    /// Nothing qualified in the requested channels
    NoCandidate,
    /// An open pull request already targets the candidate or newer
    AlreadyProposed { number: u64 },
    /// The project is already at the candidate or newer
    UpToDate,
    /// A new pull request was opened
    Created { number: u64, branch: String },
}

impl ReconcileOutcome {
    pub fn pull_request(&self) -> Option<u64> {
        match self {
            ReconcileOutcome::AlreadyProposed { number }
            | ReconcileOutcome::Created { number, .. } => Some(*number),
            ReconcileOutcome::NoCandidate | ReconcileOutcome::UpToDate => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ReconcileOutcome::NoCandidate => "no_candidate",
            ReconcileOutcome::AlreadyProposed { .. } => "already_proposed",
            ReconcileOutcome::UpToDate => "up_to_date",
            ReconcileOutcome::Created { .. } => "created",
        }
    }
}

/// An open pull request carrying this bot's marker.
#[derive(Debug, Clone)]
struct BotPullRequest {
    number: u64,
    head_ref: String,
    marker: Marker,
}

#[derive(Debug, Clone)]
struct TrackedPullRequest<V> {
    number: u64,
    head_ref: String,
    version: V,
}

#[derive(Debug, Clone, Copy)]
enum CloseReason {
    Duplicate,
    Outdated,
}

impl CloseReason {
    fn comment(self) -> &'static str {
        match self {
            CloseReason::Duplicate => DUPLICATE_COMMENT,
            CloseReason::Outdated => OUTDATED_COMMENT,
        }
    }

    fn name(self) -> &'static str {
        match self {
            CloseReason::Duplicate => "duplicate",
            CloseReason::Outdated => "outdated",
        }
    }
}

/// Drives the per-target state machine against a [`GitDataClient`].
pub struct Reconciler<G: GitDataClient> {
    client: G,
    settings: BumpSettings,
}

impl<G: GitDataClient> Reconciler<G> {
    pub fn new(client: G, settings: BumpSettings) -> Self {
        Self { client, settings }
    }

    pub fn client(&self) -> &G {
        &self.client
    }

    pub fn settings(&self) -> &BumpSettings {
        &self.settings
    }

    /// Reconcile `subject` against `candidate` and summarise the run.
    pub async fn run<S: UpdateSubject>(
        &self,
        subject: &S,
        candidate: Option<&S::Version>,
    ) -> Result<TargetReport> {
        let started = Instant::now();
        let target = subject.target_kind().to_string();
        let span = obs::target_span(&target);
        span.in_scope(|| {
            obs::emit_target_started(
                &target,
                &subject.current().to_string(),
                candidate.map(|c| c.to_string()).as_deref(),
            )
        });

        let result = self
            .reconcile(subject, candidate)
            .instrument(span.clone())
            .await;
        let _entered = span.enter();
        match result {
            Ok(outcome) => {
                obs::emit_target_finished(
                    &target,
                    outcome.name(),
                    started.elapsed().as_millis() as u64,
                );
                Ok(TargetReport::new(&target, subject.current(), candidate, outcome))
            }
            Err(err) => {
                obs::emit_target_failed(&target, &err);
                Err(err)
            }
        }
    }

    /// Apply steps 1 to 8 for one target.
    pub async fn reconcile<S: UpdateSubject>(
        &self,
        subject: &S,
        candidate: Option<&S::Version>,
    ) -> Result<ReconcileOutcome> {
        let target = subject.target_kind();

        let bot_prs = self.bot_pull_requests().await?;
        let mut tracked = bot_prs
            .iter()
            .filter(|pr| pr.marker.target_kind() == target)
            .map(|pr| {
                let version = <S::Version as BumpVersion>::parse_detailed(pr.marker.version()).map_err(|source| {
                    BumpError::Marker {
                        number: pr.number,
                        source,
                    }
                })?;
                Ok(TrackedPullRequest {
                    number: pr.number,
                    head_ref: pr.head_ref.clone(),
                    version,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        obs::emit_pull_requests_found(target, tracked.len());

        self.delete_dangling_branches(&bot_prs).await?;

        tracked.sort_by(|a, b| a.version.cmp(&b.version).then(a.number.cmp(&b.number)));
        let survivor = tracked.pop();
        for duplicate in &tracked {
            self.retire(target, duplicate, CloseReason::Duplicate).await?;
        }

        let Some(candidate) = candidate else {
            debug!(target = %target, "No candidate version in the requested channels");
            return Ok(ReconcileOutcome::NoCandidate);
        };

        if let Some(existing) = &survivor {
            if is_at_least(Some(&existing.version), Some(candidate)) {
                return Ok(ReconcileOutcome::AlreadyProposed {
                    number: existing.number,
                });
            }
            self.retire(target, existing, CloseReason::Outdated).await?;
        }

        if is_at_least(Some(subject.current()), Some(candidate)) {
            return Ok(ReconcileOutcome::UpToDate);
        }

        let (number, branch) = self.open_bump(subject, candidate).await?;
        Ok(ReconcileOutcome::Created { number, branch })
    }

    async fn bot_pull_requests(&self) -> Result<Vec<BotPullRequest>> {
        let records: Vec<PullRequestRecord> =
            git_data::pull_requests(&self.client, self.settings.page_size)
                .try_collect()
                .await?;
        Ok(records
            .into_iter()
            .filter_map(|record| {
                let marker = Marker::extract(record.body.as_deref()?)?;
                Some(BotPullRequest {
                    number: record.number,
                    head_ref: record.head_ref,
                    marker,
                })
            })
            .collect())
    }

    /// Delete every branch in the bot's namespace that no open bot pull
    /// request uses as its head.
    async fn delete_dangling_branches(&self, bot_prs: &[BotPullRequest]) -> Result<()> {
        let heads: HashSet<&str> = bot_prs.iter().map(|pr| pr.head_ref.as_str()).collect();
        let branches: Vec<String> = git_data::branches(&self.client, self.settings.page_size)
            .try_collect()
            .await?;
        for branch in branches
            .iter()
            .filter(|b| self.settings.owns_branch(b) && !heads.contains(b.as_str()))
        {
            self.client.delete_ref(branch).await?;
            obs::emit_branch_deleted(branch);
        }
        Ok(())
    }

    async fn retire<V>(
        &self,
        target: &str,
        pr: &TrackedPullRequest<V>,
        reason: CloseReason,
    ) -> Result<()> {
        self.client
            .post_issue_comment(pr.number, reason.comment())
            .await?;
        self.client.close_pull_request(pr.number).await?;
        self.client.delete_ref(&pr.head_ref).await?;
        obs::emit_pr_closed(target, pr.number, reason.name());
        Ok(())
    }

    /// Build the single-file commit on a fresh branch and open the pull
    /// request for it.
    async fn open_bump<S: UpdateSubject>(
        &self,
        subject: &S,
        target: &S::Version,
    ) -> Result<(u64, String)> {
        let base = self.client.default_branch().await?;
        let tip = self.client.branch_tip(&base).await?;

        let content = subject.render_file(target)?;
        let blob = self.client.create_blob(&content).await?;
        let path = self.settings.repository_path(subject.file_path());
        let tree = self
            .client
            .create_tree(&tip.tree_sha, &path, &blob)
            .await?;

        let title = pull_request_title(subject, target);
        let commit = self
            .client
            .create_commit(&title, &tree, &tip.commit_sha, &self.settings.author)
            .await?;

        let branch = self.settings.branch_name(subject.target_kind(), target);
        self.client.create_ref(&branch, &commit).await?;

        let body = pull_request_body(subject, target)?;
        let number = self
            .client
            .open_pull_request(&NewPullRequest {
                base,
                head: branch.clone(),
                title,
                body,
            })
            .await?;
        if !self.settings.labels.is_empty() {
            self.client
                .apply_labels(number, &self.settings.labels)
                .await?;
        }

        obs::emit_pr_created(subject.target_kind(), number, &branch);
        Ok((number, branch))
    }
}

/// Commit message and pull request title.
pub fn pull_request_title<S: UpdateSubject>(subject: &S, target: &S::Version) -> String {
    format!(
        "build(deps): bump `{}` from `{}` to `{}`",
        subject.title_name(),
        subject.current(),
        target
    )
}

/// Pull request body ending in the bot marker.
pub fn pull_request_body<S: UpdateSubject>(subject: &S, target: &S::Version) -> Result<String> {
    let mut body = format!(
        "Bumps {} version from `{}` to `{}`.",
        subject.body_subject(),
        subject.current().detailed(),
        target.detailed()
    );
    if let Some(notes) = subject.release_notes(target) {
        body.push_str("\n\n");
        body.push_str(&notes);
    }
    body.push_str("\n\n");
    body.push_str(&Marker::new(subject.target_kind(), &target.detailed()).render()?);
    Ok(body)
}
