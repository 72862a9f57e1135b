//! Hosting-API trait and the records it exchanges.
//!
//! The bot has no working tree. Every change is assembled remotely from
//! individual git-data primitives (blob, tree, commit, ref) and proposed as a
//! pull request. [`GitDataClient`] is the seam between that sequence and the
//! concrete REST backend, so the reconciliation logic can run against
//! [`MemoryGitHost`](crate::fakes::MemoryGitHost) in tests.

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};

use crate::error::GitDataError;

/// Result alias for hosting-API operations.
pub type GitResult<T> = std::result::Result<T, GitDataError>;

/// Number of records requested per page when listing.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Repository coordinates in `owner/name` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryId {
    pub owner: String,
    pub name: String,
}

impl RepositoryId {
    /// Parse `owner/name`. Both halves must be non-empty and there must be
    /// exactly one separator.
    pub fn parse(s: &str) -> GitResult<Self> {
        let mut parts = s.trim().split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty() => {
                Ok(Self {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(GitDataError::InvalidRepository(s.to_string())),
        }
    }

    /// Browser URL of pull request `number`.
    pub fn pull_request_url(&self, number: u64) -> String {
        format!("https://github.com/{}/{}/pull/{}", self.owner, self.name, number)
    }
}

impl FromStr for RepositoryId {
    type Err = GitDataError;

    fn from_str(s: &str) -> GitResult<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Author and committer identity stamped on bot commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitAuthor {
    pub name: String,
    pub email: String,
}

impl CommitAuthor {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// Tip of a branch: the commit and the tree it points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchTip {
    pub commit_sha: String,
    pub tree_sha: String,
}

/// Parameters for opening a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPullRequest {
    pub base: String,
    pub head: String,
    pub title: String,
    pub body: String,
}

/// An open pull request as listed by the hosting API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestRecord {
    pub number: u64,
    /// Branch name the pull request merges from
    pub head_ref: String,
    pub body: Option<String>,
}

// ---------------------------------------------------------------------------
// GitDataClient
// ---------------------------------------------------------------------------

/// Remote operations scoped to a single repository.
///
/// Guarantees:
/// - Every mutating call either succeeds with the documented status or
///   returns [`GitDataError::UnexpectedStatus`] carrying both statuses and
///   the raw response body. There is no silent partial success.
/// - No call is retried by the implementation.
/// - Listing calls return one page at a time; use [`pull_requests`] and
///   [`branches`] for the full collection.
#[async_trait]
pub trait GitDataClient: Send + Sync {
    /// Name of the repository's default branch.
    async fn default_branch(&self) -> GitResult<String>;

    /// Commit and tree at the tip of `branch`.
    async fn branch_tip(&self, branch: &str) -> GitResult<BranchTip>;

    /// Store `content` as a UTF-8 blob. Returns the blob SHA.
    async fn create_blob(&self, content: &str) -> GitResult<String>;

    /// Create a tree that replaces `path` in `base_tree` with `blob_sha`.
    async fn create_tree(&self, base_tree: &str, path: &str, blob_sha: &str) -> GitResult<String>;

    /// Create a single-parent commit. Returns the commit SHA.
    async fn create_commit(
        &self,
        message: &str,
        tree_sha: &str,
        parent_sha: &str,
        author: &CommitAuthor,
    ) -> GitResult<String>;

    /// Create `refs/heads/{branch}` pointing at `commit_sha`.
    async fn create_ref(&self, branch: &str, commit_sha: &str) -> GitResult<()>;

    /// Open a pull request. Returns its number.
    async fn open_pull_request(&self, pr: &NewPullRequest) -> GitResult<u64>;

    /// Attach labels to an issue or pull request.
    async fn apply_labels(&self, number: u64, labels: &[String]) -> GitResult<()>;

    async fn post_issue_comment(&self, number: u64, body: &str) -> GitResult<()>;

    async fn close_pull_request(&self, number: u64) -> GitResult<()>;

    /// Delete `refs/heads/{branch}`.
    async fn delete_ref(&self, branch: &str) -> GitResult<()>;

    /// One page (1-based) of open pull requests.
    async fn list_pull_requests_page(
        &self,
        page: u32,
        per_page: u32,
    ) -> GitResult<Vec<PullRequestRecord>>;

    /// One page (1-based) of branch names.
    async fn list_branches_page(&self, page: u32, per_page: u32) -> GitResult<Vec<String>>;
}

/// All open pull requests, fetched page by page.
///
/// Fetching continues while a page comes back full and stops at the first
/// short page.
pub fn pull_requests<C>(client: &C, page_size: u32) -> BoxStream<'_, GitResult<PullRequestRecord>>
where
    C: GitDataClient + ?Sized,
{
    let page_size = page_size.max(1);
    paged(page_size, move |page| {
        client.list_pull_requests_page(page, page_size)
    })
}

/// All branch names, fetched page by page.
pub fn branches<C>(client: &C, page_size: u32) -> BoxStream<'_, GitResult<String>>
where
    C: GitDataClient + ?Sized,
{
    let page_size = page_size.max(1);
    paged(page_size, move |page| client.list_branches_page(page, page_size))
}

fn paged<'a, T, F, Fut>(page_size: u32, fetch: F) -> BoxStream<'a, GitResult<T>>
where
    T: Send + 'a,
    F: Fn(u32) -> Fut + Send + 'a,
    Fut: Future<Output = GitResult<Vec<T>>> + Send + 'a,
{
    stream::try_unfold(
        (1u32, false, fetch),
        move |(page, exhausted, fetch)| async move {
            if exhausted {
                return Ok(None);
            }
            let items = fetch(page).await?;
            let short = (items.len() as u32) < page_size;
            Ok::<_, GitDataError>(Some((items, (page + 1, short, fetch))))
        },
    )
    .map_ok(|items| stream::iter(items.into_iter().map(Ok)))
    .try_flatten()
    .boxed()
}
