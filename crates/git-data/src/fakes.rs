//! In-memory fake of the hosting API (testing only)
//!
//! `MemoryGitHost` keeps branches, git objects and pull requests in a single
//! `Mutex`-guarded state, hands out content-addressed SHAs and records every
//! call so tests can assert on the exact operation sequence. Individual
//! operations can be made to fail with an arbitrary status.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::client_traits::*;
use crate::error::GitDataError;

/// A pull request held by [`MemoryGitHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakePullRequest {
    pub number: u64,
    pub base: String,
    pub head: String,
    pub title: String,
    pub body: String,
    pub open: bool,
    pub labels: Vec<String>,
    pub comments: Vec<String>,
}

/// A commit created through [`GitDataClient::create_commit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeCommit {
    pub message: String,
    pub tree: String,
    pub parent: String,
    pub author: CommitAuthor,
}

/// A tree created through [`GitDataClient::create_tree`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeTree {
    pub base_tree: String,
    pub path: String,
    pub blob: String,
}

#[derive(Debug)]
struct HostState {
    default_branch: String,
    /// branch name -> commit sha
    branches: BTreeMap<String, String>,
    /// commit sha -> tree sha for commits that exist before the test runs
    seeded_trees: HashMap<String, String>,
    blobs: HashMap<String, String>,
    trees: HashMap<String, FakeTree>,
    commits: HashMap<String, FakeCommit>,
    pulls: BTreeMap<u64, FakePullRequest>,
    next_number: u64,
    failures: HashMap<String, u16>,
    calls: Vec<String>,
}

impl Default for HostState {
    fn default() -> Self {
        let root_commit = fake_sha("commit", "initial");
        let root_tree = fake_sha("tree", "initial");
        let mut branches = BTreeMap::new();
        branches.insert("main".to_string(), root_commit.clone());
        let mut seeded_trees = HashMap::new();
        seeded_trees.insert(root_commit, root_tree);
        Self {
            default_branch: "main".to_string(),
            branches,
            seeded_trees,
            blobs: HashMap::new(),
            trees: HashMap::new(),
            commits: HashMap::new(),
            pulls: BTreeMap::new(),
            next_number: 1,
            failures: HashMap::new(),
            calls: Vec::new(),
        }
    }
}

/// In-memory repository implementing [`GitDataClient`].
///
/// Starts with a single `main` branch. Pull request numbers are allocated
/// sequentially from 1.
#[derive(Debug, Default)]
pub struct MemoryGitHost {
    state: Mutex<HostState>,
}

impl MemoryGitHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later call of `operation` fail with `status`.
    ///
    /// `operation` is the trait method name, e.g. `"create_ref"`.
    pub fn fail_on(&self, operation: &str, status: u16) {
        let mut state = self.state.lock().unwrap();
        state.failures.insert(operation.to_string(), status);
    }

    /// Seed a branch pointing at a synthetic commit.
    pub fn add_branch(&self, name: &str) {
        let mut state = self.state.lock().unwrap();
        let commit = fake_sha("commit", name);
        state.seeded_trees.insert(commit.clone(), fake_sha("tree", name));
        state.branches.insert(name.to_string(), commit);
    }

    /// Seed an open pull request and its head branch. Returns its number.
    pub fn add_pull_request(&self, head: &str, title: &str, body: &str) -> u64 {
        self.add_branch(head);
        let mut state = self.state.lock().unwrap();
        let number = state.next_number;
        state.next_number += 1;
        let base = state.default_branch.clone();
        state.pulls.insert(
            number,
            FakePullRequest {
                number,
                base,
                head: head.to_string(),
                title: title.to_string(),
                body: body.to_string(),
                open: true,
                labels: Vec::new(),
                comments: Vec::new(),
            },
        );
        number
    }

    pub fn pull_request(&self, number: u64) -> Option<FakePullRequest> {
        self.state.lock().unwrap().pulls.get(&number).cloned()
    }

    pub fn open_pull_requests(&self) -> Vec<FakePullRequest> {
        let state = self.state.lock().unwrap();
        state.pulls.values().filter(|pr| pr.open).cloned().collect()
    }

    pub fn branch_names(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.branches.keys().cloned().collect()
    }

    pub fn has_branch(&self, name: &str) -> bool {
        self.state.lock().unwrap().branches.contains_key(name)
    }

    pub fn blob(&self, sha: &str) -> Option<String> {
        self.state.lock().unwrap().blobs.get(sha).cloned()
    }

    pub fn tree(&self, sha: &str) -> Option<FakeTree> {
        self.state.lock().unwrap().trees.get(sha).cloned()
    }

    pub fn commit(&self, sha: &str) -> Option<FakeCommit> {
        self.state.lock().unwrap().commits.get(sha).cloned()
    }

    /// Commit a branch currently points at.
    pub fn branch_commit(&self, branch: &str) -> Option<String> {
        self.state.lock().unwrap().branches.get(branch).cloned()
    }

    /// Every trait call made so far, in order, as `operation` or
    /// `operation:argument`.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Calls that changed remote state.
    pub fn mutating_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| !c.starts_with("list_") && !c.starts_with("default_branch"))
            .filter(|c| !c.starts_with("branch_tip"))
            .collect()
    }
}

fn fake_sha(kind: &str, content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(kind.as_bytes());
    hasher.update([0u8]);
    hasher.update(content.as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..40].to_string()
}

fn not_found(operation: &str, what: &str) -> GitDataError {
    GitDataError::unexpected_status(operation, 200, 404, format!("{what} not found"))
}

impl HostState {
    fn record(&mut self, operation: &str, argument: Option<&str>) -> Result<(), GitDataError> {
        match argument {
            Some(arg) => self.calls.push(format!("{operation}:{arg}")),
            None => self.calls.push(operation.to_string()),
        }
        match self.failures.get(operation) {
            Some(&status) => Err(GitDataError::unexpected_status(
                operation,
                expected_status(operation),
                status,
                format!("injected failure for {operation}"),
            )),
            None => Ok(()),
        }
    }

    fn tree_of(&self, commit: &str) -> Option<String> {
        self.commits
            .get(commit)
            .map(|c| c.tree.clone())
            .or_else(|| self.seeded_trees.get(commit).cloned())
    }
}

fn expected_status(operation: &str) -> u16 {
    match operation {
        "create_blob" | "create_tree" | "create_commit" | "create_ref" | "open_pull_request"
        | "post_issue_comment" => 201,
        "delete_ref" => 204,
        _ => 200,
    }
}

fn page_of<T: Clone>(items: &[T], page: u32, per_page: u32) -> Vec<T> {
    let start = (page.saturating_sub(1) as usize).saturating_mul(per_page as usize);
    items
        .iter()
        .skip(start)
        .take(per_page as usize)
        .cloned()
        .collect()
}

#[async_trait]
impl GitDataClient for MemoryGitHost {
    async fn default_branch(&self) -> GitResult<String> {
        let mut state = self.state.lock().unwrap();
        state.record("default_branch", None)?;
        Ok(state.default_branch.clone())
    }

    async fn branch_tip(&self, branch: &str) -> GitResult<BranchTip> {
        let mut state = self.state.lock().unwrap();
        state.record("branch_tip", Some(branch))?;
        let commit_sha = state
            .branches
            .get(branch)
            .cloned()
            .ok_or_else(|| not_found("branch_tip", branch))?;
        let tree_sha = state
            .tree_of(&commit_sha)
            .ok_or_else(|| not_found("branch_tip", &commit_sha))?;
        Ok(BranchTip {
            commit_sha,
            tree_sha,
        })
    }

    async fn create_blob(&self, content: &str) -> GitResult<String> {
        let mut state = self.state.lock().unwrap();
        state.record("create_blob", None)?;
        let sha = fake_sha("blob", content);
        state.blobs.insert(sha.clone(), content.to_string());
        Ok(sha)
    }

    async fn create_tree(&self, base_tree: &str, path: &str, blob_sha: &str) -> GitResult<String> {
        let mut state = self.state.lock().unwrap();
        state.record("create_tree", Some(path))?;
        if !state.blobs.contains_key(blob_sha) {
            return Err(not_found("create_tree", blob_sha));
        }
        let sha = fake_sha("tree", &format!("{base_tree}\n{path}\n{blob_sha}"));
        state.trees.insert(
            sha.clone(),
            FakeTree {
                base_tree: base_tree.to_string(),
                path: path.to_string(),
                blob: blob_sha.to_string(),
            },
        );
        Ok(sha)
    }

    async fn create_commit(
        &self,
        message: &str,
        tree_sha: &str,
        parent_sha: &str,
        author: &CommitAuthor,
    ) -> GitResult<String> {
        let mut state = self.state.lock().unwrap();
        state.record("create_commit", None)?;
        let sha = fake_sha("commit", &format!("{tree_sha}\n{parent_sha}\n{message}"));
        state.commits.insert(
            sha.clone(),
            FakeCommit {
                message: message.to_string(),
                tree: tree_sha.to_string(),
                parent: parent_sha.to_string(),
                author: author.clone(),
            },
        );
        Ok(sha)
    }

    async fn create_ref(&self, branch: &str, commit_sha: &str) -> GitResult<()> {
        let mut state = self.state.lock().unwrap();
        state.record("create_ref", Some(branch))?;
        if state.branches.contains_key(branch) {
            return Err(GitDataError::unexpected_status(
                "create_ref",
                201,
                422,
                "Reference already exists",
            ));
        }
        state
            .branches
            .insert(branch.to_string(), commit_sha.to_string());
        Ok(())
    }

    async fn open_pull_request(&self, pr: &NewPullRequest) -> GitResult<u64> {
        let mut state = self.state.lock().unwrap();
        state.record("open_pull_request", Some(pr.head.as_str()))?;
        if !state.branches.contains_key(&pr.head) {
            return Err(GitDataError::unexpected_status(
                "open_pull_request",
                201,
                422,
                format!("head branch {} does not exist", pr.head),
            ));
        }
        let number = state.next_number;
        state.next_number += 1;
        state.pulls.insert(
            number,
            FakePullRequest {
                number,
                base: pr.base.clone(),
                head: pr.head.clone(),
                title: pr.title.clone(),
                body: pr.body.clone(),
                open: true,
                labels: Vec::new(),
                comments: Vec::new(),
            },
        );
        Ok(number)
    }

    async fn apply_labels(&self, number: u64, labels: &[String]) -> GitResult<()> {
        let mut state = self.state.lock().unwrap();
        state.record("apply_labels", Some(number.to_string().as_str()))?;
        let pr = state
            .pulls
            .get_mut(&number)
            .ok_or_else(|| not_found("apply_labels", &number.to_string()))?;
        pr.labels.extend(labels.iter().cloned());
        Ok(())
    }

    async fn post_issue_comment(&self, number: u64, body: &str) -> GitResult<()> {
        let mut state = self.state.lock().unwrap();
        state.record("post_issue_comment", Some(number.to_string().as_str()))?;
        let pr = state
            .pulls
            .get_mut(&number)
            .ok_or_else(|| not_found("post_issue_comment", &number.to_string()))?;
        pr.comments.push(body.to_string());
        Ok(())
    }

    async fn close_pull_request(&self, number: u64) -> GitResult<()> {
        let mut state = self.state.lock().unwrap();
        state.record("close_pull_request", Some(number.to_string().as_str()))?;
        let pr = state
            .pulls
            .get_mut(&number)
            .ok_or_else(|| not_found("close_pull_request", &number.to_string()))?;
        pr.open = false;
        Ok(())
    }

    async fn delete_ref(&self, branch: &str) -> GitResult<()> {
        let mut state = self.state.lock().unwrap();
        state.record("delete_ref", Some(branch))?;
        match state.branches.remove(branch) {
            Some(_) => Ok(()),
            None => Err(GitDataError::unexpected_status(
                "delete_ref",
                204,
                422,
                "Reference does not exist",
            )),
        }
    }

    async fn list_pull_requests_page(
        &self,
        page: u32,
        per_page: u32,
    ) -> GitResult<Vec<PullRequestRecord>> {
        let mut state = self.state.lock().unwrap();
        state.record("list_pull_requests_page", Some(page.to_string().as_str()))?;
        let open: Vec<PullRequestRecord> = state
            .pulls
            .values()
            .filter(|pr| pr.open)
            .map(|pr| PullRequestRecord {
                number: pr.number,
                head_ref: pr.head.clone(),
                body: Some(pr.body.clone()),
            })
            .collect();
        Ok(page_of(&open, page, per_page))
    }

    async fn list_branches_page(&self, page: u32, per_page: u32) -> GitResult<Vec<String>> {
        let mut state = self.state.lock().unwrap();
        state.record("list_branches_page", Some(page.to_string().as_str()))?;
        let names: Vec<String> = state.branches.keys().cloned().collect();
        Ok(page_of(&names, page, per_page))
    }
}
