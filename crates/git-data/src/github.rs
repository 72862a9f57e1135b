//! GitHub REST implementation of [`GitDataClient`].

use std::fmt;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::client_traits::*;
use crate::error::GitDataError;

/// Public GitHub API root.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

const USER_AGENT: &str = concat!("engine-version-bump/", env!("CARGO_PKG_VERSION"));

/// Connection settings for [`GitHubClient`].
#[derive(Clone)]
pub struct GitHubConfig {
    /// API root, without the `/repos/...` suffix
    pub api_url: String,
    pub repository: RepositoryId,
    pub token: String,
    pub user_agent: String,
}

impl GitHubConfig {
    pub fn new(repository: RepositoryId, token: &str) -> Self {
        GitHubConfig {
            api_url: DEFAULT_API_URL.to_string(),
            repository,
            token: token.to_string(),
            user_agent: USER_AGENT.to_string(),
        }
    }

    /// Read `GITHUB_REPOSITORY`, `GITHUB_TOKEN` and, if set, `GITHUB_API_URL`.
    pub fn from_env() -> GitResult<Self> {
        let repository = std::env::var("GITHUB_REPOSITORY")
            .map_err(|_| GitDataError::Config("GITHUB_REPOSITORY is not set".to_string()))?;
        let token = std::env::var("GITHUB_TOKEN")
            .map_err(|_| GitDataError::Config("GITHUB_TOKEN is not set".to_string()))?;
        let mut config = Self::new(RepositoryId::parse(&repository)?, &token);
        if let Ok(api_url) = std::env::var("GITHUB_API_URL") {
            config = config.with_api_url(&api_url);
        }
        Ok(config)
    }

    /// Point at a different API root (GitHub Enterprise, test servers).
    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = api_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = user_agent.to_string();
        self
    }
}

impl fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("api_url", &self.api_url)
            .field("repository", &self.repository)
            .field("token", &"<redacted>")
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

// Response shapes, only the fields we read.

#[derive(Deserialize)]
struct RepoResponse {
    default_branch: String,
}

#[derive(Deserialize)]
struct ShaResponse {
    sha: String,
}

#[derive(Deserialize)]
struct BranchResponse {
    commit: BranchCommit,
}

#[derive(Deserialize)]
struct BranchCommit {
    sha: String,
    commit: CommitDetail,
}

#[derive(Deserialize)]
struct CommitDetail {
    tree: ShaResponse,
}

#[derive(Deserialize)]
struct NumberResponse {
    number: u64,
}

#[derive(Deserialize)]
struct ListedPull {
    number: u64,
    head: ListedHead,
    body: Option<String>,
}

#[derive(Deserialize)]
struct ListedHead {
    #[serde(rename = "ref")]
    ref_name: String,
}

#[derive(Deserialize)]
struct ListedBranch {
    name: String,
}

/// [`GitDataClient`] backed by the GitHub REST API.
pub struct GitHubClient {
    config: GitHubConfig,
    http: reqwest::Client,
}

impl GitHubClient {
    pub fn new(config: GitHubConfig) -> GitResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| GitDataError::Config(e.to_string()))?;
        Ok(GitHubClient { config, http })
    }

    pub fn from_env() -> GitResult<Self> {
        Self::new(GitHubConfig::from_env()?)
    }

    pub fn repository(&self) -> &RepositoryId {
        &self.config.repository
    }

    fn url(&self, path: &str) -> String {
        let base = format!(
            "{}/repos/{}/{}",
            self.config.api_url, self.config.repository.owner, self.config.repository.name
        );
        if path.is_empty() {
            base
        } else {
            format!("{base}/{path}")
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, self.url(path))
            .bearer_auth(&self.config.token)
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
    }

    /// Send `request`, require `expected`, return the raw body.
    async fn send_raw(
        &self,
        operation: &str,
        expected: StatusCode,
        request: RequestBuilder,
    ) -> GitResult<String> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if status != expected {
            warn!(
                operation = operation,
                expected = expected.as_u16(),
                actual = status.as_u16(),
                "Hosting API returned an unexpected status"
            );
            return Err(GitDataError::unexpected_status(
                operation,
                expected.as_u16(),
                status.as_u16(),
                body,
            ));
        }
        debug!(operation = operation, status = status.as_u16(), "Hosting API call succeeded");
        Ok(body)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        operation: &str,
        expected: StatusCode,
        request: RequestBuilder,
    ) -> GitResult<T> {
        let body = self.send_raw(operation, expected, request).await?;
        serde_json::from_str(&body).map_err(|e| GitDataError::Decode {
            operation: operation.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl GitDataClient for GitHubClient {
    async fn default_branch(&self) -> GitResult<String> {
        let repo: RepoResponse = self
            .send("default_branch", StatusCode::OK, self.request(Method::GET, ""))
            .await?;
        Ok(repo.default_branch)
    }

    async fn branch_tip(&self, branch: &str) -> GitResult<BranchTip> {
        let response: BranchResponse = self
            .send(
                "branch_tip",
                StatusCode::OK,
                self.request(Method::GET, &format!("branches/{branch}")),
            )
            .await?;
        Ok(BranchTip {
            commit_sha: response.commit.sha,
            tree_sha: response.commit.commit.tree.sha,
        })
    }

    async fn create_blob(&self, content: &str) -> GitResult<String> {
        let request = self
            .request(Method::POST, "git/blobs")
            .json(&json!({ "content": content, "encoding": "utf-8" }));
        let blob: ShaResponse = self
            .send("create_blob", StatusCode::CREATED, request)
            .await?;
        Ok(blob.sha)
    }

    async fn create_tree(&self, base_tree: &str, path: &str, blob_sha: &str) -> GitResult<String> {
        let request = self.request(Method::POST, "git/trees").json(&json!({
            "base_tree": base_tree,
            "tree": [{ "path": path, "mode": "100644", "type": "blob", "sha": blob_sha }],
        }));
        let tree: ShaResponse = self
            .send("create_tree", StatusCode::CREATED, request)
            .await?;
        Ok(tree.sha)
    }

    async fn create_commit(
        &self,
        message: &str,
        tree_sha: &str,
        parent_sha: &str,
        author: &CommitAuthor,
    ) -> GitResult<String> {
        let request = self.request(Method::POST, "git/commits").json(&json!({
            "message": message,
            "tree": tree_sha,
            "parents": [parent_sha],
            "author": { "name": author.name, "email": author.email },
        }));
        let commit: ShaResponse = self
            .send("create_commit", StatusCode::CREATED, request)
            .await?;
        Ok(commit.sha)
    }

    async fn create_ref(&self, branch: &str, commit_sha: &str) -> GitResult<()> {
        let request = self
            .request(Method::POST, "git/refs")
            .json(&json!({ "ref": format!("refs/heads/{branch}"), "sha": commit_sha }));
        self.send_raw("create_ref", StatusCode::CREATED, request)
            .await?;
        Ok(())
    }

    async fn open_pull_request(&self, pr: &NewPullRequest) -> GitResult<u64> {
        let request = self.request(Method::POST, "pulls").json(&json!({
            "title": pr.title,
            "body": pr.body,
            "base": pr.base,
            "head": pr.head,
        }));
        let created: NumberResponse = self
            .send("open_pull_request", StatusCode::CREATED, request)
            .await?;
        Ok(created.number)
    }

    async fn apply_labels(&self, number: u64, labels: &[String]) -> GitResult<()> {
        if labels.is_empty() {
            return Ok(());
        }
        let request = self
            .request(Method::POST, &format!("issues/{number}/labels"))
            .json(&json!({ "labels": labels }));
        self.send_raw("apply_labels", StatusCode::OK, request)
            .await?;
        Ok(())
    }

    async fn post_issue_comment(&self, number: u64, body: &str) -> GitResult<()> {
        let request = self
            .request(Method::POST, &format!("issues/{number}/comments"))
            .json(&json!({ "body": body }));
        self.send_raw("post_issue_comment", StatusCode::CREATED, request)
            .await?;
        Ok(())
    }

    async fn close_pull_request(&self, number: u64) -> GitResult<()> {
        let request = self
            .request(Method::PATCH, &format!("pulls/{number}"))
            .json(&json!({ "state": "closed" }));
        self.send_raw("close_pull_request", StatusCode::OK, request)
            .await?;
        Ok(())
    }

    async fn delete_ref(&self, branch: &str) -> GitResult<()> {
        let request = self.request(Method::DELETE, &format!("git/refs/heads/{branch}"));
        self.send_raw("delete_ref", StatusCode::NO_CONTENT, request)
            .await?;
        Ok(())
    }

    async fn list_pull_requests_page(
        &self,
        page: u32,
        per_page: u32,
    ) -> GitResult<Vec<PullRequestRecord>> {
        let request = self.request(Method::GET, "pulls").query(&[
            ("state", "open".to_string()),
            ("per_page", per_page.to_string()),
            ("page", page.to_string()),
        ]);
        let pulls: Vec<ListedPull> = self
            .send("list_pull_requests", StatusCode::OK, request)
            .await?;
        Ok(pulls
            .into_iter()
            .map(|pr| PullRequestRecord {
                number: pr.number,
                head_ref: pr.head.ref_name,
                body: pr.body,
            })
            .collect())
    }

    async fn list_branches_page(&self, page: u32, per_page: u32) -> GitResult<Vec<String>> {
        let request = self.request(Method::GET, "branches").query(&[
            ("per_page", per_page.to_string()),
            ("page", page.to_string()),
        ]);
        let branches: Vec<ListedBranch> = self
            .send("list_branches", StatusCode::OK, request)
            .await?;
        Ok(branches.into_iter().map(|b| b.name).collect())
    }
}
