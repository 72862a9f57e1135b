//! Git-Data: hosting-API client for engine-version-bump
//!
//! This crate wraps the handful of REST operations the bot needs to propose a
//! change without a local checkout: read the default branch, build a blob,
//! tree and commit, point a branch at it and open a pull request. It also
//! lists and retires the bot's own pull requests and branches.
//!
//! ## Layer 0 - Remote State
//!
//! Focus: exact status-code contracts and complete pagination.
//!
//! ## Key Components
//!
//! - `GitDataClient`: async trait scoped to one repository
//! - `GitHubClient`: reqwest implementation against the GitHub REST API
//! - `MemoryGitHost`: in-memory fake for engine tests
//! - `pull_requests` / `branches`: paged streams over the listing calls

pub mod client_traits;
mod error;
pub mod fakes;
mod github;

pub use client_traits::{
    branches, pull_requests, BranchTip, CommitAuthor, GitDataClient, GitResult, NewPullRequest,
    PullRequestRecord, RepositoryId, DEFAULT_PAGE_SIZE,
};
pub use error::GitDataError;
pub use github::{GitHubClient, GitHubConfig, DEFAULT_API_URL};
