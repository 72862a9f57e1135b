//! Trait contract tests for GitDataClient.
//!
//! These tests exercise the behavioral contract of the hosting-API trait
//! through the in-memory fake, plus the paging helpers shared by every
//! implementation.

use futures::TryStreamExt;
use git_data::fakes::MemoryGitHost;
use git_data::*;

fn bot() -> CommitAuthor {
    CommitAuthor::new("UnityVersionBump (bot)", "bot@example.com")
}

// ===========================================================================
// Commit graph
// ===========================================================================

#[tokio::test]
async fn commit_chain_builds_on_branch_tip() {
    let host = MemoryGitHost::new();
    let base = host.default_branch().await.unwrap();
    let tip = host.branch_tip(&base).await.unwrap();

    let blob = host.create_blob("m_EditorVersion: 2022.2.1f2\n").await.unwrap();
    let tree = host
        .create_tree(&tip.tree_sha, "ProjectSettings/ProjectVersion.txt", &blob)
        .await
        .unwrap();
    let commit = host
        .create_commit("bump", &tree, &tip.commit_sha, &bot())
        .await
        .unwrap();
    host.create_ref("bump/editor/2022-2-1f2", &commit).await.unwrap();

    let stored = host.commit(&commit).unwrap();
    assert_eq!(stored.parent, tip.commit_sha);
    assert_eq!(stored.author, bot());
    assert_eq!(host.tree(&tree).unwrap().base_tree, tip.tree_sha);
    assert_eq!(
        host.branch_commit("bump/editor/2022-2-1f2").as_deref(),
        Some(commit.as_str())
    );
    let new_tip = host.branch_tip("bump/editor/2022-2-1f2").await.unwrap();
    assert_eq!(new_tip.tree_sha, tree);
}

#[tokio::test]
async fn blob_sha_is_content_addressed() {
    let host = MemoryGitHost::new();
    let a = host.create_blob("same").await.unwrap();
    let b = host.create_blob("same").await.unwrap();
    let c = host.create_blob("other").await.unwrap();

    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(a.len(), 40);
}

#[tokio::test]
async fn create_ref_rejects_existing_branch() {
    let host = MemoryGitHost::new();
    host.add_branch("bump/editor/1");
    let err = host.create_ref("bump/editor/1", "abc").await.unwrap_err();

    assert_eq!(err.status(), Some(422));
}

// ===========================================================================
// Pull requests
// ===========================================================================

#[tokio::test]
async fn open_comment_close_pull_request() {
    let host = MemoryGitHost::new();
    host.add_branch("feature");
    let number = host
        .open_pull_request(&NewPullRequest {
            base: "main".into(),
            head: "feature".into(),
            title: "t".into(),
            body: "b".into(),
        })
        .await
        .unwrap();
    host.apply_labels(number, &["dependencies".to_string()])
        .await
        .unwrap();
    host.post_issue_comment(number, "closing").await.unwrap();
    host.close_pull_request(number).await.unwrap();

    let pr = host.pull_request(number).unwrap();
    assert!(!pr.open);
    assert_eq!(pr.labels, vec!["dependencies".to_string()]);
    assert_eq!(pr.comments, vec!["closing".to_string()]);
    assert!(host.open_pull_requests().is_empty());
}

#[tokio::test]
async fn delete_missing_ref_is_an_error() {
    let host = MemoryGitHost::new();
    let err = host.delete_ref("nope").await.unwrap_err();

    assert!(matches!(
        err,
        GitDataError::UnexpectedStatus {
            expected: 204,
            actual: 422,
            ..
        }
    ));
}

#[tokio::test]
async fn injected_failure_carries_expected_and_actual_status() {
    let host = MemoryGitHost::new();
    host.fail_on("create_commit", 500);
    let err = host
        .create_commit("m", "tree", "parent", &bot())
        .await
        .unwrap_err();

    match err {
        GitDataError::UnexpectedStatus {
            operation,
            expected,
            actual,
            body,
        } => {
            assert_eq!(operation, "create_commit");
            assert_eq!(expected, 201);
            assert_eq!(actual, 500);
            assert!(body.contains("injected"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

// ===========================================================================
// Paging
// ===========================================================================

#[tokio::test]
async fn pull_request_stream_follows_full_pages() {
    let host = MemoryGitHost::new();
    for i in 0..7 {
        host.add_pull_request(&format!("head-{i}"), "t", "b");
    }

    let all: Vec<PullRequestRecord> = pull_requests(&host, 3).try_collect().await.unwrap();

    assert_eq!(all.len(), 7);
    let pages: Vec<String> = host
        .calls()
        .into_iter()
        .filter(|c| c.starts_with("list_pull_requests_page"))
        .collect();
    assert_eq!(
        pages,
        vec![
            "list_pull_requests_page:1",
            "list_pull_requests_page:2",
            "list_pull_requests_page:3"
        ]
    );
}

#[tokio::test]
async fn exact_multiple_of_page_size_fetches_trailing_empty_page() {
    let host = MemoryGitHost::new();
    // `main` plus three seeded branches
    for name in ["a", "b", "c"] {
        host.add_branch(name);
    }

    let names: Vec<String> = branches(&host, 2).try_collect().await.unwrap();

    assert_eq!(names, vec!["a", "b", "c", "main"]);
    let page_calls = host
        .calls()
        .into_iter()
        .filter(|c| c.starts_with("list_branches_page"))
        .count();
    assert_eq!(page_calls, 3);
}

#[tokio::test]
async fn paging_error_ends_stream_with_error() {
    let host = MemoryGitHost::new();
    host.fail_on("list_pull_requests_page", 502);

    let result: GitResult<Vec<PullRequestRecord>> =
        pull_requests(&host, DEFAULT_PAGE_SIZE).try_collect().await;

    assert_eq!(result.unwrap_err().status(), Some(502));
}
