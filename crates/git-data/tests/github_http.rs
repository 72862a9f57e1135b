//! GitHubClient against a mock HTTP server.

use futures::TryStreamExt;
use git_data::*;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const REPO: &str = "/repos/owner/game";

fn client(server: &MockServer) -> GitHubClient {
    let repo = RepositoryId::parse("owner/game").unwrap();
    GitHubClient::new(GitHubConfig::new(repo, "t0ken").with_api_url(&server.uri())).unwrap()
}

fn pulls_page(start: u64, count: u64) -> serde_json::Value {
    let pulls: Vec<serde_json::Value> = (start..start + count)
        .map(|n| json!({ "number": n, "head": { "ref": format!("b{n}"), "label": format!("owner:b{n}") }, "body": null }))
        .collect();
    json!(pulls)
}

#[tokio::test]
async fn default_branch_sends_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(REPO))
        .and(header("authorization", "Bearer t0ken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "default_branch": "develop" })))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(client(&server).default_branch().await.unwrap(), "develop");
}

#[tokio::test]
async fn branch_tip_reads_commit_and_tree() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{REPO}/branches/main")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "main",
            "commit": { "sha": "c0ffee", "commit": { "tree": { "sha": "7ree" } } }
        })))
        .mount(&server)
        .await;

    let tip = client(&server).branch_tip("main").await.unwrap();
    assert_eq!(tip.commit_sha, "c0ffee");
    assert_eq!(tip.tree_sha, "7ree");
}

#[tokio::test]
async fn create_tree_posts_single_blob_entry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{REPO}/git/trees")))
        .and(body_partial_json(json!({
            "base_tree": "base",
            "tree": [{ "path": "Packages/manifest.json", "mode": "100644", "type": "blob", "sha": "blob1" }]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sha": "tree1" })))
        .expect(1)
        .mount(&server)
        .await;

    let sha = client(&server)
        .create_tree("base", "Packages/manifest.json", "blob1")
        .await
        .unwrap();
    assert_eq!(sha, "tree1");
}

#[tokio::test]
async fn create_ref_with_wrong_status_surfaces_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{REPO}/git/refs")))
        .respond_with(
            ResponseTemplate::new(422).set_body_string(r#"{"message":"Reference already exists"}"#),
        )
        .mount(&server)
        .await;

    let err = client(&server)
        .create_ref("bump/editor/2022-2-1f2", "abc")
        .await
        .unwrap_err();
    match err {
        GitDataError::UnexpectedStatus {
            expected,
            actual,
            body,
            ..
        } => {
            assert_eq!(expected, 201);
            assert_eq!(actual, 422);
            assert!(body.contains("Reference already exists"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn success_status_other_than_documented_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{REPO}/git/blobs")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "sha": "x" })))
        .mount(&server)
        .await;

    let err = client(&server).create_blob("text").await.unwrap_err();
    assert_eq!(err.status(), Some(200));
}

#[tokio::test]
async fn close_and_delete_use_documented_statuses() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path(format!("{REPO}/pulls/12")))
        .and(body_partial_json(json!({ "state": "closed" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "number": 12 })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("{REPO}/git/refs/heads/bump/editor/2022-2-0a17")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let c = client(&server);
    c.close_pull_request(12).await.unwrap();
    c.delete_ref("bump/editor/2022-2-0a17").await.unwrap();
}

#[tokio::test]
async fn empty_label_list_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    client(&server).apply_labels(3, &[]).await.unwrap();
}

#[tokio::test]
async fn pull_requests_page_until_short_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{REPO}/pulls")))
        .and(query_param("page", "1"))
        .and(query_param("per_page", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(pulls_page(1, 100)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{REPO}/pulls")))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(pulls_page(101, 3)))
        .expect(1)
        .mount(&server)
        .await;

    let c = client(&server);
    let all: Vec<PullRequestRecord> = pull_requests(&c, DEFAULT_PAGE_SIZE)
        .try_collect()
        .await
        .unwrap();

    assert_eq!(all.len(), 103);
    assert_eq!(all[102].number, 103);
    assert_eq!(all[102].head_ref, "b103");
    assert_eq!(all[0].body, None);
}

#[tokio::test]
async fn undecodable_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(REPO))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client(&server).default_branch().await.unwrap_err();
    assert!(matches!(err, GitDataError::Decode { .. }));
}
