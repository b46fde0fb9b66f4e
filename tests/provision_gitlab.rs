use httpmock::prelude::*;
use rscaf::provision::{ProvisionSettings, Stage};
use rscaf::{GitLabClient, ProvisionError, ProvisionRequest, Provisioner, Visibility};
use serde_json::json;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

fn scaffold(dir: &Path) -> PathBuf {
    let root = dir.join(".gitlab-repo-scaffolding").join("demo-main");
    fs::create_dir_all(root.join("cmd").join("demo")).unwrap();
    fs::write(root.join("README.md"), "# demo\n").unwrap();
    fs::write(root.join("cmd").join("demo").join("main.go"), "package main\n").unwrap();
    root
}

fn provisioner(server: &MockServer) -> Provisioner<GitLabClient> {
    let client =
        GitLabClient::new(&server.base_url(), Some("token"), Duration::from_secs(5)).unwrap();
    let settings = ProvisionSettings {
        default_base_url: server.base_url(),
        ..Default::default()
    };
    Provisioner::new(client, settings)
}

fn request(local_path: PathBuf) -> ProvisionRequest {
    ProvisionRequest {
        local_path,
        name: "demo".into(),
        owner: "alice".into(),
        org: "acme".into(),
        visibility: Visibility::Internal,
        ..Default::default()
    }
}

fn full_message(err: &dyn Error) -> String {
    let mut msg = err.to_string();
    let mut cause = err.source();
    while let Some(e) = cause {
        msg = format!("{msg}: {e}");
        cause = e.source();
    }
    msg
}

fn mock_namespace(server: &MockServer) {
    server.mock(|when, then| {
        when.method(GET).path("/api/v4/namespaces/acme");
        then.status(200).json_body(json!({"id": 3, "full_path": "acme"}));
    });
}

fn mock_create(server: &MockServer) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method(POST)
            .path("/api/v4/projects")
            .header("PRIVATE-TOKEN", "token")
            .json_body_partial(r#"{"name": "demo", "namespace_id": 3, "visibility": "internal"}"#);
        then.status(201)
            .json_body(json!({"id": 11, "path_with_namespace": "acme/demo"}));
    })
}

#[test]
fn provisions_repository_end_to_end() {
    let td = TempDir::new().unwrap();
    let server = MockServer::start();
    mock_namespace(&server);
    let create = mock_create(&server);
    let commit = server.mock(|when, then| {
        when.method(POST)
            .path_contains("/repository/commits")
            .body_contains(r#""branch":"main""#)
            .body_contains(r#""commit_message":"initialized by rscaf""#)
            .body_contains(r#""file_path":"README.md""#)
            .body_contains(r#""file_path":"cmd/demo/main.go""#);
        then.status(201).json_body(json!({"id": "a1b2c3"}));
    });
    let delete = server.mock(|when, then| {
        when.method(DELETE);
        then.status(202);
    });

    let res = provisioner(&server)
        .provision(&request(scaffold(td.path())))
        .unwrap();

    create.assert();
    commit.assert();
    delete.assert_hits(0);
    assert_eq!(res.repo_url, format!("{}/acme/demo.git", server.base_url()));
    assert_eq!(res.state().repo_name, "demo");
}

#[test]
fn failed_commit_deletes_created_repository() {
    let td = TempDir::new().unwrap();
    let server = MockServer::start();
    mock_namespace(&server);
    mock_create(&server);
    server.mock(|when, then| {
        when.method(POST).path_contains("/repository/commits");
        then.status(500).body("internal error");
    });
    let delete = server.mock(|when, then| {
        when.method(DELETE).path_contains("/api/v4/projects/acme");
        then.status(202);
    });

    let err = provisioner(&server)
        .provision(&request(scaffold(td.path())))
        .unwrap_err();

    delete.assert_hits(1);
    assert!(matches!(err, ProvisionError::CommitFailed { .. }));
    assert_eq!(err.stage(), Stage::Compensated);
    assert!(full_message(&err).contains("internal error"));
}

#[test]
fn failed_cleanup_is_reported_with_commit_failure() {
    let td = TempDir::new().unwrap();
    let server = MockServer::start();
    mock_namespace(&server);
    mock_create(&server);
    server.mock(|when, then| {
        when.method(POST).path_contains("/repository/commits");
        then.status(400).body("branch is invalid");
    });
    server.mock(|when, then| {
        when.method(DELETE);
        then.status(403).body("403 Forbidden");
    });

    let err = provisioner(&server)
        .provision(&request(scaffold(td.path())))
        .unwrap_err();

    let msg = full_message(&err);
    assert!(msg.contains("branch is invalid"), "{msg}");
    assert!(msg.contains("cleanup also failed"), "{msg}");
    assert!(msg.contains("403 Forbidden"), "{msg}");
    assert_eq!(err.cleanup_failures()[0].target, "acme/demo");
}

#[test]
fn failed_create_touches_nothing_else() {
    let td = TempDir::new().unwrap();
    let server = MockServer::start();
    mock_namespace(&server);
    server.mock(|when, then| {
        when.method(POST).path("/api/v4/projects");
        then.status(400)
            .body(r#"{"message":{"name":["has already been taken"]}}"#);
    });
    let commit = server.mock(|when, then| {
        when.method(POST).path_contains("/repository/commits");
        then.status(201);
    });
    let delete = server.mock(|when, then| {
        when.method(DELETE);
        then.status(202);
    });

    let err = provisioner(&server)
        .provision(&request(scaffold(td.path())))
        .unwrap_err();

    assert!(matches!(err, ProvisionError::CreateFailed { .. }));
    commit.assert_hits(0);
    delete.assert_hits(0);
}

#[test]
fn unreachable_host_fails_creation_without_cleanup() {
    let td = TempDir::new().unwrap();
    let client = GitLabClient::new("http://127.0.0.1:9", None, Duration::from_secs(2)).unwrap();
    let p = Provisioner::new(client, ProvisionSettings::default());

    let mut req = request(scaffold(td.path()));
    req.org.clear();
    let err = p.provision(&req).unwrap_err();
    assert!(matches!(err, ProvisionError::CreateFailed { .. }));
}
