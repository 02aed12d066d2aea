//! Integration tests for the REST client against a mock service.

mod support;

use mockito::Matcher;
use pbiship_core::api::{ImportOptions, ImportState, NameConflict, PackageUpload, PowerBiApi, RestClient};
use pbiship_core::error::DeployError;
use support::make_package;
use tempfile::TempDir;

const WORKSPACE_ID: &str = "3f2c4a8e-6f1b-4c1d-9a53-0d8b1c2e7f10";

#[tokio::test]
async fn resolves_workspace_by_name_with_capacity() {
    let mut server = mockito::Server::new_async().await;
    let groups = server
        .mock("GET", "/groups")
        .match_query(Matcher::UrlEncoded("$filter".into(), "name eq 'Sales'".into()))
        .match_header("authorization", "Bearer token-1")
        .with_status(200)
        .with_body(format!(
            r#"{{"value":[{{"id":"{}","name":"Sales","isOnDedicatedCapacity":true,"capacityId":"CAP-1"}}]}}"#,
            WORKSPACE_ID
        ))
        .create_async()
        .await;
    let capacities = server
        .mock("GET", "/capacities")
        .with_status(200)
        .with_body(r#"{"value":[{"id":"cap-1","displayName":"P1 West","sku":"P1","region":"West Europe"}]}"#)
        .create_async()
        .await;

    let client = RestClient::new(&server.url(), "token-1").unwrap();
    let workspace = client.resolve_workspace("Sales").await.unwrap();

    groups.assert_async().await;
    capacities.assert_async().await;
    assert_eq!(workspace.group.id, WORKSPACE_ID);
    assert_eq!(
        workspace.capacity.unwrap().display_name.as_deref(),
        Some("P1 West")
    );
}

#[tokio::test]
async fn resolves_workspace_by_id() {
    let mut server = mockito::Server::new_async().await;
    let groups = server
        .mock("GET", "/groups")
        .match_query(Matcher::UrlEncoded(
            "$filter".into(),
            format!("id eq '{}'", WORKSPACE_ID),
        ))
        .with_status(200)
        .with_body(format!(r#"{{"value":[{{"id":"{}","name":"Sales"}}]}}"#, WORKSPACE_ID))
        .create_async()
        .await;

    let client = RestClient::new(&server.url(), "t").unwrap();
    let workspace = client.resolve_workspace(WORKSPACE_ID).await.unwrap();

    groups.assert_async().await;
    assert_eq!(workspace.group.name, "Sales");
    assert!(workspace.capacity.is_none());
}

#[tokio::test]
async fn missing_workspace_is_reported_by_reference() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/groups")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"value":[]}"#)
        .create_async()
        .await;

    let client = RestClient::new(&server.url(), "t").unwrap();
    let err = client.resolve_workspace("O'Brien Reports").await.unwrap_err();

    assert!(matches!(err, DeployError::WorkspaceNotFound(name) if name == "O'Brien Reports"));
}

#[tokio::test]
async fn posts_import_and_reads_status() {
    let temp = TempDir::new().unwrap();
    let package = make_package(temp.path(), "Q1.pbix");

    let mut server = mockito::Server::new_async().await;
    let post = server
        .mock("POST", format!("/groups/{}/imports", WORKSPACE_ID).as_str())
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("datasetDisplayName".into(), "Q1 (prod)".into()),
            Matcher::UrlEncoded("nameConflict".into(), "Overwrite".into()),
            Matcher::UrlEncoded("skipReport".into(), "false".into()),
        ]))
        .match_header("content-type", Matcher::Regex("^multipart/form-data".into()))
        .with_status(202)
        .with_body(r#"{"id":"imp-1"}"#)
        .create_async()
        .await;
    let get = server
        .mock("GET", format!("/groups/{}/imports/imp-1", WORKSPACE_ID).as_str())
        .with_status(200)
        .with_body(r#"{"id":"imp-1","name":"Q1 (prod)","importState":"Succeeded","reports":[{"id":"r-1"}],"datasets":[{"id":"d-1"}]}"#)
        .create_async()
        .await;

    let client = RestClient::new(&server.url(), "t").unwrap();
    let options = ImportOptions {
        name_conflict: NameConflict::Overwrite,
        ..ImportOptions::default()
    };
    let upload = PackageUpload::open(&package).await.unwrap();
    let handle = client
        .post_import(WORKSPACE_ID, upload, "Q1 (prod)", &options)
        .await
        .unwrap();
    assert_eq!(handle.name.as_deref(), Some("Q1 (prod)"));
    assert_eq!(handle.state(), ImportState::Pending(None));

    let status = client.get_import(WORKSPACE_ID, "imp-1").await.unwrap();
    assert_eq!(status.state(), ImportState::Succeeded);
    assert_eq!(status.reports[0].id, "r-1");

    post.assert_async().await;
    get.assert_async().await;
}

#[tokio::test]
async fn json_error_body_becomes_transport_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", format!("/groups/{}/imports/imp-9", WORKSPACE_ID).as_str())
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error":{"code":"InvalidRequest","message":"bad import id"}}"#)
        .create_async()
        .await;

    let client = RestClient::new(&server.url(), "t").unwrap();
    let err = client.get_import(WORKSPACE_ID, "imp-9").await.unwrap_err();

    match &err {
        DeployError::Transport { status, .. } => assert_eq!(*status, 400),
        other => panic!("expected Transport, got {:?}", other),
    }
    assert_eq!(err.remote_detail().unwrap()["error"]["code"], "InvalidRequest");
}

#[tokio::test]
async fn non_json_error_propagates_http_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/groups")
        .match_query(Matcher::Any)
        .with_status(503)
        .with_body("Service Unavailable")
        .create_async()
        .await;

    let client = RestClient::new(&server.url(), "t").unwrap();
    let err = client.resolve_workspace("Sales").await.unwrap_err();

    match err {
        DeployError::Http(inner) => {
            assert_eq!(inner.status().map(|s| s.as_u16()), Some(503));
        }
        other => panic!("expected Http, got {:?}", other),
    }
}
