//! Integration tests for the per-artifact deployment state machine.

mod support;

use std::path::Path;
use std::time::Duration;

use pbiship_core::api::ImportOptions;
use pbiship_core::deploy::{DeploymentExecutor, PollPolicy, ReportDeploymentInfo, WorkspaceCache};
use pbiship_core::error::DeployError;
use pbiship_core::params::DeploymentParameters;
use pbiship_core::source::SourceKind;
use support::{FakeApi, make_package};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn fast_policy() -> PollPolicy {
    PollPolicy::default()
        .with_interval(Duration::from_millis(1))
        .with_timeout(Duration::from_secs(5))
}

fn artifact(package: &Path, name: &str, workspace: &str) -> ReportDeploymentInfo {
    ReportDeploymentInfo {
        kind: SourceKind::File,
        options: ImportOptions::default(),
        parameters: DeploymentParameters::new(),
        source_path: package.to_path_buf(),
        package_path: package.to_path_buf(),
        scratch_dir: None,
        display_name: name.to_string(),
        workspace: workspace.to_string(),
    }
}

#[tokio::test]
async fn submission_state_counts_as_first_poll() {
    let temp = TempDir::new().unwrap();
    let package = make_package(temp.path(), "Q1.pbix");
    let api = FakeApi::new()
        .with_workspace("Sales", "ws-1")
        .with_script(&[None, Some("InProgress"), Some("Succeeded")]);

    let executor = DeploymentExecutor::new(&api, fast_policy(), CancellationToken::new());
    let mut cache = WorkspaceCache::new();
    let handle = executor
        .execute(&artifact(&package, "Q1", "Sales"), &mut cache)
        .await
        .unwrap();

    assert_eq!(handle.id, "import-1");
    assert_eq!(handle.name.as_deref(), Some("Q1"));
    assert_eq!(api.post_count(), 1);
    assert_eq!(api.get_count(), 2);

    let uploads = api.uploads.lock().unwrap();
    assert_eq!(uploads[0].0, "ws-1");
    assert_eq!(uploads[0].2, std::fs::metadata(&package).unwrap().len());
}

#[tokio::test]
async fn immediate_success_skips_polling() {
    let temp = TempDir::new().unwrap();
    let package = make_package(temp.path(), "Q1.pbix");
    let api = FakeApi::new()
        .with_workspace("Sales", "ws-1")
        .with_script(&[Some("Succeeded")]);

    let executor = DeploymentExecutor::new(&api, fast_policy(), CancellationToken::new());
    executor
        .execute(&artifact(&package, "Q1", "Sales"), &mut WorkspaceCache::new())
        .await
        .unwrap();

    assert_eq!(api.get_count(), 0);
}

#[tokio::test]
async fn failed_import_names_the_import() {
    let temp = TempDir::new().unwrap();
    let package = make_package(temp.path(), "Q1.pbix");
    let api = FakeApi::new()
        .with_workspace("Sales", "ws-1")
        .with_script(&[Some("Publishing"), Some("Failed")]);

    let executor = DeploymentExecutor::new(&api, fast_policy(), CancellationToken::new());
    let err = executor
        .execute(&artifact(&package, "Q1", "Sales"), &mut WorkspaceCache::new())
        .await
        .unwrap_err();

    match err {
        DeployError::ImportFailed { name, id } => {
            assert_eq!(name, "Q1");
            assert_eq!(id, "import-1");
        }
        other => panic!("expected ImportFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn polling_stops_at_deadline() {
    let temp = TempDir::new().unwrap();
    let package = make_package(temp.path(), "Q1.pbix");
    let api = FakeApi::new()
        .with_workspace("Sales", "ws-1")
        .with_script(&[Some("Publishing")]);

    let policy = PollPolicy::default()
        .with_interval(Duration::from_millis(5))
        .with_timeout(Duration::from_millis(60));
    let executor = DeploymentExecutor::new(&api, policy, CancellationToken::new());
    let err = executor
        .execute(&artifact(&package, "Q1", "Sales"), &mut WorkspaceCache::new())
        .await
        .unwrap_err();

    match err {
        DeployError::Timeout { import_id, waited } => {
            assert_eq!(import_id, "import-1");
            assert!(waited >= Duration::from_millis(60));
        }
        other => panic!("expected Timeout, got {:?}", other),
    }
    assert!(api.get_count() >= 1);
}

#[tokio::test]
async fn cancellation_interrupts_polling() {
    let temp = TempDir::new().unwrap();
    let package = make_package(temp.path(), "Q1.pbix");
    let api = FakeApi::new()
        .with_workspace("Sales", "ws-1")
        .with_script(&[Some("Publishing")]);

    let cancel = CancellationToken::new();
    let policy = PollPolicy::default()
        .with_interval(Duration::from_millis(10))
        .with_timeout(Duration::from_secs(60));
    let executor = DeploymentExecutor::new(&api, policy, cancel.clone());

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = executor
        .execute(&artifact(&package, "Q1", "Sales"), &mut WorkspaceCache::new())
        .await
        .unwrap_err();
    assert!(matches!(err, DeployError::Cancelled));
}

#[tokio::test]
async fn cancelled_before_start_sends_nothing() {
    let temp = TempDir::new().unwrap();
    let package = make_package(temp.path(), "Q1.pbix");
    let api = FakeApi::new().with_workspace("Sales", "ws-1");

    let cancel = CancellationToken::new();
    cancel.cancel();
    let executor = DeploymentExecutor::new(&api, fast_policy(), cancel);
    let err = executor
        .execute(&artifact(&package, "Q1", "Sales"), &mut WorkspaceCache::new())
        .await
        .unwrap_err();

    assert!(matches!(err, DeployError::Cancelled));
    assert_eq!(api.resolve_count(), 0);
    assert_eq!(api.post_count(), 0);
}

#[tokio::test]
async fn workspace_is_resolved_once_per_reference() {
    let temp = TempDir::new().unwrap();
    let q1 = make_package(temp.path(), "Q1.pbix");
    let q2 = make_package(temp.path(), "Q2.pbix");
    let q3 = make_package(temp.path(), "Q3.pbix");
    let api = FakeApi::new()
        .with_workspace("Sales", "ws-1")
        .with_workspace("Finance", "ws-2");

    let executor = DeploymentExecutor::new(&api, fast_policy(), CancellationToken::new());
    let mut cache = WorkspaceCache::new();
    for info in [
        artifact(&q1, "Q1", "Sales"),
        artifact(&q2, "Q2", "Sales"),
        artifact(&q3, "Q3", "Finance"),
    ] {
        executor.execute(&info, &mut cache).await.unwrap();
    }

    assert_eq!(api.resolve_count(), 2);
    assert_eq!(cache.lookups(), 2);
    assert_eq!(cache.get("Sales").unwrap().group.id, "ws-1");
    assert_eq!(api.uploaded_names(), ["Q1", "Q2", "Q3"]);
}

#[tokio::test]
async fn unknown_workspace_is_not_cached() {
    let temp = TempDir::new().unwrap();
    let package = make_package(temp.path(), "Q1.pbix");
    let api = FakeApi::new();

    let executor = DeploymentExecutor::new(&api, fast_policy(), CancellationToken::new());
    let mut cache = WorkspaceCache::new();
    for _ in 0..2 {
        let err = executor
            .execute(&artifact(&package, "Q1", "Nowhere"), &mut cache)
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::WorkspaceNotFound(name) if name == "Nowhere"));
    }

    assert_eq!(api.resolve_count(), 2);
    assert!(cache.is_empty());
    assert_eq!(api.post_count(), 0);
}
