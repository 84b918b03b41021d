//! Image build tests

use tokio_test::{assert_err, assert_ok};

use mycitool::deploy::builder::{build, BUILD_DESCRIPTOR};
use mycitool::errors::{DeployError, RuntimeError};
use mycitool::filesys::dir::Dir;
use mycitool::models::deployment::{ContainerStatus, WorkingCopy};

use crate::support::{Call, FakeRuntime};

async fn working_copy(with_descriptor: bool) -> (Dir, WorkingCopy) {
    let root = Dir::create_temp_dir("mycitool-build").await.unwrap();
    root.file("app.py").write_string("print('hello')\n").await.unwrap();
    if with_descriptor {
        root.file(BUILD_DESCRIPTOR)
            .write_string("FROM python:3.12-slim\n")
            .await
            .unwrap();
    }
    let copy = WorkingCopy::new(root.path(), "main");
    (root, copy)
}

#[tokio::test]
async fn test_build_tags_image() {
    let (root, copy) = working_copy(true).await;
    let runtime = FakeRuntime::new(ContainerStatus::Running);

    let image = assert_ok!(build(&runtime, copy, "svc:v1").await);

    assert_eq!(image.tag, "svc:v1");
    assert_eq!(image.short_id(), "sha256:4e5f6a7b8c");
    assert_eq!(runtime.calls(), vec![Call::Build("svc:v1".to_string())]);

    root.delete().await.unwrap();
}

#[tokio::test]
async fn test_build_missing_descriptor() {
    let (root, copy) = working_copy(false).await;
    let runtime = FakeRuntime::running();

    let err = assert_err!(build(&runtime, copy, "svc").await);

    match err {
        DeployError::MissingBuildDescriptor { path, descriptor } => {
            assert_eq!(path, root.path());
            assert_eq!(descriptor, "Dockerfile");
        }
        other => panic!("expected a missing descriptor error, got {other:?}"),
    }
    assert!(!runtime.built());

    root.delete().await.unwrap();
}

#[tokio::test]
async fn test_build_descriptor_is_directory() {
    let (root, copy) = working_copy(false).await;
    root.subdir(BUILD_DESCRIPTOR).create().await.unwrap();
    let runtime = FakeRuntime::running();

    let err = assert_err!(build(&runtime, copy, "svc").await);

    assert!(matches!(err, DeployError::MissingBuildDescriptor { .. }));
    assert!(!runtime.built());

    root.delete().await.unwrap();
}

#[tokio::test]
async fn test_build_blank_identity() {
    let (root, copy) = working_copy(true).await;
    let runtime = FakeRuntime::running();

    let err = assert_err!(build(&runtime, copy, "  ").await);

    assert!(matches!(err, DeployError::InvalidBuildInput(_)));
    assert_eq!(err.stage(), "build");
    assert!(!runtime.built());

    root.delete().await.unwrap();
}

#[tokio::test]
async fn test_build_missing_descriptor_checked_first() {
    let (root, copy) = working_copy(false).await;
    let runtime = FakeRuntime::running();

    let err = assert_err!(build(&runtime, copy, "").await);
    assert!(matches!(err, DeployError::MissingBuildDescriptor { .. }));

    root.delete().await.unwrap();
}

#[tokio::test]
async fn test_build_step_failure() {
    let (root, copy) = working_copy(true).await;
    let runtime = FakeRuntime::running().fail_build(RuntimeError::BuildFailed(
        "The command '/bin/sh -c pip install -r requirements.txt' returned a non-zero code: 1"
            .to_string(),
    ));

    let err = assert_err!(build(&runtime, copy, "svc").await);

    match err {
        DeployError::BuildExecution { tag, message } => {
            assert_eq!(tag, "svc");
            assert!(message.contains("non-zero code"));
        }
        other => panic!("expected a build execution error, got {other:?}"),
    }

    root.delete().await.unwrap();
}

#[tokio::test]
async fn test_build_engine_down() {
    let (root, copy) = working_copy(true).await;
    let runtime = FakeRuntime::running().fail_build(RuntimeError::Unavailable(
        "Cannot connect to the Docker daemon at unix:///var/run/docker.sock".to_string(),
    ));

    let err = assert_err!(build(&runtime, copy, "svc").await);
    assert!(matches!(err, DeployError::BuildEngineUnavailable(_)));

    root.delete().await.unwrap();
}
