// SPDX-License-Identifier: MIT OR Apache-2.0

use super::*;
use crate::resources::{DiskCreateSpec, TaskState};
use crate::testkit::MockServer;
use serde_json::json;

fn client_for(server: &MockServer) -> PhotonClient {
    let config = PhotonClientConfig::builder(server.url())
        .token("tok")
        .task_poll_delay(Duration::from_millis(5))
        .task_poll_timeout(Duration::from_secs(5))
        .logging(LoggingConfig::quiet())
        .build();
    PhotonClient::new(config).unwrap()
}

#[test]
fn test_default_config() {
    let config = PhotonClientConfig::default();
    assert_eq!(config.endpoint, "http://127.0.0.1:9000");
    assert!(config.token.is_none());
    assert!(!config.ignore_certificate);
    assert_eq!(config.task_poll_timeout, Duration::from_secs(1800));
    assert_eq!(config.task_poll_delay, Duration::from_millis(100));
    assert_eq!(config.task_retry_count, 3);
}

#[test]
fn test_builder() {
    let config = PhotonClientConfig::builder("https://10.0.0.5:9000")
        .token("abc")
        .insecure()
        .task_retry_count(5)
        .connect_timeout(Duration::from_secs(2))
        .build();

    assert_eq!(config.endpoint, "https://10.0.0.5:9000");
    assert_eq!(config.token.as_deref(), Some("abc"));
    assert!(config.ignore_certificate);
    assert_eq!(config.wait_options().max_retries, 5);
    assert_eq!(config.connect_timeout, Some(Duration::from_secs(2)));
}

#[test]
fn test_debug_redacts_token() {
    let config = PhotonClientConfig::builder("http://h:1").token("s3cret").build();
    let rendered = format!("{config:?}");
    assert!(!rendered.contains("s3cret"));
    assert!(rendered.contains("REDACTED"));
}

#[test]
fn test_invalid_endpoint() {
    let result = PhotonClient::new(PhotonClientConfig::builder("not a url").build());
    assert!(matches!(result, Err(PhotonError::Config(_))));

    let result = PhotonClient::new(PhotonClientConfig::builder("ftp://host:21").build());
    match result {
        Err(PhotonError::Config(msg)) => assert!(msg.contains("scheme")),
        other => panic!("Expected Config error, got {other:?}"),
    }
}

#[test]
fn test_zero_poll_delay_rejected() {
    let config = PhotonClientConfig::builder("http://h:1")
        .task_poll_delay(Duration::ZERO)
        .build();
    assert!(matches!(
        PhotonClient::new(config),
        Err(PhotonError::Config(_))
    ));
}

#[tokio::test]
async fn test_get_task_sends_bearer_token() {
    let server = MockServer::start().await.unwrap();
    server.respond_json(
        "GET",
        "/tasks/t-1",
        200,
        json!({
            "id": "t-1",
            "operation": "CREATE_DISK",
            "state": "STARTED",
            "entity": {"id": "disk-1", "kind": "persistent-disk"}
        }),
    );
    let client = client_for(&server);

    let task = client.tasks().get("t-1").await.unwrap();

    assert_eq!(task.state, TaskState::Started);
    assert_eq!(task.entity.id, "disk-1");
    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].header("authorization"), Some("Bearer tok"));
    assert_eq!(client.request_metrics().successful_requests(), 1);
}

#[tokio::test]
async fn test_not_found_maps_to_api_error() {
    let server = MockServer::start().await.unwrap();
    server.respond_json(
        "GET",
        "/disks/missing",
        404,
        json!({"code": "DiskNotFound", "message": "Disk #missing not found"}),
    );
    let client = client_for(&server);

    let err = client.disks().get("missing").await.unwrap_err();

    assert!(err.is_not_found());
    assert!(!err.is_transient());
    match err {
        PhotonError::Api(api) => assert_eq!(api.code, "DiskNotFound"),
        other => panic!("Expected Api error, got {other:?}"),
    }
    assert_eq!(client.request_metrics().failed_requests(), 1);
}

#[tokio::test]
async fn test_create_disk_posts_spec() {
    let server = MockServer::start().await.unwrap();
    server.respond_json(
        "POST",
        "/projects/p-1/disks",
        200,
        json!({"id": "t-2", "operation": "CREATE_DISK", "state": "QUEUED"}),
    );
    let client = client_for(&server);

    let spec = DiskCreateSpec::persistent("disk-x", "core-100", 4);
    let task = client.projects().create_disk("p-1", &spec).await.unwrap();

    assert_eq!(task.id, "t-2");
    let body = server.requests()[0].json();
    assert_eq!(body["name"], "disk-x");
    assert_eq!(body["capacityGb"], 4);
}

#[tokio::test]
async fn test_wait_until_completed() {
    let server = MockServer::start().await.unwrap();
    for state in ["QUEUED", "STARTED", "COMPLETED"] {
        server.respond_json(
            "GET",
            "/tasks/t-3",
            200,
            json!({"id": "t-3", "operation": "DELETE_VM", "state": state}),
        );
    }
    let client = client_for(&server);

    let task = client.tasks().wait("t-3").await.unwrap();

    assert_eq!(task.state, TaskState::Completed);
    assert_eq!(server.request_count("GET", "/tasks/t-3"), 3);
}

#[tokio::test]
async fn test_error_task_into_completed() {
    let server = MockServer::start().await.unwrap();
    server.respond_json(
        "GET",
        "/tasks/t-4",
        200,
        json!({
            "id": "t-4",
            "operation": "CREATE_VM",
            "state": "ERROR",
            "steps": [{
                "sequence": 0,
                "operation": "RESERVE_RESOURCE",
                "state": "ERROR",
                "errors": [{"code": "NotEnoughCpuResource", "message": "no cpu"}]
            }]
        }),
    );
    let client = client_for(&server);

    let task = client.tasks().wait("t-4").await.unwrap();
    assert_eq!(task.state, TaskState::Error);

    match task.into_completed() {
        Err(PhotonError::Task { message, .. }) => {
            assert!(message.contains("NotEnoughCpuResource"));
        }
        other => panic!("Expected Task error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_endpoint_is_transient() {
    // Bind and drop to get a port nothing listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = PhotonClientConfig::builder(format!("http://{addr}"))
        .logging(LoggingConfig::quiet())
        .build();
    let client = PhotonClient::new(config).unwrap();

    let err = client.status().await.unwrap_err();
    assert!(matches!(err, PhotonError::Transport(_)));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_request_timeout_on_stalled_route() {
    let server = MockServer::start().await.unwrap();
    server.stall("GET", "/tasks/t-hang");
    let config = PhotonClientConfig::builder(server.url())
        .request_timeout(Duration::from_millis(50))
        .task_poll_delay(Duration::from_millis(1))
        .task_retry_count(1)
        .logging(LoggingConfig::quiet())
        .build();
    let client = PhotonClient::new(config).unwrap();

    let err = client.tasks().wait("t-hang").await.unwrap_err();

    match &err {
        PhotonError::Transport(e) => assert!(e.is_timeout(), "unexpected transport error: {e}"),
        other => panic!("Expected Transport timeout, got {other:?}"),
    }
    // one tolerated timeout plus the one that exhausts the budget
    assert_eq!(server.request_count("GET", "/tasks/t-hang"), 2);
}

#[tokio::test]
async fn test_wait_deadline_on_stalled_route() {
    let server = MockServer::start().await.unwrap();
    server.stall("GET", "/tasks/t-hang");
    let config = PhotonClientConfig::builder(server.url())
        .task_poll_timeout(Duration::from_millis(200))
        .logging(LoggingConfig::quiet())
        .build();
    let client = PhotonClient::new(config).unwrap();

    let tasks = client.tasks();
    let wait = tasks.wait("t-hang");
    let result = tokio::time::timeout(Duration::from_secs(10), wait)
        .await
        .expect("wait outlived its deadline");

    assert!(matches!(
        result,
        Err(PhotonError::TaskTimeout {
            last_state: None,
            ..
        })
    ));
    assert_eq!(server.request_count("GET", "/tasks/t-hang"), 1);
}
