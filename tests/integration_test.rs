// SPDX-License-Identifier: MIT OR Apache-2.0

use std::io::Write;
use std::process::Stdio;
use std::sync::Arc;

use photon_cpi_rs::config::{ENV_PHOTON_PROJECT, ENV_PHOTON_TARGET, ENV_PHOTON_TOKEN};
use photon_cpi_rs::cpi::default_registry;
use photon_cpi_rs::resources::{Task, TaskState, PERSISTENT_DISK};
use photon_cpi_rs::testkit::{LiveTarget, MockServer};
use photon_cpi_rs::{
    dispatch, ActionResponse, CpiConfig, CpiContext, ErrorKind, PhotonClient, PhotonClientConfig,
};
use serde_json::json;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

fn write_config(server: &MockServer) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    let config = json!({
        "photon": {
            "target": server.url(),
            "project": "p-1",
            "disk_flavor": "core-100",
            "vm_flavor": "core-200",
            "task_poll_delay_ms": 1
        }
    });
    file.write_all(config.to_string().as_bytes()).unwrap();
    file
}

/// Run the CPI binary with `request` on stdin and decode its envelope.
async fn run_cpi(config_path: &std::path::Path, request: &str) -> ActionResponse {
    let mut child = Command::new(env!("CARGO_BIN_EXE_photon-cpi"))
        .arg("--config-path")
        .arg(config_path)
        .env_remove(ENV_PHOTON_TARGET)
        .env_remove(ENV_PHOTON_TOKEN)
        .env_remove(ENV_PHOTON_PROJECT)
        .env("RUST_LOG", "off")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn photon-cpi");

    let mut stdin = child.stdin.take().unwrap();
    stdin.write_all(request.as_bytes()).await.unwrap();
    drop(stdin);

    let output = child.wait_with_output().await.unwrap();
    assert!(output.status.success(), "photon-cpi exited with {}", output.status);

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.trim().lines().count(), 1, "expected one envelope: {stdout}");
    serde_json::from_str(stdout.trim()).unwrap()
}

#[tokio::test]
async fn test_binary_create_disk() {
    let server = MockServer::start().await.unwrap();
    server.respond_task(
        "POST",
        "/projects/p-1/disks",
        &Task::new("t-1", "CREATE_DISK", TaskState::Queued),
    );
    server.respond_task(
        "GET",
        "/tasks/t-1",
        &Task::new("t-1", "CREATE_DISK", TaskState::Completed).with_entity("disk-1", PERSISTENT_DISK),
    );
    let config = write_config(&server);

    let response = run_cpi(
        config.path(),
        r#"{"method": "create_disk", "arguments": [2048, {}, null], "context": {"director_uuid": "d-1"}}"#,
    )
    .await;

    assert_eq!(response.result, Some(json!("disk-1")));
    assert!(response.error.is_none());
    assert_eq!(server.request_count("POST", "/projects/p-1/disks"), 1);
}

#[tokio::test]
async fn test_binary_unknown_method() {
    let server = MockServer::start().await.unwrap();
    let config = write_config(&server);

    let response = run_cpi(
        config.path(),
        r#"{"method": "create_stemcell", "arguments": ["/tmp/image", {}]}"#,
    )
    .await;

    let error = response.error.unwrap();
    assert_eq!(error.kind, ErrorKind::NotImplementedError);
    assert_eq!(error.message, "create_stemcell not implemented");
    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn test_binary_malformed_request() {
    let server = MockServer::start().await.unwrap();
    let config = write_config(&server);

    let response = run_cpi(config.path(), "{\"method\": ").await;

    let error = response.error.unwrap();
    assert_eq!(error.kind, ErrorKind::CloudError);
    assert!(!error.ok_to_retry);
}

#[tokio::test]
async fn test_binary_missing_config() {
    let dir = tempfile::tempdir().unwrap();

    let response = run_cpi(&dir.path().join("absent.json"), r#"{"method": "info"}"#).await;

    let error = response.error.unwrap();
    assert_eq!(error.kind, ErrorKind::CloudError);
    assert!(error.message.contains("Failed to read config file"));
}

#[tokio::test]
async fn test_vm_disk_lifecycle() {
    let server = MockServer::start().await.unwrap();
    let done = |id: &str, op: &str| Task::new(id, op, TaskState::Completed);

    server.respond_task(
        "POST",
        "/projects/p-1/vms",
        &Task::new("t-vm", "CREATE_VM", TaskState::Queued),
    );
    server.respond_task("GET", "/tasks/t-vm", &done("t-vm", "CREATE_VM").with_entity("vm-1", "vm"));
    server.respond_task("POST", "/vms/vm-1/attach_disk", &done("t-at", "ATTACH_DISK"));
    server.respond_json(
        "GET",
        "/vms/vm-1",
        200,
        json!({
            "id": "vm-1",
            "name": "vm-agent-1",
            "attachedDisks": [{"id": "disk-1", "name": "disk-1", "kind": "persistent-disk"}]
        }),
    );
    server.respond_task("POST", "/vms/vm-1/detach_disk", &done("t-dt", "DETACH_DISK"));
    server.respond_task("DELETE", "/vms/vm-1", &done("t-del", "DELETE_VM"));

    let config = CpiConfig::load_from_path(write_config(&server).path()).unwrap();
    let ctx = Arc::new(CpiContext::new(config).unwrap());
    let registry = default_registry();

    let created = dispatch(
        ctx.clone(),
        &registry,
        "create_vm",
        &[
            json!("agent-1"),
            json!("stemcell-1"),
            json!({}),
            json!({"default": {"type": "dynamic"}}),
            json!([]),
            json!({}),
        ],
    )
    .await;
    assert_eq!(created.result, Some(json!("vm-1")));

    let spec = server
        .requests()
        .into_iter()
        .find(|r| r.method == "POST" && r.path == "/projects/p-1/vms")
        .unwrap()
        .json();
    assert_eq!(spec["sourceImageId"], "stemcell-1");
    assert_eq!(spec["flavor"], "core-200");
    assert_eq!(spec["environment"]["bosh_agent_id"], "agent-1");

    for (method, args) in [
        ("attach_disk", vec![json!("vm-1"), json!("disk-1")]),
        ("detach_disk", vec![json!("vm-1"), json!("disk-1")]),
        ("delete_vm", vec![json!("vm-1")]),
    ] {
        let response = dispatch(ctx.clone(), &registry, method, &args).await;
        assert!(response.is_success(), "{method} failed: {:?}", response.error);
    }

    let disks = dispatch(ctx.clone(), &registry, "get_disks", &[json!("vm-1")]).await;
    assert_eq!(disks.result, Some(json!(["disk-1"])));
    assert_eq!(server.request_count("GET", "/tasks/t-vm"), 1);
}

#[tokio::test]
async fn test_live_disk_lifecycle() {
    let Some(target) = LiveTarget::from_env() else {
        return;
    };

    let mut builder = PhotonClientConfig::builder(&target.endpoint).insecure();
    if let Some(token) = &target.token {
        builder = builder.token(token);
    }
    let client = PhotonClient::new(builder.build()).unwrap();

    let status = tokio_test::assert_ok!(client.status().await);
    println!("Controller status: {}", status.status);

    let flavors = client.flavors().get_all(None, Some(PERSISTENT_DISK)).await.unwrap();
    let Some(flavor) = flavors.items.first() else {
        println!("No persistent disk flavor on {}, skipping", target.endpoint);
        return;
    };

    let spec = photon_cpi_rs::resources::DiskCreateSpec::persistent(
        "photon-cpi-rs-live",
        &flavor.name,
        1,
    );
    let task = client.projects().create_disk(&target.project, &spec).await.unwrap();
    let task = client.tasks().wait(&task.id).await.unwrap().into_completed().unwrap();
    let disk_id = task.entity.id.clone();
    println!("Created disk {disk_id}");

    assert_eq!(client.disks().get(&disk_id).await.unwrap().id, disk_id);

    let task = client.disks().delete(&disk_id).await.unwrap();
    client.tasks().wait(&task.id).await.unwrap().into_completed().unwrap();
    assert!(client.disks().get(&disk_id).await.unwrap_err().is_not_found());
}
