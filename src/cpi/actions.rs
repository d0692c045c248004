// SPDX-License-Identifier: MIT OR Apache-2.0

//! CPI actions backed by the controller SDK.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use super::{ActionError, ActionRegistry, CpiContext};
use crate::error::PhotonError;
use crate::resources::{
    AttachedDisk, DiskCreateSpec, LocalitySpec, VmCreateSpec, VmDiskOperation, PERSISTENT_DISK,
};

/// `cloud_properties` of `create_disk`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiskCloudProperties {
    pub flavor: Option<String>,
}

/// `cloud_properties` of `create_vm`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VmCloudProperties {
    pub vm_flavor: Option<String>,
    pub disk_flavor: Option<String>,
}

/// Registry holding every action this CPI implements.
#[must_use]
pub fn default_registry() -> ActionRegistry<CpiContext> {
    let mut registry = ActionRegistry::new();
    registry
        .register("info", &[], info)
        .register(
            "create_disk",
            &["size", "cloud_properties", "vm_cid"],
            create_disk,
        )
        .register("delete_disk", &["disk_cid"], delete_disk)
        .register("has_disk", &["disk_cid"], has_disk)
        .register("get_disks", &["vm_cid"], get_disks)
        .register(
            "create_vm",
            &[
                "agent_id",
                "stemcell_cid",
                "cloud_properties",
                "networks",
                "disk_cids",
                "env",
            ],
            create_vm,
        )
        .register("delete_vm", &["vm_cid"], delete_vm)
        .register("has_vm", &["vm_cid"], has_vm)
        .register("attach_disk", &["vm_cid", "disk_cid"], attach_disk)
        .register("detach_disk", &["vm_cid", "disk_cid"], detach_disk);
    registry
}

fn required_flavor(
    explicit: Option<String>,
    fallback: Option<&String>,
    what: &str,
) -> Result<String, ActionError> {
    explicit
        .or_else(|| fallback.cloned())
        .filter(|f| !f.is_empty())
        .ok_or_else(|| PhotonError::Validation(format!("No {what} flavor configured")).into())
}

async fn info(_ctx: Arc<CpiContext>, (): ()) -> Result<Value, ActionError> {
    Ok(json!({ "stemcell_formats": ["vsphere-ova", "vsphere-ovf"] }))
}

async fn create_disk(
    ctx: Arc<CpiContext>,
    (size_mb, cloud_properties, vm_cid): (u64, Option<DiskCloudProperties>, Option<String>),
) -> Result<String, ActionError> {
    let project = ctx.project()?;
    let flavor = required_flavor(
        cloud_properties.unwrap_or_default().flavor,
        ctx.config.photon.disk_flavor.as_ref(),
        "disk",
    )?;
    let capacity_gb = size_mb.div_ceil(1024).max(1);

    let name = format!("disk-{:016x}", rand::random::<u64>());
    let mut spec = DiskCreateSpec::persistent(name, flavor, capacity_gb);
    if let Some(vm_cid) = vm_cid.filter(|id| !id.is_empty()) {
        spec = spec.near_vm(vm_cid);
    }

    let task = ctx.client.projects().create_disk(project, &spec).await?;
    let task = ctx.complete(task).await?;
    info!(disk_cid = %task.entity.id, capacity_gb, "Created disk");
    Ok(task.entity.id)
}

async fn delete_disk(
    ctx: Arc<CpiContext>,
    (disk_cid,): (String,),
) -> Result<(), ActionError> {
    match ctx.client.disks().delete(&disk_cid).await {
        Ok(task) => {
            ctx.complete(task).await?;
            Ok(())
        }
        Err(e) if e.is_not_found() => {
            warn!(disk_cid, "Disk already gone");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

async fn has_disk(ctx: Arc<CpiContext>, (disk_cid,): (String,)) -> Result<bool, ActionError> {
    match ctx.client.disks().get(&disk_cid).await {
        Ok(_) => Ok(true),
        Err(e) if e.is_not_found() => Ok(false),
        Err(e) => Err(e.into()),
    }
}

async fn get_disks(ctx: Arc<CpiContext>, (vm_cid,): (String,)) -> Result<Vec<String>, ActionError> {
    let vm = ctx.client.vms().get(&vm_cid).await?;
    Ok(vm
        .attached_disks
        .into_iter()
        .filter(|disk| disk.kind == PERSISTENT_DISK)
        .filter_map(|disk| disk.id)
        .collect())
}

async fn create_vm(
    ctx: Arc<CpiContext>,
    (agent_id, stemcell_cid, cloud_properties, networks, disk_cids, env): (
        String,
        String,
        Option<VmCloudProperties>,
        Value,
        Option<Vec<String>>,
        Option<Value>,
    ),
) -> Result<String, ActionError> {
    let project = ctx.project()?;
    let cloud_properties = cloud_properties.unwrap_or_default();
    let vm_flavor = required_flavor(
        cloud_properties.vm_flavor,
        ctx.config.photon.vm_flavor.as_ref(),
        "VM",
    )?;
    let disk_flavor = required_flavor(
        cloud_properties.disk_flavor,
        ctx.config.photon.disk_flavor.as_ref(),
        "disk",
    )?;
    let disk_cids = disk_cids.unwrap_or_default();

    let settings = json!({
        "agent_id": agent_id,
        "networks": networks,
        "env": env.unwrap_or(Value::Null),
        "disks": { "persistent": disk_cids },
        "agent": ctx.config.agent.clone().unwrap_or(Value::Null),
    });
    let environment = HashMap::from([
        ("bosh_agent_id".to_string(), agent_id.clone()),
        ("bosh_agent_settings".to_string(), settings.to_string()),
    ]);

    let spec = VmCreateSpec {
        name: format!("vm-{agent_id}"),
        flavor: vm_flavor,
        source_image_id: stemcell_cid,
        attached_disks: vec![AttachedDisk::boot(disk_flavor)],
        affinities: disk_cids
            .iter()
            .map(|id| LocalitySpec {
                id: id.clone(),
                kind: "disk".to_string(),
            })
            .collect(),
        environment,
    };

    let task = ctx.client.projects().create_vm(project, &spec).await?;
    let task = ctx.complete(task).await?;
    info!(vm_cid = %task.entity.id, agent_id, "Created VM");
    Ok(task.entity.id)
}

async fn delete_vm(ctx: Arc<CpiContext>, (vm_cid,): (String,)) -> Result<(), ActionError> {
    match ctx.client.vms().delete(&vm_cid).await {
        Ok(task) => {
            ctx.complete(task).await?;
            Ok(())
        }
        Err(e) if e.is_not_found() => {
            warn!(vm_cid, "VM already gone");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

async fn has_vm(ctx: Arc<CpiContext>, (vm_cid,): (String,)) -> Result<bool, ActionError> {
    match ctx.client.vms().get(&vm_cid).await {
        Ok(_) => Ok(true),
        Err(e) if e.is_not_found() => Ok(false),
        Err(e) => Err(e.into()),
    }
}

async fn attach_disk(
    ctx: Arc<CpiContext>,
    (vm_cid, disk_cid): (String, String),
) -> Result<(), ActionError> {
    let task = ctx
        .client
        .vms()
        .attach_disk(&vm_cid, &VmDiskOperation::new(&disk_cid))
        .await?;
    ctx.complete(task).await?;
    info!(vm_cid, disk_cid, "Attached disk");
    Ok(())
}

async fn detach_disk(
    ctx: Arc<CpiContext>,
    (vm_cid, disk_cid): (String, String),
) -> Result<(), ActionError> {
    let task = ctx
        .client
        .vms()
        .detach_disk(&vm_cid, &VmDiskOperation::new(&disk_cid))
        .await?;
    ctx.complete(task).await?;
    info!(vm_cid, disk_cid, "Detached disk");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CpiConfig;
    use crate::cpi::{dispatch, ErrorKind};
    use crate::resources::{Task, TaskState};
    use crate::testkit::MockServer;

    fn context(server: &MockServer) -> Arc<CpiContext> {
        let config = CpiConfig::from_yaml(&format!(
            r#"{{"photon": {{"target": "{}", "project": "p-1", "disk_flavor": "core-100",
                "vm_flavor": "core-200", "task_poll_delay_ms": 1}}}}"#,
            server.url()
        ))
        .unwrap();
        Arc::new(CpiContext::new(config).unwrap())
    }

    #[test]
    fn test_default_registry_names() {
        let registry = default_registry();
        assert_eq!(
            registry.names(),
            vec![
                "attach_disk",
                "create_disk",
                "create_vm",
                "delete_disk",
                "delete_vm",
                "detach_disk",
                "get_disks",
                "has_disk",
                "has_vm",
                "info",
            ]
        );
        assert_eq!(registry.expected_arity("create_vm"), Some(6));
    }

    #[tokio::test]
    async fn test_create_disk_waits_for_task() {
        let server = MockServer::start().await.unwrap();
        server.respond_task(
            "POST",
            "/projects/p-1/disks",
            &Task::new("t-1", "CREATE_DISK", TaskState::Queued),
        );
        server.respond_task(
            "GET",
            "/tasks/t-1",
            &Task::new("t-1", "CREATE_DISK", TaskState::Started),
        );
        server.respond_task(
            "GET",
            "/tasks/t-1",
            &Task::new("t-1", "CREATE_DISK", TaskState::Completed)
                .with_entity("disk-1", PERSISTENT_DISK),
        );

        let response = dispatch(
            context(&server),
            &default_registry(),
            "create_disk",
            &[json!(1500), json!({}), json!("vm-1")],
        )
        .await;

        assert_eq!(response.result, Some(json!("disk-1")));
        let post = server
            .requests()
            .into_iter()
            .find(|r| r.method == "POST")
            .unwrap();
        let body = post.json();
        assert_eq!(body["capacityGb"], 2);
        assert_eq!(body["flavor"], "core-100");
        assert_eq!(body["affinities"][0]["id"], "vm-1");
    }

    #[tokio::test]
    async fn test_failed_task_is_cloud_error() {
        let server = MockServer::start().await.unwrap();
        server.respond_task(
            "POST",
            "/vms/vm-1/attach_disk",
            &Task::new("t-2", "ATTACH_DISK", TaskState::Queued),
        );
        server.respond_json(
            "GET",
            "/tasks/t-2",
            200,
            json!({
                "id": "t-2",
                "operation": "ATTACH_DISK",
                "state": "ERROR",
                "steps": [{"operation": "ATTACH_DISK", "state": "ERROR",
                           "errors": [{"code": "DiskNotFound", "message": "disk-9"}]}]
            }),
        );

        let response = dispatch(
            context(&server),
            &default_registry(),
            "attach_disk",
            &[json!("vm-1"), json!("disk-9")],
        )
        .await;

        let error = response.error.unwrap();
        assert_eq!(error.kind, ErrorKind::CloudError);
        assert!(error.message.contains("DiskNotFound"));
    }

    #[tokio::test]
    async fn test_has_vm_and_has_disk() {
        let server = MockServer::start().await.unwrap();
        server.respond_json(
            "GET",
            "/vms/vm-1",
            200,
            json!({"id": "vm-1", "name": "vm-agent", "attachedDisks": []}),
        );
        let ctx = context(&server);
        let registry = default_registry();

        let present = dispatch(ctx.clone(), &registry, "has_vm", &[json!("vm-1")]).await;
        assert_eq!(present.result, Some(json!(true)));

        // unrouted paths answer 404
        let missing = dispatch(ctx, &registry, "has_disk", &[json!("disk-9")]).await;
        assert_eq!(missing.result, Some(json!(false)));
    }

    #[tokio::test]
    async fn test_get_disks_lists_persistent_only() {
        let server = MockServer::start().await.unwrap();
        server.respond_json(
            "GET",
            "/vms/vm-1",
            200,
            json!({
                "id": "vm-1",
                "name": "vm-agent",
                "attachedDisks": [
                    {"id": "boot", "name": "boot-disk", "kind": "ephemeral-disk", "bootDisk": true},
                    {"id": "disk-1", "name": "disk-1", "kind": "persistent-disk"}
                ]
            }),
        );

        let response = dispatch(
            context(&server),
            &default_registry(),
            "get_disks",
            &[json!("vm-1")],
        )
        .await;

        assert_eq!(response.result, Some(json!(["disk-1"])));
    }

    #[tokio::test]
    async fn test_delete_missing_vm_succeeds() {
        let server = MockServer::start().await.unwrap();

        let response = dispatch(
            context(&server),
            &default_registry(),
            "delete_vm",
            &[json!("vm-gone")],
        )
        .await;

        assert!(response.is_success());
        assert_eq!(response.result, Some(Value::Null));
        assert_eq!(server.request_count("DELETE", "/vms/vm-gone"), 1);
    }

    #[tokio::test]
    async fn test_missing_flavor_is_reported() {
        let server = MockServer::start().await.unwrap();
        let config = CpiConfig::from_yaml(&format!(
            r#"{{"photon": {{"target": "{}", "project": "p-1"}}}}"#,
            server.url()
        ))
        .unwrap();
        let ctx = Arc::new(CpiContext::new(config).unwrap());

        let response = dispatch(ctx, &default_registry(), "create_disk", &[json!(1024)]).await;

        let error = response.error.unwrap();
        assert!(error.message.contains("No disk flavor configured"));
        assert!(server.requests().is_empty());
    }
}
