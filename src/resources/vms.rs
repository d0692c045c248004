// SPDX-License-Identifier: MIT OR Apache-2.0

//! VMs API group.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{LocalitySpec, Task};
use crate::client::PhotonClient;
use crate::error::Result;

const VM_URL: &str = "/vms";

/// Disk attached to a VM at creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachedDisk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub kind: String,
    #[serde(default)]
    pub flavor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity_gb: Option<u64>,
    #[serde(default)]
    pub boot_disk: bool,
}

impl AttachedDisk {
    /// The ephemeral boot disk of a VM.
    #[must_use]
    pub fn boot(flavor: impl Into<String>) -> Self {
        Self {
            id: None,
            name: "boot-disk".to_string(),
            kind: "ephemeral-disk".to_string(),
            flavor: flavor.into(),
            capacity_gb: None,
            boot_disk: true,
        }
    }
}

/// Request body for creating a VM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmCreateSpec {
    pub name: String,
    pub flavor: String,
    pub source_image_id: String,
    pub attached_disks: Vec<AttachedDisk>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub affinities: Vec<LocalitySpec>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub environment: HashMap<String, String>,
}

/// A VM as returned by the control plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vm {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub flavor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_image_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datastore: Option<String>,
    #[serde(default)]
    pub attached_disks: Vec<AttachedDisk>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Body of the attach/detach disk operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmDiskOperation {
    pub disk_id: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub arguments: HashMap<String, String>,
}

impl VmDiskOperation {
    #[must_use]
    pub fn new(disk_id: impl Into<String>) -> Self {
        Self {
            disk_id: disk_id.into(),
            arguments: HashMap::new(),
        }
    }
}

/// VMs API group.
pub struct VmsApi<'a> {
    client: &'a PhotonClient,
}

impl<'a> VmsApi<'a> {
    pub(crate) fn new(client: &'a PhotonClient) -> Self {
        Self { client }
    }

    fn entity_url(vm_id: &str) -> String {
        format!("{VM_URL}/{vm_id}")
    }

    #[allow(clippy::result_large_err)]
    pub async fn get(&self, vm_id: &str) -> Result<Vm> {
        self.client.rest().get_json(&Self::entity_url(vm_id)).await
    }

    #[allow(clippy::result_large_err)]
    pub async fn delete(&self, vm_id: &str) -> Result<Task> {
        self.client.rest().delete_task(&Self::entity_url(vm_id)).await
    }

    /// Attach a persistent disk to a VM.
    #[allow(clippy::result_large_err)]
    pub async fn attach_disk(&self, vm_id: &str, operation: &VmDiskOperation) -> Result<Task> {
        self.client
            .rest()
            .post_task(&format!("{}/attach_disk", Self::entity_url(vm_id)), operation)
            .await
    }

    /// Detach a persistent disk from a VM.
    #[allow(clippy::result_large_err)]
    pub async fn detach_disk(&self, vm_id: &str, operation: &VmDiskOperation) -> Result<Task> {
        self.client
            .rest()
            .post_task(&format!("{}/detach_disk", Self::entity_url(vm_id)), operation)
            .await
    }
}
