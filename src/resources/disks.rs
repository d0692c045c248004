// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistent disks API group.
//!
//! Disks are created through [`ProjectsApi::create_disk`](super::ProjectsApi::create_disk);
//! this group reads and deletes them.

use serde::{Deserialize, Serialize};

use super::{LocalitySpec, Task};
use crate::client::PhotonClient;
use crate::error::Result;

const DISK_URL: &str = "/disks";

/// Kind string of persistent disks.
pub const PERSISTENT_DISK: &str = "persistent-disk";

/// Request body for creating a persistent disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiskCreateSpec {
    pub name: String,
    pub flavor: String,
    pub kind: String,
    pub capacity_gb: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub affinities: Vec<LocalitySpec>,
}

impl DiskCreateSpec {
    /// A persistent disk spec without placement hints.
    #[must_use]
    pub fn persistent(name: impl Into<String>, flavor: impl Into<String>, capacity_gb: u64) -> Self {
        Self {
            name: name.into(),
            flavor: flavor.into(),
            kind: PERSISTENT_DISK.to_string(),
            capacity_gb,
            affinities: Vec::new(),
        }
    }

    /// Ask the scheduler to place the disk next to a VM.
    #[must_use]
    pub fn near_vm(mut self, vm_id: impl Into<String>) -> Self {
        self.affinities.push(LocalitySpec {
            id: vm_id.into(),
            kind: "vm".to_string(),
        });
        self
    }
}

/// A persistent disk as returned by the control plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistentDisk {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub flavor: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub capacity_gb: u64,
    #[serde(default)]
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datastore: Option<String>,
    #[serde(default)]
    pub vms: Vec<String>,
}

/// Disks API group.
pub struct DisksApi<'a> {
    client: &'a PhotonClient,
}

impl<'a> DisksApi<'a> {
    pub(crate) fn new(client: &'a PhotonClient) -> Self {
        Self { client }
    }

    #[allow(clippy::result_large_err)]
    pub async fn get(&self, disk_id: &str) -> Result<PersistentDisk> {
        self.client
            .rest()
            .get_json(&format!("{DISK_URL}/{disk_id}"))
            .await
    }

    #[allow(clippy::result_large_err)]
    pub async fn delete(&self, disk_id: &str) -> Result<Task> {
        self.client
            .rest()
            .delete_task(&format!("{DISK_URL}/{disk_id}"))
            .await
    }
}
