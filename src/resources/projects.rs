// SPDX-License-Identifier: MIT OR Apache-2.0

//! Projects API group.
//!
//! Disks, VMs and clusters are created in the scope of a project.

use serde::{Deserialize, Serialize};

use super::{
    ClusterCreateSpec, ClusterSummary, DiskCreateSpec, PersistentDisk, QuotaLineItem,
    ResourceList, Task, Vm, VmCreateSpec,
};
use crate::client::PhotonClient;
use crate::error::Result;

const PROJECT_URL: &str = "/projects";

/// Quota reserved by a project from its tenant's resource ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceTicketReservation {
    pub name: String,
    pub limits: Vec<QuotaLineItem>,
}

/// Request body for creating a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCreateSpec {
    pub name: String,
    pub resource_ticket: ResourceTicketReservation,
}

/// A project as returned by list and get calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCompact {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
}

/// Projects API group.
pub struct ProjectsApi<'a> {
    client: &'a PhotonClient,
}

impl<'a> ProjectsApi<'a> {
    pub(crate) fn new(client: &'a PhotonClient) -> Self {
        Self { client }
    }

    fn entity_url(project_id: &str) -> String {
        format!("{PROJECT_URL}/{project_id}")
    }

    /// Get a project.
    #[allow(clippy::result_large_err)]
    pub async fn get(&self, project_id: &str) -> Result<ProjectCompact> {
        self.client
            .rest()
            .get_json(&Self::entity_url(project_id))
            .await
    }

    /// Delete a project. VMs, disks and clusters it owns must be deleted first.
    #[allow(clippy::result_large_err)]
    pub async fn delete(&self, project_id: &str) -> Result<Task> {
        self.client
            .rest()
            .delete_task(&Self::entity_url(project_id))
            .await
    }

    /// Create a persistent disk in a project.
    #[allow(clippy::result_large_err)]
    pub async fn create_disk(&self, project_id: &str, spec: &DiskCreateSpec) -> Result<Task> {
        self.client
            .rest()
            .post_task(&format!("{}/disks", Self::entity_url(project_id)), spec)
            .await
    }

    /// List the disks of a project.
    #[allow(clippy::result_large_err)]
    pub async fn get_disks(&self, project_id: &str) -> Result<ResourceList<PersistentDisk>> {
        self.client
            .rest()
            .get_json(&format!("{}/disks", Self::entity_url(project_id)))
            .await
    }

    /// Create a VM in a project.
    #[allow(clippy::result_large_err)]
    pub async fn create_vm(&self, project_id: &str, spec: &VmCreateSpec) -> Result<Task> {
        self.client
            .rest()
            .post_task(&format!("{}/vms", Self::entity_url(project_id)), spec)
            .await
    }

    /// List the VMs of a project.
    #[allow(clippy::result_large_err)]
    pub async fn get_vms(&self, project_id: &str) -> Result<ResourceList<Vm>> {
        self.client
            .rest()
            .get_json(&format!("{}/vms", Self::entity_url(project_id)))
            .await
    }

    /// Create a cluster in a project.
    #[allow(clippy::result_large_err)]
    pub async fn create_cluster(&self, project_id: &str, spec: &ClusterCreateSpec) -> Result<Task> {
        self.client
            .rest()
            .post_task(&format!("{}/clusters", Self::entity_url(project_id)), spec)
            .await
    }

    /// List the clusters of a project.
    #[allow(clippy::result_large_err)]
    pub async fn get_clusters(&self, project_id: &str) -> Result<ResourceList<ClusterSummary>> {
        self.client
            .rest()
            .get_json(&format!("{}/clusters", Self::entity_url(project_id)))
            .await
    }
}
