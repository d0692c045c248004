// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tenants API group.

use serde::{Deserialize, Serialize};

use super::{ProjectCompact, ProjectCreateSpec, QuotaLineItem, ResourceList, Task};
use crate::client::PhotonClient;
use crate::error::Result;

const TENANT_URL: &str = "/tenants";

/// Request body for creating a tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantCreateSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security_groups: Vec<String>,
}

impl TenantCreateSpec {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            security_groups: Vec::new(),
        }
    }
}

/// A tenant as returned by the control plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
}

/// Request body for creating a resource ticket under a tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceTicketCreateSpec {
    pub name: String,
    pub limits: Vec<QuotaLineItem>,
}

/// Tenants API group.
pub struct TenantsApi<'a> {
    client: &'a PhotonClient,
}

impl<'a> TenantsApi<'a> {
    pub(crate) fn new(client: &'a PhotonClient) -> Self {
        Self { client }
    }

    /// Create a tenant.
    #[allow(clippy::result_large_err)]
    pub async fn create(&self, spec: &TenantCreateSpec) -> Result<Task> {
        self.client.rest().post_task(TENANT_URL, spec).await
    }

    /// List all tenants.
    #[allow(clippy::result_large_err)]
    pub async fn get_all(&self) -> Result<ResourceList<Tenant>> {
        self.client.rest().get_json(TENANT_URL).await
    }

    /// Delete a tenant. Its projects must be deleted first.
    #[allow(clippy::result_large_err)]
    pub async fn delete(&self, tenant_id: &str) -> Result<Task> {
        self.client
            .rest()
            .delete_task(&format!("{TENANT_URL}/{tenant_id}"))
            .await
    }

    /// Create a resource ticket that projects of this tenant can reserve from.
    #[allow(clippy::result_large_err)]
    pub async fn create_resource_ticket(
        &self,
        tenant_id: &str,
        spec: &ResourceTicketCreateSpec,
    ) -> Result<Task> {
        self.client
            .rest()
            .post_task(&format!("{TENANT_URL}/{tenant_id}/resource-tickets"), spec)
            .await
    }

    /// Create a project under a tenant.
    #[allow(clippy::result_large_err)]
    pub async fn create_project(&self, tenant_id: &str, spec: &ProjectCreateSpec) -> Result<Task> {
        self.client
            .rest()
            .post_task(&format!("{TENANT_URL}/{tenant_id}/projects"), spec)
            .await
    }

    /// List the projects of a tenant.
    #[allow(clippy::result_large_err)]
    pub async fn get_projects(&self, tenant_id: &str) -> Result<ResourceList<ProjectCompact>> {
        self.client
            .rest()
            .get_json(&format!("{TENANT_URL}/{tenant_id}/projects"))
            .await
    }
}
