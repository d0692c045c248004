// SPDX-License-Identifier: MIT OR Apache-2.0

//! Clusters API group.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::Task;
use crate::client::PhotonClient;
use crate::error::Result;

const CLUSTER_URL: &str = "/clusters";

/// Request body for creating a cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterCreateSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vm_flavor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_flavor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_id: Option<String>,
    pub worker_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size_worker: Option<u32>,
    #[serde(default)]
    pub extended_properties: HashMap<String, String>,
}

/// A cluster as returned by the control plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSummary {
    pub id: String,
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub worker_count: u32,
    #[serde(default)]
    pub extended_properties: HashMap<String, String>,
}

/// Clusters API group.
pub struct ClustersApi<'a> {
    client: &'a PhotonClient,
}

impl<'a> ClustersApi<'a> {
    pub(crate) fn new(client: &'a PhotonClient) -> Self {
        Self { client }
    }

    #[allow(clippy::result_large_err)]
    pub async fn get(&self, cluster_id: &str) -> Result<ClusterSummary> {
        self.client
            .rest()
            .get_json(&format!("{CLUSTER_URL}/{cluster_id}"))
            .await
    }

    #[allow(clippy::result_large_err)]
    pub async fn delete(&self, cluster_id: &str) -> Result<Task> {
        self.client
            .rest()
            .delete_task(&format!("{CLUSTER_URL}/{cluster_id}"))
            .await
    }
}
