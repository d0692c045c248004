// SPDX-License-Identifier: MIT OR Apache-2.0

//! Networks API group.

use serde::{Deserialize, Serialize};

use super::{ResourceList, Task};
use crate::client::PhotonClient;
use crate::error::Result;

const NETWORK_URL: &str = "/networks";

/// Request body for creating a network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkCreateSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub port_groups: Vec<String>,
}

/// A network as returned by the control plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub port_groups: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Networks API group.
pub struct NetworksApi<'a> {
    client: &'a PhotonClient,
}

impl<'a> NetworksApi<'a> {
    pub(crate) fn new(client: &'a PhotonClient) -> Self {
        Self { client }
    }

    #[allow(clippy::result_large_err)]
    pub async fn create(&self, spec: &NetworkCreateSpec) -> Result<Task> {
        self.client.rest().post_task(NETWORK_URL, spec).await
    }

    #[allow(clippy::result_large_err)]
    pub async fn get(&self, network_id: &str) -> Result<Network> {
        self.client
            .rest()
            .get_json(&format!("{NETWORK_URL}/{network_id}"))
            .await
    }

    /// List networks, optionally filtered by name.
    #[allow(clippy::result_large_err)]
    pub async fn get_all(&self, name: Option<&str>) -> Result<ResourceList<Network>> {
        let query: Vec<(&str, &str)> = name.map(|n| ("name", n)).into_iter().collect();
        self.client
            .rest()
            .get_json_with_query(NETWORK_URL, &query)
            .await
    }

    #[allow(clippy::result_large_err)]
    pub async fn delete(&self, network_id: &str) -> Result<Task> {
        self.client
            .rest()
            .delete_task(&format!("{NETWORK_URL}/{network_id}"))
            .await
    }
}
