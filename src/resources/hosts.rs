// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hosts API group.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{ResourceList, Task};
use crate::client::PhotonClient;
use crate::error::Result;

const HOST_URL: &str = "/hosts";

/// Request body for registering a host.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostCreateSpec {
    pub username: String,
    pub password: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability_zone: Option<String>,
    #[serde(default)]
    pub usage_tags: Vec<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

impl fmt::Debug for HostCreateSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostCreateSpec")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("address", &self.address)
            .field("availability_zone", &self.availability_zone)
            .field("usage_tags", &self.usage_tags)
            .finish_non_exhaustive()
    }
}

/// A host as returned by the control plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Host {
    pub id: String,
    pub address: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub usage_tags: Vec<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Hosts API group.
pub struct HostsApi<'a> {
    client: &'a PhotonClient,
}

impl<'a> HostsApi<'a> {
    pub(crate) fn new(client: &'a PhotonClient) -> Self {
        Self { client }
    }

    #[allow(clippy::result_large_err)]
    pub async fn create(&self, spec: &HostCreateSpec) -> Result<Task> {
        self.client.rest().post_task(HOST_URL, spec).await
    }

    #[allow(clippy::result_large_err)]
    pub async fn get(&self, host_id: &str) -> Result<Host> {
        self.client
            .rest()
            .get_json(&format!("{HOST_URL}/{host_id}"))
            .await
    }

    #[allow(clippy::result_large_err)]
    pub async fn get_all(&self) -> Result<ResourceList<Host>> {
        self.client.rest().get_json(HOST_URL).await
    }

    #[allow(clippy::result_large_err)]
    pub async fn delete(&self, host_id: &str) -> Result<Task> {
        self.client
            .rest()
            .delete_task(&format!("{HOST_URL}/{host_id}"))
            .await
    }
}
