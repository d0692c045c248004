// SPDX-License-Identifier: MIT OR Apache-2.0

//! Flavors API group.

use serde::{Deserialize, Serialize};

use super::{QuotaLineItem, ResourceList, Task};
use crate::client::PhotonClient;
use crate::error::Result;

const FLAVOR_URL: &str = "/flavors";

/// Request body for creating a flavor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlavorCreateSpec {
    pub cost: Vec<QuotaLineItem>,
    /// `vm`, `ephemeral-disk` or `persistent-disk`.
    pub kind: String,
    pub name: String,
}

/// A flavor as returned by the control plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flavor {
    pub id: String,
    pub name: String,
    pub kind: String,
    #[serde(default)]
    pub cost: Vec<QuotaLineItem>,
    #[serde(default)]
    pub state: String,
}

/// Flavors API group.
pub struct FlavorsApi<'a> {
    client: &'a PhotonClient,
}

impl<'a> FlavorsApi<'a> {
    pub(crate) fn new(client: &'a PhotonClient) -> Self {
        Self { client }
    }

    #[allow(clippy::result_large_err)]
    pub async fn create(&self, spec: &FlavorCreateSpec) -> Result<Task> {
        self.client.rest().post_task(FLAVOR_URL, spec).await
    }

    #[allow(clippy::result_large_err)]
    pub async fn get(&self, flavor_id: &str) -> Result<Flavor> {
        self.client
            .rest()
            .get_json(&format!("{FLAVOR_URL}/{flavor_id}"))
            .await
    }

    /// List flavors, optionally filtered by name and kind.
    #[allow(clippy::result_large_err)]
    pub async fn get_all(
        &self,
        name: Option<&str>,
        kind: Option<&str>,
    ) -> Result<ResourceList<Flavor>> {
        let query: Vec<(&str, &str)> = [("name", name), ("kind", kind)]
            .into_iter()
            .filter_map(|(key, value)| value.map(|v| (key, v)))
            .collect();
        self.client
            .rest()
            .get_json_with_query(FLAVOR_URL, &query)
            .await
    }

    #[allow(clippy::result_large_err)]
    pub async fn delete(&self, flavor_id: &str) -> Result<Task> {
        self.client
            .rest()
            .delete_task(&format!("{FLAVOR_URL}/{flavor_id}"))
            .await
    }
}
