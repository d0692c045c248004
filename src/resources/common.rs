// SPDX-License-Identifier: MIT OR Apache-2.0

//! Records shared by several API groups.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Error document returned by the control plane for failed requests and
/// failed task steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: HashMap<String, String>,
    /// HTTP status of the response that carried this error. Zero for step
    /// errors embedded in a task.
    #[serde(default)]
    pub http_status_code: u16,
}

impl ApiError {
    #[must_use]
    pub fn new(http_status_code: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            data: HashMap::new(),
            http_status_code,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.http_status_code != 0 {
            write!(f, "HTTP {} ", self.http_status_code)?;
        }
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Paged list wrapper used by every collection endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceList<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_link: Option<String>,
}

impl<T> Default for ResourceList<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            next_page_link: None,
        }
    }
}

/// A single quota or cost entry, e.g. `{"key": "vm.memory", "value": 2, "unit": "GB"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotaLineItem {
    pub key: String,
    pub value: f64,
    pub unit: String,
}

impl QuotaLineItem {
    #[must_use]
    pub fn new(key: impl Into<String>, value: f64, unit: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value,
            unit: unit.into(),
        }
    }
}

/// Placement hint pointing at another entity (e.g. create a disk next to a VM).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalitySpec {
    pub id: String,
    pub kind: String,
}
