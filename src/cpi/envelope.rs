// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire format of CPI requests and responses.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ActionError;

/// Error class reported to the director.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    #[serde(rename = "Bosh::Clouds::CloudError")]
    CloudError,
    #[serde(rename = "Bosh::Clouds::NotImplemented")]
    NotImplementedError,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    pub message: String,
    pub ok_to_retry: bool,
}

/// One request read from stdin. Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub method: String,
    #[serde(default)]
    pub arguments: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

/// The envelope written to stdout. Exactly one of `result` and `error` is
/// meaningful; both are always serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResponse {
    pub result: Option<Value>,
    pub error: Option<ErrorEnvelope>,
    #[serde(default)]
    pub log: Vec<String>,
}

impl ActionResponse {
    #[must_use]
    pub fn success(result: Value) -> Self {
        Self {
            result: Some(result),
            error: None,
            log: Vec::new(),
        }
    }

    #[must_use]
    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            result: None,
            error: Some(ErrorEnvelope {
                kind,
                message: message.into(),
                ok_to_retry: false,
            }),
            log: Vec::new(),
        }
    }

    #[must_use]
    pub fn from_error(err: &ActionError) -> Self {
        Self::failure(err.kind(), err.to_string())
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}
