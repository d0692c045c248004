// SPDX-License-Identifier: MIT OR Apache-2.0

use thiserror::Error;

use super::ErrorKind;
use crate::error::PhotonError;

/// Failure of a single CPI action, rendered into an error envelope.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("{0} not implemented")]
    NotImplemented(String),

    #[error("{param} has unexpected type")]
    UnexpectedType { param: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Error returned by a handler, already rendered.
    #[error("{0}")]
    Handler(String),

    #[error("Handler panicked: {0}")]
    Panic(String),

    #[error("Failed to serialize result: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Photon(#[from] PhotonError),
}

impl ActionError {
    /// Error class reported to the director.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            ActionError::NotImplemented(_) => ErrorKind::NotImplementedError,
            _ => ErrorKind::CloudError,
        }
    }
}
