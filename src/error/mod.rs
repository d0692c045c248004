// SPDX-License-Identifier: MIT OR Apache-2.0

use thiserror::Error;

use crate::resources::{ApiError, TaskState};

#[allow(clippy::result_large_err)]
#[derive(Debug, Error)]
pub enum PhotonError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("API request failed: {0}")]
    Api(ApiError),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Task {task_id} ({operation}) failed: {message}")]
    Task {
        task_id: String,
        operation: String,
        message: String,
    },

    #[error("Timed out waiting for task {task_id} (last state: {})", state_label(last_state))]
    TaskTimeout {
        task_id: String,
        last_state: Option<TaskState>,
    },

    #[error("Cancelled waiting for task {task_id} (last state: {})", state_label(last_state))]
    TaskCancelled {
        task_id: String,
        last_state: Option<TaskState>,
    },

    #[error("Validation error: {0}")]
    Validation(String),
}

impl PhotonError {
    /// Returns `true` for failures that say nothing about the remote resource
    /// itself (the request never got an answer), so polling may try again.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, PhotonError::Transport(_) | PhotonError::Connection(_))
    }

    /// HTTP status reported by the control plane, if this is an API error.
    #[must_use]
    pub fn http_status(&self) -> Option<u16> {
        match self {
            PhotonError::Api(err) => Some(err.http_status_code),
            _ => None,
        }
    }

    /// Returns `true` if the control plane answered 404 for the request.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.http_status() == Some(404)
    }
}

fn state_label(state: &Option<TaskState>) -> String {
    state.map_or_else(|| "never observed".to_string(), |s| s.to_string())
}

pub type Result<T> = std::result::Result<T, PhotonError>;
