// SPDX-License-Identifier: MIT OR Apache-2.0

//! Task records and the tasks API.
//!
//! Every mutating call on the control plane is accepted immediately and
//! answered with a [`Task`]. The task is then polled through [`TasksApi`]
//! until it reaches [`TaskState::Completed`] or [`TaskState::Error`].

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::ApiError;
use crate::client::PhotonClient;
use crate::error::{PhotonError, Result};
use crate::runtime::{TaskStore, TaskTracker, WaitOptions};

/// Lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    /// Accepted, not picked up yet.
    Queued,
    /// Executing on the control plane.
    Started,
    /// Finished successfully.
    Completed,
    /// Finished with an error; see the step errors.
    Error,
}

impl TaskState {
    /// Terminal states never transition again.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Error)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskState::Queued => write!(f, "QUEUED"),
            TaskState::Started => write!(f, "STARTED"),
            TaskState::Completed => write!(f, "COMPLETED"),
            TaskState::Error => write!(f, "ERROR"),
        }
    }
}

/// The entity a task operates on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub kind: String,
}

/// A single step of a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    #[serde(default)]
    pub sequence: i32,
    #[serde(default)]
    pub operation: String,
    pub state: TaskState,
    #[serde(default)]
    pub errors: Vec<ApiError>,
    #[serde(default)]
    pub warnings: Vec<ApiError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
}

/// Snapshot of an asynchronous operation as reported by the control plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    #[serde(default)]
    pub operation: String,
    pub state: TaskState,
    #[serde(default)]
    pub entity: Entity,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_properties: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queued_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
}

impl Task {
    /// Create a bare task snapshot.
    #[must_use]
    pub fn new(id: impl Into<String>, operation: impl Into<String>, state: TaskState) -> Self {
        Self {
            id: id.into(),
            operation: operation.into(),
            state,
            entity: Entity::default(),
            steps: Vec::new(),
            resource_properties: None,
            queued_time: None,
            started_time: None,
            end_time: None,
            self_link: None,
        }
    }

    /// Set the entity the task operates on.
    #[must_use]
    pub fn with_entity(mut self, id: impl Into<String>, kind: impl Into<String>) -> Self {
        self.entity = Entity {
            id: id.into(),
            kind: kind.into(),
        };
        self
    }

    /// Append a step.
    #[must_use]
    pub fn with_step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Error messages collected from all failed steps, joined with `"; "`.
    #[must_use]
    pub fn error_detail(&self) -> Option<String> {
        let messages: Vec<String> = self
            .steps
            .iter()
            .flat_map(|step| step.errors.iter())
            .map(ToString::to_string)
            .collect();

        if messages.is_empty() {
            None
        } else {
            Some(messages.join("; "))
        }
    }

    /// Convert an `ERROR` task into [`PhotonError::Task`].
    ///
    /// Waiting returns `ERROR` tasks as data; call this when the failure of
    /// the underlying operation should be treated as an error.
    #[allow(clippy::result_large_err)]
    pub fn into_completed(self) -> Result<Self> {
        match self.state {
            TaskState::Error => Err(PhotonError::Task {
                message: self
                    .error_detail()
                    .unwrap_or_else(|| "no error detail reported".to_string()),
                task_id: self.id,
                operation: self.operation,
            }),
            _ => Ok(self),
        }
    }
}

impl Step {
    /// Create a step without errors.
    #[must_use]
    pub fn new(sequence: i32, operation: impl Into<String>, state: TaskState) -> Self {
        Self {
            sequence,
            operation: operation.into(),
            state,
            errors: Vec::new(),
            warnings: Vec::new(),
            started_time: None,
            end_time: None,
        }
    }

    /// Attach an error to the step.
    #[must_use]
    pub fn with_error(mut self, error: ApiError) -> Self {
        self.errors.push(error);
        self
    }
}

/// Tasks API group.
pub struct TasksApi<'a> {
    client: &'a PhotonClient,
}

impl<'a> TasksApi<'a> {
    pub(crate) fn new(client: &'a PhotonClient) -> Self {
        Self { client }
    }

    /// Fetch the current snapshot of a task.
    #[allow(clippy::result_large_err)]
    pub async fn get(&self, task_id: &str) -> Result<Task> {
        self.client.rest().get_json(&format!("/tasks/{task_id}")).await
    }

    /// Wait for a task using the client's default polling options.
    #[allow(clippy::result_large_err)]
    pub async fn wait(&self, task_id: &str) -> Result<Task> {
        self.wait_with(task_id, self.client.wait_options(), None)
            .await
    }

    /// Wait for a task with explicit options and an optional cancellation
    /// token.
    #[allow(clippy::result_large_err)]
    pub async fn wait_with(
        &self,
        task_id: &str,
        options: WaitOptions,
        cancel: Option<CancellationToken>,
    ) -> Result<Task> {
        let mut tracker = TaskTracker::new(self).with_options(options);
        if let Some(token) = cancel {
            tracker = tracker.with_cancellation(token);
        }
        tracker.wait(task_id).await
    }
}

#[async_trait]
impl TaskStore for TasksApi<'_> {
    async fn get_task(&self, task_id: &str) -> Result<Task> {
        self.get(task_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_task() {
        let json = r#"{
            "id": "task-1",
            "operation": "CREATE_DISK",
            "state": "ERROR",
            "entity": {"id": "disk-1", "kind": "persistent-disk"},
            "steps": [{
                "sequence": 0,
                "operation": "RESERVE_RESOURCE",
                "state": "ERROR",
                "errors": [{"code": "NotEnoughCapacity", "message": "no datastore", "data": {}}]
            }],
            "queuedTime": 1000,
            "selfLink": "http://localhost/tasks/task-1"
        }"#;

        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.state, TaskState::Error);
        assert_eq!(task.entity.kind, "persistent-disk");
        assert_eq!(task.steps.len(), 1);
        assert_eq!(
            task.error_detail().as_deref(),
            Some("NotEnoughCapacity: no datastore")
        );
    }

    #[test]
    fn test_unknown_state_is_rejected() {
        let json = r#"{"id": "t", "state": "PAUSED"}"#;
        assert!(serde_json::from_str::<Task>(json).is_err());
    }

    #[test]
    fn test_terminal_states() {
        assert!(!TaskState::Queued.is_terminal());
        assert!(!TaskState::Started.is_terminal());
        assert!(TaskState::Completed.is_terminal());
        assert!(TaskState::Error.is_terminal());
    }

    #[test]
    fn test_into_completed() {
        let ok = Task::new("t1", "DELETE_VM", TaskState::Completed);
        assert!(ok.into_completed().is_ok());

        let failed = Task::new("t2", "DELETE_VM", TaskState::Error).with_step(
            Step::new(0, "DELETE_VM", TaskState::Error)
                .with_error(ApiError::new(0, "VmNotFound", "VM vm-1 not found")),
        );
        match failed.into_completed() {
            Err(PhotonError::Task {
                task_id,
                operation,
                message,
            }) => {
                assert_eq!(task_id, "t2");
                assert_eq!(operation, "DELETE_VM");
                assert!(message.contains("VM vm-1 not found"));
            }
            other => panic!("Expected Task error, got {other:?}"),
        }
    }
}
