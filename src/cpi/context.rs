// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::client::PhotonClient;
use crate::config::CpiConfig;
use crate::error::{PhotonError, Result};
use crate::resources::Task;

/// State shared by all CPI actions of one run.
#[derive(Debug, Clone)]
pub struct CpiContext {
    pub client: PhotonClient,
    pub config: CpiConfig,
}

impl CpiContext {
    /// Build the SDK client described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`PhotonError::Config`] if no endpoint is configured or the
    /// endpoint is not a valid URL.
    #[allow(clippy::result_large_err)]
    pub fn new(config: CpiConfig) -> Result<Self> {
        let client = PhotonClient::new(config.to_client_config()?)?;
        Ok(Self { client, config })
    }

    /// Project owning the resources this CPI creates.
    ///
    /// # Errors
    ///
    /// Returns [`PhotonError::Config`] when `photon.project` is empty.
    #[allow(clippy::result_large_err)]
    pub fn project(&self) -> Result<&str> {
        if self.config.photon.project.is_empty() {
            return Err(PhotonError::Config(
                "No project configured (photon.project)".to_string(),
            ));
        }
        Ok(&self.config.photon.project)
    }

    /// Wait for `task` and fail if it ends in `ERROR`.
    #[allow(clippy::result_large_err)]
    pub async fn complete(&self, task: Task) -> Result<Task> {
        if task.is_terminal() {
            return task.into_completed();
        }
        self.client.tasks().wait(&task.id).await?.into_completed()
    }
}
