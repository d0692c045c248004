// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client for the Photon controller REST API.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use photon_cpi_rs::{PhotonClient, PhotonClientConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PhotonClientConfig::builder("https://10.0.0.5:9000")
//!     .token("eyJhbGciOi...")
//!     .task_poll_timeout(Duration::from_secs(600))
//!     .build();
//! let client = PhotonClient::new(config)?;
//!
//! let task = client.disks().delete("disk-1").await?;
//! let task = client.tasks().wait(&task.id).await?.into_completed()?;
//! println!("deleted {}", task.entity.id);
//! # Ok(())
//! # }
//! ```

mod rest;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PhotonError, Result};
use crate::resources::{
    ClustersApi, DisksApi, FlavorsApi, HostsApi, NetworksApi, ProjectsApi, TasksApi, TenantsApi,
    VmsApi,
};
use crate::runtime::{
    LoggingConfig, RequestMetrics, WaitOptions, DEFAULT_MAX_RETRIES, DEFAULT_POLL_DELAY,
    DEFAULT_TIMEOUT,
};

pub(crate) use rest::RestClient;

/// Default API front-end endpoint.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:9000";

#[derive(Clone)]
pub struct PhotonClientConfig {
    /// Base URL of the API front-end, e.g. `https://10.0.0.5:9000`.
    pub endpoint: String,
    /// Bearer token sent with every request.
    pub token: Option<String>,
    /// If true, skips TLS certificate verification (insecure).
    pub ignore_certificate: bool,
    pub connect_timeout: Option<Duration>,
    pub request_timeout: Option<Duration>,
    /// Overall deadline for task waits.
    pub task_poll_timeout: Duration,
    /// Delay between two task polls.
    pub task_poll_delay: Duration,
    /// Consecutive transient failures tolerated while polling a task.
    pub task_retry_count: u32,
    pub logging: LoggingConfig,
}

impl Default for PhotonClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            token: None,
            ignore_certificate: false,
            connect_timeout: None,
            request_timeout: None,
            task_poll_timeout: DEFAULT_TIMEOUT,
            task_poll_delay: DEFAULT_POLL_DELAY,
            task_retry_count: DEFAULT_MAX_RETRIES,
            logging: LoggingConfig::default(),
        }
    }
}

impl fmt::Debug for PhotonClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhotonClientConfig")
            .field("endpoint", &self.endpoint)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("ignore_certificate", &self.ignore_certificate)
            .field("connect_timeout", &self.connect_timeout)
            .field("request_timeout", &self.request_timeout)
            .field("task_poll_timeout", &self.task_poll_timeout)
            .field("task_poll_delay", &self.task_poll_delay)
            .field("task_retry_count", &self.task_retry_count)
            .finish_non_exhaustive()
    }
}

impl PhotonClientConfig {
    /// Create a configuration builder for `endpoint`.
    #[must_use]
    pub fn builder(endpoint: impl Into<String>) -> PhotonClientConfigBuilder {
        PhotonClientConfigBuilder::new(endpoint)
    }

    /// Polling options derived from the task settings.
    #[must_use]
    pub fn wait_options(&self) -> WaitOptions {
        WaitOptions {
            poll_delay: self.task_poll_delay,
            max_retries: self.task_retry_count,
            timeout: self.task_poll_timeout,
        }
    }

    #[allow(clippy::result_large_err)]
    fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.endpoint)
            .map_err(|e| PhotonError::Config(format!("Invalid endpoint URL: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(PhotonError::Config(format!(
                "Unsupported endpoint scheme: {}",
                url.scheme()
            )));
        }
        if url.host_str().is_none() {
            return Err(PhotonError::Config("No host in endpoint".to_string()));
        }
        if self.task_poll_delay.is_zero() {
            return Err(PhotonError::Config(
                "Task poll delay must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for [`PhotonClientConfig`].
#[derive(Debug, Clone)]
pub struct PhotonClientConfigBuilder {
    config: PhotonClientConfig,
}

impl PhotonClientConfigBuilder {
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            config: PhotonClientConfig {
                endpoint: endpoint.into(),
                ..PhotonClientConfig::default()
            },
        }
    }

    /// Bearer token for authentication. Empty tokens are ignored.
    #[must_use]
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.config.token = Some(token.into());
        self
    }

    #[must_use]
    pub fn ignore_certificate(mut self, ignore: bool) -> Self {
        self.config.ignore_certificate = ignore;
        self
    }

    /// Skip TLS verification.
    #[must_use]
    pub fn insecure(self) -> Self {
        self.ignore_certificate(true)
    }

    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn task_poll_timeout(mut self, timeout: Duration) -> Self {
        self.config.task_poll_timeout = timeout;
        self
    }

    #[must_use]
    pub fn task_poll_delay(mut self, delay: Duration) -> Self {
        self.config.task_poll_delay = delay;
        self
    }

    #[must_use]
    pub fn task_retry_count(mut self, count: u32) -> Self {
        self.config.task_retry_count = count;
        self
    }

    #[must_use]
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.config.logging = logging;
        self
    }

    #[must_use]
    pub fn build(self) -> PhotonClientConfig {
        self.config
    }
}

/// Health of the control plane as reported by `/status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemStatus {
    pub status: String,
    #[serde(default)]
    pub components: Vec<ComponentStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentStatus {
    pub component: String,
    pub status: String,
}

/// Stateless handle to the Photon controller API. Cheap to clone.
#[derive(Clone, Debug)]
pub struct PhotonClient {
    config: PhotonClientConfig,
    rest: Arc<RestClient>,
}

impl PhotonClient {
    /// Create a client. No request is made until an API is called.
    ///
    /// # Errors
    ///
    /// Returns [`PhotonError::Config`] if the endpoint is not an http(s) URL
    /// or the HTTP client cannot be built.
    #[allow(clippy::result_large_err)]
    pub fn new(config: PhotonClientConfig) -> Result<Self> {
        config.validate()?;
        let rest = RestClient::new(&config)?;
        debug!(endpoint = %config.endpoint, insecure = config.ignore_certificate, "Created Photon client");
        Ok(Self {
            config,
            rest: Arc::new(rest),
        })
    }

    #[must_use]
    pub fn config(&self) -> &PhotonClientConfig {
        &self.config
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    /// Default polling options for task waits made through this client.
    #[must_use]
    pub fn wait_options(&self) -> WaitOptions {
        self.config.wait_options()
    }

    /// Request counters collected by the REST layer.
    #[must_use]
    pub fn request_metrics(&self) -> &RequestMetrics {
        self.rest.logger().metrics()
    }

    pub(crate) fn rest(&self) -> &RestClient {
        &self.rest
    }

    /// Fetch the control plane status.
    #[allow(clippy::result_large_err)]
    pub async fn status(&self) -> Result<SystemStatus> {
        self.rest.get_json("/status").await
    }

    pub fn tasks(&self) -> TasksApi<'_> {
        TasksApi::new(self)
    }

    pub fn tenants(&self) -> TenantsApi<'_> {
        TenantsApi::new(self)
    }

    pub fn projects(&self) -> ProjectsApi<'_> {
        ProjectsApi::new(self)
    }

    pub fn flavors(&self) -> FlavorsApi<'_> {
        FlavorsApi::new(self)
    }

    pub fn disks(&self) -> DisksApi<'_> {
        DisksApi::new(self)
    }

    pub fn vms(&self) -> VmsApi<'_> {
        VmsApi::new(self)
    }

    pub fn hosts(&self) -> HostsApi<'_> {
        HostsApi::new(self)
    }

    pub fn networks(&self) -> NetworksApi<'_> {
        NetworksApi::new(self)
    }

    pub fn clusters(&self) -> ClustersApi<'_> {
        ClustersApi::new(self)
    }
}

#[cfg(test)]
mod tests;
