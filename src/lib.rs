// SPDX-License-Identifier: MIT OR Apache-2.0

pub mod client;
pub mod config;
pub mod cpi;
pub mod error;
pub mod resources;
pub mod runtime;
pub mod testkit;

pub use client::{PhotonClient, PhotonClientConfig, PhotonClientConfigBuilder};
pub use config::CpiConfig;
pub use cpi::{
    dispatch, ActionError, ActionRegistry, ActionRequest, ActionResponse, CpiContext,
    ErrorEnvelope, ErrorKind,
};
pub use error::PhotonError;
pub use resources::{ApiError, Task, TaskState};
pub use runtime::{Clock, TaskStore, TaskTracker, TokioClock, WaitOptions};
