// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cloud provider interface (CPI) adapter.
//!
//! The director runs the CPI once per call, writing a JSON request to stdin:
//!
//! ```json
//! {"method": "create_disk", "arguments": [1024, {}, "vm-1"], "context": {}}
//! ```
//!
//! and reads exactly one envelope from stdout:
//!
//! ```json
//! {"result": "disk-1", "error": null, "log": []}
//! ```
//!
//! Requests are routed through an [`ActionRegistry`] by [`dispatch`];
//! [`default_registry`] holds the actions backed by the controller SDK.

mod actions;
mod context;
mod dispatcher;
mod envelope;
mod error;
mod registry;

pub use actions::{default_registry, DiskCloudProperties, VmCloudProperties};
pub use context::CpiContext;
pub use dispatcher::{dispatch, handle_request};
pub use envelope::{ActionRequest, ActionResponse, ErrorEnvelope, ErrorKind};
pub use error::ActionError;
pub use registry::{Action, ActionRegistry, FromArgs};
