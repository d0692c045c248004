// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed records and API groups for control plane resources.
//!
//! Each API group borrows the [`PhotonClient`](crate::PhotonClient) and maps
//! one resource's endpoints onto `get`/`create`/`delete` style calls. Calls
//! that change state return a [`Task`] to be awaited through [`TasksApi`].

mod clusters;
mod common;
mod disks;
mod flavors;
mod hosts;
mod networks;
mod projects;
mod task;
mod tenants;
mod vms;

pub use clusters::{ClusterCreateSpec, ClusterSummary, ClustersApi};
pub use common::{ApiError, LocalitySpec, QuotaLineItem, ResourceList};
pub use disks::{DiskCreateSpec, DisksApi, PersistentDisk, PERSISTENT_DISK};
pub use flavors::{Flavor, FlavorCreateSpec, FlavorsApi};
pub use hosts::{Host, HostCreateSpec, HostsApi};
pub use networks::{Network, NetworkCreateSpec, NetworksApi};
pub use projects::{ProjectCompact, ProjectCreateSpec, ProjectsApi, ResourceTicketReservation};
pub use task::{Entity, Step, Task, TaskState, TasksApi};
pub use tenants::{ResourceTicketCreateSpec, Tenant, TenantCreateSpec, TenantsApi};
pub use vms::{AttachedDisk, Vm, VmCreateSpec, VmDiskOperation, VmsApi};
