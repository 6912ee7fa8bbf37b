// Copyright (c) 2025 - Cowboy AI, Inc.
//! Provisioning
//!
//! - [`Activator`] - makes an application's active nodes match its desired hosts
//! - [`HostProvisioner`] - async boundary to the service provisioning physical hosts

pub mod activator;
pub mod host_provisioner;
pub mod host_spec;

pub use activator::{ActivationError, Activator};
pub use host_provisioner::{
    add_hosts, deprovision_host, reconcile_host, reconcile_hosts, HostProvisioner,
    ProvisionResult, ProvisionedHost, ProvisioningError,
};
pub use host_spec::HostSpec;
