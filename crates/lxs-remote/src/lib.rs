//! lxs-remote: Remote control of an LXC host over SSH
//!
//! [`RemoteExecutor`] owns one authenticated SSH session and runs shell
//! commands on it. [`ContainerController`] layers container lifecycle
//! operations (clone, start, address discovery, delete) on top of any
//! [`CommandExecutor`](lxs_core::CommandExecutor).

pub mod controller;
pub mod executor;

pub use controller::{parse_address, ContainerController, ContainerRecord};
pub use executor::RemoteExecutor;
