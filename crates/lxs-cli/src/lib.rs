//! lxc-ssh: Command-line interface
//!
//! Provides the `lxc-ssh` CLI for cloning, starting, inspecting and
//! deleting containers on a remote LXC host.

pub mod commands;
pub mod output;
