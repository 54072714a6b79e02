//! lxs-core: Core abstractions and configuration for lxc-ssh
//!
//! This crate provides the error taxonomy, configuration structures,
//! retry policy and the command-execution trait shared by the remote
//! controller and the CLI.

pub mod config;
pub mod error;
pub mod retry;
pub mod traits;
pub mod types;

pub use error::LxsError;
pub use retry::RetryPolicy;
pub use traits::CommandExecutor;
pub use types::{CommandOutput, ContainerName};
