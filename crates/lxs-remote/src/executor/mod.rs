//! SSH command execution against the hypervisor host

mod host_keys;
mod session;

pub use session::RemoteExecutor;
