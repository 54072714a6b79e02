//! Container lifecycle on one hypervisor host
//!
//! Every operation is a short sequence of `lxc` invocations over a
//! [`CommandExecutor`]. Nothing is rolled back: when a step fails, the
//! remote host stays in whatever state the previous steps left it.
//!
//! The controller also keeps an advisory set of containers it started
//! itself. It is best-effort bookkeeping, never reconciled with what the
//! hypervisor actually runs.

mod address;
mod commands;

pub use address::{
    parse_address, ContainerRecord, ContainerState, InterfaceAddress, Interfaces,
    NetworkInterface,
};
pub use commands::LxcCli;

use std::collections::BTreeSet;

use lxs_core::config::ControllerConfig;
use lxs_core::error::{ContainerError, LxsError};
use lxs_core::{CommandExecutor, ContainerName, RetryPolicy};

use crate::executor::RemoteExecutor;

/// Lifecycle operations for named containers on one host
pub struct ContainerController<E = RemoteExecutor> {
    executor: E,
    lxc: LxcCli,
    address_retry: RetryPolicy,
    running: BTreeSet<ContainerName>,
}

impl ContainerController<RemoteExecutor> {
    /// Open an SSH session described by `config` and wrap it
    pub async fn connect(config: &ControllerConfig) -> Result<Self, LxsError> {
        let executor = RemoteExecutor::connect(config).await?;
        Ok(Self::new(executor)
            .with_lxc_binary(config.lxc_binary.clone())
            .with_address_retry(config.address_retry.clone()))
    }
}

impl<E: CommandExecutor> ContainerController<E> {
    /// Wrap an executor with default `lxc` binary and retry budget
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            lxc: LxcCli::default(),
            address_retry: RetryPolicy::default(),
            running: BTreeSet::new(),
        }
    }

    /// Use a different hypervisor binary on the remote host
    pub fn with_lxc_binary(mut self, binary: impl Into<String>) -> Self {
        self.lxc = LxcCli::new(binary);
        self
    }

    /// Set the budget for waiting on an address
    pub fn with_address_retry(mut self, policy: RetryPolicy) -> Self {
        self.address_retry = policy;
        self
    }

    /// The underlying executor
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Containers this controller started and has not deleted since
    ///
    /// Advisory only: containers may have been stopped or removed on the
    /// host without this controller knowing.
    pub fn running_containers(&self) -> &BTreeSet<ContainerName> {
        &self.running
    }

    /// Query the container's address once
    async fn query_address(
        &mut self,
        name: &ContainerName,
        ipv4_only: bool,
    ) -> Result<Option<String>, LxsError> {
        let stdout = self
            .executor
            .execute(&self.lxc.list_json(name), true)
            .await?;

        let records: Vec<ContainerRecord> =
            serde_json::from_slice(&stdout).map_err(ContainerError::from)?;

        Ok(parse_address(&records, ipv4_only, false)?)
    }

    /// IPv4 address of `name`, waiting for DHCP if necessary
    ///
    /// The list query is repeated following the address retry budget while
    /// it returns no address. Command, lookup and decoding errors are
    /// returned immediately.
    pub async fn get_address(&mut self, name: &ContainerName) -> Result<String, LxsError> {
        let mut schedule = self.address_retry.schedule();

        while let Some(attempt) = schedule.next().await {
            if let Some(address) = self.query_address(name, true).await? {
                tracing::debug!("{} has address {} (attempt {})", name, address, attempt);
                return Ok(address);
            }
            tracing::debug!("No address for {} yet (attempt {})", name, attempt);
        }

        tracing::debug!(
            "Giving up on {} after {} attempts",
            name,
            schedule.attempts_made()
        );
        Err(ContainerError::Validation("Can't find IP address".to_string()).into())
    }

    /// Force-delete `name`, tolerating a container that does not exist
    pub async fn stop_and_delete(&mut self, name: &ContainerName) -> Result<(), LxsError> {
        self.executor
            .execute(&self.lxc.force_delete(name), false)
            .await?;

        let stderr = self.executor.last_stderr();
        if !stderr.is_empty() {
            tracing::warn!("delete {}: {}", name, stderr);
        }

        self.running.remove(name);
        Ok(())
    }

    /// Replace `target` with a fresh clone of `source` and start it
    ///
    /// Runs delete, copy and start in that order; a failed copy or start
    /// is returned as-is with no cleanup.
    pub async fn copy_and_start(
        &mut self,
        source: &ContainerName,
        target: &ContainerName,
    ) -> Result<(), LxsError> {
        if source == target {
            return Err(ContainerError::InvalidArgument(format!(
                "source and target are both '{}'",
                source
            ))
            .into());
        }

        self.stop_and_delete(target).await?;

        self.executor
            .execute(&self.lxc.copy(source, target), true)
            .await?;
        self.executor.execute(&self.lxc.start(target), true).await?;

        tracing::info!("Started {} from {}", target, source);
        self.running.insert(target.clone());
        Ok(())
    }

    /// Close the underlying session
    pub async fn close(self) -> Result<(), LxsError> {
        if !self.running.is_empty() {
            tracing::debug!(
                "Closing with {} container(s) still marked running",
                self.running.len()
            );
        }
        self.executor.close().await
    }
}
