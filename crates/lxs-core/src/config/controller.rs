//! Controller configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::serde_utils::{duration_secs, option_duration_secs};
use crate::retry::RetryPolicy;

/// Hypervisor host used when nothing else is configured
pub const DEFAULT_HOST: &str = "172.16.221.3";

/// How unknown server host keys are treated
///
/// A key that differs from the one recorded for a known host is rejected
/// under every policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HostKeyPolicy {
    /// Trust on first use: accept and record unseen keys
    #[default]
    AcceptNew,
    /// Only accept keys already present in the known-hosts file
    Strict,
}

/// Configuration for a container controller and its SSH session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Hypervisor host address
    pub host: String,

    /// SSH port
    pub port: u16,

    /// Remote username
    pub username: String,

    /// Private key used for authentication (no passphrase)
    pub private_key_path: PathBuf,

    /// Known-hosts file consulted and updated for host-key checks
    pub known_hosts_path: PathBuf,

    /// Unknown host key handling
    pub host_key_policy: HostKeyPolicy,

    /// Deadline for a single connection attempt
    #[serde(with = "duration_secs")]
    pub connect_timeout: Duration,

    /// Deadline for a single remote command; unbounded when unset
    #[serde(
        default,
        with = "option_duration_secs",
        skip_serializing_if = "Option::is_none"
    )]
    pub command_timeout: Option<Duration>,

    /// Hypervisor CLI invoked on the remote host
    pub lxc_binary: String,

    /// Retry budget for establishing the SSH session
    pub connect_retry: RetryPolicy,

    /// Retry budget for waiting on a DHCP-assigned address
    pub address_retry: RetryPolicy,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        let ssh_dir = dirs::home_dir().unwrap_or_default().join(".ssh");

        Self {
            host: DEFAULT_HOST.to_string(),
            port: 22,
            username: whoami::username(),
            private_key_path: ssh_dir.join("id_rsa"),
            known_hosts_path: ssh_dir.join("known_hosts"),
            host_key_policy: HostKeyPolicy::default(),
            connect_timeout: Duration::from_secs(30),
            command_timeout: None,
            lxc_binary: "lxc".to_string(),
            connect_retry: RetryPolicy::default(),
            address_retry: RetryPolicy::default(),
        }
    }
}

impl ControllerConfig {
    /// Config targeting `host` with every other field defaulted
    pub fn for_host(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    /// `host:port` form used for connecting
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
