//! SSH client handler and host-key verification
//!
//! Host keys are checked against an OpenSSH known-hosts file. Under
//! [`HostKeyPolicy::AcceptNew`] an unseen key is recorded and accepted
//! (trust on first use); under [`HostKeyPolicy::Strict`] it is refused.
//! A key that changed for a known host is always refused.

use std::path::PathBuf;

use async_trait::async_trait;
use russh::client;
use russh_keys::key::PublicKey;
use thiserror::Error;

use lxs_core::config::{ControllerConfig, HostKeyPolicy};

/// Errors raised while the SSH session is being established
#[derive(Debug, Error)]
pub(crate) enum HandlerError {
    /// Transport error from russh
    #[error(transparent)]
    Ssh(#[from] russh::Error),

    /// Host key refused by policy
    #[error("{0}")]
    HostKey(String),
}

/// Outcome of looking the server key up in known_hosts
#[derive(Debug, PartialEq, Eq)]
enum Verdict {
    /// Key already recorded for this host
    Known,
    /// Unseen key to be recorded and accepted
    Learn,
    /// Key refused, with a reason
    Reject(String),
}

fn decide(policy: HostKeyPolicy, lookup: Result<bool, russh_keys::Error>) -> Verdict {
    match lookup {
        Ok(true) => Verdict::Known,
        Ok(false) => match policy {
            HostKeyPolicy::AcceptNew => Verdict::Learn,
            HostKeyPolicy::Strict => {
                Verdict::Reject("host is not in known_hosts and policy is strict".to_string())
            }
        },
        Err(russh_keys::Error::KeyChanged { line }) => Verdict::Reject(format!(
            "host key changed (known_hosts line {})",
            line
        )),
        Err(e) => Verdict::Reject(format!("failed to read known_hosts: {}", e)),
    }
}

/// SSH client handler for the executor session
pub(crate) struct ClientHandler {
    host: String,
    port: u16,
    known_hosts_path: PathBuf,
    policy: HostKeyPolicy,
}

impl ClientHandler {
    pub(crate) fn new(config: &ControllerConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            known_hosts_path: config.known_hosts_path.clone(),
            policy: config.host_key_policy,
        }
    }
}

#[async_trait]
impl client::Handler for ClientHandler {
    type Error = HandlerError;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        let fingerprint = server_public_key.fingerprint();
        tracing::debug!("Server host key for {}: {}", self.host, fingerprint);

        let lookup = russh_keys::check_known_hosts_path(
            &self.host,
            self.port,
            server_public_key,
            &self.known_hosts_path,
        );

        match decide(self.policy, lookup) {
            Verdict::Known => Ok(true),
            Verdict::Learn => {
                tracing::info!(
                    "Adding host key {} for {} to {:?}",
                    fingerprint,
                    self.host,
                    self.known_hosts_path
                );
                if let Err(e) = russh_keys::learn_known_hosts_path(
                    &self.host,
                    self.port,
                    server_public_key,
                    &self.known_hosts_path,
                ) {
                    // The key is still trusted for this session
                    tracing::warn!("Failed to record host key: {}", e);
                }
                Ok(true)
            }
            Verdict::Reject(reason) => {
                tracing::error!("Rejecting host key for {}: {}", self.host, reason);
                Err(HandlerError::HostKey(reason))
            }
        }
    }
}
