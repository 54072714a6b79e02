//! SSH session to the hypervisor host
//!
//! One [`RemoteExecutor`] owns one authenticated session. Each command runs
//! on a fresh session channel; stdout and stderr are read to completion
//! before the exit status is evaluated.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use russh::client::{self, Config, Handle};
use russh::{ChannelMsg, Disconnect};
use russh_keys::key::KeyPair;

use lxs_core::config::ControllerConfig;
use lxs_core::error::{CommandError, ConnectionError, LxsError};
use lxs_core::{CommandExecutor, CommandOutput};

use super::host_keys::{ClientHandler, HandlerError};

/// Extended data stream carrying stderr (RFC 4254 section 5.2)
const SSH_EXTENDED_DATA_STDERR: u32 = 1;

/// Executes shell commands over an authenticated SSH session
pub struct RemoteExecutor {
    /// Host the session is connected to
    host: String,
    /// SSH session handle
    session: Handle<ClientHandler>,
    /// Sanitized stderr of the most recent command
    last_stderr: String,
    /// Per-command deadline
    command_timeout: Option<Duration>,
}

impl RemoteExecutor {
    /// Connect and authenticate following `config.connect_retry`
    ///
    /// The private key is loaded once up front; a missing or unreadable key
    /// fails immediately. Every connection error but the last is logged and
    /// retried.
    pub async fn connect(config: &ControllerConfig) -> Result<Self, LxsError> {
        let key = Arc::new(load_key(&config.private_key_path)?);

        let session = config
            .connect_retry
            .retry(|attempt| {
                tracing::debug!(
                    "Connecting to {} as '{}' (attempt {}/{})",
                    config.address(),
                    config.username,
                    attempt,
                    config.connect_retry.max_attempts()
                );
                try_connect(config, Arc::clone(&key))
            })
            .await?;

        tracing::info!("Connected to {}", config.address());

        Ok(Self {
            host: config.host.clone(),
            session,
            last_stderr: String::new(),
            command_timeout: config.command_timeout,
        })
    }

    /// Run `command` on a new channel and collect its output
    async fn run(&self, command: &str) -> Result<CommandOutput, ConnectionError> {
        let mut channel = self
            .session
            .channel_open_session()
            .await
            .map_err(|e| ConnectionError::Channel(format!("failed to open channel: {}", e)))?;

        channel
            .exec(true, command)
            .await
            .map_err(|e| ConnectionError::Channel(format!("failed to exec: {}", e)))?;

        let mut stdout = BytesMut::new();
        let mut stderr = Vec::new();
        let mut exit_status = None;

        while let Some(msg) = channel.wait().await {
            match msg {
                ChannelMsg::Data { ref data } => stdout.extend_from_slice(data),
                ChannelMsg::ExtendedData { ref data, ext } if ext == SSH_EXTENDED_DATA_STDERR => {
                    stderr.extend_from_slice(data)
                }
                ChannelMsg::ExitStatus {
                    exit_status: status,
                } => exit_status = Some(status),
                ChannelMsg::ExitSignal { signal_name, .. } => {
                    tracing::warn!("Remote command terminated by signal {:?}", signal_name);
                }
                _ => {}
            }
        }

        let exit_status = exit_status.ok_or(ConnectionError::ChannelClosed)?;
        Ok(CommandOutput::from_raw(stdout.freeze(), &stderr, exit_status))
    }
}

#[async_trait]
impl CommandExecutor for RemoteExecutor {
    fn host(&self) -> &str {
        &self.host
    }

    async fn execute(&mut self, command: &str, check: bool) -> Result<Bytes, LxsError> {
        tracing::info!("[{}] {}", self.host, command);

        let output = match self.command_timeout {
            Some(limit) => tokio::time::timeout(limit, self.run(command))
                .await
                .map_err(|_| ConnectionError::TimedOut(limit))??,
            None => self.run(command).await?,
        };

        Ok(settle(&mut self.last_stderr, output, check)?)
    }

    fn last_stderr(&self) -> &str {
        &self.last_stderr
    }

    async fn close(self) -> Result<(), LxsError> {
        tracing::debug!("Closing session to {}", self.host);
        self.session
            .disconnect(Disconnect::ByApplication, "closing", "en")
            .await
            .map_err(|e| ConnectionError::Channel(format!("disconnect failed: {}", e)))?;
        Ok(())
    }
}

/// Attempt a single connection and authentication
async fn try_connect(
    config: &ControllerConfig,
    key: Arc<KeyPair>,
) -> Result<Handle<ClientHandler>, ConnectionError> {
    let ssh_config = Arc::new(Config::default());
    let handler = ClientHandler::new(config);

    let mut session = tokio::time::timeout(
        config.connect_timeout,
        client::connect(ssh_config, (config.host.as_str(), config.port), handler),
    )
    .await
    .map_err(|_| ConnectionError::TimedOut(config.connect_timeout))?
    .map_err(|e| match e {
        HandlerError::HostKey(message) => ConnectionError::HostKeyRejected { message },
        HandlerError::Ssh(e) => ConnectionError::ConnectFailed {
            address: config.address(),
            message: e.to_string(),
        },
    })?;

    let authenticated = session
        .authenticate_publickey(&config.username, key)
        .await
        .map_err(|e| ConnectionError::ConnectFailed {
            address: config.address(),
            message: format!("authentication error: {}", e),
        })?;

    if !authenticated {
        return Err(ConnectionError::AuthenticationFailed {
            username: config.username.clone(),
        });
    }

    Ok(session)
}

/// Load an unencrypted private key
fn load_key(path: &Path) -> Result<KeyPair, ConnectionError> {
    if !path.exists() {
        return Err(ConnectionError::KeyNotFound {
            path: path.to_path_buf(),
            message: "file does not exist".to_string(),
        });
    }

    russh_keys::load_secret_key(path, None).map_err(|e| ConnectionError::KeyNotFound {
        path: path.to_path_buf(),
        message: format!("failed to load key: {}", e),
    })
}

/// Record stderr and apply the exit-status check
fn settle(
    last_stderr: &mut String,
    output: CommandOutput,
    check: bool,
) -> Result<Bytes, CommandError> {
    last_stderr.clone_from(&output.stderr);

    if !output.success() {
        tracing::debug!(
            "Command exited with status {}: {}",
            output.exit_status,
            output.stderr
        );
    }

    output.into_stdout(check)
}
