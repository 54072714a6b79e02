//! Core error types for lxc-ssh

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for the lxc-ssh ecosystem
#[derive(Error, Debug)]
pub enum LxsError {
    /// Transport-level failure
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// Remote command exited non-zero
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Container lookup or argument error
    #[error(transparent)]
    Container(#[from] ContainerError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Connection-related errors
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// Private key file missing or unreadable
    #[error("Private key not found at {path}: {message}")]
    KeyNotFound { path: PathBuf, message: String },

    /// Server refused public key authentication
    #[error("Authentication rejected for user '{username}'")]
    AuthenticationFailed { username: String },

    /// Host key rejected by the configured policy
    #[error("Host key verification failed: {message}")]
    HostKeyRejected { message: String },

    /// Could not establish the session
    #[error("Failed to connect to {address}: {message}")]
    ConnectFailed { address: String, message: String },

    /// Connect or command exceeded its deadline
    #[error("Timed out after {0:?}")]
    TimedOut(std::time::Duration),

    /// Session channel failed while running a command
    #[error("Channel error: {0}")]
    Channel(String),

    /// Channel closed before the remote side reported an exit status
    #[error("Channel closed before exit status was received")]
    ChannelClosed,
}

/// A remote command exited with a non-zero status
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Command exited with status {exit_status}: {stderr}")]
pub struct CommandError {
    /// Remote exit status
    pub exit_status: u32,
    /// Sanitized standard error
    pub stderr: String,
}

/// Container-related errors
#[derive(Error, Debug)]
pub enum ContainerError {
    /// The structured query returned no records
    #[error("{0}")]
    NotFound(String),

    /// Records were returned, but without qualifying data
    #[error("{0}")]
    Validation(String),

    /// A caller precondition was violated
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Hypervisor output could not be decoded
    #[error("Malformed hypervisor output: {0}")]
    MalformedOutput(#[from] serde_json::Error),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialize error
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl LxsError {
    /// Returns the command error if this is a non-zero exit
    pub fn as_command_error(&self) -> Option<&CommandError> {
        match self {
            LxsError::Command(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_error_display() {
        let err = LxsError::from(CommandError {
            exit_status: 1,
            stderr: "Error: not found".to_string(),
        });
        assert_eq!(err.to_string(), "Command exited with status 1: Error: not found");
        assert_eq!(err.as_command_error().map(|e| e.exit_status), Some(1));
    }

    #[test]
    fn test_container_error_messages_pass_through() {
        let err = LxsError::from(ContainerError::NotFound("Container not found".into()));
        assert_eq!(err.to_string(), "Container not found");
        assert!(err.as_command_error().is_none());
    }
}
