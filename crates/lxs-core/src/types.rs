//! Core domain types

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CommandError, ContainerError};

/// Warning printed by non-interactive shells whose profile calls `stty`
pub const STTY_NOISE: &str = "stty: 'standard input': Inappropriate ioctl for device";

/// Name of a container in the hypervisor's registry
///
/// Opaque to this crate apart from being non-empty; uniqueness is the
/// hypervisor's concern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContainerName(String);

impl ContainerName {
    /// Create a container name, rejecting the empty string
    pub fn new(name: impl Into<String>) -> Result<Self, ContainerError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ContainerError::InvalidArgument(
                "container name must not be empty".to_string(),
            ));
        }
        Ok(Self(name))
    }

    /// Get the raw name
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The name as a single-quoted shell word
    pub fn quoted(&self) -> String {
        shell_quote(&self.0)
    }
}

impl fmt::Display for ContainerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ContainerName {
    type Error = ContainerError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl TryFrom<&str> for ContainerName {
    type Error = ContainerError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ContainerName> for String {
    fn from(name: ContainerName) -> Self {
        name.0
    }
}

impl AsRef<str> for ContainerName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Quote `word` for a POSIX shell
///
/// Embedded single quotes are closed, escaped and reopened.
pub fn shell_quote(word: &str) -> String {
    format!("'{}'", word.replace('\'', r"'\''"))
}

/// Result of one remote command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Raw standard output
    pub stdout: Bytes,
    /// Standard error with terminal noise removed
    pub stderr: String,
    /// Remote exit status
    pub exit_status: u32,
}

impl CommandOutput {
    /// Build an output from raw stream contents
    pub fn from_raw(stdout: impl Into<Bytes>, stderr: &[u8], exit_status: u32) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: sanitize_stderr(stderr),
            exit_status,
        }
    }

    /// Whether the command exited with status 0
    pub fn success(&self) -> bool {
        self.exit_status == 0
    }

    /// Return stdout, or a [`CommandError`] for a non-zero exit when `check` is set
    pub fn into_stdout(self, check: bool) -> Result<Bytes, CommandError> {
        if check && !self.success() {
            return Err(CommandError {
                exit_status: self.exit_status,
                stderr: self.stderr,
            });
        }
        Ok(self.stdout)
    }
}

/// Strip the `stty` ioctl warning and surrounding whitespace from stderr
pub fn sanitize_stderr(stderr: &[u8]) -> String {
    String::from_utf8_lossy(stderr)
        .trim()
        .replace(STTY_NOISE, "")
        .trim()
        .to_string()
}
