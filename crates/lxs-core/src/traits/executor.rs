//! Remote command execution trait

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::LxsError;

/// A session that runs shell commands on one remote host
///
/// Implementations are used by a single caller at a time; `&mut self`
/// serializes commands on the session.
#[async_trait]
pub trait CommandExecutor: Send {
    /// Host this executor is connected to
    fn host(&self) -> &str;

    /// Run `command` and return its standard output
    ///
    /// The sanitized standard error is recorded as [`last_stderr`] whatever
    /// the outcome. When `check` is set, a non-zero exit fails with
    /// [`LxsError::Command`].
    ///
    /// [`last_stderr`]: CommandExecutor::last_stderr
    async fn execute(&mut self, command: &str, check: bool) -> Result<Bytes, LxsError>;

    /// Sanitized standard error of the most recent command
    fn last_stderr(&self) -> &str;

    /// Release the session
    async fn close(self) -> Result<(), LxsError>
    where
        Self: Sized;
}
