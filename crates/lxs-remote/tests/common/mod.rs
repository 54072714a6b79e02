//! Scripted command executor for controller tests

use std::collections::VecDeque;

use async_trait::async_trait;
use bytes::Bytes;

use lxs_core::error::LxsError;
use lxs_core::{CommandExecutor, CommandOutput};

/// Replays canned outputs in order and records every command it was given
///
/// Once the script runs out, commands succeed with empty output.
#[derive(Default)]
pub struct ScriptedExecutor {
    script: VecDeque<CommandOutput>,
    pub commands: Vec<String>,
    last_stderr: String,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, stdout: &str, stderr: &str, exit_status: u32) -> Self {
        self.script.push_back(CommandOutput::from_raw(
            Bytes::copy_from_slice(stdout.as_bytes()),
            stderr.as_bytes(),
            exit_status,
        ));
        self
    }

    pub fn then_ok(self, stdout: &str) -> Self {
        self.then(stdout, "", 0)
    }
}

#[async_trait]
impl CommandExecutor for ScriptedExecutor {
    fn host(&self) -> &str {
        "scripted"
    }

    async fn execute(&mut self, command: &str, check: bool) -> Result<Bytes, LxsError> {
        self.commands.push(command.to_string());
        let output = self
            .script
            .pop_front()
            .unwrap_or_else(|| CommandOutput::from_raw(Bytes::new(), b"", 0));
        self.last_stderr.clone_from(&output.stderr);
        Ok(output.into_stdout(check)?)
    }

    fn last_stderr(&self) -> &str {
        &self.last_stderr
    }

    async fn close(self) -> Result<(), LxsError> {
        Ok(())
    }
}
