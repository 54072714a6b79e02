//! Hypervisor command lines

use lxs_core::ContainerName;

/// Builds `lxc` invocations for the remote shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LxcCli {
    binary: String,
}

impl Default for LxcCli {
    fn default() -> Self {
        Self::new("lxc")
    }
}

impl LxcCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn list_json(&self, name: &ContainerName) -> String {
        format!("{} list {} --format json", self.binary, name.quoted())
    }

    pub fn force_delete(&self, name: &ContainerName) -> String {
        format!("{} delete {} --force", self.binary, name.quoted())
    }

    pub fn copy(&self, source: &ContainerName, target: &ContainerName) -> String {
        format!("{} copy {} {}", self.binary, source.quoted(), target.quoted())
    }

    pub fn start(&self, name: &ContainerName) -> String {
        format!("{} start {}", self.binary, name.quoted())
    }
}
