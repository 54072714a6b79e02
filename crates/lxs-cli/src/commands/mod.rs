//! CLI command implementations

mod config;
mod container;

pub use config::{config_init, config_path, config_show, resolve_config, ConfigOverrides};
pub use container::{clone_command, delete_command, exec_command, ip_command};
