//! Config command implementations

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::output::{print_info, print_success, print_warning};
use lxs_core::config::{self, ControllerConfig};

/// Values given on the command line, applied over the config file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub private_key_path: Option<PathBuf>,
}

impl ConfigOverrides {
    fn apply(&self, config: &mut ControllerConfig) {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(username) = &self.username {
            config.username = username.clone();
        }
        if let Some(key) = &self.private_key_path {
            config.private_key_path = key.clone();
        }
    }
}

/// Build the effective configuration
///
/// An explicitly given config file must exist; the default one is optional.
pub fn resolve_config(
    config_path: Option<&PathBuf>,
    overrides: &ConfigOverrides,
) -> Result<ControllerConfig> {
    let mut config = match config_path {
        Some(path) => config::load_config(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => {
            let path = config::default_config_path();
            if path.exists() {
                config::load_config(&path)
                    .with_context(|| format!("Failed to load config from {:?}", path))?
            } else {
                tracing::debug!("No config at {:?}, using defaults", path);
                ControllerConfig::default()
            }
        }
    };

    overrides.apply(&mut config);
    Ok(config)
}

/// Print the effective configuration as TOML
pub fn config_show(config_path: Option<&PathBuf>, overrides: &ConfigOverrides) -> Result<()> {
    let config = resolve_config(config_path, overrides)?;
    let rendered =
        toml::to_string_pretty(&config).context("Failed to serialize configuration")?;
    print!("{}", rendered);
    Ok(())
}

/// Print the config file location
pub fn config_path(config_path: Option<&PathBuf>) {
    let path = config_path
        .cloned()
        .unwrap_or_else(config::default_config_path);
    println!("{}", path.display());
}

/// Write a default config file
pub fn config_init(config_path: Option<&PathBuf>, force: bool) -> Result<()> {
    let path = config_path
        .cloned()
        .unwrap_or_else(config::default_config_path);

    if path.exists() && !force {
        print_warning(&format!("Config already exists at {:?}", path));
        print_info("Use --force to overwrite");
        return Ok(());
    }

    write_default(&path)?;
    print_success(&format!("Wrote default configuration to {:?}", path));
    Ok(())
}

fn write_default(path: &Path) -> Result<()> {
    config::save_config(path, &ControllerConfig::default())
        .with_context(|| format!("Failed to write config to {:?}", path))
}
