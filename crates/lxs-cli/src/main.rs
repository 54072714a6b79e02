//! lxc-ssh CLI
//!
//! Drives the `lxc` tool on a remote hypervisor host over SSH:
//! - clone a template container and start it
//! - look up a container's address
//! - delete containers
//! - run raw commands on the host

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lxc_ssh::commands::{self, ConfigOverrides};
use lxs_core::CommandExecutor;
use lxs_remote::{ContainerController, RemoteExecutor};

#[derive(Parser)]
#[command(name = "lxc-ssh")]
#[command(author, version, about = "Manage LXC containers on a remote host over SSH")]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Hypervisor host (overrides config)
    #[arg(short = 'H', long, global = true, env = "LXC_SSH_HOST")]
    host: Option<String>,

    /// SSH port (overrides config)
    #[arg(short, long, global = true)]
    port: Option<u16>,

    /// Remote username (overrides config)
    #[arg(short, long, global = true)]
    user: Option<String>,

    /// Private key file (overrides config)
    #[arg(short = 'i', long, global = true)]
    key: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the IPv4 address of a container
    Ip {
        /// Container name
        name: String,
    },

    /// Replace a container with a fresh clone of another and start it
    Clone {
        /// Container (usually a template) to copy
        source: String,
        /// Name of the new container; an existing one is deleted first
        target: String,
        /// Wait for the new container's address and print it
        #[arg(short, long)]
        wait_ip: bool,
    },

    /// Force-delete containers (missing ones are not an error)
    Delete {
        /// Container name(s)
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Run a shell command on the hypervisor host
    Exec {
        /// Command line passed to the remote shell
        command: String,
        /// Do not fail on a non-zero exit status
        #[arg(long)]
        no_check: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Show config file path
    Path,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.into()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let overrides = ConfigOverrides {
        host: cli.host,
        port: cli.port,
        username: cli.user,
        private_key_path: cli.key,
    };
    let config_path = cli.config.as_ref();

    match cli.command {
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_show(config_path, &overrides)?,
            ConfigAction::Path => commands::config_path(config_path),
            ConfigAction::Init { force } => commands::config_init(config_path, force)?,
        },

        Commands::Exec { command, no_check } => {
            let config = commands::resolve_config(config_path, &overrides)?;
            let mut executor = RemoteExecutor::connect(&config)
                .await
                .with_context(|| format!("Failed to connect to {}", config.address()))?;
            let result = commands::exec_command(&mut executor, &command, !no_check).await;
            if let Err(e) = executor.close().await {
                tracing::warn!("Failed to close session: {}", e);
            }
            result?;
        }

        Commands::Ip { name } => {
            let mut controller = connect(config_path, &overrides).await?;
            let result = commands::ip_command(&mut controller, &name).await;
            finish(controller).await;
            result?;
        }

        Commands::Clone {
            source,
            target,
            wait_ip,
        } => {
            let mut controller = connect(config_path, &overrides).await?;
            let result = commands::clone_command(&mut controller, &source, &target, wait_ip).await;
            finish(controller).await;
            result?;
        }

        Commands::Delete { names } => {
            let mut controller = connect(config_path, &overrides).await?;
            let result = commands::delete_command(&mut controller, &names).await;
            finish(controller).await;
            result?;
        }
    }

    Ok(())
}

/// Resolve configuration and open a controller session
async fn connect(
    config_path: Option<&PathBuf>,
    overrides: &ConfigOverrides,
) -> Result<ContainerController> {
    let config = commands::resolve_config(config_path, overrides)?;
    let controller = ContainerController::connect(&config)
        .await
        .with_context(|| format!("Failed to connect to {}", config.address()))?;
    Ok(controller)
}

/// Close the controller session, logging failures
async fn finish(controller: ContainerController) {
    let running = controller.running_containers();
    if !running.is_empty() {
        let names: Vec<&str> = running.iter().map(|n| n.as_str()).collect();
        tracing::info!("Started this run: {}", names.join(", "));
    }

    if let Err(e) = controller.close().await {
        tracing::warn!("Failed to close session: {}", e);
    }
}
