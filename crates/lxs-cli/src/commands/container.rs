//! Container command implementations

use std::io::Write;

use anyhow::{Context, Result};

use crate::output::{print_error, print_success, print_warning};
use lxs_core::{CommandExecutor, ContainerName};
use lxs_remote::ContainerController;

fn container_name(name: &str) -> Result<ContainerName> {
    ContainerName::new(name).with_context(|| format!("Invalid container name {:?}", name))
}

/// Print the IPv4 address of a container
pub async fn ip_command<E: CommandExecutor>(
    controller: &mut ContainerController<E>,
    name: &str,
) -> Result<()> {
    let name = container_name(name)?;
    let address = controller
        .get_address(&name)
        .await
        .with_context(|| format!("Failed to get address of {}", name))?;
    println!("{}", address);
    Ok(())
}

/// Clone `source` into `target` and start it
pub async fn clone_command<E: CommandExecutor>(
    controller: &mut ContainerController<E>,
    source: &str,
    target: &str,
    wait_ip: bool,
) -> Result<()> {
    let source = container_name(source)?;
    let target = container_name(target)?;

    controller
        .copy_and_start(&source, &target)
        .await
        .with_context(|| format!("Failed to clone {} into {}", source, target))?;
    print_success(&format!("Started {} from {}", target, source));

    if wait_ip {
        let address = controller
            .get_address(&target)
            .await
            .with_context(|| format!("{} started but has no address", target))?;
        println!("{}", address);
    }

    Ok(())
}

/// Delete each named container, continuing past failures
pub async fn delete_command<E: CommandExecutor>(
    controller: &mut ContainerController<E>,
    names: &[String],
) -> Result<()> {
    if names.is_empty() {
        print_warning("No containers specified");
        return Ok(());
    }

    let mut failed = 0;

    for raw in names {
        let result = match container_name(raw) {
            Ok(name) => controller.stop_and_delete(&name).await.map_err(Into::into),
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => print_success(&format!("Deleted {}", raw)),
            Err(e) => {
                print_error(&format!("Failed to delete {}: {:#}", raw, e));
                failed += 1;
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("Failed to delete {} container(s)", failed);
    }

    Ok(())
}

/// Run a raw shell command and copy its stdout
pub async fn exec_command<E: CommandExecutor>(
    executor: &mut E,
    command: &str,
    check: bool,
) -> Result<()> {
    let stdout = executor.execute(command, check).await?;

    let mut out = std::io::stdout();
    out.write_all(&stdout)?;
    out.flush()?;

    let stderr = executor.last_stderr();
    if !stderr.is_empty() {
        eprintln!("{}", stderr);
    }

    Ok(())
}
