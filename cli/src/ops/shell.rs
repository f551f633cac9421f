//! Interactive shell on a deployed machine

use std::path::Path;

use tracing::info;

use crate::errors::SkyliftError;
use crate::ops::DeploymentRun;
use crate::remote::keys::resolve_key;
use crate::remote::ssh::REMOTE_USER;
use crate::source;
use crate::storage::settings::{Machine, Settings};

/// Replace this process with an ssh session on one of the
/// environment's machines. With more than one machine, the operator
/// picks by name.
pub async fn open_shell(
    settings: &Settings,
    env: &str,
    dir: Option<&Path>,
    tag: &str,
) -> Result<(), SkyliftError> {
    let source = source::prepare(settings, dir, tag).await?;
    let run = DeploymentRun::checkout(settings, env, source)?;

    let machine = choose_machine(run.machines).await?;
    let host = machine.host.clone().ok_or_else(|| {
        SkyliftError::ConfigError(format!("{} has no host entry", machine.name))
    })?;
    let key = resolve_key(&run.source, &machine.key_pair).await?;

    info!("Connecting to {}@{}", REMOTE_USER, host);
    exec_ssh(&host, &key)
}

async fn choose_machine(mut machines: Vec<Machine>) -> Result<Machine, SkyliftError> {
    if machines.len() == 1 {
        return Ok(machines.swap_remove(0));
    }

    let names: Vec<String> = machines.iter().map(|machine| machine.name.clone()).collect();
    tokio::task::spawn_blocking(move || {
        let index = dialoguer::Select::new()
            .with_prompt("Machine")
            .items(&names)
            .default(0)
            .interact()
            .map_err(|e| {
                SkyliftError::ConfigError(format!("machine selection interrupted: {}", e))
            })?;

        machines
            .into_iter()
            .nth(index)
            .ok_or_else(|| SkyliftError::Internal("selection out of range".to_string()))
    })
    .await
    .map_err(|e| SkyliftError::Internal(format!("prompt task failed: {}", e)))?
}

#[cfg(unix)]
fn exec_ssh(host: &str, key: &Path) -> Result<(), SkyliftError> {
    use std::os::unix::process::CommandExt;

    let error = std::process::Command::new("ssh")
        .arg("-i")
        .arg(key)
        .arg(format!("{}@{}", REMOTE_USER, host))
        .exec();

    // exec only returns when the replacement failed
    Err(SkyliftError::RemoteError(format!(
        "failed to exec ssh: {}",
        error
    )))
}

#[cfg(not(unix))]
fn exec_ssh(host: &str, key: &Path) -> Result<(), SkyliftError> {
    let status = std::process::Command::new("ssh")
        .arg("-i")
        .arg(key)
        .arg(format!("{}@{}", REMOTE_USER, host))
        .status()?;

    if !status.success() {
        return Err(SkyliftError::RemoteError(format!(
            "ssh exited {:?}",
            status.code()
        )));
    }
    Ok(())
}
