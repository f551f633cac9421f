//! Provisioning driver

use std::time::Duration;

use cloud_api::models::compute::{InstanceState, RunInstanceRequest};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::cloud::CloudApi;
use crate::errors::SkyliftError;
use crate::ops::DeploymentRun;
use crate::remote::keys::resolve_key;
use crate::remote::ssh::CommandRunner;
use crate::utils::{wait_until, CooldownOptions, RetryPolicy};

/// Retry schedules for the two waits a build performs
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Polling schedule while an instance is pending
    pub provision: RetryPolicy,

    /// Probe schedule until the new host accepts ssh
    pub reach: RetryPolicy,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            provision: RetryPolicy {
                max_attempts: 40,
                cooldown: CooldownOptions {
                    base_delay: Duration::from_secs(10),
                    max_delay: Duration::from_secs(30),
                    multiplier: 1.5,
                },
            },
            reach: RetryPolicy {
                max_attempts: 20,
                cooldown: CooldownOptions {
                    base_delay: Duration::from_secs(5),
                    max_delay: Duration::from_secs(60),
                    multiplier: 2.0,
                },
            },
        }
    }
}

/// Provision an instance for every machine in the environment.
///
/// Machines are handled one at a time. For each: launch an instance
/// from the base image, wait for it to leave `pending`, record its
/// public DNS as the machine's host, then run the machine's init
/// commands once it accepts ssh. A previously recorded host is only
/// warned about; the old instance keeps running.
pub async fn build_env(
    cloud: &dyn CloudApi,
    runner: &dyn CommandRunner,
    run: &mut DeploymentRun,
    options: &BuildOptions,
    shutdown: &mut broadcast::Receiver<()>,
) -> Result<(), SkyliftError> {
    let source = run.source.clone();

    for machine in &mut run.machines {
        let key = resolve_key(&source, &machine.key_pair).await?;

        info!("Requesting {} for {}", machine.base, machine.name);
        let request = RunInstanceRequest {
            image: machine.base.clone(),
            size: machine.size.clone(),
            groups: machine.groups.clone(),
            key_pair: machine.key_pair.clone(),
        };
        let instance = cloud.run_instance(&request).await?;

        let instance_id = instance.id.clone();
        let settled = wait_until(&options.provision, "instance provisioning", shutdown, |_| {
            let instance_id = instance_id.clone();
            async move {
                let described = cloud.describe_instance(&instance_id).await?;
                match described.state {
                    InstanceState::Pending => Ok(None),
                    _ => Ok(Some(described)),
                }
            }
        })
        .await?;

        if settled.state != InstanceState::Running {
            return Err(SkyliftError::CloudError(format!(
                "instance {} entered state {}",
                settled.id, settled.state
            )));
        }

        let dns = settled.public_dns.clone().ok_or_else(|| {
            SkyliftError::CloudError(format!(
                "instance {} is running without a public dns name",
                settled.id
            ))
        })?;

        if let Some(old) = &machine.host {
            warn!("{} has been replaced", old);
        }
        machine.host = Some(dns.clone());

        cloud.tag_instance(&settled.id, &machine.name).await?;

        wait_until(&options.reach, "ssh reachability", shutdown, |_| {
            let dns = dns.clone();
            let key = key.clone();
            async move {
                match runner.run(&dns, &key, "echo ok").await {
                    Ok(_) => Ok(Some(())),
                    Err(e) => {
                        debug!("{} not reachable yet: {}", dns, e);
                        Ok(None)
                    }
                }
            }
        })
        .await?;

        for command in &machine.init {
            info!("Running [{}]", command);
            runner.run(&dns, &key, command).await?;
        }

        info!("{} is live at {}", machine.name, dns);
    }

    Ok(())
}
