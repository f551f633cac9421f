//! Fleet scaling driver

use cloud_api::models::scaling::{
    CreateAutoscaleGroupRequest, CreateBalancerRequest, CreateLaunchConfigRequest,
    CreateTriggerRequest, HealthCheck, Listener,
};
use tracing::{debug, info, warn};

use crate::cloud::CloudApi;
use crate::errors::SkyliftError;
use crate::ops::DeploymentRun;
use crate::storage::settings::BalancerSpec;

/// Attach balancers and autoscaling groups to the machines that
/// configure them.
///
/// Balancers are created only when absent. Autoscaling needs the
/// machine's recorded image, so it only works after an update has
/// captured one. A machine fronted by both hands its capacity to the
/// group: the standalone instance is terminated and the host cleared.
pub async fn attach_fleet(
    cloud: &dyn CloudApi,
    run: &mut DeploymentRun,
) -> Result<(), SkyliftError> {
    for machine in &mut run.machines {
        if let Some(spec) = &mut machine.balancer {
            ensure_balancer(cloud, spec).await?;
        }

        let autoscale = match machine.autoscale.clone() {
            Some(spec) => spec,
            None => continue,
        };

        let image = machine.image.clone().ok_or_else(|| {
            SkyliftError::DeployError(format!(
                "{} has no recorded image, run an update first",
                machine.name
            ))
        })?;

        let group = autoscale
            .group
            .clone()
            .unwrap_or_else(|| format!("{}-group", machine.name));
        let config_name = format!("{}-config", group);

        cloud
            .create_launch_config(&CreateLaunchConfigRequest {
                name: config_name.clone(),
                image,
                key_pair: machine.key_pair.clone(),
                size: machine.size.clone(),
                groups: machine.groups.clone(),
            })
            .await?;

        let balancers = machine
            .balancer
            .as_ref()
            .map(|spec| vec![spec.name.clone()])
            .unwrap_or_default();

        cloud
            .create_autoscale_group(&CreateAutoscaleGroupRequest {
                name: group.clone(),
                launch_config: config_name,
                zones: autoscale.zones.clone(),
                min_size: autoscale.min,
                max_size: autoscale.max,
                balancers,
            })
            .await?;

        cloud
            .create_scaling_trigger(&CreateTriggerRequest {
                group: group.clone(),
                measure: autoscale.trigger.measure.clone(),
                lower_threshold: autoscale.trigger.lower_threshold,
                upper_threshold: autoscale.trigger.upper_threshold,
                period: autoscale.trigger.period,
                breach_duration: autoscale.trigger.breach_duration,
                scale_down_by: autoscale.trigger.scale_down_by,
                scale_up_by: autoscale.trigger.scale_up_by,
            })
            .await?;

        info!("Autoscale group {} covers {}", group, machine.name);

        // The group owns capacity now; retire the standalone instance
        if machine.balancer.is_some() {
            if let Some(host) = machine.host.take() {
                match cloud.find_instance_by_dns(&host).await? {
                    Some(instance) => {
                        cloud.terminate_instance(&instance.id).await?;
                        info!("Terminated standalone {} ({})", host, instance.id);
                    }
                    None => warn!("No instance found for {} to retire", host),
                }
            }
        }
    }

    Ok(())
}

async fn ensure_balancer(
    cloud: &dyn CloudApi,
    spec: &mut BalancerSpec,
) -> Result<(), SkyliftError> {
    if let Some(existing) = cloud.describe_balancer(&spec.name).await? {
        debug!("Balancer {} already exists", spec.name);
        spec.dns_name = Some(existing.dns_name);
        return Ok(());
    }

    let request = CreateBalancerRequest {
        name: spec.name.clone(),
        zones: spec.zones.clone(),
        listeners: spec
            .listeners
            .iter()
            .map(|listener| Listener {
                port: listener.port,
                instance_port: listener.instance_port,
                protocol: listener.protocol.clone(),
            })
            .collect(),
        health_check: HealthCheck {
            target: spec.health.target.clone(),
            interval: spec.health.interval,
            timeout: spec.health.timeout,
            healthy_threshold: spec.health.healthy_threshold,
            unhealthy_threshold: spec.health.unhealthy_threshold,
        },
    };

    let balancer = cloud.create_balancer(&request).await?;
    info!("Created balancer {} at {}", balancer.name, balancer.dns_name);
    spec.dns_name = Some(balancer.dns_name);

    Ok(())
}
