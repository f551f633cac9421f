//! Deployment driver

use tracing::{info, warn};

use cloud_api::models::compute::CreateImageRequest;

use crate::cloud::CloudApi;
use crate::errors::SkyliftError;
use crate::ops::{assets, scale, DeploymentRun};
use crate::remote::keys::resolve_key;
use crate::remote::rsync::SourceTransfer;
use crate::remote::ssh::CommandRunner;
use crate::utils::timestamp_slug;

/// Optional passes an update can carry
#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
    /// Sync static assets to each machine's configured bucket
    pub sync_assets: bool,

    /// Invalidate each machine's configured CDN distribution
    pub invalidate_cache: bool,
}

/// Push the source tree to every machine in the environment.
///
/// Machines are handled one at a time: back up the previous tree,
/// rsync the new one, repoint /srv/active, run the machine's update
/// commands, then snapshot the instance into a fresh image. A machine
/// without a host fails the whole run before anything is touched.
pub async fn update_env(
    cloud: &dyn CloudApi,
    runner: &dyn CommandRunner,
    transfer: &dyn SourceTransfer,
    run: &mut DeploymentRun,
    options: &UpdateOptions,
) -> Result<(), SkyliftError> {
    for machine in &run.machines {
        if machine.host.is_none() {
            return Err(SkyliftError::ConfigError(format!(
                "{} has no host entry",
                machine.name
            )));
        }
    }

    let source = run.source.clone();
    let basename = source
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            SkyliftError::SourceError(format!(
                "source path {} has no directory name",
                source.display()
            ))
        })?;
    let target = format!("/srv/{}", basename);

    for machine in &mut run.machines {
        let host = machine.host.clone().ok_or_else(|| {
            SkyliftError::ConfigError(format!("{} has no host entry", machine.name))
        })?;
        let key = resolve_key(&source, &machine.key_pair).await?;

        info!("Updating {} at {}", machine.name, host);

        // Keep the previous tree around under a timestamped name
        let backup = format!("test -e {target} && mv {target} {target}.`date +%m:%d:%H:%M`");
        runner.run(&host, &key, &backup).await?;

        transfer.push(&source, &host, &key).await?;

        // Repoint the active tree in one rename
        let swap =
            format!("ln -sfn {target} /srv/active.tmp && mv -T /srv/active.tmp /srv/active");
        runner.run(&host, &key, &swap).await?;

        for command in &machine.update {
            info!("Running [{}]", command);
            runner.run(&host, &key, command).await?;
        }

        if let Some(url) = &machine.url {
            let address = format!("http://{}{}", host, url);
            if let Err(e) = webbrowser::open(&address) {
                warn!("Could not open {}: {}", address, e);
            }
        }

        let instance = cloud
            .find_instance_by_dns(&host)
            .await?
            .ok_or_else(|| SkyliftError::NotFound(format!("no instance found for {}", host)))?;

        let stamp = timestamp_slug();
        let request = CreateImageRequest {
            instance_id: instance.id.clone(),
            name: format!("{} {}", machine.name, stamp),
            description: Some(format!("Image of {} on {}", machine.name, stamp)),
        };
        let image = cloud.create_image(&request).await?;
        info!("Captured {} as {}", machine.name, image.id);
        machine.image = Some(image.id);
    }

    scale::attach_fleet(cloud, run).await?;

    if options.sync_assets || options.invalidate_cache {
        assets::sync_env(cloud, run, options.sync_assets, options.invalidate_cache).await?;
    }

    Ok(())
}
