//! Main application run loop

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::app::options::{AppOptions, LifecycleOptions, Mode};
use crate::cloud::client::CloudClient;
use crate::errors::SkyliftError;
use crate::filesys::file::File;
use crate::ops::build::{build_env, BuildOptions};
use crate::ops::update::{update_env, UpdateOptions};
use crate::ops::{inventory, keypair, shell, DeploymentRun};
use crate::remote::rsync::RsyncTransfer;
use crate::remote::ssh::SshRunner;
use crate::server::gate::StatusGate;
use crate::server::serve::serve;
use crate::server::state::ServerState;
use crate::source;
use crate::storage::bootstrap::ensure_conf;
use crate::storage::settings::{load_settings, save_settings, Settings};

/// Run the requested skylift action
pub async fn run(
    options: AppOptions,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), SkyliftError> {
    let conf_file = File::new(&options.conf);
    ensure_conf(&conf_file, options.template.as_deref()).await?;
    let mut settings = load_settings(&conf_file).await?;

    let cloud = Arc::new(CloudClient::new(
        &settings.endpoint,
        &settings.key,
        &settings.secret,
    )?);

    match &options.mode {
        Mode::Map => inventory::print_map(cloud.as_ref()).await,
        Mode::Keypair { name } => keypair::generate(cloud.as_ref(), name).await.map(|_| ()),
        Mode::Shell => {
            shell::open_shell(&settings, &options.env, options.dir.as_deref(), &options.tag).await
        }
        Mode::Build => {
            run_build(
                cloud.as_ref(),
                &options,
                &mut settings,
                &conf_file,
                shutdown_signal,
            )
            .await
        }
        Mode::Update => run_update(cloud.as_ref(), &options, &mut settings, &conf_file).await,
        Mode::Listen => run_server(cloud, options, settings, conf_file, shutdown_signal).await,
    }
}

// ================================ CLI ACTIONS =================================== //

async fn run_build(
    cloud: &CloudClient,
    options: &AppOptions,
    settings: &mut Settings,
    conf_file: &File,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), SkyliftError> {
    let source = source::prepare(settings, options.dir.as_deref(), &options.tag).await?;
    let mut run = DeploymentRun::checkout(settings, &options.env, source)?;

    let runner = SshRunner;
    let transfer = RsyncTransfer;

    if confirm_build(run.machines.len()).await? {
        let (shutdown_tx, mut shutdown_rx) = broadcast::channel(1);
        tokio::spawn(forward_shutdown(shutdown_signal, shutdown_tx));

        build_env(
            cloud,
            &runner,
            &mut run,
            &BuildOptions::default(),
            &mut shutdown_rx,
        )
        .await?;
    }

    // A declined build still pushes code to the existing machines
    update_env(cloud, &runner, &transfer, &mut run, &update_options(options)).await?;

    run.commit(settings);
    save_settings(conf_file, settings).await
}

async fn run_update(
    cloud: &CloudClient,
    options: &AppOptions,
    settings: &mut Settings,
    conf_file: &File,
) -> Result<(), SkyliftError> {
    let source = source::prepare(settings, options.dir.as_deref(), &options.tag).await?;
    let mut run = DeploymentRun::checkout(settings, &options.env, source)?;

    let runner = SshRunner;
    let transfer = RsyncTransfer;
    update_env(cloud, &runner, &transfer, &mut run, &update_options(options)).await?;

    run.commit(settings);
    save_settings(conf_file, settings).await
}

fn update_options(options: &AppOptions) -> UpdateOptions {
    UpdateOptions {
        sync_assets: options.sync_assets,
        invalidate_cache: options.invalidate_cache,
    }
}

async fn confirm_build(count: usize) -> Result<bool, SkyliftError> {
    let prompt = format!(
        "Create {} server{}?",
        count,
        if count == 1 { "" } else { "s" }
    );
    tokio::task::spawn_blocking(move || {
        dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(true)
            .interact()
            .map_err(|e| {
                SkyliftError::ConfigError(format!("build confirmation interrupted: {}", e))
            })
    })
    .await
    .map_err(|e| SkyliftError::Internal(format!("prompt task failed: {}", e)))?
}

async fn forward_shutdown(
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
    shutdown_tx: broadcast::Sender<()>,
) {
    shutdown_signal.await;
    let _ = shutdown_tx.send(());
}

// ================================== SERVER ====================================== //

async fn run_server(
    cloud: Arc<CloudClient>,
    options: AppOptions,
    settings: Settings,
    conf_file: File,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), SkyliftError> {
    info!("Initializing build server...");

    let (shutdown_tx, _shutdown_rx): (broadcast::Sender<()>, _) = broadcast::channel(1);
    let mut shutdown_manager = ShutdownManager::new(shutdown_tx.clone(), options.lifecycle.clone());

    let state = ServerState::new(
        Arc::new(RwLock::new(settings)),
        Arc::new(conf_file),
        Arc::new(StatusGate::new()),
        cloud,
        Arc::new(SshRunner),
        Arc::new(RsyncTransfer),
        options.dir.clone(),
        options.tag.clone(),
        shutdown_tx.clone(),
    );

    let mut server_rx = shutdown_tx.subscribe();
    let server_handle = serve(&options.server, Arc::new(state), async move {
        let _ = server_rx.recv().await;
    })
    .await?;
    shutdown_manager.with_server_handle(server_handle)?;

    shutdown_signal.await;
    info!("Shutdown signal received, shutting down...");

    drop(shutdown_tx);
    shutdown_manager.shutdown().await
}

// ================================= SHUTDOWN ===================================== //

struct ShutdownManager {
    shutdown_tx: broadcast::Sender<()>,
    lifecycle_options: LifecycleOptions,
    server_handle: Option<JoinHandle<Result<(), SkyliftError>>>,
}

impl ShutdownManager {
    fn new(shutdown_tx: broadcast::Sender<()>, lifecycle_options: LifecycleOptions) -> Self {
        Self {
            shutdown_tx,
            lifecycle_options,
            server_handle: None,
        }
    }

    fn with_server_handle(
        &mut self,
        handle: JoinHandle<Result<(), SkyliftError>>,
    ) -> Result<(), SkyliftError> {
        if self.server_handle.is_some() {
            return Err(SkyliftError::ShutdownError(
                "server_handle already set".to_string(),
            ));
        }
        self.server_handle = Some(handle);
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<(), SkyliftError> {
        let _ = self.shutdown_tx.send(());

        match tokio::time::timeout(
            self.lifecycle_options.max_shutdown_delay,
            self.shutdown_impl(),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                error!(
                    "Shutdown timed out after {:?}, forcing shutdown...",
                    self.lifecycle_options.max_shutdown_delay
                );
                std::process::exit(1);
            }
        }
    }

    async fn shutdown_impl(&mut self) -> Result<(), SkyliftError> {
        info!("Shutting down build server...");

        if let Some(handle) = self.server_handle.take() {
            handle
                .await
                .map_err(|e| SkyliftError::ShutdownError(e.to_string()))??;
        }

        info!("Shutdown complete");
        Ok(())
    }
}
