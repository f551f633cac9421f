//! Server state

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};

use crate::cloud::CloudApi;
use crate::filesys::file::File;
use crate::remote::rsync::SourceTransfer;
use crate::remote::ssh::CommandRunner;
use crate::server::gate::StatusGate;
use crate::storage::settings::Settings;

/// Server state shared across handlers
pub struct ServerState {
    pub settings: Arc<RwLock<Settings>>,
    pub conf_file: Arc<File>,
    pub gate: Arc<StatusGate>,
    pub cloud: Arc<dyn CloudApi>,
    pub runner: Arc<dyn CommandRunner>,
    pub transfer: Arc<dyn SourceTransfer>,

    /// Deploy from this directory instead of a fresh checkout
    pub dir: Option<PathBuf>,

    /// Tag checked out for triggered operations
    pub tag: String,

    pub shutdown_tx: broadcast::Sender<()>,
}

impl ServerState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        settings: Arc<RwLock<Settings>>,
        conf_file: Arc<File>,
        gate: Arc<StatusGate>,
        cloud: Arc<dyn CloudApi>,
        runner: Arc<dyn CommandRunner>,
        transfer: Arc<dyn SourceTransfer>,
        dir: Option<PathBuf>,
        tag: String,
        shutdown_tx: broadcast::Sender<()>,
    ) -> Self {
        Self {
            settings,
            conf_file,
            gate,
            cloud,
            runner,
            transfer,
            dir,
            tag,
            shutdown_tx,
        }
    }
}
