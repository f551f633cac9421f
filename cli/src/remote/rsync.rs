//! Source tree transfer

use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::errors::SkyliftError;
use crate::remote::ssh::REMOTE_USER;

/// Pushes a source tree to a host's deployment area
#[async_trait]
pub trait SourceTransfer: Send + Sync {
    /// Incrementally sync `source` into /srv on `host`.
    ///
    /// No trailing slash on the source: the directory itself lands under
    /// /srv, so the deployment path is /srv/<basename-of-source>.
    async fn push(&self, source: &Path, host: &str, key: &Path) -> Result<(), SkyliftError>;
}

/// rsync-over-ssh transfer
pub struct RsyncTransfer;

#[async_trait]
impl SourceTransfer for RsyncTransfer {
    async fn push(&self, source: &Path, host: &str, key: &Path) -> Result<(), SkyliftError> {
        let ssh_command = format!("ssh -o StrictHostKeyChecking=no -i {}", key.display());
        let destination = format!("{}@{}:/srv", REMOTE_USER, host);

        debug!("rsync {} to {}", source.display(), destination);

        let status = Command::new("rsync")
            .arg("-az")
            .arg("-e")
            .arg(&ssh_command)
            .arg(source)
            .arg(&destination)
            .status()
            .await
            .map_err(|e| SkyliftError::TransferError(format!("Failed to run rsync: {}", e)))?;

        if !status.success() {
            return Err(SkyliftError::TransferError(format!(
                "rsync to {} failed with exit code: {:?}",
                host,
                status.code()
            )));
        }

        Ok(())
    }
}
