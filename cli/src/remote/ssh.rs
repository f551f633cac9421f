//! Remote command execution

use std::io::Read;
use std::net::{TcpStream, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};
use ssh2::Session;
use tracing::{debug, warn};

use crate::errors::SkyliftError;

/// Remote user deployments run as
// TODO: make the remote user configurable per machine
pub const REMOTE_USER: &str = "ubuntu";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Executes single commands on remote hosts
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run one command on `host` as the deployment user, returning
    /// captured stdout.
    ///
    /// Remote stderr and a non-zero exit status are surfaced as warnings,
    /// never as errors; only transport and authentication failures abort.
    async fn run(&self, host: &str, key: &Path, command: &str) -> Result<String, SkyliftError>;
}

/// ssh2-backed command runner
pub struct SshRunner;

#[async_trait]
impl CommandRunner for SshRunner {
    async fn run(&self, host: &str, key: &Path, command: &str) -> Result<String, SkyliftError> {
        let host = host.to_string();
        let key = key.to_path_buf();
        let command = command.to_string();

        tokio::task::spawn_blocking(move || exec_over_ssh(&host, &key, &command))
            .await
            .map_err(|e| SkyliftError::Internal(format!("ssh task failed: {}", e)))?
    }
}

fn exec_over_ssh(host: &str, key: &PathBuf, command: &str) -> Result<String, SkyliftError> {
    let address = format!("{}:22", host);
    let resolved = address
        .to_socket_addrs()
        .map_err(|e| SkyliftError::RemoteError(format!("failed to resolve {}: {}", address, e)))?
        .next()
        .ok_or_else(|| SkyliftError::RemoteError(format!("no address for {}", address)))?;

    let tcp = TcpStream::connect_timeout(&resolved, CONNECT_TIMEOUT).map_err(|e| {
        SkyliftError::RemoteError(format!("failed to connect to {}: {}", address, e))
    })?;

    let mut session = Session::new()
        .map_err(|e| SkyliftError::RemoteError(format!("ssh session init failed: {}", e)))?;
    session.set_tcp_stream(tcp);
    session.handshake().map_err(|e| {
        SkyliftError::RemoteError(format!("ssh handshake with {} failed: {}", host, e))
    })?;

    // Unknown host keys are trusted; log the fingerprint so a change is
    // at least visible in the logs.
    if let Some(fingerprint) = host_key_fingerprint(&session) {
        debug!("Host key for {} is {}", host, fingerprint);
    }

    session
        .userauth_pubkey_file(REMOTE_USER, None, key, None)
        .map_err(|e| SkyliftError::RemoteError(format!("ssh auth to {} failed: {}", host, e)))?;

    let mut channel = session
        .channel_session()
        .map_err(|e| SkyliftError::RemoteError(format!("ssh channel to {} failed: {}", host, e)))?;
    channel
        .exec(command)
        .map_err(|e| SkyliftError::RemoteError(format!("exec on {} failed: {}", host, e)))?;

    let mut stdout = String::new();
    channel.read_to_string(&mut stdout).map_err(|e| {
        SkyliftError::RemoteError(format!("failed to read stdout from {}: {}", host, e))
    })?;

    let mut stderr = String::new();
    channel.stderr().read_to_string(&mut stderr).map_err(|e| {
        SkyliftError::RemoteError(format!("failed to read stderr from {}: {}", host, e))
    })?;

    channel
        .wait_close()
        .map_err(|e| SkyliftError::RemoteError(format!("ssh close on {} failed: {}", host, e)))?;
    let exit_status = channel
        .exit_status()
        .map_err(|e| SkyliftError::RemoteError(format!("no exit status from {}: {}", host, e)))?;

    if !stderr.trim().is_empty() {
        warn!("{}", stderr.trim_end());
    }
    if exit_status != 0 {
        warn!("[{}] exited {} on {}", command, exit_status, host);
    }

    Ok(stdout)
}

fn host_key_fingerprint(session: &Session) -> Option<String> {
    let (host_key, _host_key_type) = session.host_key()?;
    let digest = Sha256::digest(host_key);
    Some(format!("SHA256:{}", STANDARD_NO_PAD.encode(digest)))
}
