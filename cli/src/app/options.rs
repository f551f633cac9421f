//! Application configuration options

use std::path::PathBuf;
use std::time::Duration;

/// Top-level action the process performs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Print the provider inventory
    Map,

    /// Open an ssh session on a deployed machine
    Shell,

    /// Provision new instances for the environment
    Build,

    /// Push code to the environment's machines
    Update,

    /// Generate and save a named key pair
    Keypair { name: String },

    /// Serve the build panel over HTTP
    Listen,
}

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Action to perform
    pub mode: Mode,

    /// Conf file path
    pub conf: PathBuf,

    /// Environment name within the conf file
    pub env: String,

    /// Tag checked out when no directory is given
    pub tag: String,

    /// Local source directory overriding the tag checkout
    pub dir: Option<PathBuf>,

    /// Template file seeding a fresh conf
    pub template: Option<PathBuf>,

    /// Sync static assets during updates
    pub sync_assets: bool,

    /// Invalidate CDN caches during updates
    pub invalidate_cache: bool,

    /// Server configuration
    pub server: ServerOptions,

    /// Lifecycle configuration
    pub lifecycle: LifecycleOptions,
}

/// Lifecycle options for the build server
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    /// Maximum delay for graceful shutdown
    pub max_shutdown_delay: Duration,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            max_shutdown_delay: Duration::from_secs(30),
        }
    }
}

/// Build server options
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}
